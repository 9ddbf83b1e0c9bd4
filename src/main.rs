use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use music_browser_engine::cache::{EnrichmentCache, SledCacheStore};
use music_browser_engine::config::EngineConfig;
use music_browser_engine::models::{DiscographyKind, EntityKind};
use music_browser_engine::provider::Provider;

#[derive(Parser)]
#[command(name = "music-browser", about = "Aggregated music metadata lookups")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalog for artists, albums or songs
    Search {
        /// Entity kind: artist, album or song
        kind: String,
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 25)]
        page_size: u32,
    },
    /// Look up one entity by its catalog id
    Lookup {
        /// Entity kind: artist, album or song
        kind: String,
        id: String,
        /// Owning artist id, for album lookups
        #[arg(long)]
        artist: Option<String>,
        #[arg(long, default_value_t = 25)]
        page_size: u32,
    },
    /// Page through one section of an entity's discography
    Discography {
        /// Section: album, single-ep, compilation, live or demo
        kind: String,
        id: String,
        /// Entity kind the id refers to: artist or song
        #[arg(long, default_value = "artist")]
        entity: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 25)]
        page_size: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    let store = SledCacheStore::open(config.cache_path())?;
    let cache = EnrichmentCache::new(Arc::new(store));
    let provider = Provider::from_config(&config, cache)?;

    match cli.command {
        Command::Search {
            kind,
            query,
            page,
            page_size,
        } => {
            let kind: EntityKind = kind.parse()?;
            let results = provider.run_search(kind, &query, page, page_size).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Lookup {
            kind,
            id,
            artist,
            page_size,
        } => {
            let kind: EntityKind = kind.parse()?;
            let result = provider
                .run_lookup(kind, &id, artist.as_deref(), page_size)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Discography {
            kind,
            id,
            entity,
            page,
            page_size,
        } => {
            let discog_kind: DiscographyKind = kind.parse()?;
            let entity_kind: EntityKind = entity.parse()?;
            let result = provider
                .run_discography_lookup(discog_kind, &id, entity_kind, page, page_size)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
