use std::env;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Static configuration for the engine: upstream base URLs, credentials and
/// the cache location. Built once at startup and shared by reference.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    musicbrainz_url: String,
    fanart_url: String,
    wikidata_url: String,
    wikipedia_url: String,
    fanart_api_key: String,
    data_provider: String,
    user_agent: String,
    client_id: String,
    cache_path: PathBuf,
    default_page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let client_id = format!("music-browser-{}", Uuid::new_v4());
        let user_agent =
            format!("music-browser-engine/0.1.0 ( https://musicbrainz.org ; unique-id={client_id} )");

        Self {
            musicbrainz_url: String::from("https://musicbrainz.org/ws/2"),
            fanart_url: String::from("http://webservice.fanart.tv/v3"),
            wikidata_url: String::from("https://www.wikidata.org/w/api.php"),
            wikipedia_url: String::from("https://en.wikipedia.org/w/api.php"),
            fanart_api_key: String::new(),
            data_provider: String::from("music-brainz"),
            user_agent,
            client_id,
            cache_path: PathBuf::from("data").join("cache.db"),
            default_page_size: 25,
        }
    }
}

impl EngineConfig {
    /// Builds the default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = env::var("FANART_APIKEY") {
            config.fanart_api_key = key;
        }

        if let Ok(provider) = env::var("DATA_PROVIDER") {
            config.data_provider = provider;
        }

        if let Ok(path) = env::var("CACHE_PATH") {
            config.cache_path = PathBuf::from(path);
        }

        config
    }

    pub fn musicbrainz_url(&self) -> &str {
        &self.musicbrainz_url
    }

    pub fn fanart_url(&self) -> &str {
        &self.fanart_url
    }

    pub fn wikidata_url(&self) -> &str {
        &self.wikidata_url
    }

    pub fn wikipedia_url(&self) -> &str {
        &self.wikipedia_url
    }

    pub fn fanart_api_key(&self) -> &str {
        &self.fanart_api_key
    }

    pub fn data_provider(&self) -> &str {
        &self.data_provider
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_client_id() {
        let config = EngineConfig::default();
        assert!(config.user_agent().contains(config.client_id()));
    }

    #[test]
    fn default_provider_is_musicbrainz() {
        let config = EngineConfig::default();
        assert_eq!(config.data_provider(), "music-brainz");
    }
}
