use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url, header};
use serde::Deserialize;
use thiserror::Error;

use crate::config::EngineConfig;

#[derive(Debug, Error)]
pub enum WikipediaError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Resolves a wikidata cross-reference to a short descriptive text through a
/// two-step lookup: wikidata id to English Wikipedia page title, then page
/// title to intro extract. Either step coming up empty yields an empty
/// description.
#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    wikidata_url: String,
    wikipedia_url: String,
}

impl WikipediaClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("unable to create HTTP client for description lookups")?;

        Ok(Self {
            http,
            wikidata_url: config.wikidata_url().to_string(),
            wikipedia_url: config.wikipedia_url().to_string(),
        })
    }

    /// Fetches the description for the entity behind a wikidata URL.
    pub async fn entity_description(&self, wikidata_url: &str) -> Result<String, WikipediaError> {
        let title = self.resolve_title(wikidata_url).await?;

        if title.is_empty() {
            return Ok(String::new());
        }

        self.fetch_intro(&title).await
    }

    async fn resolve_title(&self, wikidata_url: &str) -> Result<String, WikipediaError> {
        let Some(wikidata_id) = wikidata_url.rsplit('/').next() else {
            return Ok(String::new());
        };

        let url = Url::parse_with_params(
            &self.wikidata_url,
            [
                ("action", "wbgetentities"),
                ("props", "sitelinks"),
                ("ids", wikidata_id),
                ("sitefilter", "enwiki"),
                ("format", "json"),
            ],
        )
        .map_err(|err| WikipediaError::Parse(err.to_string()))?;

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: WikidataEntitiesResponse = response
            .json()
            .await
            .map_err(|err| WikipediaError::Parse(err.to_string()))?;

        let title = body
            .entities
            .get(wikidata_id)
            .and_then(|entity| entity.sitelinks.get("enwiki"))
            .map(|link| link.title.clone())
            .unwrap_or_default();

        Ok(title)
    }

    async fn fetch_intro(&self, page_title: &str) -> Result<String, WikipediaError> {
        let url = Url::parse_with_params(
            &self.wikipedia_url,
            [
                ("action", "query"),
                ("prop", "extracts"),
                ("exlimit", "1"),
                ("exintro", "true"),
                ("titles", page_title),
                ("explaintext", "1"),
                ("format", "json"),
            ],
        )
        .map_err(|err| WikipediaError::Parse(err.to_string()))?;

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: WikipediaQueryResponse = response
            .json()
            .await
            .map_err(|err| WikipediaError::Parse(err.to_string()))?;

        let intro = body
            .query
            .pages
            .into_values()
            .next()
            .map(|page| page.extract)
            .unwrap_or_default();

        Ok(intro)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct WikidataEntitiesResponse {
    entities: HashMap<String, WikidataEntity>,
}

impl Default for WikidataEntitiesResponse {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct WikidataEntity {
    sitelinks: HashMap<String, SiteLink>,
}

impl Default for WikidataEntity {
    fn default() -> Self {
        Self {
            sitelinks: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SiteLink {
    title: String,
}

impl Default for SiteLink {
    fn default() -> Self {
        Self {
            title: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct WikipediaQueryResponse {
    query: WikipediaQueryBody,
}

impl Default for WikipediaQueryResponse {
    fn default() -> Self {
        Self {
            query: WikipediaQueryBody::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct WikipediaQueryBody {
    pages: HashMap<String, WikipediaPage>,
}

impl Default for WikipediaQueryBody {
    fn default() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct WikipediaPage {
    extract: String,
}

impl Default for WikipediaPage {
    fn default() -> Self {
        Self {
            extract: String::new(),
        }
    }
}
