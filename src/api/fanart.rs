use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url, header};
use serde::Deserialize;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::models::Image;

#[derive(Debug, Error)]
pub enum FanartError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Client for the fanart.tv music image service. An entity with no images is
/// an ordinary empty result, never an error.
#[derive(Clone)]
pub struct FanartClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl FanartClient {
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
            .context("unable to create HTTP client for image lookups")?;

        Ok(Self {
            http,
            base_url: config.fanart_url().to_string(),
            api_key: config.fanart_api_key().to_string(),
        })
    }

    /// Fetches artist thumbnails and background images. Logos are returned
    /// only when neither of those exists.
    pub async fn artist_images(&self, artist_id: &str) -> Result<Vec<Image>, FanartError> {
        let url = Url::parse_with_params(
            &format!("{}/music/{artist_id}", self.base_url),
            [("api_key", self.api_key.as_str())],
        )
        .map_err(|err| FanartError::Parse(err.to_string()))?;

        let Some(record) = self.get_json::<ArtistImagesResponse>(url).await? else {
            return Ok(Vec::new());
        };

        let mut images: Vec<Image> = record
            .artistthumb
            .iter()
            .chain(record.artistbackground.iter())
            .map(|entry| Image::new(entry.url.clone()))
            .collect();

        if images.is_empty() {
            images = record
                .hdmusiclogo
                .iter()
                .map(|entry| Image::new(entry.url.clone()))
                .collect();
        }

        Ok(images)
    }

    /// Fetches album cover images keyed by release-group id. The given id
    /// may be an artist (returning covers for all their albums) or a single
    /// release group (returning a one-entry map).
    pub async fn album_images(
        &self,
        entity_id: &str,
    ) -> Result<HashMap<String, Vec<Image>>, FanartError> {
        let url = Url::parse_with_params(
            &format!("{}/music/albums/{entity_id}", self.base_url),
            [("api_key", self.api_key.as_str())],
        )
        .map_err(|err| FanartError::Parse(err.to_string()))?;

        let Some(record) = self.get_json::<AlbumImagesResponse>(url).await? else {
            return Ok(HashMap::new());
        };

        let mut images = HashMap::new();

        for (album_id, entry) in record.albums {
            let covers: Vec<Image> = if entry.albumcover.is_empty() {
                entry
                    .cdart
                    .iter()
                    .map(|item| Image::new(item.url.clone()))
                    .collect()
            } else {
                entry
                    .albumcover
                    .iter()
                    .map(|item| Image::new(item.url.clone()))
                    .collect()
            };

            images.insert(album_id, covers);
        }

        Ok(images)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Option<T>, FanartError> {
        let response = self.http.get(url).send().await?;

        // The service answers 404 for entities it has no artwork for.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status()?;
        let record = response
            .json()
            .await
            .map_err(|err| FanartError::Parse(err.to_string()))?;

        Ok(Some(record))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ArtistImagesResponse {
    artistthumb: Vec<ImageEntry>,
    artistbackground: Vec<ImageEntry>,
    hdmusiclogo: Vec<ImageEntry>,
}

impl Default for ArtistImagesResponse {
    fn default() -> Self {
        Self {
            artistthumb: Vec::new(),
            artistbackground: Vec::new(),
            hdmusiclogo: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct AlbumImagesResponse {
    albums: HashMap<String, AlbumImageEntry>,
}

impl Default for AlbumImagesResponse {
    fn default() -> Self {
        Self {
            albums: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct AlbumImageEntry {
    albumcover: Vec<ImageEntry>,
    cdart: Vec<ImageEntry>,
}

impl Default for AlbumImageEntry {
    fn default() -> Self {
        Self {
            albumcover: Vec::new(),
            cdart: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ImageEntry {
    url: String,
}

impl Default for ImageEntry {
    fn default() -> Self {
        Self { url: String::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_response_parses_image_groups() {
        let body = r#"{
            "name": "The Example Band",
            "artistthumb": [{"id": "1", "url": "http://img/thumb.jpg", "likes": "3"}],
            "artistbackground": [{"id": "2", "url": "http://img/bg.jpg", "likes": "1"}],
            "hdmusiclogo": [{"id": "3", "url": "http://img/logo.png", "likes": "0"}]
        }"#;

        let record: ArtistImagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(record.artistthumb[0].url, "http://img/thumb.jpg");
        assert_eq!(record.artistbackground[0].url, "http://img/bg.jpg");
        assert_eq!(record.hdmusiclogo[0].url, "http://img/logo.png");
    }

    #[test]
    fn album_response_parses_cover_map() {
        let body = r#"{
            "name": "The Example Band",
            "albums": {
                "rg1": {"albumcover": [{"id": "9", "url": "http://img/cover.jpg"}]},
                "rg2": {"cdart": [{"id": "10", "url": "http://img/disc.png"}]}
            }
        }"#;

        let record: AlbumImagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(record.albums["rg1"].albumcover[0].url, "http://img/cover.jpg");
        assert!(record.albums["rg1"].cdart.is_empty());
        assert_eq!(record.albums["rg2"].cdart[0].url, "http://img/disc.png");
    }
}
