use serde::{Deserialize, Serialize};

use super::request::EntityKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub url: String,
}

impl Default for Image {
    fn default() -> Self {
        Self { url: String::new() }
    }
}

impl Image {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
        }
    }
}

/// An external site link surfaced on an entity. The ordinal is a display
/// order assigned by the normalization rules, not upstream order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub label: String,
    pub target: String,
    pub ordinal: u32,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            label: String::new(),
            target: String::new(),
            ordinal: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeSpan {
    pub begin: String,
    pub end: String,
    pub ended: bool,
}

impl Default for LifeSpan {
    fn default() -> Self {
        Self {
            begin: String::new(),
            end: String::new(),
            ended: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Area {
    pub name: String,
}

impl Default for Area {
    fn default() -> Self {
        Self { name: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub life_span: LifeSpan,
}

impl Default for Member {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            life_span: LifeSpan::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub artist_id: String,
    pub duration: String,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            artist: String::new(),
            artist_id: String::new(),
            duration: String::new(),
        }
    }
}

/// The tracks of one physical medium. Releases with several mediums (box
/// sets, multi-disc albums) produce one of these per disc.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackList {
    pub tracks: Vec<Track>,
    pub total_duration: String,
    pub position: u32,
    pub format: String,
}

impl Default for TrackList {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            total_duration: String::new(),
            position: 0,
            format: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    pub album_type: String,
    pub artist: String,
    pub artist_id: String,
    pub release_date: String,
    pub ordinal: u32,
    pub tags: Vec<Tag>,
    pub genres: Vec<Tag>,
    pub images: Vec<Image>,
    pub track_list: Vec<TrackList>,
    pub description: String,
    pub links: Vec<Link>,
}

impl Default for Album {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            album_type: String::new(),
            artist: String::new(),
            artist_id: String::new(),
            release_date: String::new(),
            ordinal: 0,
            tags: Vec::new(),
            genres: Vec::new(),
            images: Vec::new(),
            track_list: Vec::new(),
            description: String::new(),
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub artist_type: String,
    pub life_span: LifeSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_area: Option<Area>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_area: Option<Area>,
    pub comment: String,
    pub annotation: String,
    pub tags: Vec<Tag>,
    pub genres: Vec<Tag>,
    pub images: Vec<Image>,
    pub albums: Vec<Album>,
    pub total_albums: u32,
    pub members: Vec<Member>,
    pub links: Vec<Link>,
    pub description: String,
}

impl Default for Artist {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            artist_type: String::new(),
            life_span: LifeSpan::default(),
            area: None,
            begin_area: None,
            end_area: None,
            comment: String::new(),
            annotation: String::new(),
            tags: Vec::new(),
            genres: Vec::new(),
            images: Vec::new(),
            albums: Vec::new(),
            total_albums: 0,
            members: Vec::new(),
            links: Vec::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub name: String,
    pub duration: String,
    pub artist: String,
    pub artist_id: String,
    pub release_date: String,
    pub tags: Vec<Tag>,
    pub genres: Vec<Tag>,
    pub annotation: String,
    pub albums: Vec<Album>,
    pub links: Vec<Link>,
    pub description: String,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            duration: String::new(),
            artist: String::new(),
            artist_id: String::new(),
            release_date: String::new(),
            tags: Vec::new(),
            genres: Vec::new(),
            annotation: String::new(),
            albums: Vec::new(),
            links: Vec::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResult {
    pub entity_type: EntityKind,
    pub id: String,
    pub name: String,
    pub artist: String,
    pub artist_id: String,
    pub album: String,
    pub score: i32,
    pub tags: Vec<Tag>,
}

impl Default for SearchResult {
    fn default() -> Self {
        Self {
            entity_type: EntityKind::Artist,
            id: String::new(),
            name: String::new(),
            artist: String::new(),
            artist_id: String::new(),
            album: String::new(),
            score: 0,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOutput {
    pub rows: Vec<SearchResult>,
    pub count: u32,
}

impl Default for SearchOutput {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Discography {
    pub rows: Vec<Album>,
    pub count: u32,
}

impl Default for Discography {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            count: 0,
        }
    }
}

/// The result of a lookup, serialized as the entity itself.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Lookup {
    Artist(Box<Artist>),
    Album(Box<Album>),
    Song(Box<Song>),
}
