pub mod entity;
pub mod request;

pub use entity::{
    Album, Area, Artist, Discography, Image, LifeSpan, Link, Lookup, Member, SearchOutput,
    SearchResult, Song, Tag, Track, TrackList,
};
pub use request::{DataKind, DataRequest, DiscographyKind, EntityKind};
