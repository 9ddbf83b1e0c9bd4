pub mod fanart;
pub mod musicbrainz;
pub mod wikipedia;
