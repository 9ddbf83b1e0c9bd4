use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::models::{EntityKind, Image};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage error: {0}")]
    Storage(String),
}

/// A process-shared key/value store. TTL and eviction policy belong to the
/// implementation; the engine only reads and writes through the handle.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;
}

/// Disk-backed store on a sled tree.
pub struct SledCacheStore {
    tree: sled::Tree,
}

impl SledCacheStore {
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path)
            .with_context(|| format!("Failed to open cache database at {}", path.display()))?;
        let tree = db
            .open_tree("enrichment")
            .context("Unable to open enrichment tree")?;
        Ok(Self { tree })
    }
}

impl CacheStore for SledCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let value = self
            .tree
            .get(key)
            .map_err(|err| CacheError::Storage(err.to_string()))?;
        Ok(value.map(|bytes| bytes.to_vec()))
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.tree
            .insert(key, value)
            .map_err(|err| CacheError::Storage(err.to_string()))?;
        self.tree
            .flush()
            .map_err(|err| CacheError::Storage(err.to_string()))?;
        Ok(())
    }
}

/// In-memory store for tests and processes that run without a disk path.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|err| CacheError::Storage(err.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| CacheError::Storage(err.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Image collections fetched for an entity, kept across lookups so repeat
/// requests for the same artist or album skip the image service.
///
/// Entries live in one bucket per entity kind (`"<kind>-images"`), each
/// bucket mapping entity id to its collection. Store failures are treated as
/// misses and never propagated.
#[derive(Clone)]
pub struct EnrichmentCache {
    store: Arc<dyn CacheStore>,
}

impl EnrichmentCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn artist_images(&self, entity_id: &str) -> Option<Vec<Image>> {
        self.get_collection(EntityKind::Artist, entity_id)
    }

    pub fn set_artist_images(&self, entity_id: &str, images: &[Image]) {
        self.set_collection(EntityKind::Artist, entity_id, &images.to_vec());
    }

    pub fn album_images(&self, entity_id: &str) -> Option<HashMap<String, Vec<Image>>> {
        self.get_collection(EntityKind::Album, entity_id)
    }

    pub fn set_album_images(&self, entity_id: &str, images: &HashMap<String, Vec<Image>>) {
        self.set_collection(EntityKind::Album, entity_id, images);
    }

    fn get_collection<V: DeserializeOwned>(&self, kind: EntityKind, entity_id: &str) -> Option<V> {
        let key = bucket_key(kind);

        let bucket = match self.store.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "error fetching cached images");
                return None;
            }
        };

        let mut collection: HashMap<String, serde_json::Value> =
            match serde_json::from_slice(&bucket) {
                Ok(collection) => collection,
                Err(err) => {
                    warn!(cache_key = %key, error = %err, "discarding unreadable cache bucket");
                    return None;
                }
            };

        let value = collection.remove(entity_id)?;
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(cache_key = %key, entity_id, error = %err, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn set_collection<V: Serialize>(&self, kind: EntityKind, entity_id: &str, value: &V) {
        let key = bucket_key(kind);

        let mut collection: HashMap<String, serde_json::Value> = match self.store.get(&key) {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Ok(None) => HashMap::new(),
            Err(err) => {
                warn!(cache_key = %key, error = %err, "error reading cache bucket, starting fresh");
                HashMap::new()
            }
        };

        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                warn!(cache_key = %key, entity_id, error = %err, "unable to serialize cache entry");
                return;
            }
        };

        collection.insert(entity_id.to_string(), value);

        let bytes = match serde_json::to_vec(&collection) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "unable to serialize cache bucket");
                return;
            }
        };

        if let Err(err) = self.store.set(&key, bytes) {
            warn!(cache_key = %key, error = %err, "error storing images in the cache");
        }
    }
}

fn bucket_key(kind: EntityKind) -> String {
    format!("{kind}-images")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_cache() -> EnrichmentCache {
        EnrichmentCache::new(Arc::new(MemoryCacheStore::new()))
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let cache = memory_cache();
        assert!(cache.artist_images("a1").is_none());
    }

    #[test]
    fn artist_images_round_trip() {
        let cache = memory_cache();
        cache.set_artist_images("a1", &[Image::new("http://img/1.jpg")]);

        let images = cache.artist_images("a1").unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "http://img/1.jpg");
    }

    #[test]
    fn empty_collections_are_cached() {
        let cache = memory_cache();
        cache.set_artist_images("a1", &[]);

        // A cached empty result is a hit, not a miss.
        let images = cache.artist_images("a1").unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn buckets_are_keyed_by_entity_kind() {
        let cache = memory_cache();
        cache.set_artist_images("x", &[Image::new("http://img/artist.jpg")]);

        // Same id under the album bucket is untouched.
        assert!(cache.album_images("x").is_none());
    }

    #[test]
    fn bucket_holds_entries_for_many_entities() {
        let cache = memory_cache();
        let mut first = HashMap::new();
        first.insert("alb1".to_string(), vec![Image::new("http://img/a.jpg")]);
        cache.set_album_images("artist1", &first);

        let mut second = HashMap::new();
        second.insert("alb2".to_string(), vec![Image::new("http://img/b.jpg")]);
        cache.set_album_images("artist2", &second);

        let stored = cache.album_images("artist1").unwrap();
        assert_eq!(stored["alb1"][0].url, "http://img/a.jpg");
        let stored = cache.album_images("artist2").unwrap();
        assert_eq!(stored["alb2"][0].url, "http://img/b.jpg");
    }

    #[test]
    fn failing_store_reads_are_misses() {
        struct BrokenStore;

        impl CacheStore for BrokenStore {
            fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
                Err(CacheError::Storage("backend offline".to_string()))
            }

            fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
                Err(CacheError::Storage("backend offline".to_string()))
            }
        }

        let cache = EnrichmentCache::new(Arc::new(BrokenStore));
        assert!(cache.artist_images("a1").is_none());
        // Writes fail silently too.
        cache.set_artist_images("a1", &[Image::new("http://img/1.jpg")]);
    }
}
