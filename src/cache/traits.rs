//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Values that can be stored in the cache.
///
/// Values are kept as JSON inside the store, so anything serde can round-trip
/// qualifies. Implemented automatically.
pub trait Cacheable: Serialize + DeserializeOwned + Send + Sync {}

impl<T: Serialize + DeserializeOwned + Send + Sync> Cacheable for T {}

/// A typed cache key that renders to the string the store is indexed by.
pub trait QueryKey {
  /// Stable string used as the storage key and in-flight marker.
  fn cache_key(&self) -> String;
}

impl QueryKey for str {
  fn cache_key(&self) -> String {
    self.to_string()
  }
}

impl QueryKey for String {
  fn cache_key(&self) -> String {
    self.clone()
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Data that was already live in the cache.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }

  /// Data read back after this call ran the initializer.
  pub fn initialized(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Initialized,
    }
  }

  /// Data read back after waiting on another caller's initializer.
  pub fn coalesced(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Coalesced,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Live, non-empty entry found on the first lookup
  Cache,
  /// This call ran the initializer and re-read the key
  Initialized,
  /// Another caller populated the key while this one waited
  Coalesced,
}

/// Point-in-time counters for a cache layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub hits: u64,
  pub misses: u64,
  pub keys: usize,
}
