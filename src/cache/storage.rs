//! Cache storage trait and in-memory implementation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use super::lock_unpoisoned;

/// A single cached value with its expiry.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// The cached payload
  pub value: Value,
  /// When the entry stops being served; `None` never expires
  pub expires_at: Option<Instant>,
}

impl CachedEntry {
  /// A zero TTL, or one too large to represent as an instant, never expires.
  pub fn new(value: Value, ttl: Duration) -> Self {
    let expires_at = if ttl.is_zero() {
      None
    } else {
      Instant::now().checked_add(ttl)
    };
    Self { value, expires_at }
  }

  /// Check if this entry is expired.
  pub fn is_expired(&self) -> bool {
    self
      .expires_at
      .is_some_and(|expires_at| Instant::now() >= expires_at)
  }

  /// Time left before expiry, `None` for entries without a TTL.
  pub fn time_remaining(&self) -> Option<Duration> {
    self
      .expires_at
      .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
  }
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get the live entry for a key. Expired entries are never returned.
  fn get(&self, key: &str) -> Option<CachedEntry>;

  /// Store a value, replacing any previous value and expiry.
  fn set(&self, key: &str, value: Value, ttl: Duration);

  /// Remove a key. Returns whether a live entry was removed.
  fn delete(&self, key: &str) -> bool;

  /// Drop every expired entry, returning how many were removed.
  fn purge_expired(&self) -> usize;

  /// Number of stored entries, including expired ones not yet purged.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Remove everything.
  fn flush(&self);
}

/// Process-local storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedEntry>> {
    lock_unpoisoned(&self.entries)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Option<CachedEntry> {
    let mut entries = self.entries();
    match entries.get(key) {
      Some(entry) if entry.is_expired() => {
        entries.remove(key);
        None
      }
      Some(entry) => Some(entry.clone()),
      None => None,
    }
  }

  fn set(&self, key: &str, value: Value, ttl: Duration) {
    self
      .entries()
      .insert(key.to_string(), CachedEntry::new(value, ttl));
  }

  fn delete(&self, key: &str) -> bool {
    self
      .entries()
      .remove(key)
      .is_some_and(|entry| !entry.is_expired())
  }

  fn purge_expired(&self) -> usize {
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired());
    before - entries.len()
  }

  fn len(&self) -> usize {
    self.entries().len()
  }

  fn flush(&self) {
    self.entries().clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test(start_paused = true)]
  async fn test_entry_expires_after_ttl() {
    let storage = MemoryStorage::new();
    storage.set("x", json!({"a": 1}), Duration::from_secs(1));
    assert_eq!(storage.get("x").map(|e| e.value), Some(json!({"a": 1})));

    tokio::time::advance(Duration::from_millis(1500)).await;
    assert!(storage.get("x").is_none());
    // Lazy removal on access
    assert_eq!(storage.len(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_zero_ttl_never_expires() {
    let storage = MemoryStorage::new();
    storage.set("forever", json!(true), Duration::ZERO);

    tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
    let entry = storage.get("forever").expect("entry should be live");
    assert_eq!(entry.time_remaining(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_unrepresentable_ttl_never_expires() {
    let storage = MemoryStorage::new();
    storage.set("huge", json!(1), Duration::from_secs(u64::MAX));
    storage.set("max", json!(2), Duration::MAX);

    tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
    assert_eq!(storage.get("huge").map(|e| e.value), Some(json!(1)));
    assert_eq!(storage.get("max").and_then(|e| e.time_remaining()), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_set_replaces_value_and_ttl() {
    let storage = MemoryStorage::new();
    storage.set("k", json!(1), Duration::from_secs(1));
    storage.set("k", json!(2), Duration::from_secs(10));

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(storage.get("k").map(|e| e.value), Some(json!(2)));
  }

  #[tokio::test(start_paused = true)]
  async fn test_purge_expired_keeps_live_entries() {
    let storage = MemoryStorage::new();
    storage.set("short", json!(1), Duration::from_secs(1));
    storage.set("long", json!(2), Duration::from_secs(60));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(storage.purge_expired(), 1);
    assert_eq!(storage.len(), 1);
    assert!(storage.get("long").is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn test_delete_reports_only_live_entries() {
    let storage = MemoryStorage::new();
    storage.set("live", json!(1), Duration::from_secs(60));
    storage.set("stale", json!(2), Duration::from_secs(1));
    tokio::time::advance(Duration::from_secs(2)).await;

    assert!(storage.delete("live"));
    assert!(!storage.delete("stale"));
    assert!(!storage.delete("missing"));
    assert!(storage.is_empty());
  }
}
