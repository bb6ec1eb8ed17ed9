//! Cache layer that orchestrates TTL storage with caller-supplied initializers.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::lock_unpoisoned;
use super::storage::CacheStorage;
use super::traits::{CacheResult, CacheStats, Cacheable, QueryKey};
use crate::error::{Error, Result};

/// Default time-to-live for entries stored without an explicit TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

type FlightMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// References to a flight lock with no waiters: the map entry, the permit's
/// handle and its held guard.
const IDLE_FLIGHT_REFS: usize = 3;

/// Cache layer that manages TTL storage and repopulation.
///
/// Cloning is cheap and every clone shares the same storage, in-flight
/// markers and counters, so one layer can be handed to every service that
/// needs it.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// TTL applied when a caller does not pass one
  default_ttl: Duration,
  /// Keys being repopulated by an initializer
  in_flight: Arc<Mutex<HashSet<String>>>,
  /// Per-key locks coalescing `get_or_initialize` callers
  flights: Arc<Mutex<FlightMap>>,
  hits: Arc<AtomicU64>,
  misses: Arc<AtomicU64>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      default_ttl: DEFAULT_TTL,
      in_flight: Arc::default(),
      flights: Arc::default(),
      hits: Arc::default(),
      misses: Arc::default(),
    }
  }

  /// Set the TTL used when `set` is called without one.
  pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
    self.default_ttl = default_ttl;
    self
  }

  pub fn default_ttl(&self) -> Duration {
    self.default_ttl
  }

  /// Store `value` under `key`, replacing any previous value and TTL.
  pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
    let value = serde_json::to_value(value).map_err(|source| Error::Encode {
      key: key.to_string(),
      source,
    })?;
    let ttl = ttl.unwrap_or(self.default_ttl);
    self.storage.set(key, value, ttl);
    debug!(key, ttl_secs = ttl.as_secs(), "cache set");
    Ok(())
  }

  /// Get the live value for `key`.
  ///
  /// Missing, expired and deleted keys all read as `None`. A value stored
  /// with a different shape than `T` is also reported as a miss.
  pub fn get<T: Cacheable>(&self, key: &str) -> Option<T> {
    let Some(entry) = self.storage.get(key) else {
      self.misses.fetch_add(1, Ordering::Relaxed);
      debug!(key, "cache miss");
      return None;
    };

    match serde_json::from_value(entry.value) {
      Ok(value) => {
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
      }
      Err(e) => {
        self.misses.fetch_add(1, Ordering::Relaxed);
        warn!(key, error = %e, "cached value has unexpected shape");
        None
      }
    }
  }

  /// Time until `key` expires. `None` when the key is absent or never expires.
  pub fn time_remaining(&self, key: &str) -> Option<Duration> {
    self.storage.get(key)?.time_remaining()
  }

  /// Remove `key`. Returns whether a live entry was removed.
  pub fn delete(&self, key: &str) -> bool {
    self.storage.delete(key)
  }

  /// Remove every entry.
  pub fn flush(&self) {
    self.storage.flush();
  }

  pub fn purge_expired(&self) -> usize {
    self.storage.purge_expired()
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      keys: self.storage.len(),
    }
  }

  /// Get a mapping dataset, running `initializer` when it is missing or empty.
  ///
  /// The initializer is expected to write the key itself through [`set`];
  /// this method only triggers it and re-reads. Initializer failures are
  /// logged and come back as an empty mapping, so callers only ever have to
  /// check for emptiness.
  ///
  /// [`set`]: CacheLayer::set
  pub async fn get_or_initialize<K, T, F, Fut>(&self, key: &K, initializer: F) -> HashMap<String, T>
  where
    K: QueryKey + ?Sized,
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
  {
    match self.try_get_or_initialize(key, initializer).await {
      Ok(result) => result.data,
      Err(e) => {
        warn!(key = %key.cache_key(), error = %e, "cache initializer failed, serving empty dataset");
        HashMap::new()
      }
    }
  }

  /// Like [`get_or_initialize`], but surfaces the initializer's error.
  ///
  /// Concurrent callers for the same key are coalesced: one runs the
  /// initializer while the rest wait and then re-read the key.
  ///
  /// [`get_or_initialize`]: CacheLayer::get_or_initialize
  pub async fn try_get_or_initialize<K, T, F, Fut>(
    &self,
    key: &K,
    initializer: F,
  ) -> Result<CacheResult<HashMap<String, T>>>
  where
    K: QueryKey + ?Sized,
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
  {
    let key = key.cache_key();

    if let Some(data) = self.live_mapping(&key) {
      return Ok(CacheResult::from_cache(data));
    }

    let _permit = self.acquire_flight(&key).await;

    // Populated by whoever held the permit before us
    if let Some(data) = self.live_mapping(&key) {
      return Ok(CacheResult::coalesced(data));
    }

    initializer().await?;

    Ok(CacheResult::initialized(self.get(&key).unwrap_or_default()))
  }

  /// Mark `key` as being repopulated.
  ///
  /// Returns `None` if the key is already marked. The marker is cleared when
  /// the returned guard is dropped.
  pub fn try_mark_in_flight<K: QueryKey + ?Sized>(&self, key: &K) -> Option<InFlightGuard> {
    let key = key.cache_key();
    let mut in_flight = lock_unpoisoned(&self.in_flight);
    if !in_flight.insert(key.clone()) {
      return None;
    }
    Some(InFlightGuard {
      key,
      in_flight: Arc::clone(&self.in_flight),
    })
  }

  pub fn is_in_flight<K: QueryKey + ?Sized>(&self, key: &K) -> bool {
    lock_unpoisoned(&self.in_flight).contains(&key.cache_key())
  }

  /// Periodically drop expired entries so unread keys do not linger.
  pub fn spawn_purge_task(&self, period: Duration) -> JoinHandle<()>
  where
    S: 'static,
  {
    let storage = Arc::clone(&self.storage);
    let period = period.max(Duration::from_secs(1));

    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // First tick completes immediately
      ticker.tick().await;
      loop {
        ticker.tick().await;
        let purged = storage.purge_expired();
        if purged > 0 {
          debug!(purged, "purged expired cache entries");
        }
      }
    })
  }

  /// Live mapping for `key`; empty mappings count as absent.
  fn live_mapping<T: Cacheable>(&self, key: &str) -> Option<HashMap<String, T>> {
    self
      .get::<HashMap<String, T>>(key)
      .filter(|data| !data.is_empty())
  }

  async fn acquire_flight(&self, key: &str) -> FlightPermit {
    let lock = {
      let mut flights = lock_unpoisoned(&self.flights);
      Arc::clone(flights.entry(key.to_string()).or_default())
    };
    let guard = Arc::clone(&lock).lock_owned().await;

    FlightPermit {
      key: key.to_string(),
      flights: Arc::clone(&self.flights),
      lock,
      _guard: guard,
    }
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      default_ttl: self.default_ttl,
      in_flight: Arc::clone(&self.in_flight),
      flights: Arc::clone(&self.flights),
      hits: Arc::clone(&self.hits),
      misses: Arc::clone(&self.misses),
    }
  }
}

/// Clears a key's in-flight marker when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
  key: String,
  in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    lock_unpoisoned(&self.in_flight).remove(&self.key);
  }
}

/// Exclusive right to initialize one key.
struct FlightPermit {
  key: String,
  flights: Arc<Mutex<FlightMap>>,
  lock: Arc<AsyncMutex<()>>,
  _guard: OwnedMutexGuard<()>,
}

impl Drop for FlightPermit {
  fn drop(&mut self) {
    let mut flights = lock_unpoisoned(&self.flights);
    let idle = Arc::strong_count(&self.lock) <= IDLE_FLIGHT_REFS;
    let ours = flights
      .get(&self.key)
      .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock));
    if idle && ours {
      flights.remove(&self.key);
    }
  }
}
