//! Generic TTL cache for remote datasets.
//!
//! This module knows nothing about game data. It provides:
//! - Per-entry time-to-live with lazy and periodic expiry
//! - A get-or-initialize contract where an empty mapping counts as a miss
//! - In-flight markers so a key is only repopulated by one initializer at a time
//! - Coalescing of concurrent `get_or_initialize` callers for the same key

mod layer;
mod storage;
mod traits;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use layer::{CacheLayer, InFlightGuard, DEFAULT_TTL};
pub use storage::{CacheStorage, CachedEntry, MemoryStorage};
pub use traits::{CacheResult, CacheSource, CacheStats, Cacheable, QueryKey};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Every critical section in this module leaves its collection consistent,
/// so poisoning carries no information worth failing on.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
