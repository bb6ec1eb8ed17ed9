//! Game data client that serves every dataset through the cache layer.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayer, CacheStorage, Cacheable, MemoryStorage, QueryKey};
use crate::config::{CacheConfig, Config};
use crate::error::{Error, Result};

use super::api_types::ApiShrine;
use super::client::ApiClient;
use super::dataset::Dataset;
use super::locale::Language;
use super::types::{
  Addon, Bundle, Character, Collection, Cosmetic, Dlc, GameMap, GameRecord, Item, NewsArticle,
  Offering, Perk, Rift, Shrine, SpecialEvent,
};

/// TTL for a shrine whose rotation window has already closed upstream.
pub const SHRINE_RETRY_TTL: Duration = Duration::from_secs(60);

/// Outcome of one initializer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Populate {
  /// Fetched and cached this many entries
  Stored(usize),
  /// Another initializer already holds the key; nothing was fetched
  InFlight,
}

/// Per-dataset results of [`GameDataClient::prime`].
#[derive(Debug, Default)]
pub struct PrimeReport {
  pub stored: Vec<(Dataset, usize)>,
  pub in_flight: Vec<Dataset>,
  pub failed: Vec<(Dataset, Error)>,
}

/// Game data API client with transparent, locale-aware caching.
///
/// The cache is injected, so several clients (or a test) can share one
/// layer or each use a fresh one.
pub struct GameDataClient<S: CacheStorage = MemoryStorage> {
  api: ApiClient,
  cache: CacheLayer<S>,
  cache_config: CacheConfig,
}

impl GameDataClient<MemoryStorage> {
  /// Create a client with a fresh in-memory cache configured from `config`.
  pub fn new(config: &Config) -> Result<Self> {
    let api = ApiClient::new(&config.api)?;
    let cache = CacheLayer::new(MemoryStorage::new()).with_default_ttl(config.cache.default_ttl());

    Ok(Self::with_cache(api, cache).with_cache_config(config.cache.clone()))
  }
}

impl<S: CacheStorage> GameDataClient<S> {
  pub fn with_cache(api: ApiClient, cache: CacheLayer<S>) -> Self {
    Self {
      api,
      cache,
      cache_config: CacheConfig::default(),
    }
  }

  /// Use `cache_config` for per-dataset TTL overrides.
  pub fn with_cache_config(mut self, cache_config: CacheConfig) -> Self {
    self.cache_config = cache_config;
    self
  }

  pub fn cache(&self) -> &CacheLayer<S> {
    &self.cache
  }

  /// Fetch `endpoint` and store it under the dataset's key for `language`.
  ///
  /// Returns [`Populate::InFlight`] without touching the network when the
  /// key is already being repopulated. The in-flight marker is released on
  /// every exit path, including errors and cancellation.
  pub async fn try_initialize(
    &self,
    endpoint: &str,
    dataset: Dataset,
    language: Language,
    ttl: Option<Duration>,
  ) -> Result<Populate> {
    let key = dataset.key(language);
    let Some(_marker) = self.cache.try_mark_in_flight(&key) else {
      debug!(%key, "repopulation already in flight");
      return Ok(Populate::InFlight);
    };

    let ttl = ttl.or_else(|| self.cache_config.ttl_for(dataset));
    let cache_key = key.cache_key();

    if dataset.is_mapping() {
      let data: HashMap<String, Value> = self.api.fetch(endpoint, language).await?;
      self.cache.set(&cache_key, &data, ttl)?;
      info!(%key, entries = data.len(), "cached game data");
      Ok(Populate::Stored(data.len()))
    } else {
      let shrine: Shrine = self.api.fetch::<ApiShrine>(endpoint, language).await?.into();
      let ttl = ttl.unwrap_or_else(|| shrine_ttl(&shrine, Utc::now()));
      self.cache.set(&cache_key, &shrine, Some(ttl))?;
      info!(%key, ttl_secs = ttl.as_secs(), "cached shrine rotation");
      Ok(Populate::Stored(shrine.perks.len()))
    }
  }

  /// Canonical initializer: populate the cache, logging rather than returning
  /// upstream failures. A failed run leaves the key empty so the next read
  /// retries.
  pub async fn initialize_game_data_cache(
    &self,
    endpoint: &str,
    dataset: Dataset,
    language: Language,
    ttl: Option<Duration>,
  ) {
    if let Err(e) = self.try_initialize(endpoint, dataset, language, ttl).await {
      warn!(key = %dataset.key(language), error = %e, "failed to populate game data cache");
    }
  }

  /// Initializer entry point for untyped dataset names.
  ///
  /// An unknown name is a caller bug and fails before any request is made.
  pub async fn initialize_named(
    &self,
    endpoint: &str,
    dataset_name: &str,
    language: Language,
    ttl: Option<Duration>,
  ) -> Result<()> {
    let dataset: Dataset = dataset_name.parse()?;
    self
      .initialize_game_data_cache(endpoint, dataset, language, ttl)
      .await;
    Ok(())
  }

  /// Get an id-keyed dataset, fetching it on a miss.
  ///
  /// Returns an empty mapping when the data is unavailable; command handlers
  /// report that as "temporarily unavailable".
  pub async fn get_cached_game_data<T: Cacheable>(
    &self,
    dataset: Dataset,
    language: Language,
  ) -> HashMap<String, T> {
    match self.try_get_cached_game_data(dataset, language).await {
      Ok(data) => data,
      Err(e) => {
        warn!(key = %dataset.key(language), error = %e, "serving empty dataset");
        HashMap::new()
      }
    }
  }

  pub async fn try_get_cached_game_data<T: Cacheable>(
    &self,
    dataset: Dataset,
    language: Language,
  ) -> Result<HashMap<String, T>> {
    if !dataset.is_mapping() {
      return Err(Error::NotAMapping(dataset.name()));
    }

    let key = dataset.key(language);
    let result = self
      .cache
      .try_get_or_initialize(&key, move || async move {
        self
          .try_initialize(dataset.endpoint(), dataset, language, None)
          .await
          .map(|_| ())
      })
      .await?;

    Ok(result.data)
  }

  /// Look up one record by id.
  pub async fn find<T: Cacheable>(&self, dataset: Dataset, id: &str, language: Language) -> Option<T> {
    self
      .get_cached_game_data::<T>(dataset, language)
      .await
      .remove(id)
  }

  /// Records whose name matches `query`, for autocomplete.
  ///
  /// Case-insensitive. Prefix matches come before substring matches, each
  /// group ordered by name.
  pub async fn search<T: Cacheable + GameRecord>(
    &self,
    dataset: Dataset,
    query: &str,
    language: Language,
    limit: usize,
  ) -> Vec<(String, T)> {
    let data = self.get_cached_game_data::<T>(dataset, language).await;
    rank_matches(data, query, limit)
  }

  /// Current shrine rotation, cached until the rotation ends.
  pub async fn shrine(&self, language: Language) -> Option<Shrine> {
    let key = Dataset::Shrine.key(language).cache_key();
    if let Some(shrine) = self.cache.get::<Shrine>(&key) {
      return Some(shrine);
    }

    self
      .initialize_game_data_cache(Dataset::Shrine.endpoint(), Dataset::Shrine, language, None)
      .await;
    self.cache.get(&key)
  }

  /// Fetch every dataset for `language` concurrently.
  pub async fn prime(&self, language: Language) -> PrimeReport {
    let runs = Dataset::ALL.into_iter().map(|dataset| async move {
      let outcome = self
        .try_initialize(dataset.endpoint(), dataset, language, None)
        .await;
      (dataset, outcome)
    });

    let mut report = PrimeReport::default();
    for (dataset, outcome) in join_all(runs).await {
      match outcome {
        Ok(Populate::Stored(entries)) => report.stored.push((dataset, entries)),
        Ok(Populate::InFlight) => report.in_flight.push(dataset),
        Err(e) => {
          warn!(key = %dataset.key(language), error = %e, "prime failed");
          report.failed.push((dataset, e))
        }
      }
    }
    report
  }

  pub async fn characters(&self, language: Language) -> HashMap<String, Character> {
    self.get_cached_game_data(Dataset::Character, language).await
  }

  pub async fn perks(&self, language: Language) -> HashMap<String, Perk> {
    self.get_cached_game_data(Dataset::Perk, language).await
  }

  pub async fn addons(&self, language: Language) -> HashMap<String, Addon> {
    self.get_cached_game_data(Dataset::Addon, language).await
  }

  pub async fn offerings(&self, language: Language) -> HashMap<String, Offering> {
    self.get_cached_game_data(Dataset::Offering, language).await
  }

  pub async fn items(&self, language: Language) -> HashMap<String, Item> {
    self.get_cached_game_data(Dataset::Item, language).await
  }

  pub async fn cosmetics(&self, language: Language) -> HashMap<String, Cosmetic> {
    self.get_cached_game_data(Dataset::Cosmetic, language).await
  }

  pub async fn collections(&self, language: Language) -> HashMap<String, Collection> {
    self.get_cached_game_data(Dataset::Collection, language).await
  }

  pub async fn news(&self, language: Language) -> HashMap<String, NewsArticle> {
    self.get_cached_game_data(Dataset::News, language).await
  }

  pub async fn maps(&self, language: Language) -> HashMap<String, GameMap> {
    self.get_cached_game_data(Dataset::Map, language).await
  }

  pub async fn special_events(&self, language: Language) -> HashMap<String, SpecialEvent> {
    self.get_cached_game_data(Dataset::SpecialEvent, language).await
  }

  pub async fn rifts(&self, language: Language) -> HashMap<String, Rift> {
    self.get_cached_game_data(Dataset::Rift, language).await
  }

  pub async fn dlcs(&self, language: Language) -> HashMap<String, Dlc> {
    self.get_cached_game_data(Dataset::Dlc, language).await
  }

  pub async fn bundles(&self, language: Language) -> HashMap<String, Bundle> {
    self.get_cached_game_data(Dataset::Bundle, language).await
  }
}

impl<S: CacheStorage> Clone for GameDataClient<S> {
  fn clone(&self) -> Self {
    Self {
      api: self.api.clone(),
      cache: self.cache.clone(),
      cache_config: self.cache_config.clone(),
    }
  }
}

/// The shrine stays cached until its window closes.
fn shrine_ttl(shrine: &Shrine, now: DateTime<Utc>) -> Duration {
  shrine.remaining(now).unwrap_or(SHRINE_RETRY_TTL)
}

fn rank_matches<T: GameRecord>(data: HashMap<String, T>, query: &str, limit: usize) -> Vec<(String, T)> {
  let query = query.trim().to_lowercase();

  let mut matches: Vec<(u8, String, T)> = data
    .into_iter()
    .filter_map(|(id, record)| {
      let name = record.display_name().to_lowercase();
      let rank = if name.starts_with(&query) {
        0
      } else if name.contains(&query) {
        1
      } else {
        return None;
      };
      Some((rank, id, record))
    })
    .collect();

  matches.sort_by(|a, b| {
    a.0
      .cmp(&b.0)
      .then_with(|| a.2.display_name().cmp(b.2.display_name()))
  });

  matches
    .into_iter()
    .take(limit)
    .map(|(_, id, record)| (id, record))
    .collect()
}
