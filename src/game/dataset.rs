//! Dataset names and locale-qualified cache keys.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::QueryKey;
use crate::error::Error;

use super::locale::Language;

/// TTL for datasets that change several times a day.
pub const SHORT_TTL: Duration = Duration::from_secs(600);

/// One named category of remote game data, cached independently per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
  Character,
  Perk,
  Addon,
  Offering,
  Item,
  Cosmetic,
  Collection,
  News,
  Map,
  SpecialEvent,
  Rift,
  Dlc,
  Bundle,
  Shrine,
}

impl Dataset {
  /// Every dataset, in the order they are primed.
  pub const ALL: [Dataset; 14] = [
    Dataset::Character,
    Dataset::Perk,
    Dataset::Addon,
    Dataset::Offering,
    Dataset::Item,
    Dataset::Cosmetic,
    Dataset::Collection,
    Dataset::News,
    Dataset::Map,
    Dataset::SpecialEvent,
    Dataset::Rift,
    Dataset::Dlc,
    Dataset::Bundle,
    Dataset::Shrine,
  ];

  /// Namespace used in cache keys.
  pub fn name(self) -> &'static str {
    match self {
      Self::Character => "characterData",
      Self::Perk => "perkData",
      Self::Addon => "addonData",
      Self::Offering => "offeringData",
      Self::Item => "itemData",
      Self::Cosmetic => "cosmeticData",
      Self::Collection => "collectionData",
      Self::News => "newsData",
      Self::Map => "mapsData",
      Self::SpecialEvent => "specialEventData",
      Self::Rift => "riftData",
      Self::Dlc => "dlcData",
      Self::Bundle => "bundleData",
      Self::Shrine => "shrineData",
    }
  }

  /// Singular name used on the command line and in config files.
  pub fn short_name(self) -> &'static str {
    match self {
      Self::Character => "character",
      Self::Perk => "perk",
      Self::Addon => "addon",
      Self::Offering => "offering",
      Self::Item => "item",
      Self::Cosmetic => "cosmetic",
      Self::Collection => "collection",
      Self::News => "news",
      Self::Map => "map",
      Self::SpecialEvent => "special-event",
      Self::Rift => "rift",
      Self::Dlc => "dlc",
      Self::Bundle => "bundle",
      Self::Shrine => "shrine",
    }
  }

  /// API path, relative to the configured base URL.
  pub fn endpoint(self) -> &'static str {
    match self {
      Self::Character => "/characters",
      Self::Perk => "/perks",
      Self::Addon => "/addons",
      Self::Offering => "/offerings",
      Self::Item => "/items",
      Self::Cosmetic => "/cosmetics",
      Self::Collection => "/collections",
      Self::News => "/news",
      Self::Map => "/maps",
      Self::SpecialEvent => "/specialevents",
      Self::Rift => "/rifts",
      Self::Dlc => "/dlc",
      Self::Bundle => "/bundles",
      Self::Shrine => "/shrine",
    }
  }

  /// TTL override for this dataset, `None` to use the cache default.
  ///
  /// The shrine is not listed: its TTL follows the rotation window.
  pub fn default_ttl(self) -> Option<Duration> {
    match self {
      Self::News | Self::Bundle => Some(SHORT_TTL),
      _ => None,
    }
  }

  /// Whether the payload is an id → record mapping.
  pub fn is_mapping(self) -> bool {
    !matches!(self, Self::Shrine)
  }

  /// Cache key for this dataset in `language`.
  pub fn key(self, language: Language) -> DatasetKey {
    DatasetKey {
      dataset: self,
      language,
    }
  }
}

impl fmt::Display for Dataset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Dataset {
  type Err = Error;

  /// Accepts the cache namespace (`perkData`), the short name (`perk`), its
  /// plural (`perks`) or the endpoint (`/perks`). Matching ignores case,
  /// dashes and underscores.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = normalize(s.trim().trim_start_matches('/'));
    Self::ALL
      .into_iter()
      .find(|dataset| {
        let short = normalize(dataset.short_name());
        wanted == normalize(dataset.name())
          || wanted == normalize(dataset.endpoint().trim_start_matches('/'))
          || wanted == short
          || wanted.strip_suffix('s') == Some(short.as_str())
      })
      .ok_or_else(|| Error::UnknownDataset(s.to_string()))
  }
}

fn normalize(name: &str) -> String {
  name
    .chars()
    .filter(|c| !matches!(c, '-' | '_'))
    .flat_map(char::to_lowercase)
    .collect()
}

/// Locale-qualified key, rendered as `<dataset>::<language>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetKey {
  pub dataset: Dataset,
  pub language: Language,
}

impl fmt::Display for DatasetKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}::{}", self.dataset.name(), self.language.code())
  }
}

impl QueryKey for DatasetKey {
  fn cache_key(&self) -> String {
    self.to_string()
  }
}
