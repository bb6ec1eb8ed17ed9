use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_TTL;
use crate::game::{Dataset, Language};

/// Default game data API.
pub const DEFAULT_BASE_URL: &str = "https://dbd.tricky.lol/api";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub logging: LoggingConfig,
  /// Discord locale used when a caller does not supply one
  pub default_locale: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Request timeout; unset leaves reqwest's default (none)
  pub timeout_secs: Option<u64>,
  pub user_agent: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_secs: None,
      user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub default_ttl_secs: u64,
  /// How often expired entries are swept; 0 disables the sweep
  pub purge_interval_secs: u64,
  /// Per-dataset TTLs keyed by dataset name (e.g. `perkData: 7200`)
  #[serde(deserialize_with = "deserialize_ttl_overrides")]
  pub ttl_overrides: HashMap<Dataset, u64>,
  /// Languages warmed by `warm` when none is given
  pub warm_languages: Vec<Language>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      default_ttl_secs: DEFAULT_TTL.as_secs(),
      purge_interval_secs: 600,
      ttl_overrides: HashMap::new(),
      warm_languages: vec![Language::English],
    }
  }
}

impl CacheConfig {
  pub fn default_ttl(&self) -> Duration {
    Duration::from_secs(self.default_ttl_secs)
  }

  /// Configured TTL for `dataset`, falling back to the dataset's own default.
  pub fn ttl_for(&self, dataset: Dataset) -> Option<Duration> {
    self
      .ttl_overrides
      .get(&dataset)
      .map(|secs| Duration::from_secs(*secs))
      .or_else(|| dataset.default_ttl())
  }
}

fn deserialize_ttl_overrides<'de, D>(deserializer: D) -> Result<HashMap<Dataset, u64>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let raw: HashMap<String, u64> = HashMap::deserialize(deserializer)?;
  raw
    .into_iter()
    .map(|(name, secs)| {
      name
        .parse::<Dataset>()
        .map(|dataset| (dataset, secs))
        .map_err(serde::de::Error::custom)
    })
    .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Filter directive used when RUST_LOG is unset
  pub level: String,
  /// Write daily-rotated log files here instead of stderr
  pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./fogwatch.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/fogwatch/config.yaml
  ///
  /// Without a file the defaults are used. `FOGWATCH_API_URL` overrides the
  /// API base URL either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(url) = std::env::var("FOGWATCH_API_URL") {
      config.api.base_url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("fogwatch.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("fogwatch").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// API language for the configured default locale.
  pub fn default_language(&self) -> Language {
    self
      .default_locale
      .as_deref()
      .map(Language::from_discord_locale)
      .unwrap_or_default()
  }
}
