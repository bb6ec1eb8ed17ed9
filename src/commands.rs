//! Subcommands of the operator CLI.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::collections::HashMap;

use fogwatch::config::Config;
use fogwatch::game::types::Perk;
use fogwatch::game::{Dataset, GameDataClient, Language};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Print a dataset (or one record of it) as JSON
  Fetch {
    /// Dataset name, e.g. perks, perkData, special-event
    dataset: String,
    /// Only print the record with this id
    #[arg(long)]
    id: Option<String>,
  },
  /// Find records by name
  Search {
    dataset: String,
    query: String,
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
  },
  /// Show the current shrine rotation
  Shrine,
  /// Populate every dataset for the given locales
  Warm {
    /// Discord locales to warm (default: cache.warm_languages from config)
    #[arg(long, value_delimiter = ',')]
    locales: Vec<String>,
  },
  /// List known datasets with their endpoints and TTLs
  Datasets,
}

pub async fn run(command: Command, client: &GameDataClient, language: Language, config: &Config) -> Result<()> {
  match command {
    Command::Fetch { dataset, id } => fetch(client, parse_dataset(&dataset)?, id, language).await,
    Command::Search {
      dataset,
      query,
      limit,
    } => search(client, parse_dataset(&dataset)?, &query, limit, language).await,
    Command::Shrine => shrine(client, language).await,
    Command::Warm { locales } => {
      let languages: Vec<Language> = if locales.is_empty() {
        config.cache.warm_languages.clone()
      } else {
        locales
          .iter()
          .map(|locale| Language::from_discord_locale(locale))
          .collect()
      };
      warm(client, &languages).await
    }
    Command::Datasets => {
      list_datasets(config);
      Ok(())
    }
  }
}

fn parse_dataset(name: &str) -> Result<Dataset> {
  name.parse().map_err(|e| {
    let known: Vec<&str> = Dataset::ALL.iter().map(|d| d.name()).collect();
    eyre!("{}. Known datasets: {}", e, known.join(", "))
  })
}

async fn fetch(client: &GameDataClient, dataset: Dataset, id: Option<String>, language: Language) -> Result<()> {
  if dataset == Dataset::Shrine {
    return shrine(client, language).await;
  }

  let data = client
    .try_get_cached_game_data::<Value>(dataset, language)
    .await
    .map_err(|e| eyre!("{} is temporarily unavailable: {}", dataset, e))?;

  let output = match id {
    Some(id) => data
      .get(&id)
      .cloned()
      .ok_or_else(|| eyre!("No {} record with id {}", dataset, id))?,
    None if data.is_empty() => return Err(eyre!("{} is temporarily unavailable", dataset)),
    None => serde_json::to_value(&data)?,
  };

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

async fn search(
  client: &GameDataClient,
  dataset: Dataset,
  query: &str,
  limit: usize,
  language: Language,
) -> Result<()> {
  let matches = client
    .search::<Value>(dataset, query, language, limit)
    .await;

  if matches.is_empty() {
    println!("No {} matching {:?}", dataset, query);
  }
  for (id, record) in matches {
    let name = fogwatch::game::types::GameRecord::display_name(&record);
    println!("{:<24} {}", id, name);
  }
  Ok(())
}

async fn shrine(client: &GameDataClient, language: Language) -> Result<()> {
  let shrine = client
    .shrine(language)
    .await
    .ok_or_else(|| eyre!("The shrine is temporarily unavailable"))?;
  let perks: HashMap<String, Perk> = client.perks(language).await;

  println!("Shrine #{} (until {})", shrine.id, shrine.end.format("%Y-%m-%d %H:%M UTC"));
  for entry in &shrine.perks {
    let name = perks
      .get(&entry.id)
      .map(|perk| perk.name.as_str())
      .unwrap_or(entry.id.as_str());
    println!("  {:<32} {:>6} shards", name, entry.shards);
  }
  Ok(())
}

async fn warm(client: &GameDataClient, languages: &[Language]) -> Result<()> {
  let mut failures = 0;

  for &language in languages {
    let report = client.prime(language).await;
    println!("[{}]", language);
    for (dataset, entries) in &report.stored {
      println!("  {:<20} {} entries", dataset, entries);
    }
    for dataset in &report.in_flight {
      println!("  {:<20} already in flight", dataset);
    }
    for (dataset, e) in &report.failed {
      println!("  {:<20} failed: {}", dataset, e);
    }
    failures += report.failed.len();
  }

  if failures > 0 {
    return Err(eyre!("{} dataset(s) failed to load", failures));
  }
  Ok(())
}

fn list_datasets(config: &Config) {
  for dataset in Dataset::ALL {
    println!("{:<20} {:<16} {}", dataset.name(), dataset.endpoint(), ttl_label(config, dataset));
  }
}

/// TTL a dataset is stored with, as `try_initialize` resolves it.
fn ttl_label(config: &Config, dataset: Dataset) -> String {
  match (config.cache.ttl_for(dataset), dataset) {
    (Some(ttl), _) => format!("{}s", ttl.as_secs()),
    (None, Dataset::Shrine) => "until rotation ends".to_string(),
    (None, _) => format!("{}s", config.cache.default_ttl().as_secs()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_dataset_lists_known_names_on_error() {
    let err = parse_dataset("builds").unwrap_err().to_string();
    assert!(err.contains("unknown dataset: builds"));
    assert!(err.contains("perkData"));
  }

  #[test]
  fn test_ttl_label_reflects_overrides() {
    let mut config = Config::default();
    assert_eq!(ttl_label(&config, Dataset::Shrine), "until rotation ends");
    assert_eq!(ttl_label(&config, Dataset::News), "600s");
    assert_eq!(ttl_label(&config, Dataset::Perk), "3600s");

    config.cache.ttl_overrides.insert(Dataset::Shrine, 120);
    assert_eq!(ttl_label(&config, Dataset::Shrine), "120s");
  }

  #[test]
  fn test_parse_dataset_accepts_short_names() {
    assert_eq!(parse_dataset("cosmetics").unwrap(), Dataset::Cosmetic);
  }
}
