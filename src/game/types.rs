//! Game data records as served to command handlers.
//!
//! Only the fields the bot reads are typed; everything else the API sends is
//! kept in `extra` so cached values survive a JSON round trip intact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Side a character, perk or add-on belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Survivor,
  Killer,
  /// Shared or unrecognized ("none", "all", ...)
  #[serde(other)]
  Other,
}

/// Records that can be looked up by display name.
pub trait GameRecord {
  fn display_name(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
  pub name: String,
  pub role: Option<Role>,
  pub difficulty: Option<String>,
  pub dlc: Option<String>,
  pub image: Option<String>,
  pub perks: Vec<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Perk {
  pub name: String,
  pub description: String,
  pub role: Option<Role>,
  /// Owning character id; `None` for general perks
  pub character: Option<i64>,
  pub categories: Vec<String>,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Addon {
  pub name: String,
  pub description: String,
  pub role: Option<Role>,
  pub item_type: Option<String>,
  pub rarity: Option<String>,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Offering {
  pub name: String,
  pub description: String,
  pub role: Option<Role>,
  pub rarity: Option<String>,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
  pub name: String,
  pub description: String,
  pub item_type: Option<String>,
  pub rarity: Option<String>,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cosmetic {
  pub name: String,
  pub description: String,
  pub character: Option<i64>,
  pub rarity: Option<String>,
  pub purchasable: bool,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
  pub name: String,
  pub items: Vec<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsArticle {
  pub title: String,
  pub content: String,
  pub url: Option<String>,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMap {
  pub name: String,
  pub realm: Option<String>,
  pub description: String,
  pub image: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialEvent {
  pub name: String,
  pub description: String,
  pub start: Option<i64>,
  pub end: Option<i64>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rift {
  pub name: String,
  pub start: Option<i64>,
  pub end: Option<i64>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dlc {
  pub name: String,
  pub steamid: Option<u64>,
  pub release: Option<i64>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bundle {
  pub name: String,
  pub price: Option<u64>,
  pub items: Vec<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// One perk currently in the shrine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShrinePerk {
  pub id: String,
  pub bloodpoints: u64,
  pub shards: u64,
}

/// The weekly shrine rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shrine {
  pub id: u64,
  pub perks: Vec<ShrinePerk>,
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl Shrine {
  /// Time until the rotation ends, `None` once it has.
  pub fn remaining(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
    (self.end - now).to_std().ok().filter(|d| !d.is_zero())
  }
}

/// Untyped records are named by their `name` or `title` field.
impl GameRecord for Value {
  fn display_name(&self) -> &str {
    ["name", "title"]
      .iter()
      .find_map(|field| self.get(*field).and_then(Value::as_str))
      .unwrap_or_default()
  }
}

impl GameRecord for Character {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Perk {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Addon {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Offering {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Item {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Cosmetic {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Collection {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for NewsArticle {
  fn display_name(&self) -> &str {
    &self.title
  }
}

impl GameRecord for GameMap {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for SpecialEvent {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Rift {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Dlc {
  fn display_name(&self) -> &str {
    &self.name
  }
}

impl GameRecord for Bundle {
  fn display_name(&self) -> &str {
    &self.name
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_unknown_fields_are_kept() {
    let body = r#"{"name":"Sprint Burst","role":"survivor","character":0,"tunables":[[150]]}"#;
    let perk: Perk = serde_json::from_str(body).unwrap();
    assert_eq!(perk.role, Some(Role::Survivor));
    assert_eq!(perk.character, Some(0));
    assert!(perk.extra.contains_key("tunables"));

    let back = serde_json::to_value(&perk).unwrap();
    assert_eq!(back["tunables"], serde_json::json!([[150]]));
  }

  #[test]
  fn test_missing_fields_default() {
    let perk: Perk = serde_json::from_str("{}").unwrap();
    assert!(perk.name.is_empty());
    assert!(perk.categories.is_empty());
  }

  #[test]
  fn test_untyped_record_names() {
    assert_eq!(serde_json::json!({"name": "Lithe"}).display_name(), "Lithe");
    assert_eq!(serde_json::json!({"title": "Patch 9.2.0"}).display_name(), "Patch 9.2.0");
    assert_eq!(serde_json::json!({"id": 3}).display_name(), "");
  }

  #[test]
  fn test_shrine_remaining() {
    let start = Utc.with_ymd_and_hms(2026, 10, 13, 0, 0, 0).unwrap();
    let shrine = Shrine {
      id: 1,
      perks: Vec::new(),
      start,
      end: start + chrono::Duration::days(7),
    };

    let midweek = start + chrono::Duration::days(3);
    assert_eq!(
      shrine.remaining(midweek),
      Some(std::time::Duration::from_secs(4 * 86_400))
    );
    assert_eq!(shrine.remaining(shrine.end), None);
    assert_eq!(shrine.remaining(shrine.end + chrono::Duration::hours(1)), None);
  }
}
