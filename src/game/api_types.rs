//! Serde-deserializable types matching game data API responses.
//!
//! These are kept separate from the domain records so the envelope and raw
//! timestamp formats do not leak into callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Shrine, ShrinePerk};

/// Envelope every endpoint wraps its payload in.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
  #[serde(default)]
  pub success: bool,
  pub data: Option<T>,
}

// ============================================================================
// Shrine endpoint
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiShrinePerk {
  pub id: String,
  #[serde(default)]
  pub bloodpoints: u64,
  #[serde(default)]
  pub shards: u64,
}

/// Shrine rotation with unix-second bounds.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiShrine {
  pub id: u64,
  #[serde(default)]
  pub perks: Vec<ApiShrinePerk>,
  #[serde(with = "chrono::serde::ts_seconds")]
  pub start: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_seconds")]
  pub end: DateTime<Utc>,
}

impl From<ApiShrine> for Shrine {
  fn from(api: ApiShrine) -> Self {
    Shrine {
      id: api.id,
      perks: api
        .perks
        .into_iter()
        .map(|perk| ShrinePerk {
          id: perk.id,
          bloodpoints: perk.bloodpoints,
          shards: perk.shards,
        })
        .collect(),
      start: api.start,
      end: api.end,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn test_envelope_with_mapping_payload() {
    let body = r#"{"success":true,"data":{"p1":{"name":"Sprint Burst"}}}"#;
    let response: ApiResponse<HashMap<String, serde_json::Value>> =
      serde_json::from_str(body).unwrap();
    assert!(response.success);
    assert_eq!(response.data.unwrap().len(), 1);
  }

  #[test]
  fn test_envelope_without_data() {
    let response: ApiResponse<serde_json::Value> =
      serde_json::from_str(r#"{"success":false}"#).unwrap();
    assert!(!response.success);
    assert!(response.data.is_none());
  }

  #[test]
  fn test_shrine_timestamps_are_unix_seconds() {
    let body = r#"{"id":12,"perks":[{"id":"p1","bloodpoints":100000,"shards":2000}],"start":1700000000,"end":1700604800}"#;
    let shrine: Shrine = serde_json::from_str::<ApiShrine>(body).unwrap().into();
    assert_eq!(shrine.perks.len(), 1);
    assert_eq!((shrine.end - shrine.start).num_days(), 7);
  }
}
