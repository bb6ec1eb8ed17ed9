//! Error types for the game data cache and its HTTP collaborator.

use thiserror::Error;

/// Errors produced while populating or reading cached game data.
#[derive(Debug, Error)]
pub enum Error {
  /// A dataset name outside the known set reached the initializer.
  #[error("unknown dataset: {0}")]
  UnknownDataset(String),

  /// Transport-level failure talking to the game data API.
  #[error("request to {endpoint} failed: {source}")]
  Http {
    endpoint: String,
    #[source]
    source: reqwest::Error,
  },

  /// The API answered with a non-success HTTP status.
  #[error("{endpoint} returned HTTP {status}")]
  Status {
    endpoint: String,
    status: reqwest::StatusCode,
  },

  /// The API answered 2xx but flagged the body as unsuccessful.
  #[error("{endpoint} reported success: false")]
  Unsuccessful { endpoint: String },

  /// The API reported success but the body carried no `data` field.
  #[error("{endpoint} returned no data")]
  MissingData { endpoint: String },

  /// The dataset is not an id-keyed mapping (the shrine).
  #[error("{0} is not an id-keyed dataset")]
  NotAMapping(&'static str),

  #[error("invalid API base URL {url}: {source}")]
  InvalidBaseUrl {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("failed to encode value for {key}: {source}")]
  Encode {
    key: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to decode response from {endpoint}: {source}")]
  Decode {
    endpoint: String,
    #[source]
    source: serde_json::Error,
  },

  /// Initializer failure that carries only a message (custom initializers).
  #[error("{0}")]
  Initializer(String),
}

pub type Result<T> = std::result::Result<T, Error>;
