use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::game::api_types::ApiResponse;
use crate::game::locale::Language;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP client for the game data API
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    Url::parse(&config.base_url).map_err(|source| Error::InvalidBaseUrl {
      url: config.base_url.clone(),
      source,
    })?;

    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder.build().map_err(|source| Error::Http {
      endpoint: config.base_url.clone(),
      source,
    })?;

    Ok(Self {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
    })
  }

  /// GET `<base_url><endpoint>` in `language` and unwrap the response envelope.
  ///
  /// Non-2xx statuses, `success: false` bodies and bodies without `data` are
  /// all errors. An empty `data` object is not.
  pub async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, language: Language) -> Result<T> {
    let url = format!("{}{}", self.base_url, endpoint);
    debug!(%url, language = language.code(), "fetching game data");

    let response = self
      .http
      .get(&url)
      .headers(language_headers(language))
      .send()
      .await
      .map_err(|source| Error::Http {
        endpoint: endpoint.to_string(),
        source,
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(Error::Status {
        endpoint: endpoint.to_string(),
        status,
      });
    }

    let body = response.bytes().await.map_err(|source| Error::Http {
      endpoint: endpoint.to_string(),
      source,
    })?;
    let envelope: ApiResponse<T> = serde_json::from_slice(&body).map_err(|source| Error::Decode {
      endpoint: endpoint.to_string(),
      source,
    })?;

    if !envelope.success {
      return Err(Error::Unsuccessful {
        endpoint: endpoint.to_string(),
      });
    }

    envelope.data.ok_or_else(|| Error::MissingData {
      endpoint: endpoint.to_string(),
    })
  }
}

/// The API picks its response language from a `lang` cookie.
fn language_headers(language: Language) -> HeaderMap {
  let mut headers = HeaderMap::new();
  // Language codes are ASCII
  if let Ok(value) = HeaderValue::from_str(&format!("lang={}", language.code())) {
    headers.insert(COOKIE, value);
  }
  headers
}

#[cfg(test)]
mod tests {
  use super::*;
  use httpmock::MockServer;
  use std::collections::HashMap;

  fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ApiConfig {
      base_url: server.base_url(),
      ..ApiConfig::default()
    })
    .expect("client")
  }

  #[test]
  fn test_invalid_base_url_is_rejected() {
    let err = ApiClient::new(&ApiConfig {
      base_url: "not a url".to_string(),
      ..ApiConfig::default()
    })
    .err()
    .expect("invalid url should fail");
    assert!(matches!(err, Error::InvalidBaseUrl { .. }));
  }

  #[tokio::test]
  async fn test_fetch_sends_language_cookie() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when.method("GET").path("/perks").header("cookie", "lang=de");
        then
          .status(200)
          .header("content-type", "application/json")
          .body(r#"{"success":true,"data":{"p1":{"name":"Sprint Burst"}}}"#);
      })
      .await;

    let data: HashMap<String, serde_json::Value> = client(&server)
      .fetch("/perks", Language::German)
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(data["p1"]["name"], "Sprint Burst");
  }

  #[tokio::test]
  async fn test_fetch_maps_failures() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/down");
        then.status(503);
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/refused");
        then
          .status(200)
          .header("content-type", "application/json")
          .body(r#"{"success":false}"#);
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/hollow");
        then
          .status(200)
          .header("content-type", "application/json")
          .body(r#"{"success":true}"#);
      })
      .await;

    let api = client(&server);
    let down = api.fetch::<serde_json::Value>("/down", Language::English).await;
    assert!(matches!(down, Err(Error::Status { status, .. }) if status.as_u16() == 503));

    let refused = api.fetch::<serde_json::Value>("/refused", Language::English).await;
    assert!(matches!(refused, Err(Error::Unsuccessful { .. })));

    let hollow = api.fetch::<serde_json::Value>("/hollow", Language::English).await;
    assert!(matches!(hollow, Err(Error::MissingData { .. })));
  }

  #[tokio::test]
  async fn test_empty_payload_is_not_an_error() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/bundles");
        then
          .status(200)
          .header("content-type", "application/json")
          .body(r#"{"success":true,"data":{}}"#);
      })
      .await;

    let data: HashMap<String, serde_json::Value> = client(&server)
      .fetch("/bundles", Language::English)
      .await
      .unwrap();
    assert!(data.is_empty());
  }
}
