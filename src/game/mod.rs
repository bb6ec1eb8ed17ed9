//! Game data: dataset names, languages, API client and the cached service.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod dataset;
pub mod locale;
pub mod types;

pub use cached_client::{GameDataClient, Populate, PrimeReport};
pub use client::ApiClient;
pub use dataset::{Dataset, DatasetKey};
pub use locale::Language;
