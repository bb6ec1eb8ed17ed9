//! Locale-aware TTL cache in front of a game data API.
//!
//! [`cache`] is a generic cache-aside layer; [`game`] wires it to the game
//! data endpoints and the per-entity lookups command handlers use.

pub mod cache;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;

pub use error::{Error, Result};
