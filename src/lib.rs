//! reel - resilient content gateway for a video catalog
//!
//! Fetches catalog lists, search results and title details from unreliable
//! upstream JSON APIs. Each request goes direct first and then through an
//! ordered chain of CORS proxies; the responses, whose shapes drift between
//! upstream releases, are normalized into one item/detail model.

pub mod config;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod router;
pub mod sources;
pub mod transport;
pub mod types;

pub use config::GatewayConfig;
pub use error::{ConfigError, FailureKind, FetchFailure, TransportError};
pub use gateway::Gateway;
pub use types::{CatalogItem, Category, ContentDetail, DetailResult, EpisodeRef, HomeSection, ListResult};
