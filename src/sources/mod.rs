//! Upstream backends.
//!
//! Each backend knows which logical actions it can serve and how to turn them
//! into a concrete URL. The router walks them in order; the normalizer uses
//! [`SourceKind`] to pick its field map.

mod legacy;
mod primary;

pub use legacy::LegacyBackend;
pub use primary::PrimaryBackend;

use std::fmt::Debug;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which response shape a backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Evolving field names, full-URL detail refs, probed defensively.
    Primary,
    /// Already close to the internal shape.
    Legacy,
}

pub trait Backend: Send + Sync + Debug {
    fn id(&self) -> &str;
    fn kind(&self) -> SourceKind;
    fn handles_category(&self, category: &str) -> bool;
    fn supports_search(&self) -> bool;
    /// Whether a detail ref produced by some list call belongs to this backend.
    fn matches(&self, detail_ref: &str) -> bool;
    fn list_url(&self, category: &str, page: u32) -> Url;
    fn search_url(&self, query: &str) -> Url;
    fn detail_url(&self, detail_ref: &str) -> Url;
}

static URL_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*https?://").unwrap());

/// True when a detail ref is a fully-qualified HTTP(S) URL rather than a
/// backend-relative key.
pub fn looks_like_url(detail_ref: &str) -> bool {
    URL_SCHEME.is_match(detail_ref)
}

pub(crate) fn parse_base(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid(format!("{} is not a valid URL: {}", field, e)))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::Invalid(format!("{} cannot be used as a base URL", field)));
    }
    Ok(url)
}
