//! Gateway configuration.
//!
//! Upstream base URLs, query parameter names, proxy prefixes and display
//! fallbacks all live here so that upstream churn is a config change, not a
//! code change. Values are layered: built-in defaults, then an optional TOML
//! file, then `REEL_*` environment variables.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sources::parse_base;

pub const DEFAULT_LEGACY_BASE: &str = "https://zeldvorik.ru/apiv3/api.php";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Safari/537.36";

pub const ENV_CONFIG_PATH: &str = "REEL_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Caller-side safety timeout for one whole façade call.
    pub request_timeout_secs: u64,
    /// Timeout for a single direct or proxied HTTP attempt.
    pub attempt_timeout_secs: u64,
    /// CORS proxy prefixes, tried in order after the direct fetch fails.
    pub proxies: Vec<String>,
    /// Outbound HTTP proxy for every request, e.g. a local privoxy.
    pub http_proxy: Option<String>,
    pub user_agent: String,
    /// Category ids shown on the home feed after the trending hero.
    pub home_sections: Vec<String>,
    pub legacy: LegacyConfig,
    pub primary: Option<PrimaryConfig>,
    pub fallbacks: Fallbacks,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            attempt_timeout_secs: DEFAULT_ATTEMPT_TIMEOUT_SECS,
            proxies: vec![
                "https://corsproxy.io/?".to_string(),
                "https://api.allorigins.win/raw?url=".to_string(),
            ],
            http_proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            home_sections: ["trending", "indonesian-movies", "kdrama", "anime", "indonesian-drama"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            legacy: LegacyConfig::default(),
            primary: None,
            fallbacks: Fallbacks::default(),
        }
    }
}

/// Single-endpoint upstream that takes the action as a query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    pub base_url: String,
    pub action_param: String,
    pub page_param: String,
    pub query_param: String,
    pub detail_param: String,
    pub search_action: String,
    pub detail_action: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        LegacyConfig {
            base_url: DEFAULT_LEGACY_BASE.to_string(),
            action_param: "action".to_string(),
            page_param: "page".to_string(),
            query_param: "q".to_string(),
            detail_param: "detailPath".to_string(),
            search_action: "search".to_string(),
            detail_action: "detail".to_string(),
        }
    }
}

/// Path-per-action upstream whose items carry full-URL detail refs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryConfig {
    pub base_url: String,
    /// Category ids served by this upstream; everything else goes to legacy.
    pub categories: Vec<String>,
    pub page_param: String,
    pub search_path: String,
    pub query_param: String,
    pub detail_path: String,
    pub detail_param: String,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        PrimaryConfig {
            base_url: String::new(),
            categories: vec!["trending".to_string(), "latest".to_string()],
            page_param: "page".to_string(),
            search_path: "search".to_string(),
            query_param: "q".to_string(),
            detail_path: "detail".to_string(),
            detail_param: "url".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearFallback {
    /// Leave the year absent.
    Empty,
    /// Use the current calendar year.
    Current,
}

/// Display literals used when upstream omits a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub description: String,
    pub episode_title_prefix: String,
    pub year: YearFallback,
    /// Rating label keyed by lower-cased item kind.
    pub rating_labels: BTreeMap<String, String>,
}

impl Default for Fallbacks {
    fn default() -> Self {
        let rating_labels = [("movie", "HD"), ("series", "TV"), ("tv", "TV")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Fallbacks {
            description: "No description available.".to_string(),
            episode_title_prefix: "Episode".to_string(),
            year: YearFallback::Empty,
            rating_labels,
        }
    }
}

impl Fallbacks {
    pub fn rating_label(&self, kind: Option<&str>) -> Option<String> {
        let kind = kind?.trim().to_lowercase();
        self.rating_labels.get(&kind).cloned()
    }
}

impl GatewayConfig {
    /// Defaults, overlaid with the TOML file at `path` (or `$REEL_CONFIG`),
    /// overlaid with environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(ENV_CONFIG_PATH).ok().filter(|s| !s.is_empty());
        let path = path
            .map(|p| p.to_path_buf())
            .or_else(|| env_path.map(PathBuf::from));
        let mut cfg = match path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let label = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: label.clone(),
            source,
        })?;
        Self::from_toml_str(&contents, &label)
    }

    pub fn from_toml_str(contents: &str, label: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: label.to_string(),
            source,
        })
    }

    /// Applies `REEL_*` overrides through `lookup` so tests need not touch
    /// the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(base) = get("REEL_LEGACY_BASE") {
            self.legacy.base_url = base;
        }
        if let Some(base) = get("REEL_PRIMARY_BASE") {
            let mut primary = self.primary.take().unwrap_or_default();
            primary.base_url = base;
            self.primary = Some(primary);
        }
        if let Some(list) = get("REEL_PROXIES") {
            self.proxies = list
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(proxy) = get("REEL_HTTP_PROXY") {
            self.http_proxy = Some(proxy);
        }
        if let Some(raw) = get("REEL_TIMEOUT_SECS") {
            self.request_timeout_secs = raw
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("REEL_TIMEOUT_SECS is not a number: {}", raw)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 || self.attempt_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".into()));
        }
        check_base_url("legacy.base_url", &self.legacy.base_url)?;
        if let Some(primary) = &self.primary {
            check_base_url("primary.base_url", &primary.base_url)?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

fn check_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
    }
    parse_base(field, value).map(|_| ())
}
