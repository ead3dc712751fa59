//! Upstream router: maps a logical action onto a backend and a concrete URL.

use reqwest::Url;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::ConfigError;
use crate::sources::{Backend, LegacyBackend, PrimaryBackend, SourceKind};

/// Where a logical request goes and how its response must be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub backend_id: String,
    pub kind: SourceKind,
    pub url: Url,
}

/// Ordered backend list; the first backend that accepts an action wins.
#[derive(Debug)]
pub struct Router {
    backends: Vec<Box<dyn Backend>>,
}

impl Router {
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Router { backends }
    }

    /// Primary first when configured, legacy always last as the catch-all.
    pub fn from_config(cfg: &GatewayConfig) -> Result<Self, ConfigError> {
        let mut backends: Vec<Box<dyn Backend>> = Vec::new();
        if let Some(primary) = &cfg.primary {
            backends.push(Box::new(PrimaryBackend::new(primary)?));
        }
        backends.push(Box::new(LegacyBackend::new(&cfg.legacy)?));
        Ok(Router::new(backends))
    }

    pub fn backend_ids(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    pub fn route_list(&self, category: &str, page: u32) -> Option<Route> {
        let b = self.backends.iter().find(|b| b.handles_category(category))?;
        Some(self.route(b.as_ref(), "list", b.list_url(category, page)))
    }

    pub fn route_search(&self, query: &str) -> Option<Route> {
        let b = self.backends.iter().find(|b| b.supports_search())?;
        Some(self.route(b.as_ref(), "search", b.search_url(query)))
    }

    /// Picks the backend by the shape of the ref alone: list items carry no
    /// provenance, so a full URL means primary and anything else legacy.
    pub fn route_detail(&self, detail_ref: &str) -> Option<Route> {
        let b = self.backends.iter().find(|b| b.matches(detail_ref))?;
        Some(self.route(b.as_ref(), "detail", b.detail_url(detail_ref)))
    }

    /// Uses the backend that produced the item when it is still configured,
    /// falling back to the shape heuristic otherwise.
    pub fn route_detail_tagged(&self, detail_ref: &str, source: Option<&str>) -> Option<Route> {
        match source.and_then(|id| self.backends.iter().find(|b| b.id() == id)) {
            Some(b) => Some(self.route(b.as_ref(), "detail", b.detail_url(detail_ref))),
            None => self.route_detail(detail_ref),
        }
    }

    fn route(&self, backend: &dyn Backend, action: &str, url: Url) -> Route {
        debug!(backend = backend.id(), action, url = url.as_str(), "routed");
        Route {
            backend_id: backend.id().to_string(),
            kind: backend.kind(),
            url,
        }
    }
}
