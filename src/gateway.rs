//! Gateway façade: route, resolve, normalize.
//!
//! Every public operation returns a value. Failures are logged here and turned
//! into empty results or a [`FetchFailure`]; nothing panics past this point.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{Fallbacks, GatewayConfig};
use crate::error::{ConfigError, FailureKind, FetchFailure};
use crate::normalize::{normalize_detail, normalize_list};
use crate::router::{Route, Router};
use crate::transport::{HttpClient, ReqwestClient, TransportResolver};
use crate::types::{category_label, CatalogItem, DetailResult, HomeSection, ListResult};

pub struct Gateway {
    router: Router,
    resolver: TransportResolver,
    fallbacks: Fallbacks,
    home_sections: Vec<String>,
}

impl Gateway {
    /// Builds a gateway with the production `reqwest` client.
    pub fn new(cfg: GatewayConfig) -> Result<Self, ConfigError> {
        let client = ReqwestClient::from_config(&cfg)?;
        Self::with_client(cfg, Arc::new(client))
    }

    pub fn with_client(cfg: GatewayConfig, client: Arc<dyn HttpClient>) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let router = Router::from_config(&cfg)?;
        debug!(backends = ?router.backend_ids(), proxies = cfg.proxies.len(), "gateway ready");
        Ok(Gateway {
            router,
            resolver: TransportResolver::new(client, cfg.proxies.clone(), cfg.request_timeout()),
            fallbacks: cfg.fallbacks,
            home_sections: cfg.home_sections,
        })
    }

    pub async fn list_content(&self, category: &str, page: u32) -> ListResult {
        self.list_content_cancellable(category, page, &CancellationToken::new())
            .await
    }

    pub async fn list_content_cancellable(&self, category: &str, page: u32, cancel: &CancellationToken) -> ListResult {
        let Some(route) = self.router.route_list(category, page) else {
            error!(category, "no upstream serves this category");
            return ListResult::failed();
        };
        self.fetch_list(route, page, cancel).await
    }

    pub async fn search_content(&self, query: &str) -> ListResult {
        self.search_content_cancellable(query, &CancellationToken::new())
            .await
    }

    pub async fn search_content_cancellable(&self, query: &str, cancel: &CancellationToken) -> ListResult {
        let query = query.trim();
        if query.is_empty() {
            return ListResult::empty();
        }
        let Some(route) = self.router.route_search(query) else {
            error!(query, "no upstream supports search");
            return ListResult::failed();
        };
        self.fetch_list(route, 1, cancel).await
    }

    pub async fn get_detail(&self, detail_ref: &str) -> Result<DetailResult, FetchFailure> {
        self.get_detail_cancellable(detail_ref, &CancellationToken::new())
            .await
    }

    pub async fn get_detail_cancellable(
        &self,
        detail_ref: &str,
        cancel: &CancellationToken,
    ) -> Result<DetailResult, FetchFailure> {
        let route = self.router.route_detail(detail_ref);
        self.fetch_detail(detail_ref, route, cancel).await
    }

    /// Detail lookup for a list item, sent to the backend that listed it.
    pub async fn get_detail_for(&self, item: &CatalogItem) -> Result<DetailResult, FetchFailure> {
        let route = self
            .router
            .route_detail_tagged(&item.detail_ref, item.source.as_deref());
        self.fetch_detail(&item.detail_ref, route, &CancellationToken::new())
            .await
    }

    /// First page of every home section, fetched concurrently. Sections are
    /// trimmed to `limit` items; failed or empty sections are dropped.
    pub async fn home_feed(&self, limit: usize) -> Vec<HomeSection> {
        let mut categories: Vec<&str> = Vec::new();
        for c in self.home_sections.iter().map(String::as_str) {
            if !categories.contains(&c) {
                categories.push(c);
            }
        }

        let pages = join_all(categories.iter().map(|c| self.list_content(c, 1))).await;
        categories
            .into_iter()
            .zip(pages)
            .filter_map(|(category, page)| {
                let mut items = page.items;
                items.truncate(limit);
                (!items.is_empty()).then(|| HomeSection {
                    category: category.to_string(),
                    label: category_label(category),
                    items,
                })
            })
            .collect()
    }

    async fn fetch_list(&self, route: Route, page: u32, cancel: &CancellationToken) -> ListResult {
        match self.resolver.resolve(route.url.as_str(), cancel).await {
            Ok(raw) => normalize_list(&raw, route.kind, &route.backend_id, page, &self.fallbacks),
            Err(e) => {
                error!(backend = route.backend_id.as_str(), url = route.url.as_str(), error = %e, "list fetch failed");
                ListResult::failed()
            }
        }
    }

    async fn fetch_detail(
        &self,
        detail_ref: &str,
        route: Option<Route>,
        cancel: &CancellationToken,
    ) -> Result<DetailResult, FetchFailure> {
        let Some(route) = route else {
            error!(detail_ref, "no upstream serves this detail ref");
            return Err(FetchFailure {
                kind: FailureKind::Network,
                message: format!("{} (no upstream configured)", FailureKind::Network.retry_reason()),
            });
        };
        match self.resolver.resolve(route.url.as_str(), cancel).await {
            Ok(raw) => {
                let result = normalize_detail(&raw, route.kind, &self.fallbacks);
                if !result.succeeded {
                    error!(backend = route.backend_id.as_str(), detail_ref, "upstream returned no usable detail");
                }
                Ok(result)
            }
            Err(e) => {
                error!(backend = route.backend_id.as_str(), detail_ref, error = %e, "detail fetch failed");
                Err(FetchFailure::from(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrimaryConfig;
    use crate::transport::fake::{proxied, FakeClient, Reply};

    const LEGACY: &str = "https://legacy.test/api.php";
    const PRIMARY: &str = "https://primary.test/api";
    const PROXY: &str = "https://proxy.test/?";

    fn config() -> GatewayConfig {
        let mut cfg = GatewayConfig::default();
        cfg.legacy.base_url = LEGACY.into();
        cfg.primary = Some(PrimaryConfig {
            base_url: PRIMARY.into(),
            ..PrimaryConfig::default()
        });
        cfg.proxies = vec![PROXY.to_string()];
        cfg
    }

    fn gateway(client: Arc<FakeClient>) -> Gateway {
        Gateway::with_client(config(), client).unwrap()
    }

    #[tokio::test]
    async fn html_direct_then_proxy_json() {
        let url = format!("{}?action=kdrama&page=1", LEGACY);
        let client = Arc::new(
            FakeClient::new()
                .respond(&url, 200, Some("text/html"), "<html>blocked</html>")
                .respond(&proxied(PROXY, &url), 200, None, r#"{"items":[{"title":"X"}]}"#),
        );
        let result = gateway(client).list_content("kdrama", 1).await;
        assert!(result.succeeded);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].title, "X");
        assert_eq!(result.items[0].source.as_deref(), Some("legacy"));
    }

    #[tokio::test]
    async fn missing_container_is_an_empty_success() {
        let url = format!("{}/trending?page=1", PRIMARY);
        let client = Arc::new(FakeClient::new().json(&url, r#"{"message":"ok"}"#));
        let result = gateway(client).list_content("trending", 1).await;
        assert!(result.succeeded);
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn listing_is_idempotent() {
        let url = format!("{}/trending?page=2", PRIMARY);
        let client = Arc::new(FakeClient::new().json(&url, r#"[{"title":"A","link":"https://s.test/a"},{"title":"B"}]"#));
        let gw = gateway(client);
        let first = gw.list_content("trending", 2).await;
        let second = gw.list_content("trending", 2).await;
        assert_eq!(first, second);
        assert_eq!(first.page_number, 2);
    }

    #[tokio::test]
    async fn name_only_listing_is_idempotent() {
        let url = format!("{}/trending?page=1", PRIMARY);
        let client = Arc::new(FakeClient::new().json(&url, r#"{"results":[{"name":"Ocean","url":"https://s.test/o"}]}"#));
        let gw = gateway(client);
        let first = gw.list_content("trending", 1).await;
        let second = gw.list_content("trending", 1).await;
        assert_eq!(first.items[0].id, "Ocean");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failures_collapse_to_the_failed_shape() {
        let client = Arc::new(FakeClient::new());
        let result = gateway(client.clone()).list_content("anime", 4).await;
        assert_eq!(result, ListResult::failed());
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_search_skips_the_network() {
        let client = Arc::new(FakeClient::new());
        let result = gateway(client.clone()).search_content("   ").await;
        assert_eq!(result, ListResult::empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn hanging_detail_times_out() {
        let mut cfg = config();
        cfg.request_timeout_secs = 1;
        let url = format!("{}?action=detail&detailPath=%2Fdetail%2Fx", LEGACY);
        let client = Arc::new(FakeClient::new().reply(&url, Reply::Hang));
        let gw = Gateway::with_client(cfg, client).unwrap();
        let started = std::time::Instant::now();
        let failure = gw.get_detail("/detail/x").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn detail_ref_shape_picks_the_upstream() {
        let primary_url = format!("{}/detail?url=https%3A%2F%2Fsite.test%2Fm", PRIMARY);
        let legacy_url = format!("{}?action=detail&detailPath=%2Fdetail%2Fm", LEGACY);
        let client = Arc::new(
            FakeClient::new()
                .json(&primary_url, r#"{"data":{"title":"From primary","streamUrl":"p.m3u8"}}"#)
                .json(&legacy_url, r#"{"success":true,"data":{"title":"From legacy","playerUrl":"l.m3u8"}}"#),
        );
        let gw = gateway(client);

        let full = gw.get_detail("https://site.test/m").await.unwrap().detail.unwrap();
        assert_eq!(full.title, "From primary");
        let relative = gw.get_detail("/detail/m").await.unwrap().detail.unwrap();
        assert_eq!(relative.title, "From legacy");
        assert_eq!(relative.primary_stream_ref.as_deref(), Some("l.m3u8"));
    }

    #[tokio::test]
    async fn tagged_item_goes_back_to_its_source() {
        let legacy_url = format!("{}?action=detail&detailPath=https%3A%2F%2Fsite.test%2Fm", LEGACY);
        let client = Arc::new(FakeClient::new().json(&legacy_url, r#"{"data":{"title":"L"}}"#));
        let gw = gateway(client);
        let item = CatalogItem {
            id: "m".into(),
            title: "M".into(),
            poster: String::new(),
            rating: None,
            year: None,
            kind: None,
            genre: None,
            detail_ref: "https://site.test/m".into(),
            source: Some("legacy".into()),
        };
        let detail = gw.get_detail_for(&item).await.unwrap();
        assert_eq!(detail.detail.unwrap().title, "L");
    }

    #[tokio::test]
    async fn uninterpretable_detail_is_not_found() {
        let url = format!("{}?action=detail&detailPath=%2Fgone", LEGACY);
        let client = Arc::new(FakeClient::new().json(&url, r#"{"success":false}"#));
        let result = gateway(client).get_detail("/gone").await.unwrap();
        assert_eq!(result, DetailResult::not_found());
    }

    #[tokio::test]
    async fn cancelled_search_fails_without_calls() {
        let client = Arc::new(FakeClient::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = gateway(client.clone())
            .search_content_cancellable("naruto", &cancel)
            .await;
        assert!(!result.succeeded);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn home_feed_trims_and_drops_empty_sections() {
        let mut cfg = config();
        cfg.home_sections = vec!["trending".into(), "kdrama".into(), "trending".into(), "anime".into()];
        let client = Arc::new(
            FakeClient::new()
                .json(&format!("{}/trending?page=1", PRIMARY), r#"[{"title":"A"},{"title":"B"},{"title":"C"}]"#)
                .json(&format!("{}?action=kdrama&page=1", LEGACY), r#"{"items":[{"title":"K"}]}"#)
                .json(&format!("{}?action=anime&page=1", LEGACY), r#"{"items":[]}"#),
        );
        let gw = Gateway::with_client(cfg, client).unwrap();
        let feed = gw.home_feed(2).await;
        let cats: Vec<&str> = feed.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(cats, vec!["trending", "kdrama"]);
        assert_eq!(feed[0].items.len(), 2);
        assert_eq!(feed[1].label, "K-Drama");
        assert_eq!(feed[0].items[0].source.as_deref(), Some("primary"));
    }
}
