//! Transport resolver: direct fetch first, then the CORS proxy chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::config::GatewayConfig;
use crate::error::{ConfigError, HttpError, TransportError};

/// What the resolver needs to know about an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }
}

/// Minimal GET seam so the resolver can run against fakes.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// Production client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn from_config(cfg: &GatewayConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain;q=0.9, */*;q=0.8"));
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(cfg.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .timeout(cfg.attempt_timeout());
        if let Some(proxy) = &cfg.http_proxy {
            let px = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| ConfigError::Client(format!("invalid http_proxy {}: {}", proxy, e)))?;
            builder = builder.proxy(px);
        }
        let client = builder.build().map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(ReqwestClient { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::Request(e.to_string()))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().await.map_err(|e| HttpError::Body(e.to_string()))?;
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Why a single attempt did not yield JSON.
#[derive(Debug)]
enum AttemptError {
    Http(HttpError),
    Status(u16),
    NotJson(Option<String>),
    Parse(String),
}

impl AttemptError {
    /// The server answered, but with something we cannot use.
    fn is_bad_payload(&self) -> bool {
        matches!(self, AttemptError::NotJson(_) | AttemptError::Parse(_))
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Http(e) => write!(f, "{}", e),
            AttemptError::Status(s) => write!(f, "HTTP {}", s),
            AttemptError::NotJson(ct) => write!(f, "non-JSON content type {}", ct.as_deref().unwrap_or("<none>")),
            AttemptError::Parse(e) => write!(f, "invalid JSON: {}", e),
        }
    }
}

pub struct TransportResolver {
    client: Arc<dyn HttpClient>,
    proxies: Vec<String>,
    timeout: Duration,
}

impl TransportResolver {
    pub fn new(client: Arc<dyn HttpClient>, proxies: Vec<String>, timeout: Duration) -> Self {
        TransportResolver {
            client,
            proxies,
            timeout,
        }
    }

    /// Fetches `url` as JSON, racing the attempt chain against the safety
    /// timeout and the caller's cancellation token.
    pub async fn resolve(&self, url: &str, cancel: &CancellationToken) -> Result<Value, TransportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url, "request abandoned by caller");
                Err(TransportError::Cancelled)
            }
            outcome = tokio::time::timeout(self.timeout, self.attempt_chain(url, cancel)) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    warn!(url, timeout_secs = self.timeout.as_secs(), "request timed out");
                    Err(TransportError::Timeout(self.timeout))
                }
            }
        }
    }

    async fn attempt_chain(&self, url: &str, cancel: &CancellationToken) -> Result<Value, TransportError> {
        let mut saw_bad_payload = false;

        let mut last_error = match self.try_direct(url).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(url, error = %e, "direct fetch failed, trying proxies");
                saw_bad_payload |= e.is_bad_payload();
                e.to_string()
            }
        };

        for proxy in &self.proxies {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            let proxied = format!("{}{}", proxy, encode(url));
            match self.try_proxy(&proxied).await {
                Ok(value) => {
                    debug!(proxy = proxy.as_str(), "proxy fetch succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(proxy = proxy.as_str(), error = %e, "proxy fetch failed");
                    saw_bad_payload |= e.is_bad_payload();
                    last_error = e.to_string();
                }
            }
        }

        Err(TransportError::Exhausted {
            saw_bad_payload,
            last_error,
        })
    }

    /// Direct responses must declare JSON: upstreams have been seen serving
    /// HTML error pages with a 200.
    async fn try_direct(&self, url: &str) -> Result<Value, AttemptError> {
        debug!(url, "direct fetch");
        let resp = self.client.get(url).await.map_err(AttemptError::Http)?;
        if !resp.is_success() {
            return Err(AttemptError::Status(resp.status));
        }
        if !resp.is_json() {
            return Err(AttemptError::NotJson(resp.content_type));
        }
        serde_json::from_str(&resp.body).map_err(|e| AttemptError::Parse(e.to_string()))
    }

    /// Proxies do not reliably forward content-type, so only the status is checked.
    async fn try_proxy(&self, url: &str) -> Result<Value, AttemptError> {
        debug!(url, "proxy fetch");
        let resp = self.client.get(url).await.map_err(AttemptError::Http)?;
        if !resp.is_success() {
            return Err(AttemptError::Status(resp.status));
        }
        serde_json::from_str(&resp.body).map_err(|e| AttemptError::Parse(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{proxied, FakeClient, Reply};
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;

    const TARGET: &str = "https://api.test/list?action=trending&page=1";
    const P1: &str = "https://p1.test/?";
    const P2: &str = "https://p2.test/raw?url=";

    fn resolver(client: Arc<FakeClient>, timeout: Duration) -> TransportResolver {
        TransportResolver::new(client, vec![P1.to_string(), P2.to_string()], timeout)
    }

    #[tokio::test]
    async fn direct_json_skips_proxies() {
        let client = Arc::new(FakeClient::new().json(TARGET, r#"{"items":[]}"#));
        let value = resolver(client.clone(), Duration::from_secs(5))
            .resolve(TARGET, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(value, json!({"items": []}));
        assert_eq!(client.calls(), vec![TARGET.to_string()]);
    }

    #[tokio::test]
    async fn html_with_200_falls_through_to_proxy() {
        let client = Arc::new(
            FakeClient::new()
                .respond(TARGET, 200, Some("text/html"), "<html>captcha</html>")
                .respond(&proxied(P1, TARGET), 200, None, r#"{"items":[{"title":"X"}]}"#),
        );
        let value = resolver(client.clone(), Duration::from_secs(5))
            .resolve(TARGET, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(value["items"][0]["title"], "X");
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn proxies_are_tried_in_order() {
        let client = Arc::new(
            FakeClient::new()
                .respond(&proxied(P1, TARGET), 502, Some("text/html"), "bad gateway")
                .respond(&proxied(P2, TARGET), 200, Some("text/plain"), r#"{"ok":true}"#),
        );
        let value = resolver(client.clone(), Duration::from_secs(5))
            .resolve(TARGET, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(value, json!({"ok": true}));
        assert_eq!(
            client.calls(),
            vec![TARGET.to_string(), proxied(P1, TARGET), proxied(P2, TARGET)]
        );
    }

    #[tokio::test]
    async fn everything_failing_is_exhausted() {
        let client = Arc::new(FakeClient::new());
        let err = resolver(client.clone(), Duration::from_secs(5))
            .resolve(TARGET, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
        assert!(err.to_string().contains("all fetch methods failed"));
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn garbage_bodies_classify_as_bad_data() {
        let client = Arc::new(
            FakeClient::new()
                .respond(TARGET, 200, Some("application/json"), "not json")
                .respond(&proxied(P1, TARGET), 200, None, "<html></html>"),
        );
        let err = resolver(client, Duration::from_secs(5))
            .resolve(TARGET, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::BadData);
    }

    #[tokio::test]
    async fn hanging_upstream_times_out() {
        let client = Arc::new(FakeClient::new().reply(TARGET, Reply::Hang));
        let started = std::time::Instant::now();
        let err = resolver(client, Duration::from_millis(50))
            .resolve(TARGET, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout(Duration::from_millis(50)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_any_attempt() {
        let client = Arc::new(FakeClient::new().json(TARGET, "{}"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = resolver(client.clone(), Duration::from_secs(5))
            .resolve(TARGET, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Cancelled);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn cancelling_mid_flight_abandons_the_chain() {
        let client = Arc::new(FakeClient::new().reply(TARGET, Reply::Hang));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let err = resolver(client.clone(), Duration::from_secs(30))
            .resolve(TARGET, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Cancelled);
        assert_eq!(client.calls(), vec![TARGET.to_string()]);
    }

    #[test]
    fn json_detection_ignores_case_and_params() {
        let resp = HttpResponse {
            status: 200,
            content_type: Some("Application/JSON; charset=UTF-8".into()),
            body: String::new(),
        };
        assert!(resp.is_success());
        assert!(resp.is_json());
    }
}
