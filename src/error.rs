//! Error taxonomy for the gateway.
//!
//! Only [`TransportError`] and [`ConfigError`] are ever produced as `Err`
//! values inside the crate. The façade turns transport failures into
//! [`FetchFailure`] values so callers never see an error they have to
//! recover from beyond "show empty state" or "offer a retry".

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Failure of a single HTTP exchange at the client seam.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// A response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// No reachable source returned usable JSON.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The safety timeout elapsed before any attempt succeeded.
    #[error("request timed out after {:?}", .0)]
    Timeout(Duration),

    /// The caller abandoned the request.
    #[error("request cancelled")]
    Cancelled,

    /// Direct fetch and every proxy failed.
    #[error("all fetch methods failed (last error: {last_error})")]
    Exhausted {
        /// At least one attempt got a success status with an unusable body.
        saw_bad_payload: bool,
        last_error: String,
    },
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::Timeout(_) => FailureKind::Timeout,
            TransportError::Cancelled => FailureKind::Cancelled,
            TransportError::Exhausted {
                saw_bad_payload: true,
                ..
            } => FailureKind::BadData,
            TransportError::Exhausted { .. } => FailureKind::Network,
        }
    }
}

/// Coarse cause of a failed fetch, kept distinct so the detail view can show
/// a specific retry reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Cancelled,
    BadData,
    Network,
}

impl FailureKind {
    /// User-facing explanation for a retry prompt.
    pub fn retry_reason(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "The server took too long to respond.",
            FailureKind::Cancelled => "The request was cancelled.",
            FailureKind::BadData => "The server sent data we could not read.",
            FailureKind::Network => "Could not reach the server. Check your connection.",
        }
    }
}

/// The failure side of a detail lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<TransportError> for FetchFailure {
    fn from(err: TransportError) -> Self {
        let kind = err.kind();
        FetchFailure {
            kind,
            message: format!("{} ({})", kind.retry_reason(), err),
        }
    }
}

/// Problems building a gateway from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_with_bad_payload_is_bad_data() {
        let err = TransportError::Exhausted {
            saw_bad_payload: true,
            last_error: "expected value at line 1".into(),
        };
        assert_eq!(err.kind(), FailureKind::BadData);
        assert!(err.to_string().starts_with("all fetch methods failed"));
    }

    #[test]
    fn fetch_failure_keeps_cause_in_message() {
        let failure = FetchFailure::from(TransportError::Timeout(Duration::from_secs(20)));
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(failure.message.contains("took too long"));
        assert!(failure.message.contains("20s"));

        let short = TransportError::Timeout(Duration::from_millis(50));
        assert_eq!(short.to_string(), "request timed out after 50ms");
    }
}
