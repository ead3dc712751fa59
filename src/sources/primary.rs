use reqwest::Url;

use super::{looks_like_url, parse_base, Backend, SourceKind};
use crate::config::PrimaryConfig;
use crate::error::ConfigError;

pub const PRIMARY_ID: &str = "primary";

/// REST-style upstream: one path per action, detail refs are full URLs.
#[derive(Debug, Clone)]
pub struct PrimaryBackend {
    base: Url,
    cfg: PrimaryConfig,
}

impl PrimaryBackend {
    pub fn new(cfg: &PrimaryConfig) -> Result<Self, ConfigError> {
        Ok(PrimaryBackend {
            base: parse_base("primary.base_url", &cfg.base_url)?,
            cfg: cfg.clone(),
        })
    }

    fn endpoint(&self, segment: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        if !query.is_empty() {
            let mut q = url.query_pairs_mut();
            for (k, v) in query {
                q.append_pair(k, v);
            }
        }
        url
    }
}

impl Backend for PrimaryBackend {
    fn id(&self) -> &str {
        PRIMARY_ID
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Primary
    }

    fn handles_category(&self, category: &str) -> bool {
        self.cfg.categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }

    fn supports_search(&self) -> bool {
        !self.cfg.search_path.is_empty()
    }

    fn matches(&self, detail_ref: &str) -> bool {
        looks_like_url(detail_ref)
    }

    fn list_url(&self, category: &str, page: u32) -> Url {
        self.endpoint(category, &[(self.cfg.page_param.as_str(), page.to_string().as_str())])
    }

    fn search_url(&self, query: &str) -> Url {
        self.endpoint(&self.cfg.search_path, &[(self.cfg.query_param.as_str(), query)])
    }

    fn detail_url(&self, detail_ref: &str) -> Url {
        self.endpoint(&self.cfg.detail_path, &[(self.cfg.detail_param.as_str(), detail_ref.trim())])
    }
}
