use reqwest::Url;

use super::{parse_base, Backend, SourceKind};
use crate::config::LegacyConfig;
use crate::error::ConfigError;

pub const LEGACY_ID: &str = "legacy";

/// Single PHP-style endpoint: `?action=<category>&page=N`, `?action=search&q=`,
/// `?action=detail&detailPath=`. Serves every category and matches every ref,
/// so it belongs at the end of the router's list.
#[derive(Debug, Clone)]
pub struct LegacyBackend {
    base: Url,
    cfg: LegacyConfig,
}

impl LegacyBackend {
    pub fn new(cfg: &LegacyConfig) -> Result<Self, ConfigError> {
        Ok(LegacyBackend {
            base: parse_base("legacy.base_url", &cfg.base_url)?,
            cfg: cfg.clone(),
        })
    }

    fn with_action(&self, action: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair(&self.cfg.action_param, action);
            for (k, v) in extra {
                q.append_pair(k, v);
            }
        }
        url
    }
}

impl Backend for LegacyBackend {
    fn id(&self) -> &str {
        LEGACY_ID
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Legacy
    }

    fn handles_category(&self, _category: &str) -> bool {
        true
    }

    fn supports_search(&self) -> bool {
        true
    }

    fn matches(&self, _detail_ref: &str) -> bool {
        true
    }

    fn list_url(&self, category: &str, page: u32) -> Url {
        self.with_action(category, &[(self.cfg.page_param.as_str(), page.to_string().as_str())])
    }

    fn search_url(&self, query: &str) -> Url {
        self.with_action(&self.cfg.search_action, &[(self.cfg.query_param.as_str(), query)])
    }

    fn detail_url(&self, detail_ref: &str) -> Url {
        self.with_action(&self.cfg.detail_action, &[(self.cfg.detail_param.as_str(), detail_ref)])
    }
}
