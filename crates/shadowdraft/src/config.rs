//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};
use url::Url;

/// Workflow configuration.
///
/// Built once and passed explicitly; no component reads ambient state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the host admin interface.
    pub admin_url: Url,

    /// Query parameter carrying the action name on trigger URLs.
    pub action_param: String,

    /// Query parameter carrying the item id on trigger URLs.
    pub item_param: String,

    /// Item types drafts may be created for. `None` allows every type.
    pub draftable_types: Option<Vec<String>>,
}

impl Config {
    /// A configuration with default parameter names and no type filter.
    pub fn new(admin_url: Url) -> Self {
        Self {
            admin_url,
            action_param: "shadowdraft_action".to_string(),
            item_param: "shadowdraft_item".to_string(),
            draftable_types: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `SHADOWDRAFT_ADMIN_URL` (default `http://localhost:3000/admin`),
    /// `SHADOWDRAFT_ACTION_PARAM`, `SHADOWDRAFT_ITEM_PARAM`, and
    /// `SHADOWDRAFT_TYPES` (comma-separated; unset allows every type).
    pub fn from_env() -> Result<Self> {
        let admin_url = env::var("SHADOWDRAFT_ADMIN_URL")
            .unwrap_or_else(|_| "http://localhost:3000/admin".to_string());
        let admin_url =
            Url::parse(&admin_url).context("SHADOWDRAFT_ADMIN_URL must be a valid URL")?;

        let mut config = Self::new(admin_url);

        if let Ok(param) = env::var("SHADOWDRAFT_ACTION_PARAM") {
            config.action_param = param;
        }
        if let Ok(param) = env::var("SHADOWDRAFT_ITEM_PARAM") {
            config.item_param = param;
        }

        config.draftable_types = env::var("SHADOWDRAFT_TYPES")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|item_type| item_type.trim().to_string())
                    .filter(|item_type| !item_type.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty());

        Ok(config)
    }

    /// Whether drafts may be created for this item type.
    pub fn is_draftable(&self, item_type: &str) -> bool {
        self.draftable_types
            .as_ref()
            .is_none_or(|types| types.iter().any(|t| t == item_type))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new(Url::parse("http://localhost:3000/admin").unwrap())
    }

    #[test]
    fn no_filter_allows_every_type() {
        let config = config();
        assert!(config.is_draftable("page"));
        assert!(config.is_draftable("event"));
    }

    #[test]
    fn filter_restricts_types() {
        let mut config = config();
        config.draftable_types = Some(vec!["page".to_string(), "article".to_string()]);

        assert!(config.is_draftable("article"));
        assert!(!config.is_draftable("event"));
    }
}
