//! Orchestrator configuration.

use std::collections::HashSet;
use std::env;

use tracing::warn;

/// Runtime options for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Users allowed to run `/stats`.
    pub admin_ids: HashSet<i64>,

    /// Style given to new users. Checked against the registry when the
    /// orchestrator is built.
    pub default_style: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            admin_ids: HashSet::new(),
            default_style: database::DEFAULT_RESPONSE_STYLE.to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `ASSISTANT_ADMIN_IDS` - Comma-separated admin user ids (default: none)
    /// - `ASSISTANT_DEFAULT_STYLE` - Style for new users (default: friendly)
    pub fn from_env() -> Self {
        let admin_ids = env::var("ASSISTANT_ADMIN_IDS")
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();

        let default_style = env::var("ASSISTANT_DEFAULT_STYLE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| database::DEFAULT_RESPONSE_STYLE.to_string());

        Self {
            admin_ids,
            default_style,
        }
    }

    pub fn with_admin(mut self, user_id: i64) -> Self {
        self.admin_ids.insert(user_id);
        self
    }

    pub fn with_default_style(mut self, style: impl Into<String>) -> Self {
        self.default_style = style.into();
        self
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn parse_admin_ids(raw: &str) -> HashSet<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring invalid admin id '{}'", part);
                None
            }
        })
        .collect()
}
