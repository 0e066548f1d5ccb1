//! Descope project configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Public API host used when no region is encoded in the project ID.
pub const DEFAULT_BASE_URL: &str = "https://api.descope.com";

/// Project IDs at least this long carry a region in characters `1..5`.
const REGIONAL_PROJECT_ID_LEN: usize = 32;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Descope project ID (e.g. `P2abc...`).
    #[serde(default)]
    pub id: String,

    /// Override for the API base URL. Empty means "derive from the project ID".
    #[serde(default)]
    pub base_url: String,
}

impl ProjectConfig {
    /// Check if the project ID is set.
    pub fn is_configured(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Resolve the API base URL, without a trailing slash.
    ///
    /// An explicit `base_url` always wins. Otherwise long project IDs map to
    /// their regional host, `https://api.{region}.descope.com`.
    pub fn api_base_url(&self) -> String {
        let explicit = self.base_url.trim();
        if !explicit.is_empty() {
            return explicit.trim_end_matches('/').to_string();
        }

        let id = self.id.trim();
        if id.len() >= REGIONAL_PROJECT_ID_LEN
            && let Some(region) = id.get(1..5)
        {
            return format!("https://api.{region}.descope.com");
        }

        DEFAULT_BASE_URL.to_string()
    }

    /// Validate field values that figment cannot check by type alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.base_url.trim();
        if !base_url.is_empty()
            && !base_url.starts_with("https://")
            && !base_url.starts_with("http://")
        {
            return Err(ConfigError::InvalidValue {
                field: "project.base_url".into(),
                reason: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }
        Ok(())
    }
}
