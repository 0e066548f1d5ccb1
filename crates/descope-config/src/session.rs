//! Session validation settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted `exp` leeway, in seconds.
pub const MAX_LEEWAY_SECS: u64 = 3600;

/// Clock skew tolerated when checking `exp`, in seconds.
const fn default_leeway_secs() -> u64 {
    5
}

/// Transport timeout for key fetches and refresh calls, in seconds.
const fn default_request_timeout_secs() -> u64 {
    30
}

fn default_session_cookie_name() -> String {
    "DS".to_string()
}

fn default_refresh_cookie_name() -> String {
    "DSR".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Leeway applied to `exp` validation.
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,

    /// Request timeout enforced by the HTTP client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cookie carrying the session JWT.
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,

    /// Cookie carrying the refresh JWT.
    #[serde(default = "default_refresh_cookie_name")]
    pub refresh_cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            leeway_secs: default_leeway_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            session_cookie_name: default_session_cookie_name(),
            refresh_cookie_name: default_refresh_cookie_name(),
        }
    }
}

impl SessionConfig {
    /// Check the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the leeway exceeds
    /// [`MAX_LEEWAY_SECS`] or the request timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leeway_secs > MAX_LEEWAY_SECS {
            return Err(ConfigError::InvalidValue {
                field: "session.leeway_secs".into(),
                reason: format!("must be at most {MAX_LEEWAY_SECS}, got {}", self.leeway_secs),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.request_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
