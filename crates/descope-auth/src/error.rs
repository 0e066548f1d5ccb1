use descope_config::ConfigError;
use thiserror::Error;

/// Errors returned by [`crate::TokenValidator`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session token is empty")]
    EmptyToken,

    #[error("header.kid must not be empty")]
    EmptyKeyId,

    #[error("failed to fetch matching key for kid '{kid}': {reason}")]
    KeyResolution { kid: String, reason: String },

    #[error("could not validate tokens: {0}")]
    Jwt(#[from] JwtFailure),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build Descope client: {0}")]
    Transport(#[source] ApiError),
}

/// Why a token (or the refresh attempt behind it) was rejected.
#[derive(Debug, Error)]
pub enum JwtFailure {
    #[error("token has expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("refresh token is required to refresh an expired session")]
    MissingRefreshToken,

    #[error("session and refresh tokens are both empty")]
    MissingTokens,

    #[error("refresh token rejected: {0}")]
    RefreshTokenInvalid(#[source] Box<AuthError>),

    #[error("refresh request failed: {0}")]
    RefreshRequest(#[source] ApiError),
}

/// Outcome of a call to the Descope API that did not produce a usable response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// Descope error code (e.g. `E061301`), when the body carried one.
        code: Option<String>,
        message: String,
    },

    /// The API returned 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

impl AuthError {
    /// True for failures caused by the presented tokens rather than by the
    /// SDK setup. Callers typically map these to HTTP 401.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::EmptyToken | Self::EmptyKeyId | Self::KeyResolution { .. } | Self::Jwt(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_documented_failures() {
        assert!(AuthError::EmptyToken.to_string().contains("empty"));
        assert_eq!(
            AuthError::EmptyKeyId.to_string(),
            "header.kid must not be empty"
        );
        let err = AuthError::KeyResolution {
            kid: "unknown".into(),
            reason: "not found".into(),
        };
        assert!(err.to_string().contains("failed to fetch matching key"));
        let err = AuthError::from(JwtFailure::Expired);
        assert!(err.to_string().starts_with("could not validate tokens"));
    }

    #[test]
    fn refresh_failure_keeps_api_cause() {
        let err = AuthError::from(JwtFailure::RefreshRequest(ApiError::Api {
            status: 503,
            code: None,
            message: "unavailable".into(),
        }));
        let source = std::error::Error::source(&err).expect("jwt failure source");
        let source = source.source().expect("api error source");
        assert!(source.to_string().contains("503"));
    }

    #[test]
    fn config_errors_are_not_unauthenticated() {
        let err = AuthError::from(ConfigError::NotConfigured {
            section: "project".into(),
        });
        assert!(!err.is_unauthenticated());
        assert!(AuthError::EmptyToken.is_unauthenticated());
    }
}
