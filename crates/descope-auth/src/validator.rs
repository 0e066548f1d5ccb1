//! Session token validation with key caching and a single refresh on expiry.
//!
//! ```text
//! validate_session(session, refresh)
//!   ├─ decode header → kid, alg
//!   ├─ get_key(kid) ── cache hit ──────────────┐
//!   │            └─ miss → GET keys, cache all ┤
//!   ├─ verify signature + exp ◄────────────────┘
//!   │     ├─ ok      → AuthenticationInfo
//!   │     ├─ expired → validate refresh token → GET refresh (once) → re-verify
//!   │     └─ other   → error, no retry
//! ```

use std::sync::Arc;
use std::time::Duration;

use descope_config::{DescopeConfig, MAX_LEEWAY_SECS, SessionConfig};
use descope_core::{AuthenticationInfo, Token};
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};

use crate::error::{ApiError, AuthError, JwtFailure};
use crate::http::DescopeClient;
use crate::keys::{KeyCache, PublicKey};
use crate::refresh::RefreshResponse;

/// Asymmetric algorithms accepted for session tokens. HMAC is never valid
/// here: the verification keys are public.
const SUPPORTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Enforce,
    Ignore,
}

/// Validates Descope session tokens for one project.
///
/// Cheap to share behind an `Arc`; every method takes `&self`. The key cache
/// belongs to the instance (see [`TokenValidator::with_key_cache`]).
#[derive(Debug)]
pub struct TokenValidator {
    client: DescopeClient,
    keys: Arc<KeyCache>,
    leeway_secs: u64,
    session_cookie_name: String,
    refresh_cookie_name: String,
}

impl TokenValidator {
    /// Validator with default session settings and a fresh key cache.
    #[must_use]
    pub fn new(client: DescopeClient) -> Self {
        Self::with_session_config(client, &SessionConfig::default())
    }

    /// Validator with explicit session settings. The leeway is capped at
    /// [`MAX_LEEWAY_SECS`].
    #[must_use]
    pub fn with_session_config(client: DescopeClient, session: &SessionConfig) -> Self {
        Self {
            client,
            keys: Arc::new(KeyCache::new()),
            leeway_secs: session.leeway_secs.min(MAX_LEEWAY_SECS),
            session_cookie_name: session.session_cookie_name.clone(),
            refresh_cookie_name: session.refresh_cookie_name.clone(),
        }
    }

    /// Build a validator from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` when no project ID is configured, the base
    /// URL is invalid or the session settings are out of range, and `AuthError::Transport` if the HTTP client
    /// cannot be built.
    pub fn from_config(config: &DescopeConfig) -> Result<Self, AuthError> {
        let project = config.require_project()?;
        config.session.validate()?;
        let client = DescopeClient::new(
            project.id.trim(),
            project.api_base_url(),
            Duration::from_secs(config.session.request_timeout_secs),
        )
        .map_err(AuthError::Transport)?;
        Ok(Self::with_session_config(client, &config.session))
    }

    /// Load configuration (TOML files + `DESCOPE_*` env) and build a validator.
    ///
    /// # Errors
    ///
    /// See [`TokenValidator::from_config`].
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_config(&DescopeConfig::load()?)
    }

    /// Replace the key cache, e.g. to share one between validators.
    #[must_use]
    pub fn with_key_cache(mut self, keys: Arc<KeyCache>) -> Self {
        self.keys = keys;
        self
    }

    #[must_use]
    pub const fn key_cache(&self) -> &Arc<KeyCache> {
        &self.keys
    }

    #[must_use]
    pub const fn client(&self) -> &DescopeClient {
        &self.client
    }

    /// Resolve the public key for `kid`.
    ///
    /// A cached key is returned without any network call. On a miss the whole
    /// project key set is fetched once and cached, then the lookup is retried.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmptyKeyId` for an empty `kid`, and
    /// `AuthError::KeyResolution` when the key is still unknown after the
    /// fetch (including when the fetch itself failed).
    pub async fn get_key(&self, kid: &str) -> Result<Arc<PublicKey>, AuthError> {
        if kid.trim().is_empty() {
            return Err(AuthError::EmptyKeyId);
        }
        if let Some(key) = self.keys.get(kid).await {
            return Ok(key);
        }

        let _fetch = self.keys.lock_fetch().await;
        // A concurrent miss may have filled the cache while we waited.
        if let Some(key) = self.keys.get(kid).await {
            return Ok(key);
        }

        let jwks = self
            .client
            .fetch_keys()
            .await
            .map_err(|error| AuthError::KeyResolution {
                kid: kid.to_string(),
                reason: error.to_string(),
            })?;
        let fetched = jwks.len();
        let usable = jwks.into_iter().filter_map(|jwk| {
            let jwk_kid = jwk.kid.clone();
            PublicKey::from_jwk(jwk)
                .inspect_err(|error| {
                    tracing::warn!(kid = %jwk_kid, %error, "skipping unusable project key");
                })
                .ok()
        });
        let inserted = self.keys.insert_all(usable).await;
        tracing::debug!(kid, fetched, inserted, "fetched project keys");

        self.keys
            .get(kid)
            .await
            .ok_or_else(|| AuthError::KeyResolution {
                kid: kid.to_string(),
                reason: "no key with this id in the project key set".into(),
            })
    }

    /// Validate a JWT without any refresh.
    ///
    /// # Errors
    ///
    /// `AuthError::EmptyToken` for an empty token, key resolution errors, or
    /// `AuthError::Jwt` for an invalid or expired token.
    pub async fn validate_jwt(&self, jwt: &str) -> Result<AuthenticationInfo, AuthError> {
        let jwt = jwt.trim();
        if jwt.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        let token = self.verify(jwt, Expiry::Enforce).await?;
        Ok(AuthenticationInfo::new(jwt.to_string(), token))
    }

    /// Validate a session token, refreshing it once if it has expired.
    ///
    /// A valid session token returns immediately with no network call beyond
    /// a possible key fetch. An expired one triggers exactly one call to the
    /// refresh endpoint; the result carries the cookies from that call and the
    /// claims of the refreshed session (or of the original token when the
    /// response carries no new session JWT).
    ///
    /// # Errors
    ///
    /// - `AuthError::EmptyToken` when `session_token` is empty or whitespace.
    /// - `AuthError::EmptyKeyId` / `AuthError::KeyResolution` when the
    ///   signing key cannot be found.
    /// - `AuthError::Jwt` for any invalid token, a missing or invalid refresh
    ///   token, or a failed refresh call. Nothing is retried.
    pub async fn validate_session(
        &self,
        session_token: &str,
        refresh_token: &str,
    ) -> Result<AuthenticationInfo, AuthError> {
        let session_token = session_token.trim();
        if session_token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        match self.verify(session_token, Expiry::Enforce).await {
            Ok(token) => Ok(AuthenticationInfo::new(session_token.to_string(), token)),
            Err(AuthError::Jwt(JwtFailure::Expired)) => {
                tracing::debug!("session token expired, attempting refresh");
                let response = self.request_refresh(refresh_token).await?;
                if let Some(info) = self.refreshed_session(&response).await? {
                    return Ok(info);
                }
                let token = self.verify(session_token, Expiry::Ignore).await?;
                Ok(AuthenticationInfo::new(session_token.to_string(), token)
                    .with_cookies(self.response_cookies(&response))
                    .mark_refreshed())
            }
            Err(error) => Err(error),
        }
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// `AuthError::Jwt` when the refresh token is empty or invalid, the refresh
    /// call fails, or its response carries no valid session JWT.
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<AuthenticationInfo, AuthError> {
        let response = self.request_refresh(refresh_token).await?;
        self.refreshed_session(&response).await?.ok_or_else(|| {
            JwtFailure::RefreshRequest(ApiError::Parse(
                "refresh response carried no session token".into(),
            ))
            .into()
        })
    }

    /// Validate the session token if there is one, otherwise (or if it is
    /// rejected for any reason) fall back to a refresh.
    ///
    /// # Errors
    ///
    /// `AuthError::Jwt(JwtFailure::MissingTokens)` when both tokens are empty;
    /// the session error when it is rejected and no refresh token was given;
    /// otherwise the errors of [`TokenValidator::refresh_session`].
    pub async fn validate_and_refresh_session(
        &self,
        session_token: &str,
        refresh_token: &str,
    ) -> Result<AuthenticationInfo, AuthError> {
        let session_token = session_token.trim();
        let refresh_token = refresh_token.trim();
        if session_token.is_empty() && refresh_token.is_empty() {
            return Err(JwtFailure::MissingTokens.into());
        }

        if !session_token.is_empty() {
            match self.validate_jwt(session_token).await {
                Ok(info) => return Ok(info),
                Err(error) if refresh_token.is_empty() => return Err(error),
                Err(_) => tracing::debug!("session token rejected, falling back to refresh"),
            }
        }

        self.refresh_session(refresh_token).await
    }

    /// Verify the signature (and, if enforced, the expiry) of `jwt`.
    async fn verify(&self, jwt: &str, expiry: Expiry) -> Result<Token, AuthError> {
        let header = decode_header(jwt).map_err(|e| JwtFailure::Malformed(e.to_string()))?;
        if !SUPPORTED_ALGORITHMS.contains(&header.alg) {
            return Err(JwtFailure::UnsupportedAlgorithm(format!("{:?}", header.alg)).into());
        }

        let key = self.get_key(header.kid.as_deref().unwrap_or_default()).await?;
        if let Some(pinned) = key.algorithm()
            && pinned != header.alg
        {
            return Err(JwtFailure::UnsupportedAlgorithm(format!(
                "token signed with {:?} but key '{}' is {pinned:?}",
                header.alg,
                key.kid()
            ))
            .into());
        }

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.leeway_secs;
        validation.validate_exp = expiry == Expiry::Enforce;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Token>(jwt, key.decoding_key(), &validation).map_err(map_decode_error)?;
        Ok(data.claims)
    }

    /// Check the refresh token locally, then make the one refresh call.
    async fn request_refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(JwtFailure::MissingRefreshToken.into());
        }
        self.verify(refresh_token, Expiry::Enforce)
            .await
            .map_err(|error| JwtFailure::RefreshTokenInvalid(Box::new(error)))?;

        tracing::debug!(project_id = self.client.project_id(), "refreshing session");
        let response = self
            .client
            .refresh(refresh_token)
            .await
            .map_err(JwtFailure::RefreshRequest)?;
        Ok(response)
    }

    /// Validate the session JWT a refresh returned, if it returned one.
    async fn refreshed_session(
        &self,
        response: &RefreshResponse,
    ) -> Result<Option<AuthenticationInfo>, AuthError> {
        let Some(jwt) = response.session_jwt(&self.session_cookie_name) else {
            return Ok(None);
        };
        let token = self.verify(&jwt, Expiry::Enforce).await?;
        Ok(Some(
            AuthenticationInfo::new(jwt, token)
                .with_cookies(self.response_cookies(response))
                .mark_refreshed(),
        ))
    }

    fn response_cookies(&self, response: &RefreshResponse) -> Vec<String> {
        response.cookies(&self.session_cookie_name, &self.refresh_cookie_name)
    }
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> JwtFailure {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => JwtFailure::Expired,
        ErrorKind::InvalidSignature => JwtFailure::InvalidSignature,
        ErrorKind::InvalidAlgorithm => JwtFailure::UnsupportedAlgorithm(error.to_string()),
        _ => JwtFailure::Malformed(error.to_string()),
    }
}
