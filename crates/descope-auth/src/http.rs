//! HTTP transport for the two Descope endpoints session validation needs.
//!
//! Status handling is centralised in [`check_response`]: 429 becomes
//! [`ApiError::RateLimited`] and any other non-success status becomes
//! [`ApiError::Api`] carrying the parsed Descope error body.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::cookies;
use crate::error::ApiError;
use crate::keys::Jwk;
use crate::refresh::{RefreshBody, RefreshResponse};

/// Keys endpoint, followed by `/{project_id}`.
pub const KEYS_PATH: &str = "/v2/keys";
/// Session refresh endpoint.
pub const REFRESH_PATH: &str = "/v1/auth/refresh";

const SDK_NAME: &str = "rust";
const USER_AGENT: &str = concat!("descope-rust/", env!("CARGO_PKG_VERSION"));

/// Client bound to one Descope project.
#[derive(Debug, Clone)]
pub struct DescopeClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
}

impl DescopeClient {
    /// Build a client for `project_id` against `base_url`.
    ///
    /// `timeout` bounds each request; it is the only timeout in the
    /// validation path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the project ID is not a valid header
    /// value, or [`ApiError::Http`] if the underlying client fails to build.
    pub fn new(
        project_id: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let project_id = project_id.into();
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert("x-descope-sdk-name", HeaderValue::from_static(SDK_NAME));
        headers.insert(
            "x-descope-sdk-version",
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );
        headers.insert(
            "x-descope-project-id",
            HeaderValue::from_str(&project_id)
                .map_err(|e| ApiError::Parse(format!("invalid project id: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            project_id,
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base_url}/v2/keys/{project_id}`.
    ///
    /// Accepts either a bare JSON array of JWKs or a JWK set (`{"keys": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-success status, or an
    /// unparseable body.
    pub async fn fetch_keys(&self) -> Result<Vec<Jwk>, ApiError> {
        let url = format!(
            "{}{KEYS_PATH}/{}",
            self.base_url,
            urlencoding::encode(&self.project_id)
        );
        let resp = check_response(self.http.get(&url).send().await?).await?;
        let body = resp.bytes().await?;
        parse_key_list(&body)
    }

    /// `GET {base_url}/v1/auth/refresh` with the refresh token as bearer
    /// credential (`{project_id}:{refresh_token}`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, a non-success status, or a
    /// body that is present but not valid JSON.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let url = format!("{}{REFRESH_PATH}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(format!("{}:{refresh_token}", self.project_id))
            .send()
            .await?;
        let resp = check_response(resp).await?;

        let set_cookies = cookies::set_cookie_values(resp.headers());
        let body = resp.bytes().await?;
        let body = if body.iter().all(u8::is_ascii_whitespace) {
            RefreshBody::default()
        } else {
            serde_json::from_slice(&body)
                .map_err(|e| ApiError::Parse(format!("refresh response: {e}")))?
        };

        Ok(RefreshResponse { body, set_cookies })
    }
}

/// Check an HTTP response for error statuses.
///
/// Returns the response unchanged on success.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let (code, message) = parse_error_body(&body);
        return Err(ApiError::Api {
            status,
            code,
            message,
        });
    }
    Ok(resp)
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(60)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_code: Option<String>,
    error_description: Option<String>,
    error_message: Option<String>,
}

/// Best-effort extraction of `(errorCode, message)`; falls back to the raw body.
fn parse_error_body(body: &str) -> (Option<String>, String) {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return (None, body.trim().to_string());
    };
    let message = parsed
        .error_message
        .filter(|m| !m.is_empty())
        .or(parsed.error_description)
        .unwrap_or_else(|| body.trim().to_string());
    (parsed.error_code, message)
}

fn parse_key_list(body: &[u8]) -> Result<Vec<Jwk>, ApiError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KeyList {
        Bare(Vec<Jwk>),
        Set { keys: Vec<Jwk> },
    }

    match serde_json::from_slice::<KeyList>(body) {
        Ok(KeyList::Bare(keys) | KeyList::Set { keys }) => Ok(keys),
        Err(e) => Err(ApiError::Parse(format!("keys response: {e}"))),
    }
}
