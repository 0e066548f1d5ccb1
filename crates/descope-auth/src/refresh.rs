//! Shaping of refresh endpoint responses.

use serde::Deserialize;

use crate::cookies::{self, CookieOptions};

/// JSON body of a successful refresh. Every field is optional; an empty body
/// is a valid response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    #[serde(default)]
    pub session_jwt: Option<String>,
    #[serde(default)]
    pub refresh_jwt: Option<String>,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    #[serde(default)]
    pub cookie_path: Option<String>,
    #[serde(default)]
    pub cookie_max_age: Option<i64>,
}

/// A successful refresh: body plus the `Set-Cookie` headers that came with it.
#[derive(Debug, Clone, Default)]
pub struct RefreshResponse {
    pub body: RefreshBody,
    pub set_cookies: Vec<String>,
}

impl RefreshResponse {
    /// The new session JWT, from the body or else from the session cookie.
    #[must_use]
    pub fn session_jwt(&self, session_cookie_name: &str) -> Option<String> {
        self.body
            .session_jwt
            .as_deref()
            .filter(|jwt| !jwt.is_empty())
            .or_else(|| cookies::find_cookie(&self.set_cookies, session_cookie_name))
            .map(str::to_string)
    }

    /// Cookies to hand back to the caller.
    ///
    /// The server's `Set-Cookie` headers win. Without them, cookies are built
    /// from the tokens and cookie attributes in the body.
    #[must_use]
    pub fn cookies(&self, session_cookie_name: &str, refresh_cookie_name: &str) -> Vec<String> {
        if !self.set_cookies.is_empty() {
            return self.set_cookies.clone();
        }

        let options = CookieOptions {
            domain: self.body.cookie_domain.as_deref(),
            path: self.body.cookie_path.as_deref(),
            max_age: self.body.cookie_max_age,
        };
        [
            (session_cookie_name, self.body.session_jwt.as_deref()),
            (refresh_cookie_name, self.body.refresh_jwt.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, jwt)| {
            jwt.filter(|jwt| !jwt.is_empty())
                .map(|jwt| cookies::generate_cookie(name, jwt, &options))
        })
        .collect()
    }
}
