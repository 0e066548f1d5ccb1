//! Validation result and the authorization checks run against it.
//!
//! Tenant-scoped checks fail outright when the user is not associated with the
//! tenant, even if nothing is required. An empty required list is otherwise
//! always satisfied.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::token::Token;

/// A fully trusted session.
///
/// Produced by `descope-auth` after signature and expiry validation, owned by
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuthenticationInfo {
    /// The validated session JWT.
    pub jwt: String,
    /// Its decoded claims.
    pub token: Token,
    /// `Set-Cookie` values produced by a refresh. Empty when no refresh
    /// happened, and possibly empty after one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    /// Set when the session came out of a refresh call.
    #[serde(default)]
    pub refreshed: bool,
}

impl AuthenticationInfo {
    #[must_use]
    pub const fn new(jwt: String, token: Token) -> Self {
        Self {
            jwt,
            token,
            cookies: Vec::new(),
            refreshed: false,
        }
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: Vec<String>) -> Self {
        self.cookies = cookies;
        self
    }

    #[must_use]
    pub const fn mark_refreshed(mut self) -> Self {
        self.refreshed = true;
        self
    }

    /// Whether this result came out of a refresh call, with or without cookies.
    #[must_use]
    pub const fn was_refreshed(&self) -> bool {
        self.refreshed
    }

    #[must_use]
    pub fn is_associated_with_tenant(&self, tenant: &str) -> bool {
        self.token.has_tenant(tenant)
    }

    /// True when every permission in `required` is granted at the top level.
    #[must_use]
    pub fn validate_permissions(&self, required: &[&str]) -> bool {
        contains_all(&self.token.permissions(), required)
    }

    /// True when the user belongs to `tenant` and holds every permission there.
    #[must_use]
    pub fn validate_tenant_permissions(&self, tenant: &str, required: &[&str]) -> bool {
        self.is_associated_with_tenant(tenant)
            && contains_all(&self.token.tenant_permissions(tenant), required)
    }

    /// True when every role in `required` is granted at the top level.
    #[must_use]
    pub fn validate_roles(&self, required: &[&str]) -> bool {
        contains_all(&self.token.roles(), required)
    }

    /// True when the user belongs to `tenant` and holds every role there.
    #[must_use]
    pub fn validate_tenant_roles(&self, tenant: &str, required: &[&str]) -> bool {
        self.is_associated_with_tenant(tenant)
            && contains_all(&self.token.tenant_roles(tenant), required)
    }

    /// The subset of `candidates` granted as top-level permissions.
    #[must_use]
    pub fn matched_permissions<'a>(&self, candidates: &[&'a str]) -> Vec<&'a str> {
        matched(&self.token.permissions(), candidates)
    }

    #[must_use]
    pub fn matched_tenant_permissions<'a>(
        &self,
        tenant: &str,
        candidates: &[&'a str],
    ) -> Vec<&'a str> {
        if !self.is_associated_with_tenant(tenant) {
            return Vec::new();
        }
        matched(&self.token.tenant_permissions(tenant), candidates)
    }

    /// The subset of `candidates` granted as top-level roles.
    #[must_use]
    pub fn matched_roles<'a>(&self, candidates: &[&'a str]) -> Vec<&'a str> {
        matched(&self.token.roles(), candidates)
    }

    #[must_use]
    pub fn matched_tenant_roles<'a>(&self, tenant: &str, candidates: &[&'a str]) -> Vec<&'a str> {
        if !self.is_associated_with_tenant(tenant) {
            return Vec::new();
        }
        matched(&self.token.tenant_roles(tenant), candidates)
    }
}

fn contains_all(granted: &[&str], required: &[&str]) -> bool {
    required.iter().all(|item| granted.contains(item))
}

fn matched<'a>(granted: &[&str], candidates: &[&'a str]) -> Vec<&'a str> {
    candidates
        .iter()
        .copied()
        .filter(|item| granted.contains(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info() -> AuthenticationInfo {
        let token: Token = serde_json::from_value(serde_json::json!({
            "sub": "U2user",
            "permissions": ["read", "write"],
            "roles": ["viewer"],
            "tenants": {
                "T1": {"permissions": ["billing"], "roles": ["owner", "admin"]},
                "T2": {}
            }
        }))
        .expect("token should deserialize");
        AuthenticationInfo::new("header.payload.sig".into(), token)
    }

    #[test]
    fn top_level_permissions() {
        let info = info();
        assert!(info.validate_permissions(&["read"]));
        assert!(info.validate_permissions(&["read", "write"]));
        assert!(!info.validate_permissions(&["read", "delete"]));
        assert!(info.validate_permissions(&[]));
        assert_eq!(info.matched_permissions(&["delete", "write"]), vec!["write"]);
    }

    #[test]
    fn top_level_roles() {
        let info = info();
        assert!(info.validate_roles(&["viewer"]));
        assert!(!info.validate_roles(&["owner"]));
        assert_eq!(info.matched_roles(&["viewer", "owner"]), vec!["viewer"]);
    }

    #[test]
    fn tenant_scoped_checks() {
        let info = info();
        assert!(info.validate_tenant_permissions("T1", &["billing"]));
        assert!(!info.validate_tenant_permissions("T1", &["read"]));
        assert!(info.validate_tenant_roles("T1", &["owner", "admin"]));
        assert_eq!(
            info.matched_tenant_roles("T1", &["admin", "viewer"]),
            vec!["admin"]
        );
        assert_eq!(
            info.matched_tenant_permissions("T1", &["billing"]),
            vec!["billing"]
        );
    }

    #[test]
    fn unknown_tenant_fails_even_with_empty_requirement() {
        let info = info();
        assert!(!info.validate_tenant_permissions("T9", &[]));
        assert!(!info.validate_tenant_roles("T9", &[]));
        assert!(info.matched_tenant_roles("T9", &["owner"]).is_empty());
        assert!(info.validate_tenant_roles("T2", &[]));
    }

    #[test]
    fn refresh_is_recorded_independently_of_cookies() {
        let info = info();
        assert!(!info.was_refreshed());
        let with_cookies = info.clone().with_cookies(vec!["DS=abc; Path=/".into()]);
        assert!(!with_cookies.was_refreshed());
        let refreshed = info.mark_refreshed();
        assert!(refreshed.was_refreshed());
        assert!(refreshed.cookies.is_empty());
    }

    #[test]
    fn serializes_without_empty_cookies() {
        let value = serde_json::to_value(info()).expect("serialize");
        assert!(value.get("cookies").is_none());
        assert_eq!(value["token"]["sub"], "U2user");
    }
}
