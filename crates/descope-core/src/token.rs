use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim holding the top-level permission list.
pub const PERMISSIONS_CLAIM: &str = "permissions";
/// Claim holding the top-level role list.
pub const ROLES_CLAIM: &str = "roles";
/// Claim mapping tenant IDs to their per-tenant claims.
pub const TENANTS_CLAIM: &str = "tenants";
/// Claim naming the tenant currently selected for the session.
pub const CURRENT_TENANT_CLAIM: &str = "dct";

/// Decoded JWT claims.
///
/// Standard claims get typed fields; everything else the service puts in the
/// token lands in `custom`. Produced by signature validation in
/// `descope-auth`, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Token {
    /// User ID (`sub` claim).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration, seconds since the epoch (`exp` claim).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issuer (`iss` claim). Either the project ID or a URL ending in it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued-at, seconds since the epoch (`iat` claim).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// All remaining claims.
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Token {
    /// Token expiration time, if the token carries a representable `exp`.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Check if the token is expired or expires within `buffer_secs`.
    ///
    /// Tokens without `exp` never expire.
    #[must_use]
    pub fn is_near_expiry(&self, buffer_secs: i64) -> bool {
        let threshold = Utc::now() + chrono::TimeDelta::seconds(buffer_secs);
        self.expires_at().is_some_and(|expires_at| expires_at <= threshold)
    }

    /// Project ID this token was issued for.
    ///
    /// Accepts both the bare project ID and the URL form of `iss`.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.iss
            .as_deref()
            .and_then(|iss| iss.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
    }

    /// Raw access to any non-standard claim.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// Top-level permissions granted to the user.
    #[must_use]
    pub fn permissions(&self) -> Vec<&str> {
        string_items(self.claim(PERMISSIONS_CLAIM))
    }

    /// Top-level roles granted to the user.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        string_items(self.claim(ROLES_CLAIM))
    }

    /// IDs of every tenant the user is associated with.
    #[must_use]
    pub fn tenant_ids(&self) -> Vec<&str> {
        self.tenants()
            .map(|tenants| tenants.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether the `tenants` claim has an entry for `tenant`.
    #[must_use]
    pub fn has_tenant(&self, tenant: &str) -> bool {
        self.tenants().is_some_and(|tenants| tenants.contains_key(tenant))
    }

    /// Permissions granted within `tenant`.
    #[must_use]
    pub fn tenant_permissions(&self, tenant: &str) -> Vec<&str> {
        self.tenant_items(tenant, PERMISSIONS_CLAIM)
    }

    /// Roles granted within `tenant`.
    #[must_use]
    pub fn tenant_roles(&self, tenant: &str) -> Vec<&str> {
        self.tenant_items(tenant, ROLES_CLAIM)
    }

    /// Tenant selected for this session (`dct` claim).
    #[must_use]
    pub fn current_tenant(&self) -> Option<&str> {
        self.claim(CURRENT_TENANT_CLAIM)
            .and_then(Value::as_str)
            .filter(|tenant| !tenant.is_empty())
    }

    fn tenants(&self) -> Option<&Map<String, Value>> {
        self.claim(TENANTS_CLAIM).and_then(Value::as_object)
    }

    fn tenant_items(&self, tenant: &str, claim: &str) -> Vec<&str> {
        string_items(
            self.tenants()
                .and_then(|tenants| tenants.get(tenant))
                .and_then(|entry| entry.get(claim)),
        )
    }
}

/// Non-array values and non-string items are ignored.
fn string_items(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
