//! Project signing keys and the per-validator key cache.
//!
//! Keys are fetched from the project keys endpoint as JWK records, converted
//! once into verification keys, and kept for the lifetime of the cache. There
//! is no TTL and no eviction; a rotated key shows up as an unknown `kid`, which
//! triggers a fetch of the whole key set.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// A JWK record as served by the keys endpoint.
///
/// Every field is optional on the wire so that one odd entry does not fail
/// the whole key set; completeness is checked by [`PublicKey::from_jwk`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(default)]
    pub kid: String,
    #[serde(default)]
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// RSA modulus (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA exponent (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// EC / OKP x coordinate (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC y coordinate (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key has no kid")]
    MissingKid,
    #[error("unsupported key type '{0}'")]
    UnsupportedKeyType(String),
    #[error("{kty} key is missing '{component}'")]
    MissingComponent {
        kty: String,
        component: &'static str,
    },
    #[error("unknown algorithm '{0}'")]
    UnknownAlgorithm(String),
    #[error("invalid key material: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// A project signing key, ready for signature verification.
///
/// Immutable once built. Identified by [`PublicKey::kid`].
#[derive(Clone)]
pub struct PublicKey {
    jwk: Jwk,
    algorithm: Option<Algorithm>,
    decoding_key: DecodingKey,
}

impl PublicKey {
    /// Convert a JWK record into a verification key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the record has no `kid`, an unsupported `kty`,
    /// missing public components, or an unknown `alg`.
    pub fn from_jwk(jwk: Jwk) -> Result<Self, KeyError> {
        if jwk.kid.trim().is_empty() {
            return Err(KeyError::MissingKid);
        }

        let algorithm = jwk
            .alg
            .as_deref()
            .map(|alg| Algorithm::from_str(alg).map_err(|_| KeyError::UnknownAlgorithm(alg.into())))
            .transpose()?;

        let decoding_key = match jwk.kty.as_str() {
            "RSA" => DecodingKey::from_rsa_components(
                component(&jwk, "n", jwk.n.as_deref())?,
                component(&jwk, "e", jwk.e.as_deref())?,
            )?,
            "EC" => DecodingKey::from_ec_components(
                component(&jwk, "x", jwk.x.as_deref())?,
                component(&jwk, "y", jwk.y.as_deref())?,
            )?,
            "OKP" => DecodingKey::from_ed_components(component(&jwk, "x", jwk.x.as_deref())?)?,
            other => return Err(KeyError::UnsupportedKeyType(other.to_string())),
        };

        Ok(Self {
            jwk,
            algorithm,
            decoding_key,
        })
    }

    #[must_use]
    pub fn kid(&self) -> &str {
        &self.jwk.kid
    }

    /// The algorithm the key is pinned to, when the JWK declares one.
    #[must_use]
    pub const fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("kid", &self.jwk.kid)
            .field("kty", &self.jwk.kty)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn component<'a>(
    jwk: &Jwk,
    name: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, KeyError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| KeyError::MissingComponent {
            kty: jwk.kty.clone(),
            component: name,
        })
}

/// `kid` → [`PublicKey`] map owned by a validator.
///
/// Share one cache between validators with `Arc` to pool keys; give each
/// tenant its own cache to keep them isolated. The map lock is never held
/// across an await. Fetches are serialised through a separate lock so that
/// concurrent misses for the same `kid` produce a single request.
///
/// That lock is per cache, not per `kid`: misses for different kids queue
/// behind one another, and a `kid` the project never publishes is fetched
/// again, under the lock, on every lookup.
#[derive(Debug, Default)]
pub struct KeyCache {
    keys: RwLock<HashMap<String, Arc<PublicKey>>>,
    fetch_lock: Mutex<()>,
}

impl KeyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, kid: &str) -> Option<Arc<PublicKey>> {
        self.keys.read().await.get(kid).cloned()
    }

    /// Insert every key, replacing entries with the same `kid`. Returns the
    /// number of keys inserted.
    pub async fn insert_all(&self, keys: impl IntoIterator<Item = PublicKey>) -> usize {
        let mut map = self.keys.write().await;
        let mut inserted = 0;
        for key in keys {
            map.insert(key.kid().to_string(), Arc::new(key));
            inserted += 1;
        }
        inserted
    }

    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }

    pub(crate) async fn lock_fetch(&self) -> MutexGuard<'_, ()> {
        self.fetch_lock.lock().await
    }
}
