#![allow(dead_code)]

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use descope_auth::{DescopeClient, TokenValidator};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand_core::OsRng;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_ID: &str = "P2testproject";
pub const KEYS_ROUTE: &str = "/v2/keys/P2testproject";
pub const REFRESH_ROUTE: &str = "/v1/auth/refresh";

/// Far-future `exp` (2032).
pub const FUTURE_EXP: i64 = 1_981_398_111;
/// Far-past `exp` (2007).
pub const PAST_EXP: i64 = 1_181_398_111;

pub struct TestKey {
    signing: SigningKey,
    pub kid: String,
}

impl TestKey {
    pub fn new(kid: &str) -> Self {
        Self {
            signing: SigningKey::random(&mut OsRng),
            kid: kid.to_owned(),
        }
    }

    pub fn jwk(&self) -> Value {
        let point = self.signing.verifying_key().to_encoded_point(false);
        let bytes = point.as_bytes();
        json!({
            "kid": self.kid,
            "kty": "EC",
            "crv": "P-256",
            "alg": "ES256",
            "use": "sig",
            "x": URL_SAFE_NO_PAD.encode(&bytes[1..33]),
            "y": URL_SAFE_NO_PAD.encode(&bytes[33..65]),
        })
    }

    /// Sign arbitrary claims as an ES256 JWT.
    pub fn sign(&self, claims: &Value) -> String {
        let header = json!({"alg": "ES256", "kid": self.kid, "typ": "JWT"});
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        let signature: Signature = self.signing.sign(signing_input.as_bytes());
        format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )
    }

    pub fn token(&self, sub: &str, exp: i64) -> String {
        self.sign(&json!({
            "sub": sub,
            "exp": exp,
            "iss": format!("https://api.descope.com/{PROJECT_ID}"),
        }))
    }
}

pub fn validator(server: &MockServer) -> TokenValidator {
    let client = DescopeClient::new(PROJECT_ID, server.uri(), Duration::from_secs(5))
        .expect("client builds");
    TokenValidator::new(client)
}

/// Serve `keys` from the keys endpoint, expecting exactly `calls` requests.
pub async fn mount_keys(server: &MockServer, keys: &[&TestKey], calls: u64) {
    let body: Vec<Value> = keys.iter().map(|key| key.jwk()).collect();
    Mock::given(method("GET"))
        .and(path(KEYS_ROUTE))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .named("project keys")
        .mount(server)
        .await;
}

/// Fail the test if the refresh endpoint is called at all.
pub async fn forbid_refresh(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(REFRESH_ROUTE))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .named("refresh")
        .mount(server)
        .await;
}
