//! # descope-auth
//!
//! Session validation for Descope projects.
//!
//! Verifies session JWTs against the project's public keys (fetched once per
//! unknown `kid` and cached for the life of the [`KeyCache`]), and on expiry
//! exchanges the refresh token for a new session exactly once.
//!
//! ```no_run
//! # async fn run() -> Result<(), descope_auth::AuthError> {
//! use descope_auth::TokenValidator;
//!
//! let validator = TokenValidator::from_env()?;
//! let info = validator.validate_session("<session jwt>", "<refresh jwt>").await?;
//! if info.validate_permissions(&["documents:read"]) {
//!     // ...
//! }
//! for cookie in &info.cookies {
//!     // forward as Set-Cookie
//! }
//! # Ok(())
//! # }
//! ```

pub mod cookies;
pub mod error;
pub mod http;
pub mod keys;
pub mod refresh;
pub mod validator;

pub use descope_core::{AuthenticationInfo, Token};
pub use error::{ApiError, AuthError, JwtFailure};
pub use http::DescopeClient;
pub use keys::{Jwk, KeyCache, PublicKey};
pub use validator::TokenValidator;
