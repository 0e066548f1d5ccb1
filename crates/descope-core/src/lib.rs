//! # descope-core
//!
//! Data types shared across the Descope SDK crates:
//! - [`Token`]: decoded session/refresh JWT claims with typed accessors
//! - [`AuthenticationInfo`]: the result of a successful validation, plus the
//!   permission / role / tenant checks callers run against it
//!
//! Contains only data and claim logic. No network calls, no key material.

pub mod authentication;
pub mod token;

pub use authentication::AuthenticationInfo;
pub use token::Token;
