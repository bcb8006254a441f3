//! # Videosphere Auth - Bearer Token Verification
//!
//! Verifies RS256-signed session tokens issued by a hosted identity provider
//! (Clerk) against the provider's published JSON Web Key Set.
//!
//! ## Architecture
//!
//! - [`jwt::jwks`] - JWK model, [`KeySetSource`] seam and the [`KeySetCache`]
//! - [`jwt::validator`] - [`TokenVerifier`], the single verification entry point
//! - [`config`] - [`AuthConfig`] (issuer base URL, audience, refresh policy)
//! - [`error`] - [`AuthError`] and [`JwksError`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use videosphere_auth::{AuthConfig, TokenVerifier};
//!
//! # tokio_test::block_on(async {
//! let config = AuthConfig::new("https://api.clerk.dev", "pk_live_audience");
//! let verifier = TokenVerifier::from_config(&config)?;
//!
//! match verifier.verify("eyJhbGciOiJSUzI1NiIs...").await {
//!     Ok(claims) => println!("hello {:?}", claims.subject()),
//!     Err(e) => println!("rejected: {e}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! ## Known gaps
//!
//! - The `iss` claim is never validated.
//! - With the default [`RefreshPolicy::Never`] the first fetched key set is
//!   kept until restart, so provider key rotation breaks new tokens.

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod jwt;

pub use config::{AuthConfig, DEFAULT_ISSUER_BASE_URL};
pub use error::{AuthError, AuthResult, JwksError};
pub use jwt::{
    ClaimSet, HttpKeySetSource, Jwk, JwkSet, KeySetCache, KeySetSource, RefreshPolicy,
    StaticKeySetSource, TokenVerifier,
};
