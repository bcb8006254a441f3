//! JWT infrastructure for bearer-token verification
//!
//! ```text
//! token ──► header (kid, alg) ──► KeySetCache ──► Jwk ──► DecodingKey
//!                                     │                       │
//!                              KeySetSource              RS256 decode
//!                           (HTTP JWKS endpoint)     (aud, exp, nbf checks)
//!                                                             │
//!                                                         ClaimSet
//! ```
//!
//! # Modules
//!
//! - `jwks` - JWK model, key-set sources and the process-wide cache
//! - `validator` - the RS256 [`TokenVerifier`]

pub mod jwks;
pub mod validator;

pub use jwks::{
    HttpKeySetSource, Jwk, JwkSet, KeySetCache, KeySetSource, RefreshPolicy, StaticKeySetSource,
};
pub use validator::TokenVerifier;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded and verified token payload
///
/// Holds the claims exactly as they appeared in the token, in their original
/// order. Nothing is added, renamed or dropped during verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Wrap an already-decoded claim mapping
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Subject (`sub`) - the authenticated principal
    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// Issuer (`iss`), never validated by [`TokenVerifier`]
    pub fn issuer(&self) -> Option<&str> {
        self.get_str("iss")
    }

    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Claim value when it is a JSON string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Number of claims
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the token carried an empty payload object
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the underlying mapping
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}
