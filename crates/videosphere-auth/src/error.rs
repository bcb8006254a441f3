//! Error types for key-set retrieval and token verification
//!
//! Verification failures are deliberately detailed here so they can be logged.
//! Callers at the HTTP boundary collapse every [`AuthError`] into one
//! unauthorized response.

use jsonwebtoken::Algorithm;

/// Result alias for token verification
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure to obtain or interpret a JSON Web Key Set
#[derive(Debug, thiserror::Error)]
pub enum JwksError {
    /// HTTP request to the JWKS endpoint failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JWKS endpoint answered with a non-success status
    #[error("JWKS endpoint returned status {0}")]
    Status(u16),

    /// JWKS response was invalid or malformed
    #[error("Invalid JWKS response: {0}")]
    InvalidResponse(String),

    /// Key type is not usable for RS256 verification
    #[error("Unsupported key type: {kty}")]
    UnsupportedKeyType {
        /// The unsupported key type
        kty: String,
    },

    /// Key parameters are missing or not decodable
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),
}

/// Bearer token verification failure
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token header could not be decoded
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The token header carries no `kid`
    #[error("Token header carries no key ID")]
    MissingKeyId,

    /// The header names an algorithm other than RS256
    #[error("Algorithm {0:?} not allowed")]
    UnsupportedAlgorithm(Algorithm),

    /// The key set could not be fetched
    #[error("Key set unavailable: {0}")]
    KeySetUnavailable(#[source] JwksError),

    /// No key in the key set matches the token's `kid`
    #[error("Key ID '{kid}' not found in key set")]
    UnknownKey {
        /// The key ID that was not found
        kid: String,
    },

    /// The matching key could not be turned into a verification key
    #[error("Invalid verification key: {0}")]
    InvalidKey(#[source] JwksError),

    /// Signature, audience or time-based claim checks failed
    #[error("Token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// True when the failure came from the identity provider rather than the token
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::KeySetUnavailable(_))
    }
}
