//! RS256 bearer-token verification
//!
//! Verification steps, in order:
//!
//! 1. Decode the unverified header for `kid` and `alg`
//! 2. Obtain the key set from the [`KeySetCache`]
//! 3. Select the key whose `kid` matches
//! 4. Build an RSA public key from its modulus and exponent
//! 5. Verify the signature with RS256, whatever the header claims
//! 6. Check `aud` against the configured audience; `iss` is not checked
//! 7. Check `exp` and `nbf` when present
//!
//! `aud` must be present. `exp` may be absent, as RFC 7519 allows, but is
//! enforced whenever the token carries it.
//!
//! Issuer verification is disabled on purpose to match the identity
//! provider integration this service replaces. Treat it as a known gap.

use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation, decode, decode_header};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::ClaimSet;
use super::jwks::{HttpKeySetSource, KeySetCache};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult, JwksError};

/// The only signature algorithm accepted
pub const REQUIRED_ALGORITHM: Algorithm = Algorithm::RS256;

/// Verifies bearer tokens against the identity provider's key set
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use videosphere_auth::{HttpKeySetSource, KeySetCache, TokenVerifier};
/// # tokio_test::block_on(async {
/// let source = HttpKeySetSource::new("https://api.clerk.dev/v1/jwks")?;
/// let cache = Arc::new(KeySetCache::new(Arc::new(source)));
/// let verifier = TokenVerifier::new("pk_test_audience", cache);
///
/// let claims = verifier.verify("eyJhbGciOiJSUzI1NiIs...").await?;
/// println!("subject: {:?}", claims.subject());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    expected_audience: String,
    leeway: Duration,
    cache: Arc<KeySetCache>,
}

impl TokenVerifier {
    /// Create a verifier with zero clock-skew leeway
    pub fn new(expected_audience: impl Into<String>, cache: Arc<KeySetCache>) -> Self {
        Self {
            expected_audience: expected_audience.into(),
            leeway: Duration::ZERO,
            cache,
        }
    }

    /// Build a verifier that fetches keys from the configured JWKS endpoint
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AuthConfig) -> Result<Self, JwksError> {
        let source = HttpKeySetSource::new(config.jwks_url())?;
        let cache = KeySetCache::with_policy(Arc::new(source), config.refresh_policy());
        Ok(Self::new(config.audience.clone(), Arc::new(cache))
            .with_leeway(Duration::from_secs(config.leeway_secs)))
    }

    /// Set clock-skew tolerance for `exp` and `nbf`
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// The audience every token must carry
    pub fn expected_audience(&self) -> &str {
        &self.expected_audience
    }

    /// Clock-skew tolerance
    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    /// The key-set cache backing this verifier
    pub fn key_set_cache(&self) -> &Arc<KeySetCache> {
        &self.cache
    }

    /// Verify `token` and return its claims unmodified
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] describing the first failed step. Callers
    /// exposing this over HTTP should not forward the detail.
    pub async fn verify(&self, token: &str) -> AuthResult<ClaimSet> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode JWT header");
            AuthError::MalformedToken(e.to_string())
        })?;

        if header.alg != REQUIRED_ALGORITHM {
            warn!(algorithm = ?header.alg, "JWT algorithm not allowed");
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let kid = header.kid.ok_or_else(|| {
            warn!("JWT missing kid (key ID) in header");
            AuthError::MissingKeyId
        })?;

        let decoding_key = self.decoding_key(&kid).await?;

        let token_data: TokenData<ClaimSet> = decode(token, &decoding_key, &self.validation())
            .map_err(|e| {
                warn!(
                    error = %e,
                    kid = %kid,
                    audience = %self.expected_audience,
                    "JWT validation failed"
                );
                AuthError::Rejected(e)
            })?;

        debug!(
            kid = %kid,
            subject = ?token_data.claims.subject(),
            "JWT validation successful"
        );
        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        // Pinned to RS256 so the decoder never trusts the header's algorithm.
        let mut validation = Validation::new(REQUIRED_ALGORITHM);
        validation.set_audience(&[&self.expected_audience]);
        validation.required_spec_claims = HashSet::from(["aud".to_string()]);
        // No set_issuer: `iss` is accepted whatever its value.
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = self.leeway.as_secs();
        validation
    }

    async fn decoding_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        let keys = self.cache.get().await.map_err(|e| {
            error!(error = %e, "JWKS unavailable, rejecting token");
            AuthError::KeySetUnavailable(e)
        })?;

        let unknown = || {
            warn!(kid = kid, "Key ID not found in JWKS");
            AuthError::UnknownKey {
                kid: kid.to_string(),
            }
        };

        let jwk = match keys.find(kid) {
            Some(jwk) => jwk.clone(),
            None => {
                let refreshed = self
                    .cache
                    .refresh_for_unknown_key(kid)
                    .await
                    .map_err(AuthError::KeySetUnavailable)?
                    .ok_or_else(unknown)?;
                refreshed.find(kid).cloned().ok_or_else(unknown)?
            }
        };

        jwk.to_decoding_key().map_err(|e| {
            error!(kid = kid, error = %e, "Failed to create decoding key from JWK");
            AuthError::InvalidKey(e)
        })
    }
}
