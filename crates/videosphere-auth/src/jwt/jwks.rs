//! JWKS (JSON Web Key Set) model, sources and caching
//!
//! The key set is fetched lazily on first use and then held for the lifetime
//! of the [`KeySetCache`]. By default it is never refreshed: a key rotation at
//! the identity provider makes newly issued tokens unverifiable until the
//! process restarts. [`RefreshPolicy::OnUnknownKey`] opts into a rate-limited
//! re-fetch when a token names a `kid` the cached set does not contain.
//!
//! Concurrent first requests share one in-flight fetch. A failed fetch leaves
//! the slot empty, so the next request tries again.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::JwksError;

/// JSON Web Key (RFC 7517)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key Type (RSA, EC, oct, OKP)
    pub kty: String,

    /// Key ID, matched against the token header's `kid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Public Key Use (sig, enc)
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// Algorithm advertised by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// RSA modulus (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent (base64url encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Elliptic curve name; parsed so EC entries do not break the set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// EC X coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC Y coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    /// Build an RSA public verification key from the modulus and exponent
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::UnsupportedKeyType`] for anything but `RSA`, and
    /// [`JwksError::InvalidKeyFormat`] when `n` or `e` is missing or not
    /// valid base64url.
    pub fn to_decoding_key(&self) -> Result<DecodingKey, JwksError> {
        if self.kty != "RSA" {
            return Err(JwksError::UnsupportedKeyType {
                kty: self.kty.clone(),
            });
        }

        let n = self
            .n
            .as_deref()
            .ok_or_else(|| JwksError::InvalidKeyFormat("RSA key missing 'n' parameter".into()))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| JwksError::InvalidKeyFormat("RSA key missing 'e' parameter".into()))?;

        for (name, value) in [("n", n), ("e", e)] {
            let bytes = URL_SAFE_NO_PAD.decode(value).map_err(|err| {
                JwksError::InvalidKeyFormat(format!("RSA parameter '{name}' is not base64url: {err}"))
            })?;
            if bytes.is_empty() {
                return Err(JwksError::InvalidKeyFormat(format!(
                    "RSA parameter '{name}' is empty"
                )));
            }
        }

        DecodingKey::from_rsa_components(n, e)
            .map_err(|err| JwksError::InvalidKeyFormat(format!("Failed to create RSA key: {err}")))
    }
}

/// JSON Web Key Set as served by `<issuer>/v1/jwks`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Published keys
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// First key whose `kid` equals `kid`
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

/// Where the key set comes from
///
/// Production code uses [`HttpKeySetSource`]; tests and embedders can supply
/// their own implementation.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    /// Retrieve the current key set
    async fn fetch(&self) -> Result<JwkSet, JwksError>;

    /// Human-readable location used in log events
    fn location(&self) -> &str {
        "custom"
    }
}

/// Fetches the key set from a remote JWKS endpoint
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    uri: String,
    client: reqwest::Client,
}

impl HttpKeySetSource {
    /// Create a source with a 10 second request timeout
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::Http`] if the HTTP client cannot be built.
    pub fn new(uri: impl Into<String>) -> Result<Self, JwksError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(uri, client))
    }

    /// Create a source that reuses an existing HTTP client
    pub fn with_client(uri: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            uri: uri.into(),
            client,
        }
    }

    /// The JWKS endpoint
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        let response = self.client.get(&self.uri).send().await.map_err(|e| {
            error!(jwks_uri = %self.uri, error = %e, "Failed to fetch JWKS");
            JwksError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(jwks_uri = %self.uri, status = %status, "JWKS endpoint returned error status");
            return Err(JwksError::Status(status.as_u16()));
        }

        response.json::<JwkSet>().await.map_err(|e| {
            error!(jwks_uri = %self.uri, error = %e, "Failed to parse JWKS JSON");
            JwksError::InvalidResponse(e.to_string())
        })
    }

    fn location(&self) -> &str {
        &self.uri
    }
}

/// A fixed key set, for tests and deployments with pinned keys
#[derive(Debug, Clone, Default)]
pub struct StaticKeySetSource(JwkSet);

impl StaticKeySetSource {
    /// Serve `keys` on every fetch
    pub fn new(keys: JwkSet) -> Self {
        Self(keys)
    }
}

#[async_trait]
impl KeySetSource for StaticKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        Ok(self.0.clone())
    }

    fn location(&self) -> &str {
        "static"
    }
}

/// What happens when a token names a `kid` missing from the cached set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Keep the first fetched set for the lifetime of the cache
    #[default]
    Never,
    /// Re-fetch, but no more often than `min_interval`
    OnUnknownKey {
        /// Minimum time between two fetches
        min_interval: Duration,
    },
}

#[derive(Debug, Clone)]
struct CachedKeySet {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Process-wide key-set slot
pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    slot: RwLock<Option<CachedKeySet>>,
    /// Serializes upstream fetches so concurrent misses share one request
    fetch_gate: Mutex<()>,
    policy: RefreshPolicy,
    fetches: AtomicU64,
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("source", &self.source.location())
            .field("policy", &self.policy)
            .field("fetches", &self.fetch_count())
            .finish_non_exhaustive()
    }
}

impl KeySetCache {
    /// Create an empty cache that never refreshes once populated
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self::with_policy(source, RefreshPolicy::Never)
    }

    /// Create an empty cache with an explicit refresh policy
    pub fn with_policy(source: Arc<dyn KeySetSource>, policy: RefreshPolicy) -> Self {
        Self {
            source,
            slot: RwLock::new(None),
            fetch_gate: Mutex::new(()),
            policy,
            fetches: AtomicU64::new(0),
        }
    }

    /// Return the cached key set, fetching it on first use
    ///
    /// # Errors
    ///
    /// Propagates the source's error when the slot is empty and the fetch fails.
    pub async fn get(&self) -> Result<Arc<JwkSet>, JwksError> {
        if let Some(keys) = self.cached().await {
            debug!(source = self.source.location(), "Using cached JWKS");
            return Ok(keys);
        }

        let _gate = self.fetch_gate.lock().await;
        // Another caller may have filled the slot while this one waited.
        if let Some(keys) = self.cached().await {
            return Ok(keys);
        }
        self.fetch_and_store().await
    }

    /// Give the cache a chance to pick up a rotated key
    ///
    /// Returns `None` under [`RefreshPolicy::Never`]. Otherwise returns the
    /// freshest set available: a new fetch, or the current set when the last
    /// fetch is younger than the minimum interval.
    ///
    /// # Errors
    ///
    /// Propagates the source's error when a re-fetch was attempted and failed.
    pub async fn refresh_for_unknown_key(
        &self,
        kid: &str,
    ) -> Result<Option<Arc<JwkSet>>, JwksError> {
        let RefreshPolicy::OnUnknownKey { min_interval } = self.policy else {
            return Ok(None);
        };

        let _gate = self.fetch_gate.lock().await;
        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref()
                && cached.fetched_at.elapsed() < min_interval
            {
                warn!(
                    kid = kid,
                    since_last_ms = cached.fetched_at.elapsed().as_millis(),
                    "JWKS refresh rate limited, using cache"
                );
                return Ok(Some(Arc::clone(&cached.keys)));
            }
        }

        info!(kid = kid, "Unknown key ID, refreshing JWKS");
        self.fetch_and_store().await.map(Some)
    }

    /// Drop the cached set; the next [`get`](Self::get) fetches again
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
        debug!(source = self.source.location(), "JWKS cache cleared");
    }

    /// True once a key set has been fetched and stored
    pub async fn is_populated(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Number of upstream fetches attempted so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Configured refresh policy
    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    async fn cached(&self) -> Option<Arc<JwkSet>> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|cached| Arc::clone(&cached.keys))
    }

    async fn fetch_and_store(&self) -> Result<Arc<JwkSet>, JwksError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        info!(source = self.source.location(), "Fetching JWKS");

        let keys = Arc::new(self.source.fetch().await?);
        info!(
            source = self.source.location(),
            key_count = keys.keys.len(),
            "Successfully fetched JWKS"
        );

        *self.slot.write().await = Some(CachedKeySet {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }
}
