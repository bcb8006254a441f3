//! Authentication configuration
//!
//! Mirrors the identity provider settings the service is deployed with:
//! the provider's API base URL (the JWKS lives at `<base>/v1/jwks`) and the
//! audience tokens must be minted for.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::jwt::RefreshPolicy;

/// Default identity provider API base
pub const DEFAULT_ISSUER_BASE_URL: &str = "https://api.clerk.dev";

/// Token verification settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity provider API base URL
    pub issuer_base_url: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Clock-skew tolerance for `exp`/`nbf`, in seconds
    pub leeway_secs: u64,
    /// Re-fetch the key set when a token names an unknown `kid`
    pub refresh_on_unknown_key: bool,
    /// Minimum seconds between two key-set fetches when refreshing
    pub min_refresh_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer_base_url: DEFAULT_ISSUER_BASE_URL.to_string(),
            audience: String::new(),
            leeway_secs: 0,
            refresh_on_unknown_key: false,
            min_refresh_interval_secs: 30,
        }
    }
}

impl AuthConfig {
    /// Config for a given issuer base and audience, other fields default
    pub fn new(issuer_base_url: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer_base_url: issuer_base_url.into(),
            audience: audience.into(),
            ..Self::default()
        }
    }

    /// The JWKS endpoint derived from the issuer base
    pub fn jwks_url(&self) -> String {
        format!("{}/v1/jwks", self.issuer_base_url.trim_end_matches('/'))
    }

    /// Key-set refresh behaviour selected by this config
    pub fn refresh_policy(&self) -> RefreshPolicy {
        if self.refresh_on_unknown_key {
            RefreshPolicy::OnUnknownKey {
                min_interval: Duration::from_secs(self.min_refresh_interval_secs),
            }
        } else {
            RefreshPolicy::Never
        }
    }
}
