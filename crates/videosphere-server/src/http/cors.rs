//! Cross-origin access for the browser frontend

use axum::http::{HeaderValue, request::Parts};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::debug;

use crate::config::CorsConfig;

/// Allowed-origin list with single-label wildcard support
///
/// `https://*.clerk.accounts.dev` matches `https://abc.clerk.accounts.dev`
/// and `https://a.b.clerk.accounts.dev`, but not the bare
/// `https://clerk.accounts.dev` nor another scheme.
#[derive(Debug, Clone, Default)]
pub struct OriginMatcher {
    exact: Vec<String>,
    // (scheme + "://", "." + domain suffix)
    wildcard: Vec<(String, String)>,
}

impl OriginMatcher {
    /// Build from origin patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().trim_end_matches('/');
            match pattern.split_once("://*.") {
                Some((scheme, domain)) if !domain.is_empty() => matcher
                    .wildcard
                    .push((format!("{scheme}://"), format!(".{domain}"))),
                _ => matcher.exact.push(pattern.to_string()),
            }
        }
        matcher
    }

    /// True when `origin` is allowed
    pub fn matches(&self, origin: &str) -> bool {
        if self.exact.iter().any(|o| o == origin) {
            return true;
        }

        self.wildcard.iter().any(|(scheme, suffix)| {
            origin
                .strip_prefix(scheme.as_str())
                .and_then(|host| host.strip_suffix(suffix.as_str()))
                .is_some_and(|sub| !sub.is_empty() && !sub.contains(['/', ':']))
        })
    }
}

/// CORS layer for the configured origins
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// preflight rather than answered with `*`.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let matcher = Arc::new(OriginMatcher::new(config.origins()));
    debug!(origins = ?config.origins(), "CORS origins configured");

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin.to_str().is_ok_and(|o| matcher.matches(o))
            },
        ))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
