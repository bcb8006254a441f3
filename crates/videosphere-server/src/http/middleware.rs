//! Bearer-token authentication middleware
//!
//! Runs the [`TokenVerifier`](videosphere_auth::TokenVerifier) on every
//! protected request and hands the verified identity to handlers through
//! request extensions as [`CurrentUser`].

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use videosphere_auth::ClaimSet;

use super::AppState;
use crate::error::ApiError;

/// The verified caller of a protected route
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    subject: String,
    claims: ClaimSet,
}

impl CurrentUser {
    /// Wrap verified claims; `None` when they carry no string `sub`
    pub fn from_claims(claims: ClaimSet) -> Option<Self> {
        let subject = claims.subject().filter(|s| !s.is_empty())?.to_string();
        Some(Self { subject, claims })
    }

    /// The caller's subject, the ownership key for videos
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Every claim of the verified token
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }
}

/// Extract the credentials of an `Authorization: Bearer` header
///
/// The scheme is matched case-insensitively. Returns `None` when the header
/// is absent, not valid ASCII, uses another scheme or carries no token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Reject requests without a valid bearer token
///
/// On success inserts [`CurrentUser`] into the request extensions. The
/// response never reveals which verification step failed.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()).map(str::to_owned) else {
        debug!(path = %request.uri().path(), "No bearer credentials");
        return ApiError::MissingCredentials.into_response();
    };

    let claims = match state.verifier.verify(&token).await {
        Ok(claims) => claims,
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Bearer token rejected");
            return ApiError::InvalidCredentials.into_response();
        }
    };

    let Some(user) = CurrentUser::from_claims(claims) else {
        warn!(path = %request.uri().path(), "Verified token has no subject");
        return ApiError::InvalidCredentials.into_response();
    };

    debug!(subject = %user.subject(), "Request authenticated");
    request.extensions_mut().insert(user);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_current_user_requires_subject() {
        let claims = |v| serde_json::from_value::<ClaimSet>(v).unwrap();

        let user = CurrentUser::from_claims(claims(json!({"sub": "user_1", "aud": "x"}))).unwrap();
        assert_eq!(user.subject(), "user_1");
        assert_eq!(user.claims().get_str("aud"), Some("x"));

        assert!(CurrentUser::from_claims(claims(json!({"aud": "x"}))).is_none());
        assert!(CurrentUser::from_claims(claims(json!({"sub": ""}))).is_none());
        assert!(CurrentUser::from_claims(claims(json!({"sub": 7}))).is_none());
    }
}
