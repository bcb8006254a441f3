//! HTTP surface
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/api/health` | none |
//! | GET | `/api/auth/me` | bearer |
//! | GET | `/api/videos` | none |
//! | GET | `/api/videos/me` | bearer |
//! | GET | `/api/videos/{id}` | none |
//! | POST | `/api/videos` | bearer |
//! | DELETE | `/api/videos/{id}` | bearer |
//!
//! Authentication is attached per method with `route_layer`, so public and
//! protected methods can share a path.

pub mod cors;
pub mod handlers;
pub mod middleware;

pub use cors::{OriginMatcher, cors_layer};
pub use handlers::UserProfile;
pub use middleware::{CurrentUser, extract_bearer_token, require_bearer};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use videosphere_auth::TokenVerifier;

use crate::config::CorsConfig;
use crate::store::VideoStore;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Video persistence
    pub store: Arc<dyn VideoStore>,
    /// Bearer token verifier, one key-set cache for the whole process
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn VideoStore>, verifier: Arc<TokenVerifier>) -> Self {
        Self { store, verifier }
    }
}

/// Build the service router
pub fn router(state: AppState, cors: &CorsConfig) -> Router {
    let auth = from_fn_with_state(state.clone(), require_bearer);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/auth/me",
            get(handlers::me).route_layer(auth.clone()),
        )
        .route(
            "/api/videos",
            get(handlers::list_videos)
                .merge(post(handlers::create_video).route_layer(auth.clone())),
        )
        .route(
            "/api/videos/me",
            get(handlers::my_videos).route_layer(auth.clone()),
        )
        .route(
            "/api/videos/{id}",
            get(handlers::get_video).merge(delete(handlers::delete_video).route_layer(auth)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors)),
        )
        .with_state(state)
}
