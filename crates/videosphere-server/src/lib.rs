//! # Videosphere Server
//!
//! Video catalogue API. Anyone can browse; signed-in users (Clerk session
//! tokens) can add videos and delete their own.
//!
//! ## Modules
//!
//! - [`store`] - [`Video`] records behind the [`VideoStore`] trait
//! - [`http`] - axum router, bearer middleware, handlers and CORS
//! - [`config`] - [`ServiceConfig`] loading (file, environment)
//! - [`logging`] - tracing subscriber setup
//! - [`error`] - [`ApiError`] HTTP responses
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use videosphere_server::{AppState, InMemoryVideoStore, ServiceConfig, router};
//! use videosphere_auth::TokenVerifier;
//!
//! # tokio_test::block_on(async {
//! let config = ServiceConfig::load(None)?;
//! let verifier = TokenVerifier::from_config(&config.auth)?;
//! let state = AppState::new(Arc::new(InMemoryVideoStore::sample()), Arc::new(verifier));
//!
//! let app = router(state, &config.cors);
//! let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
//! axum::serve(listener, app).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod store;

pub use config::{ConfigError, CorsConfig, LoggingConfig, ServiceConfig};
pub use error::ApiError;
pub use http::{AppState, CurrentUser, UserProfile, router};
pub use store::{InMemoryVideoStore, StoreError, Video, VideoStore};

use std::sync::Arc;
use tracing::info;
use videosphere_auth::TokenVerifier;

/// Build application state from configuration
///
/// # Errors
///
/// Returns an error if the JWKS HTTP client cannot be created.
pub fn build_state(config: &ServiceConfig) -> Result<AppState, videosphere_auth::JwksError> {
    let verifier = TokenVerifier::from_config(&config.auth)?;
    let store = if config.seed_sample_data {
        InMemoryVideoStore::sample()
    } else {
        InMemoryVideoStore::new()
    };

    info!(
        jwks_url = %config.auth.jwks_url(),
        audience = %config.auth.audience,
        refresh_policy = ?config.auth.refresh_policy(),
        videos = store.len(),
        "Application state ready"
    );

    Ok(AppState::new(Arc::new(store), Arc::new(verifier)))
}

/// Resolves on Ctrl-C (and SIGTERM on unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
