//! Logging initialization
//!
//! Logs always go to stderr. `RUST_LOG`, when set, replaces the configured
//! level entirely.
//!
//! ```rust,no_run
//! use videosphere_server::LoggingConfig;
//!
//! LoggingConfig::default().init()?;
//! # Ok::<(), std::io::Error>(())
//! ```

use crate::config::LoggingConfig;
use std::io;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

impl LoggingConfig {
    /// Install the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already set.
    pub fn init(&self) -> io::Result<()> {
        let filter = self.filter();
        let subscriber = tracing_subscriber::registry().with(filter);

        if self.structured {
            subscriber
                .with(fmt::layer().json().with_writer(io::stderr))
                .try_init()
                .map_err(|e| io::Error::other(e.to_string()))
        } else {
            subscriber
                .with(fmt::layer().with_writer(io::stderr))
                .try_init()
                .map_err(|e| io::Error::other(e.to_string()))
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
