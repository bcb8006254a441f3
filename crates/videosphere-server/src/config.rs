//! Service configuration management
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. Optional config file (`.toml`, `.yaml`/`.yml` or `.json`)
//! 3. `VIDEOSPHERE_` environment variables, `__` between nested keys
//!    (e.g. `VIDEOSPHERE_AUTH__AUDIENCE`)
//! 4. The identity provider variables deployments already set:
//!    `CLERK_API_URL`, `CLERK_PUBLISHABLE_KEY` and `FRONTEND_URL`
//!
//! Command-line flags are applied on top by the binary.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use videosphere_auth::AuthConfig;

/// Prefix for service environment variables
pub const ENV_PREFIX: &str = "VIDEOSPHERE";

/// Identity provider API base (maps to `auth.issuer_base_url`)
pub const CLERK_API_URL_VAR: &str = "CLERK_API_URL";
/// Publishable key, used as the expected audience (maps to `auth.audience`)
pub const CLERK_PUBLISHABLE_KEY_VAR: &str = "CLERK_PUBLISHABLE_KEY";
/// Extra allowed browser origin (maps to `cors.frontend_url`)
pub const FRONTEND_URL_VAR: &str = "FRONTEND_URL";

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address
    pub bind_address: String,
    /// Bind port
    pub port: u16,
    /// Token verification
    pub auth: AuthConfig,
    /// Cross-origin access
    pub cors: CorsConfig,
    /// Logging
    pub logging: LoggingConfig,
    /// Seed the store with the two demo videos on startup
    pub seed_sample_data: bool,
}

/// Cross-origin settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; a leading `*.` label matches any subdomain
    pub allowed_origins: Vec<String>,
    /// Deployed frontend origin, allowed in addition to the list
    pub frontend_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub structured: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
            seed_sample_data: true,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "https://*.clerk.accounts.dev".to_string(),
            ],
            frontend_url: None,
        }
    }
}

impl CorsConfig {
    /// Every allowed origin pattern, the frontend URL last
    pub fn origins(&self) -> Vec<String> {
        let mut origins = self.allowed_origins.clone();
        if let Some(url) = &self.frontend_url
            && !url.is_empty()
            && !origins.contains(url)
        {
            origins.push(url.clone());
        }
        origins
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            structured: false,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// Loaded values are unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ServiceConfig {
    /// Load configuration from defaults, an optional file and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or has an unknown extension,
    /// if any source fails to parse, or if [`validate`](Self::validate) fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the
    /// process environment when given
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let lookup = |name: &str| match &env {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        };

        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(file_source(path)?);
        }

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env.clone()),
            )
            .set_override_option("auth.issuer_base_url", lookup(CLERK_API_URL_VAR))?
            .set_override_option("auth.audience", lookup(CLERK_PUBLISHABLE_KEY_VAR))?
            .set_override_option("cors.frontend_url", lookup(FRONTEND_URL_VAR))?;

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the loaded values can run a service
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the audience is empty (every
    /// token would be rejected), the issuer base URL is not an http(s) URL,
    /// or key refresh is enabled with a zero minimum interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.audience.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "auth.audience is empty; set {CLERK_PUBLISHABLE_KEY_VAR} or {ENV_PREFIX}_AUTH__AUDIENCE"
            )));
        }

        let base = &self.auth.issuer_base_url;
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "auth.issuer_base_url must be an http(s) URL, got {base:?}"
            )));
        }

        // Zero would let every unknown kid trigger an upstream fetch.
        if self.auth.refresh_on_unknown_key && self.auth.min_refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "auth.min_refresh_interval_secs must be at least 1 when refresh_on_unknown_key is enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address to listen on
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind_address` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bad bind address: {e}")))
    }
}

fn file_source(path: &Path) -> Result<File<config::FileSourceFile, FileFormat>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let format = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => FileFormat::Toml,
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        _ => return Err(ConfigError::UnsupportedFormat),
    };

    Ok(File::from(path).format(format))
}
