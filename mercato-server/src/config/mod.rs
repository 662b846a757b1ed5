//! Configuration module for mercato-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    CheckoutConfig, MailConfig, ServerConfig, SharedConfig, StripeConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub stripe: StripeConfig,
    pub checkout: CheckoutConfig,
    pub mail: Option<MailConfig>,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    ///
    /// The mail section is not reloadable and stays with the mailer.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            stripe: Arc::new(RwLock::new(self.stripe)),
            checkout: Arc::new(RwLock::new(self.checkout)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_from_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_from_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        // Apply CLI overrides
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        build_loaded_config(file_config)
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.stripe.webhook_secret.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "stripe.webhook_secret must not be empty".to_string(),
        ));
    }
    if config
        .stripe
        .secret_key
        .as_deref()
        .is_some_and(|k| k.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "stripe.secret_key must not be empty when set".to_string(),
        ));
    }
    if config.server.identity_header.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "server.identity_header must not be empty".to_string(),
        ));
    }
    if axum::http::HeaderName::from_bytes(config.server.identity_header.as_bytes()).is_err() {
        return Err(ConfigError::ValidationError(format!(
            "server.identity_header {:?} is not a valid header name",
            config.server.identity_header
        )));
    }
    let checkout = &config.checkout;
    if checkout.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "checkout.poll_interval_ms must be greater than 0".to_string(),
        ));
    }
    if checkout.poll_interval_ms > checkout.wait_timeout_ms {
        return Err(ConfigError::ValidationError(format!(
            "checkout.poll_interval_ms ({}) must not exceed checkout.wait_timeout_ms ({})",
            checkout.poll_interval_ms, checkout.wait_timeout_ms
        )));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let api_base = match file_config.stripe.api_base {
        Some(url) => url,
        None => Url::parse(mercato_core::config::DEFAULT_API_BASE)?,
    };

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
            identity_header: file_config.server.identity_header.to_ascii_lowercase(),
        },
        stripe: StripeConfig {
            webhook_secret: file_config.stripe.webhook_secret.into_bytes().into_boxed_slice(),
            secret_key: file_config.stripe.secret_key,
            api_base,
            tolerance_secs: i64::from(file_config.stripe.tolerance_secs),
        },
        checkout: CheckoutConfig {
            wait_timeout: Duration::from_millis(file_config.checkout.wait_timeout_ms),
            poll_interval: Duration::from_millis(file_config.checkout.poll_interval_ms),
        },
        mail: file_config.mail.map(|m| MailConfig {
            endpoint: m.endpoint,
            api_key: m.api_key,
            from: m.from,
        }),
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
