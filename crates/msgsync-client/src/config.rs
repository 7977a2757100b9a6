//! Client configuration.

use std::time::Duration;

/// Configuration for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service (HTTPS); the API endpoint is `{base_url}/api`
    pub base_url: String,
    /// Stable caller-chosen identity, shared across reconnects
    pub client_id: String,
    /// Timeout bounding one batch exchange
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration with the default 10 second exchange timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the exchange timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MSGSYNC_BASE_URL`: service base URL (required)
    /// - `MSGSYNC_CLIENT_ID`: stable client identity (required)
    /// - `MSGSYNC_TIMEOUT_SECS`: exchange timeout in seconds
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("MSGSYNC_BASE_URL")
            .map_err(|_| ConfigError::Missing("MSGSYNC_BASE_URL"))?;
        let client_id = std::env::var("MSGSYNC_CLIENT_ID")
            .map_err(|_| ConfigError::Missing("MSGSYNC_CLIENT_ID"))?;

        let mut config = Self::new(base_url, client_id);
        if let Ok(value) = std::env::var("MSGSYNC_TIMEOUT_SECS") {
            let seconds: u64 = value
                .parse()
                .map_err(|_| ConfigError::Invalid("MSGSYNC_TIMEOUT_SECS", value))?;
            config.timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }
}

/// Errors loading configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is unset
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    /// An environment variable holds an unusable value
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
