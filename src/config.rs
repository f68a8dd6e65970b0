//! Runtime configuration for tudata
//!
//! Holds the provider access token, the cache directory, and the fixed delay
//! inserted between successive provider requests. The token comes from the
//! process environment at startup; everything else has defaults that the CLI
//! can override. All collaborators receive the configuration explicitly
//! rather than through global state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the TuShare Pro access token
pub const TOKEN_ENV_VAR: &str = "TUSHARE_TOKEN";

/// Default directory where cached tables are stored, relative to the
/// working directory
pub const DEFAULT_CACHE_DIR: &str = "data";

/// Default delay between successive provider requests
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(200);

/// Errors raised while assembling the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The provider token is absent from the environment
    #[error("{TOKEN_ENV_VAR} is not set; export your TuShare Pro token before running")]
    MissingToken,
}

/// Runtime configuration assembled at process start
#[derive(Debug, Clone)]
pub struct Config {
    /// TuShare Pro access token
    pub token: String,
    /// Directory where cached tables are stored
    pub cache_dir: PathBuf,
    /// Fixed delay between successive provider requests
    pub request_delay: Duration,
}

impl Config {
    /// Builds a configuration from the process environment.
    ///
    /// Reads the access token from `TUSHARE_TOKEN` and fills every other
    /// field with its default. A missing or blank token is an error here,
    /// at startup, rather than at the first provider request.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            token,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            request_delay: DEFAULT_REQUEST_DELAY,
        })
    }

    /// Returns the configuration with a custom cache directory
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Returns the configuration with a custom inter-request delay
    pub fn with_request_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }
}
