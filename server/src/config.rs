//! Configuration management for the server.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Connection details for the hosted backend service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Project URL, without trailing slash
    pub url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Backend service; `None` runs every store in local-only mode
    pub backend: Option<BackendConfig>,
    /// Directory holding the local snapshots
    pub data_dir: PathBuf,
    /// Where unauthenticated callers are sent
    pub login_redirect: String,
    /// Timeout for backend requests
    pub request_timeout: Duration,
    /// Link in the confirmation email sent on sign-up
    pub signup_redirect: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let var_or_public =
            |key: &str| var(key).or_else(|| var(&format!("NEXT_PUBLIC_{key}")));

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let backend = match (var_or_public("SUPABASE_URL"), var_or_public("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(BackendConfig {
                url: url.trim().trim_end_matches('/').to_string(),
                anon_key: anon_key.trim().to_string(),
            }),
            _ => None,
        };

        let data_dir = var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let login_redirect = var("LOGIN_REDIRECT").unwrap_or_else(|| "/login".to_string());

        let timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidTimeout)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let signup_redirect = var("SIGNUP_REDIRECT");

        Ok(Self {
            host,
            port,
            backend,
            data_dir,
            login_redirect,
            request_timeout: Duration::from_secs(timeout_secs),
            signup_redirect,
        })
    }

    pub fn is_backend_configured(&self) -> bool {
        self.backend.is_some()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid REQUEST_TIMEOUT_SECS value, expected a positive number of seconds")]
    InvalidTimeout,
}
