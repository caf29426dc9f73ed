//! services/admin_client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Deployed backend, used whenever the client runs outside a local host.
pub const PRODUCTION_API_URL: &str = "https://bnp-backend.vercel.app";
pub const LOCAL_API_URL: &str = "http://localhost:5000";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub log_level: Level,
    pub login_timeout: Duration,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    pub expiry_warning: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: LOCAL_API_URL.to_string(),
            session_path: PathBuf::from("./.kyc-session.json"),
            log_level: Level::INFO,
            login_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            upload_timeout: Duration::from_secs(300),
            expiry_warning: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Backend Selection ---
        let api_base_url = match lookup("API_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => resolve_api_url(lookup("APP_HOSTNAME").as_deref()).to_string(),
        };
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }

        let session_path = lookup("SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_path);

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Timeouts ---
        let login_timeout = seconds(&lookup, "LOGIN_TIMEOUT_SECS", defaults.login_timeout)?;
        let request_timeout = seconds(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout)?;
        let upload_timeout = seconds(&lookup, "UPLOAD_TIMEOUT_SECS", defaults.upload_timeout)?;
        let expiry_warning = seconds(&lookup, "EXPIRY_WARNING_SECS", defaults.expiry_warning)?;

        Ok(Self {
            api_base_url,
            session_path,
            log_level,
            login_timeout,
            request_timeout,
            upload_timeout,
            expiry_warning,
        })
    }
}

/// Picks the backend the same way the browser build did: anything that is not
/// a local host talks to the deployed backend.
pub fn resolve_api_url(hostname: Option<&str>) -> &'static str {
    match hostname {
        Some(host) if host != "localhost" && host != "127.0.0.1" => PRODUCTION_API_URL,
        _ => LOCAL_API_URL,
    }
}

fn seconds<F>(lookup: &F, name: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}
