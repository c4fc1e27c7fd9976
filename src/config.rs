//! Server configuration from environment variables

use std::env;
use std::time::Duration;

/// Per-fetch deadline applied when nothing else is configured
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Maximum in-flight vendor fetches per request in concurrent mode
pub const MAX_CONCURRENT: usize = 3;

/// Admissions allowed per client within one window
pub const RATE_LIMIT: u32 = 20;

/// Sliding window length in milliseconds
pub const RATE_WINDOW_MS: u64 = 60_000;

/// Timestamps retained per client record, raised to the limit when larger
pub const MAX_TRACKED_TIMESTAMPS: usize = 100;

/// Header carrying the trusted connecting-client address
pub const DEFAULT_CLIENT_IP_HEADER: &str = "CF-Connecting-IP";

/// Configuration for the aggregation server
///
/// Loaded from environment variables with defaults matching the
/// constants above.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to
    pub bind_addr: String,

    /// Deadline for a single vendor fetch in milliseconds
    pub fetch_timeout_ms: u64,

    /// Concurrent fetch bound for `order=concurrent`
    pub max_concurrent: usize,

    /// Admissions per client per window
    pub rate_limit: u32,

    /// Sliding window length in milliseconds
    pub rate_window_ms: u64,

    /// Request header used to derive the client identity
    pub client_ip_header: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `IPFUSION_BIND_ADDR` (default: 0.0.0.0:8787)
    /// - `IPFUSION_FETCH_TIMEOUT_MS` (default: 5000)
    /// - `IPFUSION_MAX_CONCURRENT` (default: 3)
    /// - `IPFUSION_RATE_LIMIT` (default: 20)
    /// - `IPFUSION_RATE_WINDOW_MS` (default: 60000)
    /// - `IPFUSION_CLIENT_IP_HEADER` (default: CF-Connecting-IP)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable numbers fall back to their defaults, the same way an
    /// unset variable does.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            bind_addr: lookup("IPFUSION_BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8787".to_string()),

            fetch_timeout_ms: lookup("IPFUSION_FETCH_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),

            max_concurrent: lookup("IPFUSION_MAX_CONCURRENT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONCURRENT)
                .max(1),

            rate_limit: lookup("IPFUSION_RATE_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RATE_LIMIT),

            rate_window_ms: lookup("IPFUSION_RATE_WINDOW_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RATE_WINDOW_MS),

            client_ip_header: lookup("IPFUSION_CLIENT_IP_HEADER")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CLIENT_IP_HEADER.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "IPFUSION_BIND_ADDR must be a socket address, got '{}'",
                self.bind_addr
            )));
        }

        if self.rate_window_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "IPFUSION_RATE_WINDOW_MS must be greater than zero".to_string(),
            ));
        }

        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "IPFUSION_FETCH_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8787".to_string(),
            fetch_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent: MAX_CONCURRENT,
            rate_limit: RATE_LIMIT,
            rate_window_ms: RATE_WINDOW_MS,
            client_ip_header: DEFAULT_CLIENT_IP_HEADER.to_string(),
        }
    }
}
