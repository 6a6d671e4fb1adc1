//! Process configuration read from environment variables.
//!
//! # Environment Variables
//!
//! - `APP_ENV`: `development` | `production` (default) | `test`
//! - `HOST`: bind host (default `0.0.0.0`)
//! - `PORT`: bind port (default `5000`)
//! - `LOG_FORMAT`: `pretty` (default) | `json`
//!
//! Storage variables are read by
//! [`RepositoryConfig`](crate::infrastructure::RepositoryConfig).
//!
//! Every reader takes a lookup function so configuration can be built from a
//! fixed map in tests instead of the process environment.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 5000;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid `APP_ENV` value.
    #[error("Invalid environment: '{0}'. Expected 'development', 'production' or 'test'")]
    InvalidEnvironment(String),

    /// Invalid `LOG_FORMAT` value.
    #[error("Invalid log format: '{0}'. Expected 'pretty' or 'json'")]
    InvalidLogFormat(String),

    /// `PORT` is not a valid port number.
    #[error("Invalid port: '{0}'")]
    InvalidPort(String),

    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    /// `DATABASE_MAX_CONNECTIONS` is not a positive integer.
    #[error("Invalid DATABASE_MAX_CONNECTIONS: '{0}'")]
    InvalidMaxConnections(String),
}

/// Reads a variable from the process environment.
///
/// Empty and whitespace-only values are treated as unset.
#[must_use]
pub fn env_lookup(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
    Test,
}

impl Environment {
    /// Returns true if error responses may carry diagnostic stacks.
    #[must_use]
    pub const fn exposes_stack(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name of the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(ConfigurationError::InvalidEnvironment(value.to_string())),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigurationError::InvalidLogFormat(value.to_string())),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration of the HTTP server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: Environment::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the server configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(env_lookup)
    }

    /// Reads the server configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: Environment = lookup("APP_ENV")
            .map(|value| value.parse())
            .transpose()?
            .unwrap_or_default();

        let log_format: LogFormat = lookup("LOG_FORMAT")
            .map(|value| value.parse())
            .transpose()?
            .unwrap_or_default();

        let port = lookup("PORT")
            .map(|value| {
                value
                    .parse::<u16>()
                    .map_err(|_| ConfigurationError::InvalidPort(value.clone()))
            })
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            environment,
            log_format,
        })
    }

    /// Returns the `host:port` address to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
