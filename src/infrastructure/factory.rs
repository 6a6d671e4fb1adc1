//! Repository factory for runtime backend selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default `5`)
//!
//! # Example
//!
//! ```ignore
//! let config = RepositoryConfig::from_env()?;
//! let repositories = RepositoryFactory::new(config).create().await?;
//! let todos = repositories.todo_repository.find_all(SortOrder::NewestFirst).await?;
//! ```

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use super::database::{DEFAULT_MAX_CONNECTIONS, Database, DatabaseError};
use super::{InMemoryTodoRepository, PostgresTodoRepository, TodoRepository};
use crate::config::{ConfigurationError, env_lookup};

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend of the todo collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local storage, lost on exit.
    #[default]
    InMemory,
    /// `PostgreSQL` storage.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl RepositoryConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` or `DATABASE_MAX_CONNECTIONS` contains an invalid value
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(env_lookup)
    }

    /// Creates a configuration from variables resolved by `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`RepositoryConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_mode: StorageMode = lookup("STORAGE_MODE")
            .map(|value| value.parse())
            .transpose()?
            .unwrap_or_default();

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .map(|value| {
                value
                    .parse::<u32>()
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or(ConfigurationError::InvalidMaxConnections(value))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let config = Self {
            storage_mode,
            database_url: lookup("DATABASE_URL"),
            max_connections,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if Postgres storage is
    /// selected without a URL.
    pub const fn validate(&self) -> Result<(), ConfigurationError> {
        if matches!(self.storage_mode, StorageMode::Postgres) && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Repositories created by the factory.
///
/// `database` is present only for Postgres storage; the caller owns it and
/// closes it on shutdown.
pub struct Repositories {
    pub todo_repository: Arc<dyn TodoRepository>,
    pub database: Option<Database>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("todo_repository", &"Arc<dyn TodoRepository>")
            .field("database", &self.database)
            .finish()
    }
}

/// Factory for creating repository instances based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates the todo repository, connecting to the database if needed.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the configuration is invalid or the
    /// database connection fails.
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => {
                tracing::info!("Using in-memory storage");
                Ok(Repositories {
                    todo_repository: Arc::new(InMemoryTodoRepository::new()),
                    database: None,
                })
            }
            StorageMode::Postgres => {
                let database_url = self
                    .config
                    .database_url
                    .as_ref()
                    .ok_or(ConfigurationError::MissingDatabaseUrl)?;

                let mut database = Database::new(database_url.as_str())
                    .with_max_connections(self.config.max_connections);
                database.connect().await?;
                let pool = database.connection()?;

                tracing::info!("Using PostgreSQL storage");
                Ok(Repositories {
                    todo_repository: Arc::new(PostgresTodoRepository::new(pool)),
                    database: Some(database),
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::SortOrder;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let variables: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        move |name: &str| variables.get(name).cloned()
    }

    // -------------------------------------------------------------------------
    // StorageMode Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[case("in_memory", StorageMode::InMemory)]
    #[case("memory", StorageMode::InMemory)]
    #[case("IN_MEMORY", StorageMode::InMemory)]
    #[case("postgres", StorageMode::Postgres)]
    #[case("pg", StorageMode::Postgres)]
    fn test_storage_mode_from_str_valid(#[case] input: &str, #[case] expected: StorageMode) {
        assert_eq!(input.parse::<StorageMode>().unwrap(), expected);
    }

    #[rstest]
    #[case("mongodb")]
    #[case("")]
    fn test_storage_mode_from_str_invalid(#[case] input: &str) {
        assert_eq!(
            input.parse::<StorageMode>(),
            Err(ConfigurationError::InvalidStorageMode(input.to_string()))
        );
    }

    // -------------------------------------------------------------------------
    // RepositoryConfig Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_config_defaults_to_in_memory() {
        let config = RepositoryConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, RepositoryConfig::default());
    }

    #[rstest]
    fn test_config_postgres_requires_url() {
        let result = RepositoryConfig::from_lookup(lookup_from(&[("STORAGE_MODE", "postgres")]));
        assert_eq!(result, Err(ConfigurationError::MissingDatabaseUrl));
    }

    #[rstest]
    fn test_config_postgres_with_url() {
        let config = RepositoryConfig::from_lookup(lookup_from(&[
            ("STORAGE_MODE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/todos"),
            ("DATABASE_MAX_CONNECTIONS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.storage_mode, StorageMode::Postgres);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/todos")
        );
        assert_eq!(config.max_connections, 10);
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("many")]
    fn test_config_rejects_invalid_pool_size(#[case] value: &str) {
        let result =
            RepositoryConfig::from_lookup(lookup_from(&[("DATABASE_MAX_CONNECTIONS", value)]));
        assert_eq!(
            result,
            Err(ConfigurationError::InvalidMaxConnections(value.to_string()))
        );
    }

    // -------------------------------------------------------------------------
    // Factory Tests
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_factory_creates_in_memory_repository() {
        let repositories = RepositoryFactory::new(RepositoryConfig::default())
            .create()
            .await
            .unwrap();

        assert!(repositories.database.is_none());
        let todos = repositories
            .todo_repository
            .find_all(SortOrder::NewestFirst)
            .await
            .unwrap();
        assert!(todos.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_factory_postgres_without_url_fails() {
        let config = RepositoryConfig {
            storage_mode: StorageMode::Postgres,
            ..RepositoryConfig::default()
        };

        let result = RepositoryFactory::new(config).create().await;

        assert!(matches!(
            result,
            Err(FactoryError::Configuration(
                ConfigurationError::MissingDatabaseUrl
            ))
        ));
    }
}
