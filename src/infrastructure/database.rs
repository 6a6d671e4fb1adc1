//! Owned `PostgreSQL` connection handle.
//!
//! The entry point constructs one [`Database`], connects it, hands clones of
//! the pool to repositories and closes it after the server stops.

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use super::postgres::ensure_schema;

/// Default size of the connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Errors of the connection lifecycle.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The handle was used before a successful `connect`.
    #[error("Database not connected")]
    NotConnected,

    /// The connection string could not be parsed.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    /// Connecting or preparing the schema failed.
    #[error("Database connection error: {0}")]
    Connection(String),
}

/// Handle owning the `PostgreSQL` connection pool.
#[derive(Debug)]
pub struct Database {
    url: String,
    max_connections: u32,
    pool: Option<PgPool>,
}

impl Database {
    /// Creates an unconnected handle.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            pool: None,
        }
    }

    /// Sets the maximum size of the connection pool.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Opens the pool and creates the `todos` table if needed.
    ///
    /// Calling `connect` on a connected handle does nothing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the URL is invalid, the server cannot be
    /// reached, or the schema cannot be created.
    pub async fn connect(&mut self) -> Result<(), DatabaseError> {
        if self.pool.is_some() {
            tracing::debug!("Database already connected");
            return Ok(());
        }

        let options: PgConnectOptions = self
            .url
            .parse()
            .map_err(|error: sqlx::Error| DatabaseError::InvalidUrl(error.to_string()))?;
        let host = options.get_host().to_string();

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await
            .map_err(|error| DatabaseError::Connection(error.to_string()))?;

        ensure_schema(&pool)
            .await
            .map_err(|error| DatabaseError::Connection(error.to_string()))?;

        tracing::info!(%host, max_connections = self.max_connections, "Database connected");
        self.pool = Some(pool);
        Ok(())
    }

    /// Returns the connection pool.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotConnected` before a successful `connect`.
    pub fn connection(&self) -> Result<PgPool, DatabaseError> {
        self.pool.clone().ok_or(DatabaseError::NotConnected)
    }

    /// Returns true once `connect` has succeeded.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::info!("Database connection closed");
        }
    }
}
