//! Infrastructure layer for persistence.
//!
//! This module contains the repository trait, its in-memory and `PostgreSQL`
//! implementations, the owned database handle and the factory selecting a
//! backend at startup.

pub mod database;
pub mod factory;
mod in_memory;
mod postgres;
mod repository;

pub use database::{Database, DatabaseError};
pub use factory::{FactoryError, Repositories, RepositoryConfig, RepositoryFactory, StorageMode};
pub use in_memory::InMemoryTodoRepository;
pub use postgres::{PostgresTodoRepository, ensure_schema};
pub use repository::{RepositoryError, RepositoryFuture, SortOrder, TodoRepository};
