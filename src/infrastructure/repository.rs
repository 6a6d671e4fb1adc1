//! Persistence gateway for todos.
//!
//! The [`TodoRepository`] trait is the only seam through which the rest of the
//! crate reaches the document store. Every method returns a boxed future, so
//! implementations can be selected at runtime behind `Arc<dyn TodoRepository>`.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{NewTodo, SchemaError, Todo, TodoId, TodoPatch};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone)]
pub enum RepositoryError {
    /// The write was rejected by the document schema.
    #[error(transparent)]
    Validation(#[from] SchemaError),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Future returned by every repository operation.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

// =============================================================================
// Sorting
// =============================================================================

/// Ordering of `find_all` results by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// `createdAt` descending.
    #[default]
    NewestFirst,
    /// `createdAt` ascending.
    OldestFirst,
}

// =============================================================================
// Todo Repository
// =============================================================================

/// Repository trait for the todo collection.
///
/// Implementations apply [`TodoSchema`](crate::domain::TodoSchema) on every
/// write and assign identifiers and timestamps themselves.
pub trait TodoRepository: Send + Sync {
    /// Inserts a new todo.
    ///
    /// Fails with [`RepositoryError::Validation`] if the fields violate the
    /// document schema.
    fn create(&self, new_todo: NewTodo) -> RepositoryFuture<Todo>;

    /// Returns every todo in the requested order.
    fn find_all(&self, order: SortOrder) -> RepositoryFuture<Vec<Todo>>;

    /// Finds a todo by its ID.
    ///
    /// Returns `Ok(None)` if no todo has this ID.
    fn find_by_id(&self, id: &TodoId) -> RepositoryFuture<Option<Todo>>;

    /// Applies the supplied fields of `patch` to a todo.
    ///
    /// Returns the updated todo, or `Ok(None)` if no todo has this ID.
    fn update_by_id(&self, id: &TodoId, patch: TodoPatch) -> RepositoryFuture<Option<Todo>>;

    /// Removes a todo.
    ///
    /// Returns the removed todo, or `Ok(None)` if no todo has this ID.
    fn delete_by_id(&self, id: &TodoId) -> RepositoryFuture<Option<Todo>>;
}

// =============================================================================
// Tests
// =============================================================================
