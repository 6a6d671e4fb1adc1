//! `PostgreSQL` repository implementation.
//!
//! Todos are stored as JSONB documents, one row per todo, in the `todos`
//! table. Timestamps live in their own columns so the collection can be
//! ordered without touching the document.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS todos (
//!     id TEXT PRIMARY KEY,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos (created_at);
//! ```

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::{NewTodo, Timestamp, Todo, TodoFields, TodoId, TodoPatch, TodoSchema};
use crate::infrastructure::{RepositoryError, RepositoryFuture, SortOrder, TodoRepository};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS todos (\
     id TEXT PRIMARY KEY, \
     data JSONB NOT NULL, \
     created_at TIMESTAMPTZ NOT NULL, \
     updated_at TIMESTAMPTZ NOT NULL)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos (created_at)";

const SELECT_NEWEST_FIRST: &str = "SELECT id, data, created_at, updated_at FROM todos \
     ORDER BY created_at DESC, id DESC";

const SELECT_OLDEST_FIRST: &str = "SELECT id, data, created_at, updated_at FROM todos \
     ORDER BY created_at ASC, id ASC";

/// Creates the `todos` table and its index if they do not exist yet.
///
/// # Errors
///
/// Returns `RepositoryError::DatabaseError` if a statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    for statement in [CREATE_TABLE, CREATE_INDEX] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;
    }
    Ok(())
}

// =============================================================================
// Row Mapping
// =============================================================================

/// JSONB document body of a todo row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TodoDocument {
    title: String,
    description: String,
    completed: bool,
}

type TodoRow = (String, serde_json::Value, DateTime<Utc>, DateTime<Utc>);

fn todo_from_row((id, data, created_at, updated_at): TodoRow) -> Result<Todo, RepositoryError> {
    let document: TodoDocument = serde_json::from_value(data)
        .map_err(|error| RepositoryError::SerializationError(error.to_string()))?;

    Ok(Todo {
        id: TodoId::new(id),
        title: document.title,
        description: document.description,
        completed: document.completed,
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

/// Builds the JSONB object merged into the stored document on update.
///
/// Only supplied fields appear in the object, so `data || patch` leaves the
/// others untouched.
fn patch_document(patch: &TodoPatch) -> serde_json::Value {
    let mut document = serde_json::Map::new();
    if let Some(title) = &patch.title {
        document.insert("title".to_string(), serde_json::Value::from(title.as_str()));
    }
    if let Some(description) = &patch.description {
        document.insert(
            "description".to_string(),
            serde_json::Value::from(description.as_str()),
        );
    }
    if let Some(completed) = patch.completed {
        document.insert("completed".to_string(), serde_json::Value::from(completed));
    }
    serde_json::Value::Object(document)
}

// =============================================================================
// PostgreSQL Todo Repository
// =============================================================================

/// `PostgreSQL` implementation of `TodoRepository`.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/todos").await?;
/// ensure_schema(&pool).await?;
/// let repository = PostgresTodoRepository::new(pool);
/// let todos = repository.find_all(SortOrder::NewestFirst).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTodoRepository {
    pool: PgPool,
}

impl PostgresTodoRepository {
    /// Creates a new repository over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TodoRepository for PostgresTodoRepository {
    fn create(&self, new_todo: NewTodo) -> RepositoryFuture<Todo> {
        let pool = self.pool.clone();
        async move {
            let TodoFields {
                title,
                description,
                completed,
            } = TodoSchema::validate_new(new_todo)?;
            let document = TodoDocument {
                title,
                description,
                completed,
            };
            let data = serde_json::to_value(&document)
                .map_err(|error| RepositoryError::SerializationError(error.to_string()))?;

            let row: TodoRow = sqlx::query_as(
                "INSERT INTO todos (id, data, created_at, updated_at) VALUES ($1, $2, $3, $3) \
                 RETURNING id, data, created_at, updated_at",
            )
            .bind(TodoId::generate().as_str())
            .bind(&data)
            .bind(Timestamp::now().as_datetime())
            .fetch_one(&pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

            todo_from_row(row)
        }
        .boxed()
    }

    fn find_all(&self, order: SortOrder) -> RepositoryFuture<Vec<Todo>> {
        let pool = self.pool.clone();
        async move {
            let statement = match order {
                SortOrder::NewestFirst => SELECT_NEWEST_FIRST,
                SortOrder::OldestFirst => SELECT_OLDEST_FIRST,
            };

            let rows: Vec<TodoRow> = sqlx::query_as(statement)
                .fetch_all(&pool)
                .await
                .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

            rows.into_iter()
                .map(todo_from_row)
                .collect::<Result<Vec<_>, _>>()
        }
        .boxed()
    }

    fn find_by_id(&self, id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        let pool = self.pool.clone();
        let id = id.clone();
        async move {
            let row: Option<TodoRow> = sqlx::query_as(
                "SELECT id, data, created_at, updated_at FROM todos WHERE id = $1",
            )
            .bind(id.as_str())
            .fetch_optional(&pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

            row.map(todo_from_row).transpose()
        }
        .boxed()
    }

    fn update_by_id(&self, id: &TodoId, patch: TodoPatch) -> RepositoryFuture<Option<Todo>> {
        let pool = self.pool.clone();
        let id = id.clone();
        async move {
            let patch = TodoSchema::validate_patch(patch)?;

            let row: Option<TodoRow> = sqlx::query_as(
                "UPDATE todos SET data = data || $2, updated_at = $3 WHERE id = $1 \
                 RETURNING id, data, created_at, updated_at",
            )
            .bind(id.as_str())
            .bind(patch_document(&patch))
            .bind(Timestamp::now().as_datetime())
            .fetch_optional(&pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

            row.map(todo_from_row).transpose()
        }
        .boxed()
    }

    fn delete_by_id(&self, id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        let pool = self.pool.clone();
        let id = id.clone();
        async move {
            let row: Option<TodoRow> = sqlx::query_as(
                "DELETE FROM todos WHERE id = $1 RETURNING id, data, created_at, updated_at",
            )
            .bind(id.as_str())
            .fetch_optional(&pool)
            .await
            .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;

            row.map(todo_from_row).transpose()
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
