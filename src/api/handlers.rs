//! HTTP handlers for the Todo API.
//!
//! Each handler receives its input already validated, calls the repository
//! and maps the outcome to a success envelope or an [`AppError`].
//!
//! Failure policy: a missing todo is reported as `404 Todo not found`; any
//! repository failure is logged and wrapped into the operation's own error
//! with the repository error kept as its cause.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::dto::{
    ApiResponse, CreateTodoBody, CreateTodoRequest, TodoPathRequest, TodoResponse,
    UpdateTodoBody, UpdateTodoRequest,
};
use super::error::{AppError, ErrorResponse};
use super::openapi::{DeletedEnvelope, TodoEnvelope, TodoListEnvelope};
use super::validation::{Validated, ValidationFailure};
use crate::config::Environment;
use crate::domain::{NewTodo, TodoId, TodoPatch};
use crate::infrastructure::{RepositoryError, SortOrder, TodoRepository};

/// Message of the domain error raised for unknown ids.
pub const TODO_NOT_FOUND: &str = "Todo not found";

// =============================================================================
// Application State
// =============================================================================

/// Runtime settings visible to handlers and middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: Environment,
}

/// Shared application dependencies.
#[derive(Clone)]
pub struct AppState {
    pub todo_repository: Arc<dyn TodoRepository>,
    pub config: AppConfig,
}

impl AppState {
    /// Creates a new `AppState`.
    #[must_use]
    pub fn new(todo_repository: Arc<dyn TodoRepository>, config: AppConfig) -> Self {
        Self {
            todo_repository,
            config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("todo_repository", &"Arc<dyn TodoRepository>")
            .field("config", &self.config)
            .finish()
    }
}

/// Wraps a repository failure into the operation's domain error.
fn operation_failed(
    operation: &'static str,
    status: StatusCode,
    message: &'static str,
    error: RepositoryError,
) -> AppError {
    tracing::error!(operation, %error, "Repository operation failed");
    AppError::domain(status, message).with_cause(error)
}

// =============================================================================
// POST /api/todos
// =============================================================================

/// Creates a new todo.
///
/// # Request Body
///
/// ```json
/// { "title": "Buy milk", "description": "Optional", "completed": false }
/// ```
///
/// `completed` is validated but not stored; a new todo always starts
/// incomplete.
///
/// # Response
///
/// - **201 Created**: `{ "success": true, "data": <todo> }`
/// - **400 Bad Request**: validation failed, or the record was rejected
///   (`Failed to create todo`, with the rejection message in `errors`)
///
/// # Errors
///
/// Returns [`AppError`] if the repository rejects or fails the write.
#[utoipa::path(
    post,
    path = "/api/todos",
    tag = "todos",
    request_body = CreateTodoBody,
    responses(
        (status = 201, description = "Todo created", body = TodoEnvelope),
        (status = 400, description = "Validation failed", body = ValidationFailure),
        (status = 500, description = "Unexpected failure", body = ErrorResponse),
    )
)]
pub async fn create_todo(
    State(state): State<AppState>,
    Validated(request): Validated<CreateTodoRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TodoResponse>>), AppError> {
    let body = request.body;
    let new_todo = NewTodo {
        title: Some(body.title),
        description: Some(body.description.unwrap_or_default()),
        completed: None,
    };

    let todo = state
        .todo_repository
        .create(new_todo)
        .await
        .map_err(|error| {
            let details = error.to_string();
            operation_failed(
                "create",
                StatusCode::BAD_REQUEST,
                "Failed to create todo",
                error,
            )
            .with_details(details)
        })?;

    tracing::debug!(id = %todo.id, "Todo created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(TodoResponse::from(todo))),
    ))
}

// =============================================================================
// GET /api/todos
// =============================================================================

/// Lists every todo, newest first.
///
/// # Response
///
/// - **200 OK**: `{ "success": true, "count": n, "data": [<todo>...] }`
///
/// # Errors
///
/// Returns `500 Failed to fetch todos` if the repository fails.
#[utoipa::path(
    get,
    path = "/api/todos",
    tag = "todos",
    responses(
        (status = 200, description = "All todos, newest first", body = TodoListEnvelope),
        (status = 500, description = "Failed to fetch todos", body = ErrorResponse),
    )
)]
pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TodoResponse>>>, AppError> {
    let todos = state
        .todo_repository
        .find_all(SortOrder::NewestFirst)
        .await
        .map_err(|error| {
            operation_failed(
                "list",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch todos",
                error,
            )
        })?;

    Ok(Json(ApiResponse::list(
        todos.into_iter().map(TodoResponse::from).collect(),
    )))
}

// =============================================================================
// GET /api/todos/{id}
// =============================================================================

/// Fetches one todo.
///
/// # Errors
///
/// Returns `404 Todo not found` for an unknown id and
/// `500 Failed to fetch todo` if the repository fails.
#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    tag = "todos",
    params(("id" = String, Path, description = "Todo id")),
    responses(
        (status = 200, description = "The todo", body = TodoEnvelope),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Failed to fetch todo", body = ErrorResponse),
    )
)]
pub async fn get_todo(
    State(state): State<AppState>,
    Validated(request): Validated<TodoPathRequest>,
) -> Result<Json<ApiResponse<TodoResponse>>, AppError> {
    let id = TodoId::new(request.params.id);

    let todo = state
        .todo_repository
        .find_by_id(&id)
        .await
        .map_err(|error| {
            operation_failed(
                "get",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch todo",
                error,
            )
        })?
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;

    Ok(Json(ApiResponse::data(TodoResponse::from(todo))))
}

// =============================================================================
// PUT /api/todos/{id}
// =============================================================================

/// Applies a partial update; omitted fields keep their stored values.
///
/// # Errors
///
/// Returns `404 Todo not found` for an unknown id and
/// `500 Failed to update todo` if the repository rejects or fails the write.
#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    tag = "todos",
    params(("id" = String, Path, description = "Todo id")),
    request_body = UpdateTodoBody,
    responses(
        (status = 200, description = "The updated todo", body = TodoEnvelope),
        (status = 400, description = "Validation failed", body = ValidationFailure),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Failed to update todo", body = ErrorResponse),
    )
)]
pub async fn update_todo(
    State(state): State<AppState>,
    Validated(request): Validated<UpdateTodoRequest>,
) -> Result<Json<ApiResponse<TodoResponse>>, AppError> {
    let id = TodoId::new(request.params.id);
    let patch = TodoPatch {
        title: request.body.title,
        description: request.body.description,
        completed: request.body.completed,
    };

    let todo = state
        .todo_repository
        .update_by_id(&id, patch)
        .await
        .map_err(|error| {
            operation_failed(
                "update",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update todo",
                error,
            )
        })?
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;

    Ok(Json(ApiResponse::data(TodoResponse::from(todo))))
}

// =============================================================================
// DELETE /api/todos/{id}
// =============================================================================

/// Deletes a todo.
///
/// # Response
///
/// - **200 OK**: `{ "success": true, "data": null, "message": "Todo deleted successfully" }`
///
/// # Errors
///
/// Returns `404 Todo not found` for an unknown id and
/// `500 Failed to delete todo` if the repository fails.
#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    tag = "todos",
    params(("id" = String, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo deleted", body = DeletedEnvelope),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 500, description = "Failed to delete todo", body = ErrorResponse),
    )
)]
pub async fn delete_todo(
    State(state): State<AppState>,
    Validated(request): Validated<TodoPathRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = TodoId::new(request.params.id);

    state
        .todo_repository
        .delete_by_id(&id)
        .await
        .map_err(|error| {
            operation_failed(
                "delete",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete todo",
                error,
            )
        })?
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;

    tracing::debug!(%id, "Todo deleted");
    Ok(Json(ApiResponse::deleted()))
}

// =============================================================================
// Health Check and Fallback
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Answers requests that match no route.
pub async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// Answers requests to a known path with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::domain(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::{CreateTodoBody, TodoPath, UpdateTodoBody};
    use crate::infrastructure::InMemoryTodoRepository;
    use rstest::rstest;

    fn state() -> AppState {
        AppState::new(
            Arc::new(InMemoryTodoRepository::new()),
            AppConfig::default(),
        )
    }

    fn create_request(title: &str) -> Validated<CreateTodoRequest> {
        Validated(CreateTodoRequest {
            body: CreateTodoBody {
                title: title.to_string(),
                description: None,
                completed: false,
            },
        })
    }

    fn path_request(id: &str) -> Validated<TodoPathRequest> {
        Validated(TodoPathRequest {
            params: TodoPath { id: id.to_string() },
        })
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_todo_defaults_description() {
        let (status, Json(response)) = create_todo(State(state()), create_request("  Buy milk "))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(response.success);
        assert_eq!(response.data.title, "Buy milk");
        assert_eq!(response.data.description, "");
        assert!(!response.data.completed);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_todo_rejected_by_schema() {
        let error = create_todo(State(state()), create_request("   "))
            .await
            .unwrap_err();

        match error {
            AppError::Domain {
                status,
                message,
                details,
                cause,
            } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "Failed to create todo");
                assert_eq!(
                    details,
                    Some(serde_json::Value::from(
                        "Todo validation failed: title: Title is required"
                    ))
                );
                assert!(cause.is_some());
            }
            other => panic!("Expected domain error, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_get_todo_unknown_id_is_not_found() {
        let error = get_todo(State(state()), path_request("not-an-id"))
            .await
            .unwrap_err();

        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), TODO_NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_then_delete() {
        let state = state();
        let (_, Json(created)) = create_todo(State(state.clone()), create_request("Buy milk"))
            .await
            .unwrap();
        let id = created.data.id.clone();

        let Json(updated) = update_todo(
            State(state.clone()),
            Validated(UpdateTodoRequest {
                params: TodoPath { id: id.clone() },
                body: UpdateTodoBody {
                    completed: Some(true),
                    ..UpdateTodoBody::default()
                },
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.data.title, "Buy milk");
        assert!(updated.data.completed);
        assert_eq!(updated.data.created_at, created.data.created_at);

        let Json(deleted) = delete_todo(State(state.clone()), path_request(&id))
            .await
            .unwrap();
        assert_eq!(deleted.message.as_deref(), Some("Todo deleted successfully"));

        let error = delete_todo(State(state), path_request(&id))
            .await
            .unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_todos_counts() {
        let state = state();
        for title in ["one", "two"] {
            create_todo(State(state.clone()), create_request(title))
                .await
                .unwrap();
        }

        let Json(response) = list_todos(State(state)).await.unwrap();

        assert_eq!(response.count, Some(2));
        assert_eq!(response.data[0].title, "two");
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
