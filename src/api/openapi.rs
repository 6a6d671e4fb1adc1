//! OpenAPI document and interactive docs page.
//!
//! The document is generated from the `#[utoipa::path]` annotations on the
//! handlers and served at `/api-docs/openapi.json`; `/api-docs` serves a
//! Swagger UI page that loads its assets from a CDN.

use axum::{Json, response::Html};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use super::dto::{CreateTodoBody, TodoResponse, UpdateTodoBody};
use super::error::{ErrorResponse, FieldError, ViolationCode};
use super::handlers::{self, HealthResponse};
use super::validation::ValidationFailure;

/// Path of the generated OpenAPI document.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

// =============================================================================
// Envelope Schemas
// =============================================================================

/// `{ success, data }` envelope around a single todo.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodoEnvelope {
    pub success: bool,
    pub data: TodoResponse,
}

/// `{ success, count, data }` envelope around the todo list.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodoListEnvelope {
    pub success: bool,
    pub count: usize,
    pub data: Vec<TodoResponse>,
}

/// Body of a successful delete. `data` is always `null`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedEnvelope {
    pub success: bool,
    pub data: Option<TodoResponse>,
    pub message: String,
}

// =============================================================================
// Document
// =============================================================================

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Todo API",
        description = "CRUD API for todo items with request validation"
    ),
    paths(
        handlers::create_todo,
        handlers::list_todos,
        handlers::get_todo,
        handlers::update_todo,
        handlers::delete_todo,
        handlers::health_check,
    ),
    components(schemas(
        TodoResponse,
        CreateTodoBody,
        UpdateTodoBody,
        TodoEnvelope,
        TodoListEnvelope,
        DeletedEnvelope,
        ErrorResponse,
        ValidationFailure,
        FieldError,
        ViolationCode,
        HealthResponse,
    )),
    tags((name = "todos", description = "Todo management"))
)]
pub struct ApiDoc;

/// Serves the OpenAPI document.
pub async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

const SWAGGER_UI_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Todo API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api-docs/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

/// Serves the Swagger UI page.
pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_PAGE)
}
