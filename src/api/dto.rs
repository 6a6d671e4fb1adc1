//! Data Transfer Objects (DTOs) for API requests and responses.
//!
//! Request DTOs mirror the normalized output of request validation: each
//! one is deserialized from the `{ body, params, query }` object produced by
//! its declared [`RequestSchema`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{FieldRule, ObjectSchema, RequestSchema, ValidateRequest};
use crate::domain::Todo;

// =============================================================================
// Request Schemas
// =============================================================================

fn todo_path_schema() -> ObjectSchema {
    ObjectSchema::new().field("id", FieldRule::text().min_length(1, "Todo ID is required"))
}

/// Route parameters of `/api/todos/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TodoPath {
    pub id: String,
}

/// Request of `GET` and `DELETE /api/todos/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TodoPathRequest {
    pub params: TodoPath,
}

impl ValidateRequest for TodoPathRequest {
    fn schema() -> RequestSchema {
        RequestSchema::new().params(todo_path_schema())
    }
}

/// Body of `POST /api/todos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct CreateTodoBody {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

/// Request of `POST /api/todos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTodoRequest {
    pub body: CreateTodoBody,
}

impl ValidateRequest for CreateTodoRequest {
    fn schema() -> RequestSchema {
        RequestSchema::new().body(
            ObjectSchema::new()
                .field("title", FieldRule::text().min_length(1, "Title is required"))
                .field("description", FieldRule::text().optional())
                .field("completed", FieldRule::boolean().default_value(false)),
        )
    }
}

/// Body of `PUT /api/todos/{id}`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct UpdateTodoBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Request of `PUT /api/todos/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateTodoRequest {
    pub params: TodoPath,
    pub body: UpdateTodoBody,
}

impl ValidateRequest for UpdateTodoRequest {
    fn schema() -> RequestSchema {
        RequestSchema::new().params(todo_path_schema()).body(
            ObjectSchema::new()
                .field(
                    "title",
                    FieldRule::text()
                        .min_length(1, "Title is required")
                        .optional(),
                )
                .field("description", FieldRule::text().optional())
                .field("completed", FieldRule::boolean().optional()),
        )
    }
}

// =============================================================================
// Response DTOs
// =============================================================================

/// Todo as rendered in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// RFC 3339 with millisecond precision.
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Todo> for TodoResponse {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.to_string(),
            title: todo.title.clone(),
            description: todo.description.clone(),
            completed: todo.completed,
            created_at: todo.created_at.to_rfc3339(),
            updated_at: todo.updated_at.to_rfc3339(),
        }
    }
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self::from(&todo)
    }
}

/// Success envelope shared by every todo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Wraps a single value.
    #[must_use]
    pub const fn data(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
            message: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Wraps a collection together with its length.
    #[must_use]
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
            message: None,
        }
    }
}

impl ApiResponse<()> {
    /// Confirms a deletion: `data` is `null`.
    #[must_use]
    pub fn deleted() -> Self {
        Self {
            success: true,
            count: None,
            data: (),
            message: Some("Todo deleted successfully".to_string()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Timestamp, TodoFields, TodoId};
    use chrono::{DateTime, Utc};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn test_todo_response_uses_camel_case_and_millis() {
        let created = DateTime::parse_from_rfc3339("2024-05-01T12:30:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        let todo = Todo::new(
            TodoId::new("todo-1"),
            TodoFields {
                title: "Buy milk".to_string(),
                description: String::new(),
                completed: false,
            },
            Timestamp::from_datetime(created),
        );

        let value = serde_json::to_value(TodoResponse::from(&todo)).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "todo-1",
                "title": "Buy milk",
                "description": "",
                "completed": false,
                "createdAt": "2024-05-01T12:30:00.500Z",
                "updatedAt": "2024-05-01T12:30:00.500Z"
            })
        );
    }

    #[rstest]
    fn test_api_response_envelopes() {
        assert_eq!(
            serde_json::to_value(ApiResponse::list(vec![1, 2])).unwrap(),
            json!({ "success": true, "count": 2, "data": [1, 2] })
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::deleted()).unwrap(),
            json!({ "success": true, "data": null, "message": "Todo deleted successfully" })
        );
        assert_eq!(
            serde_json::to_value(ApiResponse::data("x")).unwrap(),
            json!({ "success": true, "data": "x" })
        );
    }

    #[rstest]
    fn test_create_request_binds_normalized_value() {
        let normalized = CreateTodoRequest::schema()
            .validate(&json!({ "body": { "title": "Buy milk" } }))
            .unwrap();

        let request: CreateTodoRequest = serde_json::from_value(normalized).unwrap();
        assert_eq!(
            request.body,
            CreateTodoBody {
                title: "Buy milk".to_string(),
                description: None,
                completed: false,
            }
        );
    }

    #[rstest]
    fn test_update_request_requires_id_param() {
        let error = UpdateTodoRequest::schema()
            .validate(&json!({ "params": { "id": "" }, "body": {} }))
            .unwrap_err();

        assert_eq!(error.errors.len(), 1);
        assert_eq!(error.errors[0].message, "Todo ID is required");
    }
}
