//! HTTP API layer.
//!
//! Every todo route follows the same pipeline: the [`Validated`] extractor
//! checks the request against its declared schema, the handler calls the
//! repository, and failures become [`AppError`]s rendered by the error
//! normalizer.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod validation;

pub use dto::{
    ApiResponse, CreateTodoBody, CreateTodoRequest, TodoPath, TodoPathRequest, TodoResponse,
    UpdateTodoBody, UpdateTodoRequest,
};
pub use error::{
    AppError, ErrorReport, ErrorResponse, FieldError, ValidationError, ViolationCode, normalize,
};
pub use handlers::{
    AppConfig, AppState, HealthResponse, create_todo, delete_todo, get_todo, health_check,
    list_todos, method_not_allowed, route_not_found, update_todo,
};
pub use openapi::{ApiDoc, openapi_document, swagger_ui};
pub use routes::build_router;
pub use validation::{
    FieldRule, ObjectSchema, RequestSchema, Section, ValidateRequest, Validated,
    ValidationFailure, ValidationRejection,
};
