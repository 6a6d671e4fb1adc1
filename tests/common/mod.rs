//! Common test helpers for integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{create_test_app_state, send};
//! ```
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, so helpers used by only one test
//! file would otherwise generate dead code warnings in the others.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use futures::FutureExt;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use todo_api::api::{AppConfig, AppState, build_router};
use todo_api::config::Environment;
use todo_api::domain::{NewTodo, Todo, TodoId, TodoPatch};
use todo_api::infrastructure::{
    InMemoryTodoRepository, RepositoryError, RepositoryFuture, SortOrder, TodoRepository,
};

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates an `AppState` over an empty in-memory repository.
pub fn create_test_app_state(environment: Environment) -> AppState {
    create_app_state_with(Arc::new(InMemoryTodoRepository::new()), environment)
}

/// Creates an `AppState` over the given repository.
pub fn create_app_state_with(
    repository: Arc<dyn TodoRepository>,
    environment: Environment,
) -> AppState {
    AppState::new(repository, AppConfig { environment })
}

/// Creates a router over an empty in-memory repository.
pub fn create_test_router(environment: Environment) -> Router {
    build_router(create_test_app_state(environment))
}

// =============================================================================
// Repository Doubles
// =============================================================================

/// Repository whose every operation fails with a database error.
#[derive(Debug, Default)]
pub struct FailingTodoRepository;

impl FailingTodoRepository {
    fn fail<T: Send + 'static>() -> RepositoryFuture<T> {
        async { Err::<T, _>(RepositoryError::DatabaseError("connection reset".to_string())) }
            .boxed()
    }
}

impl TodoRepository for FailingTodoRepository {
    fn create(&self, _new_todo: NewTodo) -> RepositoryFuture<Todo> {
        Self::fail()
    }

    fn find_all(&self, _order: SortOrder) -> RepositoryFuture<Vec<Todo>> {
        Self::fail()
    }

    fn find_by_id(&self, _id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        Self::fail()
    }

    fn update_by_id(&self, _id: &TodoId, _patch: TodoPatch) -> RepositoryFuture<Option<Todo>> {
        Self::fail()
    }

    fn delete_by_id(&self, _id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        Self::fail()
    }
}

/// Repository whose every operation panics while being polled.
#[derive(Debug, Default)]
pub struct PanickingTodoRepository;

impl PanickingTodoRepository {
    fn crash<T>() -> Result<T, RepositoryError> {
        panic!("storage driver crashed")
    }

    fn panic<T: Send + 'static>() -> RepositoryFuture<T> {
        async { Self::crash::<T>() }.boxed()
    }
}

impl TodoRepository for PanickingTodoRepository {
    fn create(&self, _new_todo: NewTodo) -> RepositoryFuture<Todo> {
        Self::panic()
    }

    fn find_all(&self, _order: SortOrder) -> RepositoryFuture<Vec<Todo>> {
        Self::panic()
    }

    fn find_by_id(&self, _id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        Self::panic()
    }

    fn update_by_id(&self, _id: &TodoId, _patch: TodoPatch) -> RepositoryFuture<Option<Todo>> {
        Self::panic()
    }

    fn delete_by_id(&self, _id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        Self::panic()
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Sends one request through the router and decodes the JSON response.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Sends a `GET` and returns the status, content type and raw body text.
pub async fn get_text(router: &Router, uri: &str) -> (StatusCode, String, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Creates a todo through the API and returns its id.
pub async fn create_todo(router: &Router, body: &str) -> String {
    let (status, value) = send(router, Method::POST, "/api/todos", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {value}");
    value["data"]["id"].as_str().unwrap().to_string()
}
