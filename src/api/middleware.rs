//! Error normalizer middleware.
//!
//! [`AppError`] responses carry an [`ErrorReport`] in their extensions.
//! [`attach_error_stack`] consumes it and, in development only, rewrites the
//! body with the `stack` field. Panics are turned into unrecognized faults by
//! [`handle_panic`] so they flow through the same path.

use std::any::Any;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::{AppError, ErrorReport};
use super::handlers::AppState;

/// Adds the diagnostic stack to error bodies when the environment allows it.
pub async fn attach_error_stack(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };
    if !state.config.environment.exposes_stack() {
        return response;
    }

    let mut body = report.body;
    body.stack = Some(report.stack);
    (response.status(), Json(body)).into_response()
}

/// Converts a caught panic into an unrecognized fault response.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(ToString::to_string))
        .unwrap_or_default();

    tracing::error!(panic = %message, "Handler panicked");
    AppError::unrecognized(message).into_response()
}
