//! API error handling.
//!
//! Every failure a handler or extractor propagates is an [`AppError`]. The
//! error normalizer ([`normalize`]) turns it into the single JSON error shape
//! returned to clients:
//!
//! ```json
//! { "success": false, "status": 404, "message": "Todo not found" }
//! ```
//!
//! `errors` is present when the error carries details; `stack` is added by
//! [`attach_error_stack`](super::middleware::attach_error_stack) in
//! development only.

use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// Boxed error used as the cause of an [`AppError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Message used when an unrecognized fault carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "Internal Server Error";

// =============================================================================
// Validation Error
// =============================================================================

/// Machine-readable kind of a field violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    /// The value is missing or has the wrong type.
    InvalidType,
    /// The string is shorter than the declared minimum.
    TooSmall,
}

/// A single field-level violation of a request schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub code: ViolationCode,
    /// Key path of the offending value, e.g. `["body", "title"]`.
    pub path: Vec<String>,
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(code: ViolationCode, path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}: {}", self.path.join("."), self.message)
    }
}

/// Structured failure of request validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_field_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }
}

fn render_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// App Error
// =============================================================================

/// Every error that can reach the error normalizer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request validation failed.
    #[error("Validation failed")]
    Validation(#[from] ValidationError),

    /// Error raised deliberately with an explicit status.
    #[error("{message}")]
    Domain {
        status: StatusCode,
        message: String,
        details: Option<Value>,
        #[source]
        cause: Option<BoxError>,
    },

    /// Any other fault.
    #[error("{0}")]
    Unrecognized(BoxError),
}

impl AppError {
    /// Creates a domain error with the given status and message.
    #[must_use]
    pub fn domain(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Creates a 404 domain error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::domain(StatusCode::NOT_FOUND, message)
    }

    /// Wraps an arbitrary fault.
    #[must_use]
    pub fn unrecognized(fault: impl Into<BoxError>) -> Self {
        Self::Unrecognized(fault.into())
    }

    /// Attaches details reported as `errors`. No effect on other variants.
    #[must_use]
    pub fn with_details(mut self, value: impl Into<Value>) -> Self {
        if let Self::Domain { details, .. } = &mut self {
            *details = Some(value.into());
        }
        self
    }

    /// Records the error that caused this one. No effect on other variants.
    #[must_use]
    pub fn with_cause(mut self, error: impl Into<BoxError>) -> Self {
        if let Self::Domain { cause, .. } = &mut self {
            *cause = Some(error.into());
        }
        self
    }

    /// Returns the HTTP status this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Domain { status, .. } => *status,
            Self::Unrecognized(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error and its chain of causes, one line per error.
    ///
    /// An unrecognized fault is rendered from the fault itself.
    #[must_use]
    pub fn stack(&self) -> String {
        let head: &(dyn StdError + 'static) = match self {
            Self::Unrecognized(fault) => fault.as_ref(),
            other => other,
        };

        let mut lines = vec![format!("Error: {head}")];
        let mut current = head.source();
        while let Some(cause) = current {
            lines.push(format!("    caused by: {cause}"));
            current = cause.source();
        }
        lines.join("\n")
    }
}

// =============================================================================
// Error Normalizer
// =============================================================================

/// Uniform JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Maps an error to the uniform error body, without a stack.
#[must_use]
pub fn normalize(error: &AppError) -> ErrorResponse {
    let (message, errors) = match error {
        AppError::Validation(validation) => (
            "Validation failed".to_string(),
            serde_json::to_value(&validation.errors).ok(),
        ),
        AppError::Domain {
            message, details, ..
        } => (message.clone(), details.clone()),
        AppError::Unrecognized(fault) => {
            let message = fault.to_string();
            if message.is_empty() {
                (FALLBACK_MESSAGE.to_string(), None)
            } else {
                (message, None)
            }
        }
    };

    ErrorResponse {
        success: false,
        status: error.status().as_u16(),
        message,
        errors,
        stack: None,
    }
}

/// Normalized body and diagnostic stack of an error response.
///
/// Stored in the response extensions so the stack middleware can decide
/// whether to expose the stack.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub body: ErrorResponse,
    pub stack: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = normalize(&self);
        let report = ErrorReport {
            body: body.clone(),
            stack: self.stack(),
        };

        let mut response = (self.status(), Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

// =============================================================================
// Tests
// =============================================================================
