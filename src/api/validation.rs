//! Request validation.
//!
//! A [`RequestSchema`] declares the expected shape of the `body`, `params`
//! and `query` sections of a request. The [`Validated`] extractor assembles
//! those sections into one JSON object, checks it against the schema of the
//! handler input and hands the normalized value to the handler.
//!
//! Schema violations short-circuit with 400 and the body
//!
//! ```json
//! {
//!   "status": "error",
//!   "message": "Validation failed",
//!   "errors": [{ "code": "invalid_type", "path": ["body", "title"], "message": "Required" }]
//! }
//! ```
//!
//! Every other extraction failure is an [`AppError`] left to the error
//! normalizer.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::error::{AppError, FieldError, ValidationError, ViolationCode};

// =============================================================================
// Field Rules
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum FieldKind {
    Text { min_length: Option<(usize, String)> },
    Boolean,
}

impl FieldKind {
    const fn expected(&self) -> &'static str {
        match self {
            Self::Text { .. } => "string",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Presence {
    Required,
    Optional,
    Default(Value),
}

/// Rule for a single field of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    kind: FieldKind,
    presence: Presence,
}

impl FieldRule {
    /// A required string.
    #[must_use]
    pub const fn text() -> Self {
        Self {
            kind: FieldKind::Text { min_length: None },
            presence: Presence::Required,
        }
    }

    /// A required boolean.
    #[must_use]
    pub const fn boolean() -> Self {
        Self {
            kind: FieldKind::Boolean,
            presence: Presence::Required,
        }
    }

    /// Requires a string of at least `length` characters, reporting `message`
    /// otherwise. No effect on non-text rules.
    #[must_use]
    pub fn min_length(mut self, length: usize, message: impl Into<String>) -> Self {
        if let FieldKind::Text { min_length } = &mut self.kind {
            *min_length = Some((length, message.into()));
        }
        self
    }

    /// Allows the field to be absent.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    /// Substitutes `value` when the field is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.presence = Presence::Default(value.into());
        self
    }

    fn check(&self, value: &Value, path: &[String], errors: &mut Vec<FieldError>) -> bool {
        match (&self.kind, value) {
            (FieldKind::Text { min_length }, Value::String(text)) => {
                match min_length {
                    Some((minimum, message)) if text.chars().count() < *minimum => {
                        errors.push(FieldError::new(
                            ViolationCode::TooSmall,
                            path.to_vec(),
                            message.clone(),
                        ));
                        false
                    }
                    _ => true,
                }
            }
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (kind, other) => {
                errors.push(FieldError::new(
                    ViolationCode::InvalidType,
                    path.to_vec(),
                    format!("Expected {}, received {}", kind.expected(), type_name(other)),
                ));
                false
            }
        }
    }
}

/// Name of a JSON value's type as reported in violation messages.
const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Object Schema
// =============================================================================

/// Schema of a JSON object: an ordered list of field rules.
///
/// Keys without a rule are dropped from the normalized object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldRule)>,
}

impl ObjectSchema {
    /// Creates an empty object schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }

    fn validate(
        &self,
        value: &Value,
        path: &[String],
        errors: &mut Vec<FieldError>,
    ) -> Option<Map<String, Value>> {
        let Value::Object(object) = value else {
            errors.push(FieldError::new(
                ViolationCode::InvalidType,
                path.to_vec(),
                format!("Expected object, received {}", type_name(value)),
            ));
            return None;
        };

        let mut normalized = Map::new();
        let mut valid = true;

        for (name, rule) in &self.fields {
            let mut field_path = path.to_vec();
            field_path.push(name.clone());

            match (object.get(name), &rule.presence) {
                (Some(field), _) => {
                    if rule.check(field, &field_path, errors) {
                        normalized.insert(name.clone(), field.clone());
                    } else {
                        valid = false;
                    }
                }
                (None, Presence::Required) => {
                    errors.push(FieldError::new(
                        ViolationCode::InvalidType,
                        field_path,
                        "Required",
                    ));
                    valid = false;
                }
                (None, Presence::Optional) => {}
                (None, Presence::Default(default)) => {
                    normalized.insert(name.clone(), default.clone());
                }
            }
        }

        valid.then_some(normalized)
    }
}

// =============================================================================
// Request Schema
// =============================================================================

/// Section of a request covered by a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Body,
    Params,
    Query,
}

impl Section {
    /// Key of the section in the assembled request object.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Params => "params",
            Self::Query => "query",
        }
    }
}

/// Composite schema of a request, sections checked in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSchema {
    sections: Vec<(Section, ObjectSchema)>,
}

impl RequestSchema {
    /// Creates a schema declaring no sections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the body schema.
    #[must_use]
    pub fn body(self, schema: ObjectSchema) -> Self {
        self.section(Section::Body, schema)
    }

    /// Declares the route parameter schema.
    #[must_use]
    pub fn params(self, schema: ObjectSchema) -> Self {
        self.section(Section::Params, schema)
    }

    /// Declares the query string schema.
    #[must_use]
    pub fn query(self, schema: ObjectSchema) -> Self {
        self.section(Section::Query, schema)
    }

    fn section(mut self, section: Section, schema: ObjectSchema) -> Self {
        self.sections.retain(|(declared, _)| *declared != section);
        self.sections.push((section, schema));
        self
    }

    /// Returns true if the schema covers `section`.
    #[must_use]
    pub fn declares(&self, section: Section) -> bool {
        self.sections.iter().any(|(declared, _)| *declared == section)
    }

    /// Validates an assembled request object.
    ///
    /// Returns the normalized request containing only declared sections and
    /// fields, with defaults applied.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] listing every violation found.
    pub fn validate(&self, request: &Value) -> Result<Value, ValidationError> {
        let mut errors = Vec::new();
        let mut normalized = Map::new();

        for (section, schema) in &self.sections {
            let path = vec![section.key().to_string()];
            let Some(value) = request.get(section.key()) else {
                errors.push(FieldError::new(ViolationCode::InvalidType, path, "Required"));
                continue;
            };
            if let Some(object) = schema.validate(value, &path, &mut errors) {
                normalized.insert(section.key().to_string(), Value::Object(object));
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(normalized))
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

/// Handler input validated against a declared request schema.
pub trait ValidateRequest: DeserializeOwned {
    /// Returns the schema the request must satisfy.
    fn schema() -> RequestSchema;
}

// =============================================================================
// Rejection
// =============================================================================

/// Body of the short-circuit validation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationFailure {
    pub status: String,
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl From<ValidationError> for ValidationFailure {
    fn from(error: ValidationError) -> Self {
        Self {
            status: "error".to_string(),
            message: "Validation failed".to_string(),
            errors: error.errors,
        }
    }
}

/// Rejection of the [`Validated`] extractor.
#[derive(Debug)]
pub enum ValidationRejection {
    /// The request violates its schema.
    Invalid(ValidationError),
    /// The request could not be read or bound; handled by the error normalizer.
    Fault(AppError),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Invalid(error) => {
                (StatusCode::BAD_REQUEST, Json(ValidationFailure::from(error))).into_response()
            }
            Self::Fault(error) => error.into_response(),
        }
    }
}

fn extraction_fault(status: StatusCode, message: String) -> ValidationRejection {
    ValidationRejection::Fault(AppError::domain(status, message))
}

// =============================================================================
// Extractor
// =============================================================================

/// Extractor running request validation before the handler.
///
/// # Example
///
/// ```ignore
/// async fn get_todo(Validated(request): Validated<TodoPathRequest>) -> ... {
///     let id = request.params.id;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: ValidateRequest,
{
    type Rejection = ValidationRejection;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let schema = T::schema();
        let (mut parts, body) = request.into_parts();
        let mut assembled = Map::new();

        if schema.declares(Section::Params) {
            let Path(params) =
                Path::<HashMap<String, String>>::from_request_parts(&mut parts, state)
                    .await
                    .map_err(|rejection| extraction_fault(rejection.status(), rejection.body_text()))?;
            assembled.insert(Section::Params.key().to_string(), to_object(params));
        }

        if schema.declares(Section::Query) {
            let Query(query) =
                Query::<HashMap<String, String>>::from_request_parts(&mut parts, state)
                    .await
                    .map_err(|rejection| extraction_fault(rejection.status(), rejection.body_text()))?;
            assembled.insert(Section::Query.key().to_string(), to_object(query));
        }

        if schema.declares(Section::Body) {
            let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
                .await
                .map_err(|rejection| extraction_fault(rejection.status(), rejection.body_text()))?;
            assembled.insert(Section::Body.key().to_string(), parse_body(&bytes)?);
        }

        let normalized = schema
            .validate(&Value::Object(assembled))
            .map_err(ValidationRejection::Invalid)?;

        serde_json::from_value(normalized)
            .map(Self)
            .map_err(|error| ValidationRejection::Fault(AppError::unrecognized(error)))
    }
}

fn to_object(values: HashMap<String, String>) -> Value {
    Value::Object(
        values
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

/// Parses a JSON body. An empty body reads as `{}`.
fn parse_body(bytes: &[u8]) -> Result<Value, ValidationRejection> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(bytes).map_err(|error| {
        ValidationRejection::Fault(
            AppError::domain(StatusCode::BAD_REQUEST, "Malformed JSON body")
                .with_details(error.to_string())
                .with_cause(error),
        )
    })
}

// =============================================================================
// Tests
// =============================================================================
