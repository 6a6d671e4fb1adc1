//! Todo domain model.
//!
//! This module contains the `Todo` entity together with the document schema
//! that guards storage integrity. The schema is applied by the persistence
//! layer on every write, independently of request validation at the API edge.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum number of characters allowed in a stored title.
pub const TITLE_MAX_LENGTH: usize = 100;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Opaque identifier of a todo.
///
/// Identifiers are assigned by the persistence layer. Any string is a
/// well-formed identifier; lookups for unknown ones simply find nothing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wraps an existing identifier string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a new time-ordered identifier (UUID v7).
    ///
    /// **Note**: This is an impure function (side effect: time + random).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: This is an impure function (side effect: system clock).
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Formats the timestamp as RFC 3339 with millisecond precision, e.g.
    /// `2024-05-01T12:30:00.000Z`.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.to_rfc3339())
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A single violated field rule of the document schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// Title is missing or empty after trimming.
    #[error("Title is required")]
    TitleRequired,

    /// Title exceeds [`TITLE_MAX_LENGTH`] characters after trimming.
    #[error("Title cannot be more than 100 characters")]
    TitleTooLong,

    /// Description is absent on creation. An empty or blank description is
    /// present and is stored as `""`.
    #[error("Description is required")]
    DescriptionRequired,
}

impl SchemaViolation {
    /// Returns the document path of the violated field.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::TitleRequired | Self::TitleTooLong => "title",
            Self::DescriptionRequired => "description",
        }
    }
}

/// Rejection of a write by the document schema.
///
/// Carries every violation found, in field declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Todo validation failed: {}", render_violations(.violations))]
pub struct SchemaError {
    violations: Vec<SchemaViolation>,
}

impl SchemaError {
    /// Creates a schema error from a non-empty list of violations.
    #[must_use]
    pub const fn new(violations: Vec<SchemaViolation>) -> Self {
        Self { violations }
    }

    /// Returns the violations in field declaration order.
    #[must_use]
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

fn render_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {violation}", violation.path()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fields supplied for a new todo, before the schema is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Partial update of a todo. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Normalized field values accepted by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFields {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

/// Document schema of the `todos` collection.
///
/// Trims text fields, enforces the title rules and applies the
/// `completed = false` default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoSchema;

impl TodoSchema {
    /// Trims and checks a title.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaViolation::TitleRequired`] if the trimmed title is empty
    /// and [`SchemaViolation::TitleTooLong`] if it exceeds
    /// [`TITLE_MAX_LENGTH`] characters.
    pub fn normalize_title(raw: &str) -> Result<String, SchemaViolation> {
        let title = raw.trim();

        if title.is_empty() {
            return Err(SchemaViolation::TitleRequired);
        }

        if title.chars().count() > TITLE_MAX_LENGTH {
            return Err(SchemaViolation::TitleTooLong);
        }

        Ok(title.to_string())
    }

    /// Trims a description.
    #[must_use]
    pub fn normalize_description(raw: &str) -> String {
        raw.trim().to_string()
    }

    /// Validates the fields of a new todo and applies defaults.
    ///
    /// The description must be supplied, but may be empty after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] listing every violated rule.
    pub fn validate_new(new_todo: NewTodo) -> Result<TodoFields, SchemaError> {
        let title = new_todo
            .title
            .as_deref()
            .map_or(Err(SchemaViolation::TitleRequired), Self::normalize_title);
        let description = new_todo
            .description
            .as_deref()
            .map(Self::normalize_description)
            .ok_or(SchemaViolation::DescriptionRequired);

        match (title, description) {
            (Ok(title), Ok(description)) => Ok(TodoFields {
                title,
                description,
                completed: new_todo.completed.unwrap_or(false),
            }),
            (title, description) => Err(SchemaError::new(
                [title.err(), description.err()]
                    .into_iter()
                    .flatten()
                    .collect(),
            )),
        }
    }

    /// Re-applies the field rules to the supplied fields of a patch.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if a supplied title violates the title rules.
    pub fn validate_patch(patch: TodoPatch) -> Result<TodoPatch, SchemaError> {
        let title = patch
            .title
            .as_deref()
            .map(Self::normalize_title)
            .transpose()
            .map_err(|violation| SchemaError::new(vec![violation]))?;

        Ok(TodoPatch {
            title,
            description: patch.description.as_deref().map(Self::normalize_description),
            completed: patch.completed,
        })
    }
}

// =============================================================================
// Todo
// =============================================================================

/// A todo record as held by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Identifier assigned at creation.
    pub id: TodoId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Trimmed description, possibly empty.
    pub description: String,
    /// Whether the todo is done.
    pub completed: bool,
    /// Creation time, never changes.
    pub created_at: Timestamp,
    /// Time of the last write.
    pub updated_at: Timestamp,
}

impl Todo {
    /// Creates a todo from schema-validated fields.
    ///
    /// Both timestamps are set to `now`.
    #[must_use]
    pub fn new(id: TodoId, fields: TodoFields, now: Timestamp) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            completed: fields.completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a schema-validated patch, refreshing `updated_at`.
    #[must_use]
    pub fn apply(self, patch: TodoPatch, now: Timestamp) -> Self {
        Self {
            title: patch.title.unwrap_or(self.title),
            description: patch.description.unwrap_or(self.description),
            completed: patch.completed.unwrap_or(self.completed),
            updated_at: now,
            ..self
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn new_todo(title: Option<&str>, description: Option<&str>) -> NewTodo {
        NewTodo {
            title: title.map(ToString::to_string),
            description: description.map(ToString::to_string),
            completed: None,
        }
    }

    // -------------------------------------------------------------------------
    // TodoId Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_todo_id_generate_unique() {
        assert_ne!(TodoId::generate(), TodoId::generate());
    }

    #[rstest]
    fn test_todo_id_display() {
        let id = TodoId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    // -------------------------------------------------------------------------
    // Schema Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_validate_new_trims_and_defaults() {
        let fields =
            TodoSchema::validate_new(new_todo(Some("  Test Todo  "), Some("  Test Description  ")))
                .unwrap();

        assert_eq!(fields.title, "Test Todo");
        assert_eq!(fields.description, "Test Description");
        assert!(!fields.completed);
    }

    #[rstest]
    fn test_validate_new_keeps_completed() {
        let mut input = new_todo(Some("Done already"), Some(""));
        input.completed = Some(true);

        let fields = TodoSchema::validate_new(input).unwrap();
        assert!(fields.completed);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn test_validate_new_requires_title(#[case] title: Option<&str>) {
        let error = TodoSchema::validate_new(new_todo(title, Some("desc"))).unwrap_err();
        assert_eq!(error.violations(), &[SchemaViolation::TitleRequired]);
    }

    #[rstest]
    fn test_validate_new_requires_description() {
        let error = TodoSchema::validate_new(new_todo(Some("Title"), None)).unwrap_err();
        assert_eq!(error.violations(), &[SchemaViolation::DescriptionRequired]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_validate_new_accepts_blank_description(#[case] description: &str) {
        let fields = TodoSchema::validate_new(new_todo(Some("Title"), Some(description))).unwrap();
        assert_eq!(fields.description, "");
    }

    #[rstest]
    fn test_validate_new_collects_every_violation() {
        let error = TodoSchema::validate_new(new_todo(None, None)).unwrap_err();
        assert_eq!(
            error.violations(),
            &[
                SchemaViolation::TitleRequired,
                SchemaViolation::DescriptionRequired
            ]
        );
        assert_eq!(
            error.to_string(),
            "Todo validation failed: title: Title is required, description: Description is required"
        );
    }

    #[rstest]
    #[case(100, true)]
    #[case(101, false)]
    fn test_title_length_limit(#[case] length: usize, #[case] accepted: bool) {
        let title = "a".repeat(length);
        assert_eq!(TodoSchema::normalize_title(&title).is_ok(), accepted);
    }

    #[rstest]
    fn test_title_length_counts_characters_not_bytes() {
        let title = "é".repeat(100);
        assert!(TodoSchema::normalize_title(&title).is_ok());
    }

    #[rstest]
    fn test_title_length_checked_after_trimming() {
        let title = format!("  {}  ", "a".repeat(100));
        assert_eq!(TodoSchema::normalize_title(&title).unwrap().len(), 100);
    }

    #[rstest]
    fn test_validate_patch_only_touches_supplied_fields() {
        let patch = TodoPatch {
            title: None,
            description: Some("  new description ".to_string()),
            completed: Some(true),
        };

        let validated = TodoSchema::validate_patch(patch).unwrap();
        assert_eq!(validated.title, None);
        assert_eq!(validated.description.as_deref(), Some("new description"));
        assert_eq!(validated.completed, Some(true));
    }

    #[rstest]
    fn test_validate_patch_rejects_blank_title() {
        let patch = TodoPatch {
            title: Some("   ".to_string()),
            ..TodoPatch::default()
        };

        let error = TodoSchema::validate_patch(patch).unwrap_err();
        assert_eq!(error.violations(), &[SchemaViolation::TitleRequired]);
    }

    // -------------------------------------------------------------------------
    // Todo Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_apply_patch_keeps_omitted_fields() {
        let created = Timestamp::now();
        let todo = Todo::new(
            TodoId::generate(),
            TodoFields {
                title: "Buy milk".to_string(),
                description: "2 liters".to_string(),
                completed: false,
            },
            created,
        );
        let later = Timestamp::from_datetime(*created.as_datetime() + chrono::Duration::seconds(5));

        let updated = todo.clone().apply(
            TodoPatch {
                completed: Some(true),
                ..TodoPatch::default()
            },
            later,
        );

        assert_eq!(updated.id, todo.id);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description, "2 liters");
        assert!(updated.completed);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, later);
    }

    #[rstest]
    fn test_timestamp_rfc3339_millis() {
        let datetime = DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            Timestamp::from_datetime(datetime).to_rfc3339(),
            "2024-05-01T12:30:00.000Z"
        );
    }

    proptest! {
        #[test]
        fn prop_accepted_titles_are_trimmed_and_bounded(
            core in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,98}[a-zA-Z0-9]?",
            left in " {0,5}",
            right in " {0,5}",
        ) {
            let raw = format!("{left}{core}{right}");
            let title = TodoSchema::normalize_title(&raw).unwrap();
            prop_assert_eq!(title.as_str(), raw.trim());
            prop_assert!(title.chars().count() <= TITLE_MAX_LENGTH);
        }

        #[test]
        fn prop_overlong_titles_are_rejected(length in 101usize..300) {
            let title = "x".repeat(length);
            prop_assert_eq!(
                TodoSchema::normalize_title(&title),
                Err(SchemaViolation::TitleTooLong)
            );
        }
    }
}
