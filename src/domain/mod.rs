//! Domain module for the todo list.
//!
//! This module contains the `Todo` entity, its value objects, and the
//! document schema applied to every write.

pub mod todo;

pub use todo::{
    NewTodo, SchemaError, SchemaViolation, TITLE_MAX_LENGTH, Timestamp, Todo, TodoFields, TodoId,
    TodoPatch, TodoSchema,
};
