//! Todo API
//!
//! A CRUD todo-list REST API and its typed client.
//!
//! # Modules
//!
//! - [`domain`]: the `Todo` entity and its document schema
//! - [`infrastructure`]: repository trait and storage backends
//! - [`api`]: request validation, handlers and error normalization
//! - [`client`]: HTTP client mirroring the API contract
//! - [`config`]: environment-driven configuration

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
