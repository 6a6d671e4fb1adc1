//! Typed HTTP client for the Todo API.
//!
//! Mirrors the server contract: each call unwraps the `data` envelope of a
//! success response, and every non-2xx response becomes
//! [`ClientError::Api`], whichever error body shape the server produced.
//!
//! # Example
//!
//! ```no_run
//! use todo_api::client::{CreateTodoInput, TodoClient};
//!
//! # async fn run() -> Result<(), todo_api::client::ClientError> {
//! let client = TodoClient::new("http://localhost:5000/api");
//! let todo = client.create(&CreateTodoInput::new("Buy milk")).await?;
//! client.delete(&todo.id).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::api::{ApiResponse, TodoResponse};

/// Base URL of a locally running server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Errors returned by [`TodoClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be decoded.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The base URL cannot carry path segments.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// The server answered with an error status.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        errors: Option<Value>,
    },
}

/// Fields of a todo to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl CreateTodoInput {
    /// Creates an input with only a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            completed: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fields to change on an existing todo. `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodoInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Client for the `/todos` resource.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
    http: Client,
}

impl Default for TodoClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TodoClient {
    /// Creates a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Returns the API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists every todo, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn list(&self) -> Result<Vec<TodoResponse>, ClientError> {
        let url = self.url(&[])?;
        read_data(self.http.get(url).send().await?).await
    }

    /// Fetches one todo.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 for an unknown id.
    pub async fn get(&self, id: &str) -> Result<TodoResponse, ClientError> {
        let url = self.url(&[id])?;
        read_data(self.http.get(url).send().await?).await
    }

    /// Creates a todo.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 400 if the input is rejected.
    pub async fn create(&self, input: &CreateTodoInput) -> Result<TodoResponse, ClientError> {
        self.send_json(Method::POST, &[], input).await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 for an unknown id.
    pub async fn update(
        &self,
        id: &str,
        input: &UpdateTodoInput,
    ) -> Result<TodoResponse, ClientError> {
        self.send_json(Method::PUT, &[id], input).await
    }

    /// Deletes a todo.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 for an unknown id.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let url = self.url(&[id])?;
        read_data(self.http.delete(url).send().await?).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        read_data(self.http.request(method, url).json(body).send().await?).await
    }

    /// Builds `<base>/todos/<segments...>`, percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|error| ClientError::InvalidUrl(error.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("todos")
            .extend(segments);
        Ok(url)
    }
}

/// Unwraps the `data` field of a success response or decodes the error body.
async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        let envelope: ApiResponse<T> = response.json().await?;
        return Ok(envelope.data);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| status.canonical_reason())
        .unwrap_or("Request failed")
        .to_string();

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        errors: body.get("errors").cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("http://localhost:5000/api", &[], "http://localhost:5000/api/todos")]
    #[case("http://localhost:5000/api/", &["abc"], "http://localhost:5000/api/todos/abc")]
    #[case("http://localhost:5000/api", &["a b/c"], "http://localhost:5000/api/todos/a%20b%2Fc")]
    fn test_url_building(#[case] base: &str, #[case] segments: &[&str], #[case] expected: &str) {
        let client = TodoClient::new(base);
        assert_eq!(client.url(segments).unwrap().as_str(), expected);
    }

    #[rstest]
    fn test_invalid_base_url() {
        let client = TodoClient::new("not a url");
        assert!(matches!(client.url(&[]), Err(ClientError::InvalidUrl(_))));
    }

    #[rstest]
    fn test_inputs_skip_absent_fields() {
        assert_eq!(
            serde_json::to_value(CreateTodoInput::new("Buy milk")).unwrap(),
            json!({ "title": "Buy milk" })
        );
        assert_eq!(
            serde_json::to_value(UpdateTodoInput {
                completed: Some(true),
                ..UpdateTodoInput::default()
            })
            .unwrap(),
            json!({ "completed": true })
        );
    }

    #[rstest]
    fn test_default_client_targets_local_server() {
        assert_eq!(TodoClient::default().base_url(), DEFAULT_BASE_URL);
    }
}
