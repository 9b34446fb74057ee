//! Error types for the GraphQL transport and the schema resolver.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP error information captured from reqwest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorInfo {
    /// Error message.
    pub message: String,
    /// HTTP status code (if available).
    pub status_code: Option<u16>,
    /// Whether the error was a timeout.
    pub is_timeout: bool,
    /// Whether the error was a connection failure.
    pub is_connect: bool,
    /// Whether the error was a request error.
    pub is_request: bool,
}

impl From<reqwest::Error> for HttpErrorInfo {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status_code: err.status().map(|status| status.as_u16()),
            is_timeout: err.is_timeout(),
            is_connect: err.is_connect(),
            is_request: err.is_request(),
        }
    }
}

/// GraphQL error location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorLocation {
    /// Line number in the query (1-based).
    pub line: u32,
    /// Column number in the query (1-based).
    pub column: u32,
}

/// GraphQL error as returned in a response `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
    /// Location(s) within the query.
    #[serde(default)]
    pub locations: Vec<GraphqlErrorLocation>,
    /// Extensions metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// Error type for GraphQL transport operations.
#[derive(Debug, Clone, Error)]
pub enum GraphqlClientError {
    /// HTTP/network error.
    #[error("HTTP error: {}", .0.message)]
    Http(HttpErrorInfo),

    /// HTTP response status error.
    #[error("HTTP status {status} with body: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: StatusCode,
        /// Response body (truncated if needed).
        body: String,
        /// Retry-After duration when supplied.
        retry_after: Option<Duration>,
    },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(String),

    /// GraphQL-level errors returned by the server.
    #[error("GraphQL errors: {}", summarize(.errors))]
    GraphqlErrors {
        /// GraphQL error list.
        errors: Vec<GraphqlError>,
    },

    /// GraphQL protocol violation.
    #[error("GraphQL protocol error: {message}")]
    Protocol {
        /// Details.
        message: String,
    },
}

fn summarize(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<reqwest::Error> for GraphqlClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(HttpErrorInfo::from(err))
    }
}

impl From<serde_json::Error> for GraphqlClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl GraphqlClientError {
    /// Returns `true` if the error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(info) => info.is_timeout || info.is_connect || info.is_request,
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// Errors raised while resolving the schema or synthesizing a query.
#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    /// Introspection failed: transport error, GraphQL errors, or a malformed payload.
    #[error("Failed to connect to GraphQL API: {0}")]
    SchemaLoad(#[source] GraphqlClientError),

    /// The requested query is not a field of the root query type.
    #[error("Query '{query_name}' not found in GraphQL schema")]
    QueryNotFound {
        /// Name the caller asked for.
        query_name: String,
    },
}

impl ResolverError {
    /// Returns `true` for [`ResolverError::QueryNotFound`].
    #[must_use]
    pub const fn is_query_not_found(&self) -> bool {
        matches!(self, Self::QueryNotFound { .. })
    }
}

/// Result alias for resolver and synthesizer operations.
pub type ResolverResult<T> = Result<T, ResolverError>;
