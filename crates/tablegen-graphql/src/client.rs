//! GraphQL HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use tracing::debug;

use crate::error::GraphqlClientError;
use crate::operation::{GraphqlRequest, GraphqlResponse};
use crate::retry::{RetryDecision, RetryPolicy};

/// Executes GraphQL documents against a configured endpoint.
///
/// The resolver only depends on this seam, so tests can swap the HTTP
/// client for an in-memory schema.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Endpoint the transport talks to, for diagnostics.
    fn endpoint(&self) -> &str;

    /// Execute a request and return the decoded response envelope.
    async fn execute(
        &self,
        request: GraphqlRequest,
    ) -> Result<GraphqlResponse<serde_json::Value>, GraphqlClientError>;
}

/// GraphQL client configuration.
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    /// Default headers applied to every request.
    pub headers: HeaderMap,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl Default for GraphqlClientConfig {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            headers,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// GraphQL client builder.
#[derive(Debug, Clone)]
pub struct GraphqlClientBuilder {
    endpoint: String,
    config: GraphqlClientConfig,
}

impl GraphqlClientBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            config: GraphqlClientConfig::default(),
        }
    }

    /// Add every `(name, value)` pair, rejecting names or values that are not
    /// valid HTTP header text.
    pub fn with_headers<'a, I>(mut self, headers: I) -> Result<Self, GraphqlClientError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in headers {
            let name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| GraphqlClientError::Protocol {
                    message: format!("invalid header name '{name}': {err}"),
                })?;
            let value = HeaderValue::from_str(value).map_err(|err| GraphqlClientError::Protocol {
                message: format!("invalid value for header '{name}': {err}"),
            })?;
            self.config.headers.insert(name, value);
        }
        Ok(self)
    }

    /// Set timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GraphqlClient, GraphqlClientError> {
        GraphqlClient::with_config(self.endpoint, self.config)
    }
}

/// reqwest-backed [`GraphqlTransport`].
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    endpoint: String,
    http: reqwest::Client,
    config: GraphqlClientConfig,
}

impl GraphqlClient {
    /// Create a client with custom configuration.
    pub fn with_config(
        endpoint: impl Into<String>,
        config: GraphqlClientConfig,
    ) -> Result<Self, GraphqlClientError> {
        let http = reqwest::Client::builder()
            .default_headers(config.headers.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
            config,
        })
    }

    /// Start building a client for `endpoint`.
    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> GraphqlClientBuilder {
        GraphqlClientBuilder::new(endpoint)
    }

    async fn send_with_retry(&self, body_bytes: Vec<u8>) -> Result<Vec<u8>, GraphqlClientError> {
        let mut attempt = 1;
        loop {
            match self.send_once(&body_bytes).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) => match self.config.retry.decide(&err, attempt) {
                    RetryDecision::RetryAfter(delay) => {
                        debug!(attempt, ?delay, error = %err, "retrying GraphQL request");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::DoNotRetry => return Err(err),
                },
            }
        }
    }

    async fn send_once(&self, body_bytes: &[u8]) -> Result<Vec<u8>, GraphqlClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .body(body_bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(GraphqlClientError::HttpStatus {
                status,
                body: truncate_body(&bytes),
                retry_after,
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl GraphqlTransport for GraphqlClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(
        &self,
        request: GraphqlRequest,
    ) -> Result<GraphqlResponse<serde_json::Value>, GraphqlClientError> {
        let body = serde_json::to_vec(&request)?;
        let bytes = self.send_with_retry(body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    value.parse::<u64>().ok().map(Duration::from_secs)
}

fn truncate_body(bytes: &[u8]) -> String {
    const MAX_LEN: usize = 4096;
    let mut body = String::from_utf8_lossy(bytes).to_string();
    if body.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
