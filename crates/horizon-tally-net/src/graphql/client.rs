//! GraphQL client implementation.

use std::sync::Arc;
use std::time::Duration;

use horizon_tally_core::logging::{span_names, targets};
use serde::de::DeserializeOwned;
use tracing::Instrument;

use super::request::GraphQLRequest;
use super::response::GraphQLResponse;
use crate::error::{NetworkError, Result};
use crate::http::HttpClient;
use crate::mutation::Mutation;

/// Builder for creating a GraphQL client.
pub struct GraphQLClientBuilder {
    url: String,
    http_client: Option<HttpClient>,
    default_headers: Vec<(String, String)>,
    bearer_token: Option<String>,
    request_timeout: Option<Duration>,
}

impl GraphQLClientBuilder {
    /// Create a new builder with the specified GraphQL endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_client: None,
            default_headers: Vec::new(),
            bearer_token: None,
            request_timeout: None,
        }
    }

    /// Use an existing HTTP client.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Authenticate with an API key, sent as `x-api-key`.
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.header("x-api-key", key)
    }

    /// Set bearer token authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the request timeout for HTTP operations.
    ///
    /// Ignored when an existing HTTP client is supplied.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the GraphQL client.
    ///
    /// Fails if the endpoint is not a valid URL or a header is invalid.
    pub fn build(self) -> Result<GraphQLClient> {
        url::Url::parse(&self.url)?;

        let mut headers = http::HeaderMap::new();
        for (name, value) in &self.default_headers {
            headers.insert(
                http::HeaderName::from_bytes(name.as_bytes())?,
                http::HeaderValue::from_str(value)?,
            );
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = HttpClient::builder();
                if let Some(timeout) = self.request_timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(GraphQLClient {
            inner: Arc::new(GraphQLClientInner {
                http_client,
                url: self.url,
                headers,
                bearer_token: self.bearer_token,
            }),
        })
    }
}

struct GraphQLClientInner {
    http_client: HttpClient,
    url: String,
    headers: http::HeaderMap,
    bearer_token: Option<String>,
}

/// A GraphQL client for queries and mutations over HTTP POST.
///
/// Cheaply cloneable; clones share the HTTP connection pool.
///
/// # Example
///
/// ```ignore
/// use horizon_tally_net::graphql::{GraphQLClient, GraphQLRequest};
///
/// let client = GraphQLClient::builder("https://api.example.com/graphql")
///     .api_key("da2-...")
///     .build()?;
///
/// let request = GraphQLRequest::query("query { listProjectsProxy { items { projectId } } }");
/// let response = client.execute(request).await?;
/// ```
#[derive(Clone)]
pub struct GraphQLClient {
    inner: Arc<GraphQLClientInner>,
}

impl GraphQLClient {
    /// Create a new builder for configuring a GraphQL client.
    pub fn builder(url: impl Into<String>) -> GraphQLClientBuilder {
        GraphQLClientBuilder::new(url)
    }

    /// Get the HTTP endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Execute a GraphQL operation.
    ///
    /// Non-2xx responses become [`NetworkError::HttpStatus`]. GraphQL
    /// errors in a 2xx response are returned inside the response for the
    /// caller to inspect.
    pub async fn execute(&self, request: GraphQLRequest) -> Result<GraphQLResponse> {
        let span = tracing::debug_span!(
            target: targets::GRAPHQL,
            span_names::GRAPHQL,
            operation = request.operation_name.as_deref().unwrap_or("anonymous")
        );
        self.send(request).instrument(span).await
    }

    async fn send(&self, request: GraphQLRequest) -> Result<GraphQLResponse> {
        let mut req = self
            .inner
            .http_client
            .post(&self.inner.url)
            .header("Accept", "application/json")
            .headers(self.inner.headers.clone())
            .json(&request);
        if let Some(token) = &self.inner.bearer_token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?.error_for_status_with_body().await?;
        let request_id = response.request_id().map(str::to_owned);
        let response: GraphQLResponse = response.json().await?;

        if response.has_errors() {
            tracing::debug!(
                target: targets::GRAPHQL,
                request_id,
                errors = response.errors.len(),
                error_type = response.first_error().and_then(|e| e.error_type()),
                "operation returned errors"
            );
        }
        Ok(response)
    }

    /// Send a mutation and decode its result field.
    ///
    /// GraphQL errors become [`NetworkError::GraphQL`]; a `null` result is
    /// [`NetworkError::NoData`].
    pub async fn mutate<T: DeserializeOwned>(&self, mutation: &Mutation) -> Result<T> {
        let response = self.execute(mutation.to_request()).await?;
        let result = response.field(mutation.field());
        if result.is_ok() {
            tracing::debug!(
                target: targets::GRAPHQL,
                field = mutation.field(),
                "mutation applied"
            );
        }
        result
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("url", &self.inner.url)
            .finish_non_exhaustive()
    }
}
