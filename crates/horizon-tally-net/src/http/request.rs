//! HTTP request builder.

use std::time::Duration;

use horizon_tally_core::logging::targets;
use serde::Serialize;

use super::client::HttpClient;
use super::response::HttpResponse;
use crate::error::Result;

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
}

impl HttpMethod {
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// The body of an HTTP request.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// JSON body (serialized from a value).
    Json(serde_json::Value),
}

/// Builder for constructing HTTP requests.
pub struct HttpRequestBuilder {
    client: HttpClient,
    method: HttpMethod,
    url: String,
    headers: http::HeaderMap,
    body: RequestBody,
    timeout: Option<Duration>,
    bearer_token: Option<String>,
}

impl HttpRequestBuilder {
    pub(crate) fn new(client: HttpClient, method: HttpMethod, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: http::HeaderMap::new(),
            body: RequestBody::None,
            timeout: None,
            bearer_token: None,
        }
    }

    /// Add a header to the request.
    ///
    /// Invalid names or values are skipped with a warning.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            http::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                tracing::warn!(target: targets::NET, header = name, "skipping invalid header");
            }
        }
        self
    }

    /// Add multiple headers to the request.
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set a JSON body from a serializable value.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = RequestBody::Json(value),
            Err(e) => {
                tracing::error!(target: targets::NET, "failed to serialize JSON body: {}", e);
            }
        }
        self
    }

    /// Set bearer token authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set a timeout for this specific request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send the request and wait for the response.
    pub async fn send(self) -> Result<HttpResponse> {
        let url = url::Url::parse(&self.url)?;
        let method = self.method;

        let mut req_builder = self
            .client
            .reqwest_client()
            .request(method.to_reqwest(), url)
            .headers(self.headers);

        if let Some(token) = &self.bearer_token {
            req_builder = req_builder.bearer_auth(token);
        }
        if let Some(timeout) = self.timeout {
            req_builder = req_builder.timeout(timeout);
        }
        match self.body {
            RequestBody::None => {}
            RequestBody::Json(value) => {
                req_builder = req_builder.json(&value);
            }
        }

        let response = req_builder.send().await.inspect_err(|e| {
            tracing::debug!(target: targets::NET, %method, url = %self.url, error = %e, "request failed");
        })?;
        tracing::debug!(
            target: targets::NET,
            %method,
            url = %self.url,
            status = response.status().as_u16(),
            "response received"
        );
        Ok(HttpResponse::from_reqwest(response))
    }
}

impl std::fmt::Debug for HttpRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
