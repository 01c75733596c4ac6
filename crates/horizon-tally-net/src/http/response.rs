//! HTTP responses from the backend.

use serde::de::DeserializeOwned;

use crate::error::{NetworkError, Result};

/// Longest error body kept in [`NetworkError::HttpStatus`].
const MAX_ERROR_BODY: usize = 1024;

/// Header carrying the gateway's request id.
const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// A received response whose body has not been read yet.
pub struct HttpResponse {
    inner: reqwest::Response,
}

impl HttpResponse {
    pub(crate) fn from_reqwest(response: reqwest::Response) -> Self {
        Self { inner: response }
    }

    /// Status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true for 2xx.
    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    /// The gateway request id, if the backend sent one.
    pub fn request_id(&self) -> Option<&str> {
        self.inner
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    async fn text(self) -> Result<String> {
        Ok(self.inner.text().await?)
    }

    /// Reads the whole body and parses it as JSON.
    ///
    /// A body that is not the expected document is a
    /// [`NetworkError::Json`], never a transport error.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.inner.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Turns a non-2xx response into [`NetworkError::HttpStatus`] carrying
    /// the start of the body.
    pub async fn error_for_status_with_body(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = self
            .text()
            .await
            .ok()
            .map(|body| truncate(body.trim(), MAX_ERROR_BODY))
            .filter(|body| !body.is_empty());
        Err(NetworkError::HttpStatus { status, message })
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_owned(),
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status())
            .field("request_id", &self.request_id())
            .finish_non_exhaustive()
    }
}
