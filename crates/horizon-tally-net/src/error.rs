//! Error types for the networking module.

use std::fmt;

use horizon_tally_core::{FetchError, FetchErrorKind};

/// Network-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// HTTP request failed.
    Request(String),
    /// Invalid URL provided.
    InvalidUrl(String),
    /// Request timed out.
    Timeout,
    /// Connection refused or failed.
    Connection(String),
    /// Invalid header name or value.
    InvalidHeader(String),
    /// JSON serialization/deserialization error.
    Json(String),
    /// I/O error.
    Io(String),
    /// Invalid response body.
    InvalidBody(String),
    /// HTTP error status (4xx or 5xx).
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Optional error message from the response body.
        message: Option<String>,
    },
    /// Redirect limit exceeded.
    TooManyRedirects,
    /// The GraphQL response carried execution errors.
    GraphQL {
        /// All error messages, joined.
        message: String,
        /// `errorType` of the first error, if the server set one.
        error_type: Option<String>,
    },
    /// The operation succeeded but returned no data for the field.
    NoData {
        /// The response field that was missing or null.
        field: String,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "HTTP request error: {msg}"),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {msg}"),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Connection(msg) => write!(f, "Connection error: {msg}"),
            Self::InvalidHeader(msg) => write!(f, "Invalid header: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::InvalidBody(msg) => write!(f, "Invalid response body: {msg}"),
            Self::HttpStatus { status, message } => {
                if let Some(msg) = message
                    && !msg.is_empty()
                {
                    write!(f, "HTTP {status}: {msg}")
                } else {
                    write!(f, "HTTP {status}")
                }
            }
            Self::TooManyRedirects => write!(f, "Too many redirects"),
            Self::GraphQL {
                message,
                error_type: Some(error_type),
            } => write!(f, "GraphQL error ({error_type}): {message}"),
            Self::GraphQL { message, .. } => write!(f, "GraphQL error: {message}"),
            Self::NoData { field } => write!(f, "No data returned for '{field}'"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl NetworkError {
    /// Returns true if the server rejected the caller's identity.
    ///
    /// Covers HTTP 401/403 and GraphQL errors typed or worded as an
    /// authorization failure (`Unauthorized`, `UnauthorizedException`).
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::HttpStatus { status, .. } => matches!(status, 401 | 403),
            Self::GraphQL {
                message,
                error_type,
            } => {
                error_type
                    .as_deref()
                    .is_some_and(|t| t.starts_with("Unauthorized"))
                    || message.contains("Unauthorized")
            }
            _ => false,
        }
    }

    /// The [`FetchErrorKind`] this failure presents as.
    pub fn fetch_error_kind(&self) -> FetchErrorKind {
        if self.is_unauthorized() {
            return FetchErrorKind::Auth;
        }
        match self {
            Self::Request(_)
            | Self::Timeout
            | Self::Connection(_)
            | Self::Io(_)
            | Self::TooManyRedirects => FetchErrorKind::Network,
            Self::HttpStatus { status, .. } if *status >= 500 => FetchErrorKind::Server,
            Self::GraphQL { .. } => FetchErrorKind::Server,
            Self::HttpStatus { .. }
            | Self::InvalidUrl(_)
            | Self::InvalidHeader(_)
            | Self::Json(_)
            | Self::InvalidBody(_)
            | Self::NoData { .. } => FetchErrorKind::Validation,
        }
    }

    /// Classifies this failure as a [`FetchError`] for the collection layer.
    pub fn into_fetch_error(self) -> FetchError {
        FetchError::new(self.fetch_error_kind(), self.to_string())
    }
}

impl From<NetworkError> for FetchError {
    fn from(err: NetworkError) -> Self {
        err.into_fetch_error()
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_redirect() {
            Self::TooManyRedirects
        } else if err.is_decode() {
            Self::Json(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetworkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetworkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
