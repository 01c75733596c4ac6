//! Error types for Horizon Tally.

use std::fmt;

/// Classification of a failed page fetch.
///
/// The kind decides how the failure is presented: network and server
/// failures are worth a retry affordance, auth and validation failures
/// usually are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The request never produced a response (connection, timeout, DNS).
    Network,
    /// The backend rejected the caller's identity or permissions.
    Auth,
    /// The backend failed while executing the request.
    Server,
    /// The response (or the request) did not have the expected shape.
    Validation,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Auth => write!(f, "auth"),
            Self::Server => write!(f, "server"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// A page source failed to produce a page.
///
/// Fetch errors are recorded on the collection state as its last error and
/// returned to the caller; they are never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct FetchError {
    /// What went wrong.
    pub kind: FetchErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl FetchError {
    /// Creates an error of the given kind.
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A transport-level failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    /// An authentication or authorization failure.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Auth, message)
    }

    /// A backend execution failure.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Server, message)
    }

    /// A malformed request or response.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Validation, message)
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Network | FetchErrorKind::Server)
    }
}

/// Errors raised while deriving a sorted view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortError {
    /// A sort key's comparator could not order two of the items.
    ///
    /// Raised before any reordering is returned to the caller.
    #[error("sort key '{key}' is not a total order for the current items")]
    InvalidSortSpec {
        /// Identifier of the offending sort key.
        key: String,
    },
}

/// A specialized Result type for page fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
