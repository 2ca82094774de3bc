//! Fetch error types and their classification.

use serde::Deserialize;
use serde::Serialize;

/// Broad classification of a fetch failure.
///
/// This is what views key their error panel on; the full [`FetchError`]
/// keeps the details for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The request never got a response.
    Network,
    /// A response arrived but signaled failure.
    Api,
    /// Anything else.
    #[default]
    Generic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Api => write!(f, "api"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Errors a [`Fetcher`](crate::fetch::Fetcher) can return.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure: connection refused, DNS, timeout, reset.
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The transport succeeded but the payload carried a failing business code.
    #[error("API error {code}: {message}")]
    Business {
        /// Business code reported by the server.
        code: i64,
        /// Message reported by the server.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Response decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// Any other failure raised by the fetcher.
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a business code error.
    pub fn business(code: i64, message: impl Into<String>) -> Self {
        Self::Business {
            code,
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an unclassified error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Http { .. } | Self::Business { .. } => ErrorKind::Api,
            Self::Decode { .. } | Self::Other(_) => ErrorKind::Generic,
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Whether `err` or anything it wraps is a failed body read.
///
/// reqwest reports a connection dropped while collecting the body as a
/// decode error wrapping the body error.
fn is_body_failure(err: &reqwest::Error) -> bool {
    if err.is_body() {
        return true;
    }
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(inner) = cause.downcast_ref::<reqwest::Error>()
            && inner.is_body()
        {
            return true;
        }
        source = cause.source();
    }
    false
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::http(status.as_u16(), err.to_string())
        } else if is_body_failure(&err) {
            Self::network(err.to_string())
        } else if err.is_decode() {
            Self::decode(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::network(err.to_string())
        } else {
            Self::other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(FetchError::network("refused").kind(), ErrorKind::Network);
        assert_eq!(FetchError::http(500, "boom").kind(), ErrorKind::Api);
        assert_eq!(FetchError::business(4001, "denied").kind(), ErrorKind::Api);
        assert_eq!(FetchError::decode("eof").kind(), ErrorKind::Generic);
        assert_eq!(FetchError::other("caller bug").kind(), ErrorKind::Generic);
    }

    #[test]
    fn test_status_code() {
        assert_eq!(FetchError::http(404, "missing").status_code(), Some(404));
        assert_eq!(FetchError::network("down").status_code(), None);
    }

    #[test]
    fn test_json_errors_are_decode_errors() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(FetchError::from(err).kind(), ErrorKind::Generic);
    }
}
