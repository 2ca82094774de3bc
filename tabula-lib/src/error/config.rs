//! Configuration error types

/// Errors raised while validating a table configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A page size of zero was supplied.
    #[error("page size must be at least 1")]
    ZeroPageSize,

    /// A current page of zero was supplied. Pages are 1-indexed.
    #[error("current page must be at least 1")]
    ZeroPage,

    /// The page size options list was empty or contained zero.
    #[error("page size options must be non-empty and positive")]
    InvalidPageSizeOptions,

    /// An endpoint URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
