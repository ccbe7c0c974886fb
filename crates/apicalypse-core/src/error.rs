//! Error types for query building and API requests.
//!
//! Validation failures raised while applying filter options share one error
//! type with the transport failures raised by HTTP clients, so callers only
//! ever match on a single enum.

use crate::filter::FilterName;
use thiserror::Error;

/// Main error type for Apicalypse operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A variadic option was called without any input.
    #[error("missing input parameters for `{0}`")]
    MissingInput(FilterName),

    /// A required string argument was empty or whitespace only.
    #[error("argument `{0}` is blank or empty")]
    BlankArgument(&'static str),

    /// A required non-negative number was negative.
    #[error("`{filter}` cannot be a negative number (got {value})")]
    NegativeInput {
        /// Filter the number was provided for
        filter: FilterName,
        /// Rejected value
        value: i64,
    },

    /// An absent option was supplied where one was required.
    #[error("option list contains an absent option")]
    NilOption,

    /// A filter was set twice while overwrites are rejected.
    #[error("filter `{0}` already set")]
    FilterOverlap(FilterName),

    /// HTTP method could not be parsed
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Invalid endpoint or URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// HTTP transport failed before a response arrived
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// API is unavailable or throttling
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API rejected the query
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// API answered with a status the client does not handle
    #[error("Unexpected status: {0}")]
    UnexpectedStatus(String),

    /// Failed to parse an API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Specialized result type for Apicalypse operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::BlankArgument(_) => "BLANK_ARGUMENT",
            Self::NegativeInput { .. } => "NEGATIVE_INPUT",
            Self::NilOption => "NIL_OPTION",
            Self::FilterOverlap(_) => "FILTER_OVERLAP",
            Self::InvalidMethod(_) => "INVALID_METHOD",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UnexpectedStatus(_) => "UNEXPECTED_STATUS",
            Self::ParseError(_) => "PARSE_ERROR",
        }
    }

    /// Returns true if the error was raised while validating query options.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_)
                | Self::BlankArgument(_)
                | Self::NegativeInput { .. }
                | Self::NilOption
                | Self::FilterOverlap(_)
        )
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::ServiceUnavailable(_) | Self::HttpError(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
