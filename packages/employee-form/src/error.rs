//! Typed errors for the form core.
//!
//! Validation failures are not errors here: they live in [`ErrorSet`] and
//! never cross the network boundary. These types cover the remote
//! collaborators and configuration.
//!
//! [`ErrorSet`]: crate::types::ErrorSet

use thiserror::Error;

/// Generic message shown when the create-record service gives no reason.
pub const GENERIC_SUBMIT_FAILURE: &str = "Something went wrong.";

/// The duplicate lookup could not produce an answer.
///
/// Distinct from "not found": a failed lookup leaves the displayed duplicate
/// untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// Connection failed before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("lookup timed out")]
    Timeout,

    /// Non-2xx response from the lookup service
    #[error("lookup service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("malformed lookup response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else if err.is_decode() {
            LookupError::Parse(err.to_string())
        } else {
            LookupError::Network(err.to_string())
        }
    }
}

/// The create-record service did not accept the submission.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),

    #[error("submission timed out")]
    Timeout,

    /// Service answered with a failure, optionally explaining why
    #[error("create-record service returned {status}: {}", .message.as_deref().unwrap_or(GENERIC_SUBMIT_FAILURE))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("malformed create-record response: {0}")]
    Parse(String),
}

impl SubmitError {
    /// Message for the status line: the service's own words when it sent
    /// any, otherwise the generic fallback.
    pub fn user_message(&self) -> &str {
        match self {
            SubmitError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message,
            _ => GENERIC_SUBMIT_FAILURE,
        }
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SubmitError::Timeout
        } else if err.is_decode() {
            SubmitError::Parse(err.to_string())
        } else {
            SubmitError::Network(err.to_string())
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a valid number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} must be \"either\" or \"both\", got {value:?}")]
    InvalidPolicy { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A field name that does not belong to the form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldParseError {
    #[error("unknown field: {0}")]
    Unknown(String),
}

/// Result type alias for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
