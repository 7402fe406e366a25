//! Error types for the AWS adapters.

use std::fmt;

/// Errors from AWS JSON-protocol calls.
///
/// Adapters translate these into the error types of the capability they
/// implement, so callers of `AwsJsonClient` get the plain enum to match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwsError {
    /// The configured or derived endpoint is not a usable URL.
    InvalidEndpoint { url: String, details: String },
    /// The request body could not be encoded.
    Encode {
        operation: &'static str,
        details: String,
    },
    /// The request could not be delivered.
    RequestFailed {
        operation: &'static str,
        details: String,
    },
    /// The service answered with an error.
    Service {
        operation: &'static str,
        status: u16,
        code: String,
        message: String,
    },
    /// The service answered with a body we could not interpret.
    InvalidResponse {
        operation: &'static str,
        details: String,
    },
}

impl AwsError {
    /// The HTTP status of a service error, if the service answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for AwsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint { url, details } => {
                write!(f, "invalid AWS endpoint '{url}': {details}")
            }
            Self::Encode { operation, details } => {
                write!(f, "failed to encode {operation} request: {details}")
            }
            Self::RequestFailed { operation, details } => {
                write!(f, "{operation} request failed: {details}")
            }
            Self::Service {
                operation,
                status,
                code,
                message,
            } => {
                write!(f, "{operation} failed with status {status}")?;
                if !code.is_empty() {
                    write!(f, ": {code}")?;
                }
                if !message.is_empty() {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
            Self::InvalidResponse { operation, details } => {
                write!(f, "invalid {operation} response: {details}")
            }
        }
    }
}

impl std::error::Error for AwsError {}
