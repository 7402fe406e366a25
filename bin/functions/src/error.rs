//! Error types for the function runtime.

use serde::Serialize;
use std::fmt;

/// Errors talking to the runtime API or starting a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The process environment is incomplete or invalid.
    Config { details: String },
    /// `_HANDLER` names no known function.
    UnknownHandler { name: String },
    /// The function could not be constructed.
    Init { details: String },
    /// A runtime API request failed.
    Api {
        endpoint: &'static str,
        details: String,
    },
    /// The runtime API handed out an invocation we could not read.
    InvalidInvocation { details: String },
}

impl RuntimeError {
    /// The `errorType` reported to the runtime API.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Config { .. } => "Runtime.ConfigError",
            Self::UnknownHandler { .. } => "Runtime.UnknownHandler",
            Self::Init { .. } => "Runtime.InitError",
            Self::Api { .. } => "Runtime.ApiError",
            Self::InvalidInvocation { .. } => "Runtime.InvalidInvocation",
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::UnknownHandler { name } => write!(f, "unknown handler '{name}'"),
            Self::Init { details } => write!(f, "failed to initialize function: {details}"),
            Self::Api { endpoint, details } => {
                write!(f, "runtime API {endpoint} request failed: {details}")
            }
            Self::InvalidInvocation { details } => write!(f, "invalid invocation: {details}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// The body posted to the runtime API when an invocation or init fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error_message: String,
    pub error_type: String,
}

impl ErrorPayload {
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            error_type: error_type.into(),
        }
    }
}

impl From<&RuntimeError> for ErrorPayload {
    fn from(error: &RuntimeError) -> Self {
        Self::new(error.error_type(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_runtime_field_names() {
        let payload = ErrorPayload::from(&RuntimeError::UnknownHandler {
            name: "index.handler".to_string(),
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["errorType"], "Runtime.UnknownHandler");
        assert_eq!(json["errorMessage"], "unknown handler 'index.handler'");
    }
}
