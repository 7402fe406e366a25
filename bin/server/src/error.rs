//! Error responses for the HTTP API.
//!
//! Every error body has the shape `{"message": "..."}`; internal details
//! are logged, never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Sign-up failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpError {
    /// The body is not a JSON object.
    InvalidBody { details: String },
    /// A required field is missing or empty.
    MissingFields,
    /// The password is shorter than the minimum length.
    PasswordTooShort,
    /// Sign-up is not configured or the issuer has no pool id.
    NotConfigured,
    /// The user pool refused the registration.
    Rejected { status: u16, code: String },
    /// The user pool could not be reached or answered nonsense.
    Internal { details: String },
}

impl fmt::Display for SignUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBody { details } => write!(f, "invalid request body: {details}"),
            Self::MissingFields => write!(f, "missing required fields"),
            Self::PasswordTooShort => write!(f, "password too short"),
            Self::NotConfigured => write!(f, "sign-up is not configured"),
            Self::Rejected { status, code } => {
                write!(f, "user pool rejected sign-up with status {status}: {code}")
            }
            Self::Internal { details } => write!(f, "sign-up failed: {details}"),
        }
    }
}

impl std::error::Error for SignUpError {}

impl IntoResponse for SignUpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidBody { .. } => (StatusCode::BAD_REQUEST, "Invalid request body"),
            Self::MissingFields => (StatusCode::BAD_REQUEST, "Missing required fields"),
            Self::PasswordTooShort => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters long",
            ),
            Self::NotConfigured => {
                tracing::error!("sign-up requested but the user pool is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid Cognito configuration",
                )
            }
            Self::Rejected { status, code } => {
                let status =
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let message = if code.is_empty() {
                    "Signup failed"
                } else {
                    code.as_str()
                };
                return (status, Json(json!({ "message": message }))).into_response();
            }
            Self::Internal { details } => {
                tracing::error!(%details, "sign-up error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
