//! Error types for the claims crate.
//!
//! Errors are reported through rootcause as they leave the crate:
//! - `DirectoryError`: failures talking to the identity directory
//! - `CatalogError`: failures loading a claims catalog file
//! - `SessionError`: failures decoding an ID token into session claims

use std::fmt;

/// Errors from identity directory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The request could not be delivered or the response could not be read.
    RequestFailed {
        operation: &'static str,
        details: String,
    },
    /// The directory answered with an error.
    Rejected {
        operation: &'static str,
        code: String,
        message: String,
    },
    /// The directory answered with something we could not interpret.
    InvalidResponse {
        operation: &'static str,
        details: String,
    },
    /// The invocation deadline passed before the call completed.
    Timeout { operation: &'static str },
    /// The claims could not be encoded as an attribute value.
    Encode { details: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { operation, details } => {
                write!(f, "directory {operation} request failed: {details}")
            }
            Self::Rejected {
                operation,
                code,
                message,
            } => {
                write!(f, "directory rejected {operation}: {code}: {message}")
            }
            Self::InvalidResponse { operation, details } => {
                write!(f, "invalid directory response to {operation}: {details}")
            }
            Self::Timeout { operation } => {
                write!(f, "directory {operation} timed out")
            }
            Self::Encode { details } => {
                write!(f, "failed to encode claims attribute: {details}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Errors from loading a claims catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog file could not be read.
    Read { path: String, details: String },
    /// The catalog file is not a valid catalog document.
    Parse { path: String, details: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, details } => {
                write!(f, "failed to read claims catalog '{path}': {details}")
            }
            Self::Parse { path, details } => {
                write!(f, "failed to parse claims catalog '{path}': {details}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Errors from decoding an ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The token is not three dot-separated segments.
    InvalidFormat,
    /// The payload segment is not valid base64url.
    Decode { details: String },
    /// The payload is not a JSON object.
    Parse { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid JWT format"),
            Self::Decode { details } => write!(f, "failed to decode JWT payload: {details}"),
            Self::Parse { details } => write!(f, "failed to parse JWT payload: {details}"),
        }
    }
}

impl std::error::Error for SessionError {}
