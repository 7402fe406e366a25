//! Error types for the deploy crate.
//!
//! - `ProbeError`: the green target could not be reached or is misconfigured
//! - `LifecycleError`: the deployment controller did not accept a status
//! - `ValidationError`: the hook itself could not run or report

use std::fmt;

/// Errors from probing the green target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The request failed before a response arrived.
    RequestFailed { url: String, details: String },
    /// No response arrived within the probe timeout.
    Timeout { url: String },
    /// The test endpoint is not a usable URL.
    InvalidEndpoint { url: String, details: String },
    /// The endpoint scheme disagrees with the configured security setting.
    SchemeMismatch { url: String, is_secure: bool },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { url, details } => {
                write!(f, "health check request to '{url}' failed: {details}")
            }
            Self::Timeout { url } => write!(f, "health check request to '{url}' timed out"),
            Self::InvalidEndpoint { url, details } => {
                write!(f, "invalid test endpoint '{url}': {details}")
            }
            Self::SchemeMismatch { url, is_secure } => {
                let expected = if *is_secure { "https" } else { "http" };
                write!(f, "test endpoint '{url}' must use {expected}")
            }
        }
    }
}

impl std::error::Error for ProbeError {}

/// Errors from reporting a lifecycle hook status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The request could not be delivered.
    RequestFailed { details: String },
    /// The deployment controller answered with an error.
    Rejected { code: String, message: String },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { details } => {
                write!(f, "lifecycle status request failed: {details}")
            }
            Self::Rejected { code, message } => {
                write!(f, "deployment controller rejected status: {code}: {message}")
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Errors from the validation hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No test endpoint is configured.
    MissingTestEndpoint,
    /// The HTTP client for health checks could not be built.
    HttpClient { details: String },
    /// The status could not be delivered to the deployment controller.
    ReportFailed { details: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTestEndpoint => {
                write!(f, "TEST_ENDPOINT environment variable is required")
            }
            Self::HttpClient { details } => {
                write!(f, "failed to create HTTP client: {details}")
            }
            Self::ReportFailed { details } => {
                write!(f, "failed to report status to deployment controller: {details}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
