//! Function configuration.
//!
//! Read from the Lambda environment: `_HANDLER` selects the function and
//! `AWS_LAMBDA_RUNTIME_API` locates the runtime API. The remaining keys are
//! set on the function resource.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one function process.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionsConfig {
    /// Which function this process serves.
    #[serde(rename = "_handler")]
    pub handler: String,

    /// `host:port` of the runtime API.
    #[serde(rename = "aws_lambda_runtime_api")]
    pub runtime_api: String,

    /// Upper bound on the claims pipeline per invocation, in milliseconds.
    #[serde(default = "default_claims_timeout_ms")]
    pub claims_timeout_ms: u64,

    /// JSON claims catalog replacing the compiled-in tables.
    #[serde(default)]
    pub claims_catalog: Option<PathBuf>,

    /// URL the validation hook probes.
    #[serde(default)]
    pub test_endpoint: Option<String>,

    /// Whether the test endpoint is served over TLS.
    #[serde(default)]
    pub is_secure: bool,

    /// Time allowed for the health check request, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_claims_timeout_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

impl FunctionsConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `_HANDLER` or `AWS_LAMBDA_RUNTIME_API` is missing
    /// or a value has the wrong type.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    #[must_use]
    pub fn claims_timeout(&self) -> Duration {
        Duration::from_millis(self.claims_timeout_ms)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
