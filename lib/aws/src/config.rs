//! AWS configuration.
//!
//! Loaded from the standard `AWS_*` environment variables that the Lambda
//! environment provides (`AWS_REGION`, `AWS_ACCESS_KEY_ID`,
//! `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`). `AWS_ENDPOINT_URL`
//! redirects every service to one endpoint, which local testing uses.

use crate::error::AwsError;
use crate::sigv4::Credentials;
use reqwest::Url;
use serde::Deserialize;

/// Region, credentials and endpoint override for AWS calls.
#[derive(Clone, Deserialize)]
pub struct AwsConfig {
    /// Region the services are called in.
    #[serde(default = "default_region")]
    pub region: String,

    pub access_key_id: String,

    pub secret_access_key: String,

    /// Present for temporary (role) credentials.
    #[serde(default)]
    pub session_token: Option<String>,

    /// Overrides the regional endpoint of every service.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl AwsConfig {
    /// Loads configuration from `AWS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are missing.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("AWS").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Returns the signing credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
        }
    }

    /// Returns the endpoint for a service, honouring the override.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL.
    pub fn endpoint_for(&self, endpoint_prefix: &str) -> Result<Url, AwsError> {
        let raw = self
            .endpoint_url
            .clone()
            .unwrap_or_else(|| regional_endpoint(endpoint_prefix, &self.region));
        Url::parse(&raw).map_err(|e| AwsError::InvalidEndpoint {
            url: raw,
            details: e.to_string(),
        })
    }
}

/// The public endpoint of a service in a region.
#[must_use]
pub fn regional_endpoint(endpoint_prefix: &str, region: &str) -> String {
    format!("https://{endpoint_prefix}.{region}.amazonaws.com/")
}
