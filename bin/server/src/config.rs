//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`COGNITO__ISSUER`, `COGNITO__CLIENT_ID`).

use serde::Deserialize;
use std::net::SocketAddr;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// User pool sign-up configuration. Sign-up answers with a
    /// configuration error while this is absent.
    #[serde(default)]
    pub cognito: Option<SignUpConfig>,
}

/// The user pool app client used for self-service sign-up.
#[derive(Clone, Deserialize)]
pub struct SignUpConfig {
    /// Pool issuer URL, `https://cognito-idp.<region>.amazonaws.com/<pool id>`.
    pub issuer: String,

    pub client_id: String,

    /// Secret of the app client, when it has one.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Overrides the regional endpoint derived from the issuer.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for SignUpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpConfig")
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is present but invalid.
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
}
