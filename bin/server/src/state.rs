//! Shared application state.

use crate::auth::SignUpService;
use crate::config::SignUpConfig;
use std::sync::Arc;
use storefront_aws::{CognitoSignUp, PoolIssuer};
use tracing::{info, warn};

/// State shared by all handlers.
#[derive(Default)]
pub struct AppState {
    /// Absent when sign-up is not configured or the issuer is unusable.
    pub sign_up: Option<Arc<dyn SignUpService>>,
}

impl AppState {
    /// Creates state around a sign-up service.
    pub fn new(sign_up: Option<Arc<dyn SignUpService>>) -> Self {
        Self { sign_up }
    }

    /// Builds state from configuration. A configuration that cannot be
    /// used is logged and leaves sign-up disabled, so the rest of the API
    /// still serves.
    pub fn from_config(http: reqwest::Client, config: Option<&SignUpConfig>) -> Self {
        let Some(config) = config else {
            warn!("COGNITO__ISSUER/COGNITO__CLIENT_ID not set; sign-up disabled");
            return Self::default();
        };

        let Some(issuer) = PoolIssuer::parse(&config.issuer) else {
            warn!(issuer = %config.issuer, "issuer has no user pool id; sign-up disabled");
            return Self::default();
        };

        match CognitoSignUp::for_issuer(
            http,
            &issuer,
            config.endpoint_url.as_deref(),
            config.client_id.clone(),
            config.client_secret.clone(),
        ) {
            Ok(client) => {
                info!(region = %issuer.region, user_pool_id = %issuer.user_pool_id, "sign-up enabled");
                Self::new(Some(Arc::new(client)))
            }
            Err(e) => {
                warn!(error = %e, "invalid sign-up endpoint; sign-up disabled");
                Self::default()
            }
        }
    }
}
