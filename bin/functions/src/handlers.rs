//! The functions this runtime can serve, and their construction from the
//! environment.

use crate::config::FunctionsConfig;
use crate::error::{ErrorPayload, RuntimeError};
use crate::runtime::{Handler, Invocation};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use storefront_aws::{AwsConfig, CodeDeployReporter, CognitoDirectory};
use storefront_claims::{ClaimsCatalog, ClaimsPipeline, UserDirectory};
use storefront_deploy::{
    GreenValidator, HealthProbe, HttpHealthProbe, LifecycleHookEvent, LifecycleReporter,
};
use tracing::info;

/// `_HANDLER` value of the post-authentication trigger.
pub const POST_AUTH: &str = "post-auth";

/// `_HANDLER` value of the green validation hook.
pub const VALIDATE_GREEN: &str = "validate-green";

/// Left unused at the end of an invocation so the response can still be
/// posted before the platform's deadline.
pub const DEADLINE_MARGIN: Duration = Duration::from_millis(250);

/// The post-authentication trigger. Never fails: the event is always
/// returned so sign-in proceeds.
pub struct PostAuthHandler<D> {
    pipeline: ClaimsPipeline<D>,
}

impl<D: UserDirectory> PostAuthHandler<D> {
    pub fn new(pipeline: ClaimsPipeline<D>) -> Self {
        Self { pipeline }
    }

    /// Time the pipeline may spend on `invocation`: the configured timeout,
    /// cut short by the invocation deadline less a margin.
    pub fn budget(&self, invocation: &Invocation) -> Duration {
        let configured = self.pipeline.timeout();
        match invocation.remaining(Utc::now()) {
            Some(remaining) => configured.min(remaining.saturating_sub(DEADLINE_MARGIN)),
            None => configured,
        }
    }
}

#[async_trait]
impl<D: UserDirectory> Handler for PostAuthHandler<D> {
    fn name(&self) -> &'static str {
        POST_AUTH
    }

    async fn handle(&self, invocation: &Invocation) -> Result<JsonValue, ErrorPayload> {
        let budget = self.budget(invocation);
        Ok(self
            .pipeline
            .handle_within(invocation.payload.clone(), budget)
            .await)
    }
}

/// The green validation hook.
pub struct ValidateGreenHandler<P, R> {
    validator: GreenValidator<P, R>,
}

impl<P: HealthProbe, R: LifecycleReporter> ValidateGreenHandler<P, R> {
    pub fn new(validator: GreenValidator<P, R>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl<P: HealthProbe, R: LifecycleReporter> Handler for ValidateGreenHandler<P, R> {
    fn name(&self) -> &'static str {
        VALIDATE_GREEN
    }

    async fn handle(&self, invocation: &Invocation) -> Result<JsonValue, ErrorPayload> {
        let event: LifecycleHookEvent = serde_json::from_value(invocation.payload.clone())
            .map_err(|e| ErrorPayload::new("InvalidEvent", e.to_string()))?;

        self.validator
            .validate(&event)
            .await
            .map(|_| JsonValue::Null)
            .map_err(|e| ErrorPayload::new("ValidationError", e.to_string()))
    }
}

/// Strips a `.handler`-style suffix from the `_HANDLER` value.
fn handler_name(raw: &str) -> &str {
    raw.split('.').next().unwrap_or(raw).trim()
}

/// Builds the function `_HANDLER` selects, reading AWS settings from the
/// environment.
///
/// # Errors
///
/// Returns an error for an unknown handler or when the function's
/// dependencies cannot be set up.
pub fn from_env(
    config: &FunctionsConfig,
    http: reqwest::Client,
) -> Result<Box<dyn Handler>, RuntimeError> {
    let load_aws = || {
        AwsConfig::from_env().map_err(|e| RuntimeError::Config {
            details: e.to_string(),
        })
    };

    match handler_name(&config.handler) {
        POST_AUTH => {
            let aws = load_aws()?;
            Ok(Box::new(post_auth(config, &aws, http)?))
        }
        VALIDATE_GREEN => {
            let probe = green_probe(config)?;
            let aws = load_aws()?;
            Ok(Box::new(validate_green(probe, &aws, http)?))
        }
        other => Err(RuntimeError::UnknownHandler {
            name: other.to_string(),
        }),
    }
}

/// Builds the post-authentication trigger over the user pool.
///
/// # Errors
///
/// Returns an error if the catalog file cannot be loaded or the directory
/// endpoint is invalid.
pub fn post_auth(
    config: &FunctionsConfig,
    aws: &AwsConfig,
    http: reqwest::Client,
) -> Result<PostAuthHandler<CognitoDirectory>, RuntimeError> {
    let catalog = ClaimsCatalog::load(config.claims_catalog.as_deref()).map_err(|e| {
        RuntimeError::Init {
            details: e.to_string(),
        }
    })?;
    let directory = CognitoDirectory::from_config(http, aws).map_err(|e| RuntimeError::Init {
        details: e.to_string(),
    })?;

    info!(
        timeout_ms = config.claims_timeout_ms,
        region = %aws.region,
        "post authentication trigger ready"
    );
    Ok(PostAuthHandler::new(
        ClaimsPipeline::new(directory, Arc::new(catalog)).with_timeout(config.claims_timeout()),
    ))
}

/// Builds the probe for the configured test endpoint.
///
/// # Errors
///
/// Returns an error if `TEST_ENDPOINT` is missing. An endpoint that is set
/// but unusable still builds a probe, so the hook can report `Failed`.
pub fn green_probe(config: &FunctionsConfig) -> Result<HttpHealthProbe, RuntimeError> {
    HttpHealthProbe::new(
        config.test_endpoint.as_deref(),
        config.is_secure,
        config.probe_timeout(),
    )
    .map_err(|e| RuntimeError::Init {
        details: e.to_string(),
    })
}

/// Builds the validation hook reporting to CodeDeploy.
///
/// # Errors
///
/// Returns an error if the CodeDeploy endpoint is invalid.
pub fn validate_green(
    probe: HttpHealthProbe,
    aws: &AwsConfig,
    http: reqwest::Client,
) -> Result<ValidateGreenHandler<HttpHealthProbe, CodeDeployReporter>, RuntimeError> {
    let reporter = CodeDeployReporter::from_config(http, aws).map_err(|e| RuntimeError::Init {
        details: e.to_string(),
    })?;
    info!(target_url = %probe.target(), "green validation hook ready");
    Ok(ValidateGreenHandler::new(GreenValidator::new(probe, reporter)))
}
