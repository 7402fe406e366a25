//! Reporting hook verdicts to CodeDeploy.

use crate::client::{AwsJsonClient, CODEDEPLOY};
use crate::config::AwsConfig;
use crate::error::AwsError;
use async_trait::async_trait;
use serde::Serialize;
use storefront_core::{DeploymentId, LifecycleHookExecutionId, Result};
use storefront_deploy::{HookStatus, LifecycleError, LifecycleReporter};
use tracing::instrument;

/// Sends `PutLifecycleEventHookExecutionStatus` to CodeDeploy.
#[derive(Debug, Clone)]
pub struct CodeDeployReporter {
    client: AwsJsonClient,
}

impl CodeDeployReporter {
    /// Creates a reporter over an existing client.
    #[must_use]
    pub fn new(client: AwsJsonClient) -> Self {
        Self { client }
    }

    /// Creates a reporter signing with the environment's credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the service endpoint is invalid.
    pub fn from_config(http: reqwest::Client, config: &AwsConfig) -> Result<Self, AwsError> {
        Ok(Self::new(AwsJsonClient::from_config(http, config, CODEDEPLOY)?))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PutLifecycleEventHookExecutionStatusRequest<'a> {
    deployment_id: &'a str,
    lifecycle_event_hook_execution_id: &'a str,
    status: HookStatus,
}

#[async_trait]
impl LifecycleReporter for CodeDeployReporter {
    #[instrument(skip(self), fields(%deployment_id, %status))]
    async fn put_status(
        &self,
        deployment_id: &DeploymentId,
        execution_id: &LifecycleHookExecutionId,
        status: HookStatus,
    ) -> Result<(), LifecycleError> {
        let request = PutLifecycleEventHookExecutionStatusRequest {
            deployment_id: deployment_id.as_str(),
            lifecycle_event_hook_execution_id: execution_id.as_str(),
            status,
        };

        let _: serde::de::IgnoredAny = self
            .client
            .call("PutLifecycleEventHookExecutionStatus", &request)
            .await
            .map_err(|e| match e {
                AwsError::Service { code, message, .. } => LifecycleError::Rejected { code, message },
                other => LifecycleError::RequestFailed {
                    details: other.to_string(),
                },
            })?;

        Ok(())
    }
}
