//! Reporting hook verdicts to the deployment controller.

use crate::error::LifecycleError;
use crate::hook::HookStatus;
use async_trait::async_trait;
use storefront_core::{DeploymentId, LifecycleHookExecutionId, Result};

/// Delivers a lifecycle hook verdict to the deployment controller.
///
/// This abstraction allows testing the hook without a real controller.
#[async_trait]
pub trait LifecycleReporter: Send + Sync {
    /// Reports the status of one hook execution.
    async fn put_status(
        &self,
        deployment_id: &DeploymentId,
        execution_id: &LifecycleHookExecutionId,
        status: HookStatus,
    ) -> Result<(), LifecycleError>;
}
