//! The green validation hook.
//!
//! Runs once per deployment, after traffic is routed to the new target.
//! A single GET decides the verdict: 200 succeeds, anything else (another
//! status, a transport error, a timeout) fails. The verdict is always
//! reported; only a failure to report is an error.

use crate::error::ValidationError;
use crate::hook::{HookStatus, LifecycleHookEvent};
use crate::probe::HealthProbe;
use crate::reporter::LifecycleReporter;
use reqwest::StatusCode;
use storefront_core::Result;
use tracing::{error, info, instrument, warn};

/// Validates a freshly deployed target and reports the verdict.
pub struct GreenValidator<P, R> {
    probe: P,
    reporter: R,
}

impl<P, R> GreenValidator<P, R>
where
    P: HealthProbe,
    R: LifecycleReporter,
{
    /// Creates a validator.
    pub fn new(probe: P, reporter: R) -> Self {
        Self { probe, reporter }
    }

    /// Returns the probe.
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Returns the reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Probes the target once and reports the resulting status.
    ///
    /// # Errors
    ///
    /// Returns `ReportFailed` if the controller did not accept the status.
    #[instrument(
        skip(self, event),
        fields(
            deployment_id = %event.deployment_id,
            target = %self.probe.target(),
        )
    )]
    pub async fn validate(&self, event: &LifecycleHookEvent) -> Result<HookStatus, ValidationError> {
        let status = match self.probe.check().await {
            Ok(StatusCode::OK) => {
                info!("green target is healthy");
                HookStatus::Succeeded
            }
            Ok(code) => {
                warn!(status = %code, "green target answered with unexpected status");
                HookStatus::Failed
            }
            Err(e) => {
                warn!(error = %e, "green target health check failed");
                HookStatus::Failed
            }
        };

        self.reporter
            .put_status(
                &event.deployment_id,
                &event.lifecycle_event_hook_execution_id,
                status,
            )
            .await
            .map_err(|e| {
                error!(error = %e, %status, "failed to report lifecycle status");
                ValidationError::ReportFailed {
                    details: e.to_string(),
                }
            })?;

        info!(%status, "reported lifecycle status");
        Ok(status)
    }
}
