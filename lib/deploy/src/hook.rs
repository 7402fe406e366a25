//! Lifecycle hook event and status types.

use serde::{Deserialize, Serialize};
use std::fmt;
use storefront_core::{DeploymentId, LifecycleHookExecutionId};

/// The event the deployment controller sends to a lifecycle hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleHookEvent {
    #[serde(rename = "DeploymentId")]
    pub deployment_id: DeploymentId,
    #[serde(rename = "LifecycleEventHookExecutionId")]
    pub lifecycle_event_hook_execution_id: LifecycleHookExecutionId,
}

/// Verdict reported back for a lifecycle hook execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookStatus {
    Succeeded,
    Failed,
}

impl HookStatus {
    /// Returns the controller's name for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_controller_event() {
        let event: LifecycleHookEvent = serde_json::from_str(
            r#"{"DeploymentId":"d-ABCDEF123","LifecycleEventHookExecutionId":"eyJlbmNyeXB0"}"#,
        )
        .expect("parse");
        assert_eq!(event.deployment_id.as_str(), "d-ABCDEF123");
        assert_eq!(event.lifecycle_event_hook_execution_id.as_str(), "eyJlbmNyeXB0");
    }

    #[test]
    fn rejects_event_without_execution_id() {
        let result: Result<LifecycleHookEvent, _> =
            serde_json::from_str(r#"{"DeploymentId":"d-ABCDEF123"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn status_serializes_as_controller_name() {
        let json = serde_json::to_string(&HookStatus::Succeeded).expect("serialize");
        assert_eq!(json, "\"Succeeded\"");
        assert_eq!(HookStatus::Failed.to_string(), "Failed");
    }
}
