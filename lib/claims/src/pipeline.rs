//! The post-authentication claims pipeline.
//!
//! Per authentication event:
//! 1. Fetch the user's groups from the directory
//! 2. Order them by role precedence
//! 3. Aggregate the roles' claim-sets into one claims map
//! 4. Publish the map to the user's `custom:claims` attribute
//!
//! The pipeline fails open. A claims refresh that cannot complete is logged
//! and the event is handed back unchanged so that sign-in always proceeds.

use crate::catalog::ClaimsCatalog;
use crate::directory::{UserDirectory, fetch_groups, publish_claims};
use crate::error::DirectoryError;
use crate::event::{PostAuthenticationEvent, SkipReason};
use crate::resolve::{ResolvedClaims, aggregate_claims, order_by_precedence};
use rootcause::Report;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Time allowed for one invocation when the caller does not supply a budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How an invocation ended.
///
/// `Published` means every step ran. `Skipped` aborts silently before any
/// directory call. `FetchFailed` and `PublishFailed` abort and log; neither is
/// surfaced to the identity provider.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Claims were resolved and written.
    Published { claims: ResolvedClaims },
    /// The event lacked what the pipeline needs; nothing was done.
    Skipped { reason: SkipReason },
    /// Groups could not be fetched; nothing was resolved or written.
    FetchFailed { error: Report<DirectoryError> },
    /// Claims were resolved but could not be written.
    PublishFailed {
        claims: ResolvedClaims,
        error: Report<DirectoryError>,
    },
}

impl PipelineOutcome {
    /// Returns true if the claims attribute was written.
    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    /// Returns the resolved claims, if resolution ran.
    #[must_use]
    pub fn claims(&self) -> Option<&ResolvedClaims> {
        match self {
            Self::Published { claims } | Self::PublishFailed { claims, .. } => Some(claims),
            Self::Skipped { .. } | Self::FetchFailed { .. } => None,
        }
    }
}

/// Resolves and publishes claims for authentication events.
pub struct ClaimsPipeline<D> {
    directory: D,
    catalog: Arc<ClaimsCatalog>,
    timeout: Duration,
}

impl<D: UserDirectory> ClaimsPipeline<D> {
    /// Creates a pipeline with the default invocation timeout.
    #[must_use]
    pub fn new(directory: D, catalog: Arc<ClaimsCatalog>) -> Self {
        Self {
            directory,
            catalog,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the time allowed for one invocation.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured invocation timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the directory the pipeline talks to.
    #[must_use]
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Handles a raw trigger event and returns it unchanged.
    pub async fn handle(&self, event: JsonValue) -> JsonValue {
        self.handle_within(event, self.timeout).await
    }

    /// Like [`Self::handle`], bounded by `budget` instead of the configured
    /// timeout.
    pub async fn handle_within(&self, event: JsonValue, budget: Duration) -> JsonValue {
        debug!(
            user_name = event.get("userName").and_then(JsonValue::as_str),
            trigger_source = event.get("triggerSource").and_then(JsonValue::as_str),
            "post authentication event"
        );

        match PostAuthenticationEvent::from_json(&event) {
            Ok(typed) => {
                self.run_within(&typed, budget).await;
            }
            Err(reason) => {
                info!(%reason, "skipping claims update");
            }
        }
        event
    }

    /// Runs the pipeline for one event with the configured timeout.
    pub async fn run(&self, event: &PostAuthenticationEvent) -> PipelineOutcome {
        self.run_within(event, self.timeout).await
    }

    /// Runs the pipeline for one event, all directory calls sharing one
    /// deadline `budget` from now.
    pub async fn run_within(
        &self,
        event: &PostAuthenticationEvent,
        budget: Duration,
    ) -> PipelineOutcome {
        let deadline = Instant::now() + budget;

        if !event.has_user_attributes() {
            let reason = SkipReason::MissingUserAttributes;
            info!(%reason, "skipping claims update");
            return PipelineOutcome::Skipped { reason };
        }
        let (username, user_pool_id) = match event.identity() {
            Ok(identity) => identity,
            Err(reason) => {
                info!(%reason, "skipping claims update");
                return PipelineOutcome::Skipped { reason };
            }
        };
        info!(
            %username,
            %user_pool_id,
            trigger_source = event.trigger_source.as_deref().unwrap_or("unknown"),
            "processing user"
        );

        let groups = match fetch_groups(&self.directory, &username, &user_pool_id, deadline).await
        {
            Ok(groups) => groups,
            Err(error) => {
                error!(%username, %error, "failed to fetch user groups, claims not updated");
                return PipelineOutcome::FetchFailed { error };
            }
        };

        let roles = order_by_precedence(&self.catalog, &groups);
        let claims = aggregate_claims(&self.catalog, &roles);

        match publish_claims(&self.directory, &username, &user_pool_id, &claims, deadline).await {
            Ok(()) => {
                info!(%username, claims = claims.len(), "updated user claims");
                PipelineOutcome::Published { claims }
            }
            Err(error) => {
                error!(%username, %error, "failed to update user claims");
                PipelineOutcome::PublishFailed { claims, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DirectoryCall, FakeDirectory};
    use serde_json::json;

    fn pipeline(directory: FakeDirectory) -> ClaimsPipeline<FakeDirectory> {
        ClaimsPipeline::new(directory, Arc::new(ClaimsCatalog::default()))
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn event_for(username: &str) -> JsonValue {
        json!({
            "version": "1",
            "triggerSource": "PostAuthentication_Authentication",
            "userPoolId": "us-east-1_AbCdEf",
            "userName": username,
            "request": { "userAttributes": { "email": "alice@example.com" } },
            "response": {}
        })
    }

    fn typed(event: &JsonValue) -> PostAuthenticationEvent {
        PostAuthenticationEvent::from_json(event).expect("typed event")
    }

    #[tokio::test]
    async fn publishes_merged_claims() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["customers", "curators"]));

        let outcome = pipeline.run(&typed(&event_for("alice"))).await;

        let claims = match outcome {
            PipelineOutcome::Published { claims } => claims,
            other => panic!("expected published outcome, got {other:?}"),
        };
        assert_eq!(claims.len(), 6);
        assert!(claims.is_granted("canEditContent"));
        assert!(claims.is_granted("canPlaceMyOrder"));

        let calls = pipeline.directory().calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], DirectoryCall::ListGroups { .. }));
        assert_eq!(
            pipeline.directory().published_values(),
            vec![claims.to_attribute_value().expect("encode")]
        );
    }

    #[tokio::test]
    async fn unknown_group_is_ignored() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["guest", "customers"]));

        let outcome = pipeline.run(&typed(&event_for("alice"))).await;

        let claims = outcome.claims().expect("claims resolved");
        assert_eq!(claims.len(), 3);
        assert!(claims.is_granted("canManageMyCart"));
    }

    #[tokio::test]
    async fn no_groups_publishes_empty_object() {
        let pipeline = pipeline(FakeDirectory::with_groups(&[]));

        let outcome = pipeline.run(&typed(&event_for("alice"))).await;

        assert!(outcome.is_published());
        assert_eq!(pipeline.directory().published_values(), vec!["{}"]);
    }

    #[tokio::test]
    async fn rerun_publishes_identical_value() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["admins", "customers"]));
        let event = typed(&event_for("alice"));

        pipeline.run(&event).await;
        pipeline.run(&event).await;

        let published = pipeline.directory().published_values();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0], published[1]);
    }

    #[tokio::test]
    async fn missing_request_skips_without_directory_calls() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["customers"]));
        let event = json!({ "userName": "alice", "userPoolId": "us-east-1_AbCdEf" });

        let outcome = pipeline.run(&typed(&event)).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Skipped {
                reason: SkipReason::MissingUserAttributes
            }
        ));

        let returned = pipeline.handle(event.clone()).await;
        assert_eq!(returned, event);
        assert!(pipeline.directory().calls().is_empty());
    }

    #[tokio::test]
    async fn missing_username_skips() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["customers"]));
        let event = json!({
            "userPoolId": "us-east-1_AbCdEf",
            "request": { "userAttributes": {} }
        });

        let outcome = pipeline.run(&typed(&event)).await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Skipped {
                reason: SkipReason::MissingIdentity { field: "userName" }
            }
        ));
        assert!(pipeline.directory().calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_event_is_returned_unchanged() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["customers"]));
        let event = json!(["not", "an", "event"]);

        let returned = pipeline.handle(event.clone()).await;

        assert_eq!(returned, event);
        assert!(pipeline.directory().calls().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_aborts_before_publishing() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["customers"]).failing_list());
        let event = event_for("alice");

        let outcome = pipeline.run(&typed(&event)).await;
        assert!(matches!(outcome, PipelineOutcome::FetchFailed { .. }));
        assert!(outcome.claims().is_none());

        let returned = pipeline.handle(event.clone()).await;
        assert_eq!(returned, event);
        assert!(pipeline.directory().published_values().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_keeps_resolved_claims() {
        let pipeline = pipeline(FakeDirectory::with_groups(&["customers"]).failing_update());
        let event = event_for("alice");

        let outcome = pipeline.run(&typed(&event)).await;

        let (claims, error) = match outcome {
            PipelineOutcome::PublishFailed { claims, error } => (claims, error),
            other => panic!("expected publish failure, got {other:?}"),
        };
        assert_eq!(claims.len(), 3);
        assert!(error.to_string().contains("connection reset"));

        let returned = pipeline.handle(event.clone()).await;
        assert_eq!(returned, event);
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let pipeline = pipeline(
            FakeDirectory::with_groups(&["customers"]).with_delay(Duration::from_secs(30)),
        )
        .with_timeout(Duration::from_millis(20));

        let outcome = pipeline.run(&typed(&event_for("alice"))).await;

        let error = match outcome {
            PipelineOutcome::FetchFailed { error } => error,
            other => panic!("expected fetch failure, got {other:?}"),
        };
        assert!(error.to_string().contains("timed out"));
        assert!(pipeline.directory().published_values().is_empty());
    }

    #[tokio::test]
    async fn slow_publish_times_out_and_is_swallowed() {
        let pipeline = pipeline(
            FakeDirectory::with_groups(&["customers"]).with_update_delay(Duration::from_secs(30)),
        );
        let event = event_for("alice");

        let outcome = pipeline
            .run_within(&typed(&event), Duration::from_millis(20))
            .await;
        assert!(matches!(outcome, PipelineOutcome::PublishFailed { .. }));

        let returned = pipeline
            .handle_within(event.clone(), Duration::from_millis(20))
            .await;
        assert_eq!(returned, event);
    }

    #[tokio::test]
    async fn event_log_names_user_without_attributes() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let event = event_for("alice");
        let returned = pipeline(FakeDirectory::with_groups(&["customers"]))
            .handle(event.clone())
            .await;

        assert_eq!(returned, event);
        let text = logs.text();
        assert!(text.contains("post authentication event"));
        assert!(text.contains("user_name=\"alice\""));
        assert!(text.contains("PostAuthentication_Authentication"));
        assert!(!text.contains("alice@example.com"));
    }
}
