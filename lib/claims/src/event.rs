//! The post-authentication trigger event.
//!
//! The identity provider expects the event back untouched, so the pipeline
//! never re-serializes this view. It only reads the fields it needs from the
//! raw JSON.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use storefront_core::{UserPoolId, Username};

/// Typed view of the fields the pipeline reads from a trigger event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthenticationEvent {
    pub user_name: Option<String>,
    pub user_pool_id: Option<String>,
    pub trigger_source: Option<String>,
    pub request: Option<PostAuthenticationRequest>,
}

/// The `request` section of the trigger event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthenticationRequest {
    pub user_attributes: Option<Map<String, JsonValue>>,
}

/// Why the pipeline did no work for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The payload is not shaped like a trigger event at all.
    Malformed { details: String },
    /// `request` or `request.userAttributes` is absent.
    MissingUserAttributes,
    /// The user name or pool id is absent or blank.
    MissingIdentity { field: &'static str },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { details } => write!(f, "malformed event: {details}"),
            Self::MissingUserAttributes => {
                write!(f, "not a valid post-authentication event")
            }
            Self::MissingIdentity { field } => write!(f, "missing {field}"),
        }
    }
}

impl PostAuthenticationEvent {
    /// Reads the typed view out of a raw event.
    ///
    /// # Errors
    ///
    /// Returns `SkipReason::Malformed` if a field has the wrong type.
    pub fn from_json(event: &JsonValue) -> Result<Self, SkipReason> {
        Self::deserialize(event).map_err(|e| SkipReason::Malformed {
            details: e.to_string(),
        })
    }

    /// Returns true if the event carries user attributes.
    #[must_use]
    pub fn has_user_attributes(&self) -> bool {
        self.request
            .as_ref()
            .is_some_and(|request| request.user_attributes.is_some())
    }

    /// Validates and returns the user and pool the event is about.
    ///
    /// # Errors
    ///
    /// Returns `SkipReason::MissingIdentity` naming the first missing field.
    pub fn identity(&self) -> Result<(Username, UserPoolId), SkipReason> {
        let username = self
            .user_name
            .as_deref()
            .and_then(|name| Username::new(name).ok())
            .ok_or(SkipReason::MissingIdentity { field: "userName" })?;
        let user_pool_id = self
            .user_pool_id
            .as_deref()
            .and_then(|id| UserPoolId::new(id).ok())
            .ok_or(SkipReason::MissingIdentity {
                field: "userPoolId",
            })?;
        Ok((username, user_pool_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cognito_event() -> JsonValue {
        json!({
            "version": "1",
            "region": "us-east-1",
            "userPoolId": "us-east-1_AbCdEf",
            "userName": "alice",
            "triggerSource": "PostAuthentication_Authentication",
            "callerContext": { "clientId": "abc" },
            "request": {
                "userAttributes": { "email": "alice@example.com", "sub": "1234" },
                "newDeviceUsed": false
            },
            "response": {}
        })
    }

    #[test]
    fn reads_identity_from_cognito_event() {
        let event = PostAuthenticationEvent::from_json(&cognito_event()).expect("parse");
        assert!(event.has_user_attributes());
        assert_eq!(
            event.trigger_source.as_deref(),
            Some("PostAuthentication_Authentication")
        );
        let (username, pool) = event.identity().expect("identity");
        assert_eq!(username.as_str(), "alice");
        assert_eq!(pool.as_str(), "us-east-1_AbCdEf");
    }

    #[test]
    fn missing_request_has_no_user_attributes() {
        let event = PostAuthenticationEvent::from_json(&json!({"userName": "alice"})).expect("parse");
        assert!(!event.has_user_attributes());
    }

    #[test]
    fn null_user_attributes_count_as_missing() {
        let event =
            PostAuthenticationEvent::from_json(&json!({"request": {"userAttributes": null}}))
                .expect("parse");
        assert!(!event.has_user_attributes());
    }

    #[test]
    fn blank_username_is_missing_identity() {
        let event = PostAuthenticationEvent::from_json(&json!({
            "userName": "",
            "userPoolId": "us-east-1_AbCdEf",
            "request": { "userAttributes": {} }
        }))
        .expect("parse");
        assert_eq!(
            event.identity().unwrap_err(),
            SkipReason::MissingIdentity { field: "userName" }
        );
    }

    #[test]
    fn missing_pool_is_missing_identity() {
        let event = PostAuthenticationEvent::from_json(&json!({"userName": "alice"})).expect("parse");
        assert_eq!(
            event.identity().unwrap_err(),
            SkipReason::MissingIdentity {
                field: "userPoolId"
            }
        );
    }

    #[test]
    fn wrong_types_are_malformed() {
        let result = PostAuthenticationEvent::from_json(&json!({"userName": 42}));
        assert!(matches!(result, Err(SkipReason::Malformed { .. })));

        let result = PostAuthenticationEvent::from_json(&json!("not an object"));
        assert!(matches!(result, Err(SkipReason::Malformed { .. })));
    }
}
