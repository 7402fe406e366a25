//! Reading groups and claims back out of an ID token.
//!
//! After sign-in the identity provider issues an ID token that carries the
//! user's groups and the `custom:claims` attribute written by the pipeline.
//! The web front-end verifies the token with its OIDC library; this module
//! only decodes the payload it hands over.

use crate::directory::CLAIMS_ATTRIBUTE;
use crate::error::SessionError;
use crate::resolve::ResolvedClaims;
use base64::Engine;
use serde_json::Value as JsonValue;
use storefront_core::Result;
use tracing::warn;

/// ID token claim listing the user's groups.
pub const GROUPS_CLAIM: &str = "cognito:groups";

/// The authorization facts a session carries for a signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClaims {
    /// Directory groups the user belonged to when the token was issued.
    pub groups: Vec<String>,
    /// Claims resolved at the user's last sign-in.
    pub claims: ResolvedClaims,
}

impl SessionClaims {
    /// Decodes the payload segment of an already-verified ID token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a JWT or its payload is not JSON.
    pub fn from_id_token(id_token: &str) -> Result<Self, SessionError> {
        // JWT is base64url(header).base64url(payload).signature
        let parts: Vec<&str> = id_token.split('.').collect();
        if parts.len() != 3 {
            return Err(SessionError::InvalidFormat.into());
        }

        let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| SessionError::Decode {
                details: e.to_string(),
            })?;

        let payload: JsonValue =
            serde_json::from_slice(&payload_bytes).map_err(|e| SessionError::Parse {
                details: e.to_string(),
            })?;
        if !payload.is_object() {
            return Err(SessionError::Parse {
                details: "payload is not a JSON object".to_string(),
            }
            .into());
        }

        Ok(Self::from_payload(&payload))
    }

    /// Extracts groups and claims from a decoded token payload.
    ///
    /// Missing entries default to empty. An unreadable claims attribute is
    /// logged and treated as empty so a stale or hand-edited attribute never
    /// blocks a session.
    #[must_use]
    pub fn from_payload(payload: &JsonValue) -> Self {
        let groups = payload
            .get(GROUPS_CLAIM)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let claims = match payload.get(CLAIMS_ATTRIBUTE) {
            None | Some(JsonValue::Null) => ResolvedClaims::new(),
            // The directory hands custom attributes out as strings.
            Some(JsonValue::String(encoded)) => ResolvedClaims::from_attribute_value(encoded)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "ignoring unreadable claims attribute");
                    ResolvedClaims::new()
                }),
            Some(other) => serde_json::from_value(other.clone()).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring unreadable claims attribute");
                ResolvedClaims::new()
            }),
        };

        Self { groups, claims }
    }

    /// Returns true if the session grants the boolean claim.
    #[must_use]
    pub fn allows(&self, claim: &str) -> bool {
        self.claims.is_granted(claim)
    }

    /// Returns true if the user is in the directory group.
    #[must_use]
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
