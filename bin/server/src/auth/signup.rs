//! `POST /auth/signup`: self-service registration.

use crate::error::SignUpError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{Json, body::Bytes, extract::State};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use storefront_aws::{AwsError, CognitoSignUp, SignUpOutcome, SignUpRequest};
use storefront_claims::UserAttribute;
use tracing::{info, warn};

/// Shortest password accepted before asking the user pool.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registers users with the identity provider.
///
/// This abstraction allows testing the route without a real user pool.
#[async_trait]
pub trait SignUpService: Send + Sync {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AwsError>;
}

#[async_trait]
impl SignUpService for CognitoSignUp {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AwsError> {
        CognitoSignUp::sign_up(self, request).await
    }
}

/// The registration form. Fields are optional so that a missing field
/// gets the same answer as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct SignUpForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

impl SignUpForm {
    /// Checks the form and turns it into a registration keyed by email.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` or `PasswordTooShort`.
    pub fn into_request(self) -> Result<SignUpRequest, SignUpError> {
        let required = |field: Option<String>| field.filter(|v| !v.is_empty());
        let (Some(email), Some(password), Some(given_name), Some(family_name)) = (
            required(self.email),
            required(self.password),
            required(self.given_name),
            required(self.family_name),
        ) else {
            return Err(SignUpError::MissingFields);
        };

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SignUpError::PasswordTooShort);
        }

        Ok(SignUpRequest {
            username: email.clone(),
            password,
            attributes: vec![
                UserAttribute::new("email", email),
                UserAttribute::new("given_name", given_name),
                UserAttribute::new("family_name", family_name),
            ],
        })
    }
}

/// Registers a user and asks them to verify their email.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<JsonValue>, SignUpError> {
    let form: SignUpForm = serde_json::from_slice(&body).map_err(|e| SignUpError::InvalidBody {
        details: e.to_string(),
    })?;
    let request = form.into_request()?;

    let service = state.sign_up.as_ref().ok_or(SignUpError::NotConfigured)?;

    service.sign_up(&request).await.map_err(|e| match e {
        AwsError::Service { status, code, .. } => {
            warn!(status, %code, "user pool rejected sign-up");
            SignUpError::Rejected { status, code }
        }
        other => SignUpError::Internal {
            details: other.to_string(),
        },
    })?;

    info!("sign-up accepted");
    Ok(Json(json!({
        "message": "User registered successfully. Please check your email for verification."
    })))
}
