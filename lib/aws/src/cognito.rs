//! Cognito user pool adapters.
//!
//! `CognitoDirectory` implements the claims pipeline's directory capability
//! with the administrative (signed) operations. `CognitoSignUp` calls the
//! public, unsigned `SignUp` operation on behalf of the web client.

use crate::client::{AwsJsonClient, COGNITO_IDP};
use crate::config::{AwsConfig, regional_endpoint};
use crate::error::AwsError;
use crate::sigv4::hmac_sha256;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use storefront_claims::{DirectoryError, UserAttribute, UserDirectory};
use storefront_core::{Result, UserPoolId, Username};
use tracing::{debug, info, instrument};

const LIST_GROUPS: &str = "list groups";
const UPDATE_ATTRIBUTES: &str = "update attributes";

/// The user pool, reached through the administrative API.
#[derive(Debug, Clone)]
pub struct CognitoDirectory {
    client: AwsJsonClient,
}

impl CognitoDirectory {
    /// Creates a directory over an existing client.
    #[must_use]
    pub fn new(client: AwsJsonClient) -> Self {
        Self { client }
    }

    /// Creates a directory signing with the environment's credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the service endpoint is invalid.
    pub fn from_config(http: reqwest::Client, config: &AwsConfig) -> Result<Self, AwsError> {
        Ok(Self::new(AwsJsonClient::from_config(http, config, COGNITO_IDP)?))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AdminListGroupsForUserRequest<'a> {
    username: &'a str,
    user_pool_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AdminListGroupsForUserResponse {
    #[serde(default)]
    groups: Vec<GroupType>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GroupType {
    group_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AdminUpdateUserAttributesRequest<'a> {
    username: &'a str,
    user_pool_id: &'a str,
    user_attributes: Vec<AttributeType<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType<'a> {
    name: &'a str,
    value: &'a str,
}

fn directory_error(operation: &'static str, error: AwsError) -> DirectoryError {
    match error {
        AwsError::Service { code, message, .. } => DirectoryError::Rejected {
            operation,
            code,
            message,
        },
        AwsError::InvalidResponse { details, .. } => {
            DirectoryError::InvalidResponse { operation, details }
        }
        other => DirectoryError::RequestFailed {
            operation,
            details: other.to_string(),
        },
    }
}

#[async_trait]
impl UserDirectory for CognitoDirectory {
    #[instrument(skip(self), fields(%username, %user_pool_id))]
    async fn list_groups_for_user(
        &self,
        username: &Username,
        user_pool_id: &UserPoolId,
    ) -> Result<Vec<String>, DirectoryError> {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let request = AdminListGroupsForUserRequest {
                username: username.as_str(),
                user_pool_id: user_pool_id.as_str(),
                next_token: next_token.as_deref(),
            };
            let response: AdminListGroupsForUserResponse = self
                .client
                .call("AdminListGroupsForUser", &request)
                .await
                .map_err(|e| directory_error(LIST_GROUPS, e))?;

            groups.extend(response.groups.into_iter().map(|g| g.group_name));

            match response.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!(count = groups.len(), "listed groups");
        Ok(groups)
    }

    #[instrument(skip(self, attributes), fields(%username, %user_pool_id))]
    async fn update_user_attributes(
        &self,
        username: &Username,
        user_pool_id: &UserPoolId,
        attributes: &[UserAttribute],
    ) -> Result<(), DirectoryError> {
        let request = AdminUpdateUserAttributesRequest {
            username: username.as_str(),
            user_pool_id: user_pool_id.as_str(),
            user_attributes: attributes
                .iter()
                .map(|a| AttributeType {
                    name: &a.name,
                    value: &a.value,
                })
                .collect(),
        };

        let _: serde::de::IgnoredAny = self
            .client
            .call("AdminUpdateUserAttributes", &request)
            .await
            .map_err(|e| directory_error(UPDATE_ATTRIBUTES, e))?;

        debug!(count = attributes.len(), "updated attributes");
        Ok(())
    }
}

/// Region and pool id taken from a user pool issuer URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolIssuer {
    pub region: String,
    pub user_pool_id: String,
}

impl PoolIssuer {
    /// Parses `https://cognito-idp.<region>.amazonaws.com/<pool id>`.
    ///
    /// The region falls back to `us-east-1` when the host is not a
    /// regional user pool host. Returns `None` when there is no pool id.
    #[must_use]
    pub fn parse(issuer: &str) -> Option<Self> {
        let user_pool_id = issuer.rsplit('/').next().unwrap_or_default();
        if user_pool_id.is_empty() {
            return None;
        }

        let region = issuer
            .split_once("cognito-idp.")
            .and_then(|(_, rest)| rest.split_once(".amazonaws.com"))
            .map(|(region, _)| region)
            .filter(|region| {
                !region.is_empty()
                    && region
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            })
            .unwrap_or("us-east-1");

        Some(Self {
            region: region.to_string(),
            user_pool_id: user_pool_id.to_string(),
        })
    }
}

/// A self-service registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub attributes: Vec<UserAttribute>,
}

/// What the user pool reports about a new registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignUpOutcome {
    #[serde(default)]
    pub user_confirmed: bool,
    #[serde(default)]
    pub user_sub: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpBody<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_hash: Option<String>,
}

/// Registers users through an app client of the pool.
#[derive(Debug, Clone)]
pub struct CognitoSignUp {
    client: AwsJsonClient,
    client_id: String,
    client_secret: Option<String>,
}

impl CognitoSignUp {
    /// Creates a sign-up client over an existing (unsigned) client.
    #[must_use]
    pub fn new(client: AwsJsonClient, client_id: String, client_secret: Option<String>) -> Self {
        Self {
            client,
            client_id,
            client_secret,
        }
    }

    /// Creates a sign-up client for the pool's region, or for
    /// `endpoint_url` when one is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid.
    pub fn for_issuer(
        http: reqwest::Client,
        issuer: &PoolIssuer,
        endpoint_url: Option<&str>,
        client_id: String,
        client_secret: Option<String>,
    ) -> Result<Self, AwsError> {
        let raw = endpoint_url
            .map(str::to_string)
            .unwrap_or_else(|| regional_endpoint(COGNITO_IDP.endpoint_prefix, &issuer.region));
        let endpoint = Url::parse(&raw).map_err(|e| AwsError::InvalidEndpoint {
            url: raw.clone(),
            details: e.to_string(),
        })?;
        let client = AwsJsonClient::new(http, endpoint, COGNITO_IDP, None)?;
        Ok(Self::new(client, client_id, client_secret))
    }

    /// Registers a user.
    ///
    /// Returns the plain `AwsError` so callers can relay the pool's status
    /// and error code.
    ///
    /// # Errors
    ///
    /// Returns `Service` if the pool rejects the registration, or a
    /// transport error.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> std::result::Result<SignUpOutcome, AwsError> {
        let body = SignUpBody {
            client_id: &self.client_id,
            username: &request.username,
            password: &request.password,
            user_attributes: request
                .attributes
                .iter()
                .map(|a| AttributeType {
                    name: &a.name,
                    value: &a.value,
                })
                .collect(),
            secret_hash: self
                .client_secret
                .as_deref()
                .map(|secret| secret_hash(&request.username, &self.client_id, secret)),
        };

        let outcome: SignUpOutcome = self.client.call("SignUp", &body).await?;
        info!(confirmed = outcome.user_confirmed, "user registered");
        Ok(outcome)
    }
}

/// The `SecretHash` an app client with a secret must send:
/// base64(HMAC-SHA256(secret, username + client id)).
#[must_use]
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> String {
    let digest = hmac_sha256(
        client_secret.as_bytes(),
        format!("{username}{client_id}").as_bytes(),
    );
    base64::engine::general_purpose::STANDARD.encode(digest)
}
