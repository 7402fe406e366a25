//! The identity directory capability and the two calls made through it.
//!
//! The pipeline needs exactly two operations from the directory: listing a
//! user's groups and writing attributes on the user record. Everything else
//! about the directory stays behind the `UserDirectory` trait.

use crate::error::DirectoryError;
use crate::resolve::ResolvedClaims;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::{Result, UserPoolId, Username};
use tokio::time::{Instant, timeout_at};
use tracing::debug;

/// Name of the custom attribute holding the encoded claims.
pub const CLAIMS_ATTRIBUTE: &str = "custom:claims";

/// A name/value attribute on a directory user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttribute {
    pub name: String,
    pub value: String,
}

impl UserAttribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Administrative access to the identity directory.
///
/// This abstraction allows testing the pipeline without a real directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Lists the names of the groups the user currently belongs to.
    async fn list_groups_for_user(
        &self,
        username: &Username,
        user_pool_id: &UserPoolId,
    ) -> Result<Vec<String>, DirectoryError>;

    /// Writes attributes on the user record, replacing existing values.
    async fn update_user_attributes(
        &self,
        username: &Username,
        user_pool_id: &UserPoolId,
        attributes: &[UserAttribute],
    ) -> Result<(), DirectoryError>;
}

/// Fetches the user's groups, failing if `deadline` passes first.
///
/// # Errors
///
/// Returns the directory's error, or `Timeout` if the deadline passes.
pub async fn fetch_groups<D>(
    directory: &D,
    username: &Username,
    user_pool_id: &UserPoolId,
    deadline: Instant,
) -> Result<Vec<String>, DirectoryError>
where
    D: UserDirectory + ?Sized,
{
    let groups = timeout_at(
        deadline,
        directory.list_groups_for_user(username, user_pool_id),
    )
    .await
    .map_err(|_| DirectoryError::Timeout {
        operation: "list groups",
    })??;

    debug!(?groups, "user groups");
    Ok(groups)
}

/// Writes the claims to the user's `custom:claims` attribute.
///
/// # Errors
///
/// Returns an error if encoding fails, the directory rejects the write, or
/// the deadline passes.
pub async fn publish_claims<D>(
    directory: &D,
    username: &Username,
    user_pool_id: &UserPoolId,
    claims: &ResolvedClaims,
    deadline: Instant,
) -> Result<(), DirectoryError>
where
    D: UserDirectory + ?Sized,
{
    let value = claims
        .to_attribute_value()
        .map_err(|e| DirectoryError::Encode {
            details: e.to_string(),
        })?;
    let attributes = [UserAttribute::new(CLAIMS_ATTRIBUTE, value)];

    timeout_at(
        deadline,
        directory.update_user_attributes(username, user_pool_id, &attributes),
    )
    .await
    .map_err(|_| DirectoryError::Timeout {
        operation: "update attributes",
    })?
}
