//! In-memory directory used by the crate's tests.

use crate::directory::{UserAttribute, UserDirectory};
use crate::error::DirectoryError;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use storefront_core::{Result, UserPoolId, Username};

/// A call observed by the fake directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    ListGroups {
        username: String,
        user_pool_id: String,
    },
    UpdateAttributes {
        username: String,
        user_pool_id: String,
        attributes: Vec<UserAttribute>,
    },
}

/// A directory that serves fixed groups and records every call.
pub struct FakeDirectory {
    groups: Vec<String>,
    fail_list: bool,
    fail_update: bool,
    list_delay: Option<Duration>,
    update_delay: Option<Duration>,
    calls: Mutex<Vec<DirectoryCall>>,
}

impl FakeDirectory {
    pub fn with_groups(groups: &[&str]) -> Self {
        Self {
            groups: groups.iter().map(|g| (*g).to_string()).collect(),
            fail_list: false,
            fail_update: false,
            list_delay: None,
            update_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_update(mut self) -> Self {
        self.fail_update = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Values written to the claims attribute, in call order.
    pub fn published_values(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DirectoryCall::UpdateAttributes { attributes, .. } => attributes
                    .into_iter()
                    .find(|a| a.name == crate::directory::CLAIMS_ATTRIBUTE)
                    .map(|a| a.value),
                DirectoryCall::ListGroups { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn list_groups_for_user(
        &self,
        username: &Username,
        user_pool_id: &UserPoolId,
    ) -> Result<Vec<String>, DirectoryError> {
        self.calls.lock().unwrap().push(DirectoryCall::ListGroups {
            username: username.to_string(),
            user_pool_id: user_pool_id.to_string(),
        });
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list {
            return Err(DirectoryError::Rejected {
                operation: "list groups",
                code: "TooManyRequestsException".to_string(),
                message: "Rate exceeded".to_string(),
            }
            .into());
        }
        Ok(self.groups.clone())
    }

    async fn update_user_attributes(
        &self,
        username: &Username,
        user_pool_id: &UserPoolId,
        attributes: &[UserAttribute],
    ) -> Result<(), DirectoryError> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::UpdateAttributes {
                username: username.to_string(),
                user_pool_id: user_pool_id.to_string(),
                attributes: attributes.to_vec(),
            });
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_update {
            return Err(DirectoryError::RequestFailed {
                operation: "update attributes",
                details: "connection reset".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
