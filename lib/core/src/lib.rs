//! Core types shared by the storefront identity and deployment functions.
//!
//! This crate provides the `Result` alias used across crate boundaries and
//! validated identifier types for the values that arrive in trigger events.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{DeploymentId, LifecycleHookExecutionId, ParseIdError, UserPoolId, Username};
