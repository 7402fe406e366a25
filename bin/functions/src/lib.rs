//! Lambda custom runtime for the storefront's functions.
//!
//! One binary serves both functions; `_HANDLER` picks which:
//! - `post-auth`: the post-authentication trigger resolving `custom:claims`
//! - `validate-green`: the blue/green deployment validation hook

pub mod config;
pub mod error;
pub mod handlers;
pub mod runtime;

pub use config::FunctionsConfig;
pub use error::{ErrorPayload, RuntimeError};
pub use runtime::{Handler, Invocation, NextInvocation, RuntimeClient, run, run_once};
