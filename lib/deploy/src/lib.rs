//! Blue/green deployment validation for the storefront API.
//!
//! The deployment controller invokes the hook once traffic reaches the new
//! ("green") target. The hook probes the target and reports `Succeeded` or
//! `Failed` back to the controller, which rolls back on failure.

pub mod error;
pub mod hook;
pub mod probe;
pub mod reporter;
pub mod validate;

pub use error::{LifecycleError, ProbeError, ValidationError};
pub use hook::{HookStatus, LifecycleHookEvent};
pub use probe::{DEFAULT_PROBE_TIMEOUT, HealthProbe, HttpHealthProbe};
pub use reporter::LifecycleReporter;
pub use validate::GreenValidator;
