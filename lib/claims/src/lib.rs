//! Post-authentication claims resolution for the storefront user pool.
//!
//! This crate provides:
//! - The role and claim-set catalog (`ClaimsCatalog`)
//! - Precedence ordering and claim aggregation (`order_by_precedence`, `aggregate_claims`)
//! - The identity directory capability (`UserDirectory`)
//! - The fail-open trigger pipeline (`ClaimsPipeline`)
//! - Decoding of claims carried in ID tokens (`SessionClaims`)
//!
//! # Example
//!
//! ```
//! use storefront_claims::{ClaimsCatalog, resolve_groups};
//!
//! let catalog = ClaimsCatalog::default();
//! let groups = vec!["customers".to_string(), "curators".to_string()];
//! let claims = resolve_groups(&catalog, &groups);
//!
//! assert!(claims.is_granted("canEditContent"));
//! assert!(claims.is_granted("canPlaceMyOrder"));
//! assert!(!claims.is_granted("canDeleteUsers"));
//! ```

pub mod catalog;
pub mod directory;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod resolve;
pub mod session;

#[cfg(test)]
mod testing;

pub use catalog::{ClaimSet, ClaimValue, ClaimsCatalog, RoleDefinition};
pub use directory::{CLAIMS_ATTRIBUTE, UserAttribute, UserDirectory, fetch_groups, publish_claims};
pub use error::{CatalogError, DirectoryError, SessionError};
pub use event::{PostAuthenticationEvent, PostAuthenticationRequest, SkipReason};
pub use pipeline::{ClaimsPipeline, DEFAULT_TIMEOUT, PipelineOutcome};
pub use resolve::{ResolvedClaims, aggregate_claims, order_by_precedence, resolve_groups};
pub use session::{GROUPS_CLAIM, SessionClaims};
