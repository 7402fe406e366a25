//! Static role and claim-set definitions.
//!
//! A user's directory groups map to roles, each role bundles one or more
//! claim-sets, and each claim-set is a flat map of claim values. The catalog is
//! built once at start-up (compiled-in defaults or a JSON file) and shared
//! read-only between invocations.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use storefront_core::Result;
use tracing::{info, warn};

/// A single claim value attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ClaimValue {
    /// Returns true only for a boolean `true` claim.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A named, reusable bundle of claims.
pub type ClaimSet = BTreeMap<String, ClaimValue>;

/// A role and the claim-sets it includes, in the order they are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub claim_sets: Vec<String>,
}

impl RoleDefinition {
    /// Creates a role from claim-set names.
    #[must_use]
    pub fn new<I, S>(claim_sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            claim_sets: claim_sets.into_iter().map(Into::into).collect(),
        }
    }
}

/// The complete, immutable claims configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsCatalog {
    /// Role names from highest to lowest precedence.
    precedence: Vec<String>,
    roles: BTreeMap<String, RoleDefinition>,
    claim_sets: BTreeMap<String, ClaimSet>,
    /// Directory group name to role name. Groups without an entry are used
    /// verbatim as role names.
    #[serde(default)]
    group_roles: BTreeMap<String, String>,
}

impl ClaimsCatalog {
    /// Creates a catalog from its tables, with no group aliases.
    #[must_use]
    pub fn new(
        precedence: Vec<String>,
        roles: BTreeMap<String, RoleDefinition>,
        claim_sets: BTreeMap<String, ClaimSet>,
    ) -> Self {
        Self {
            precedence,
            roles,
            claim_sets,
            group_roles: BTreeMap::new(),
        }
    }

    /// Maps a directory group to a role name.
    #[must_use]
    pub fn with_group_role(mut self, group: impl Into<String>, role: impl Into<String>) -> Self {
        self.group_roles.insert(group.into(), role.into());
        self
    }

    /// Loads a catalog from a JSON file.
    ///
    /// Dangling references are logged as warnings; they never fail the load
    /// because resolution skips unknown names anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: shown.clone(),
            details: e.to_string(),
        })?;
        let catalog: Self = serde_json::from_str(&raw).map_err(|e| CatalogError::Parse {
            path: shown.clone(),
            details: e.to_string(),
        })?;

        for problem in catalog.dangling_references() {
            warn!(path = %shown, %problem, "claims catalog reference does not resolve");
        }
        info!(
            path = %shown,
            roles = catalog.roles.len(),
            claim_sets = catalog.claim_sets.len(),
            "loaded claims catalog"
        );
        Ok(catalog)
    }

    /// Loads the catalog from `path` when given, otherwise the built-in tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Returns role names from highest to lowest precedence.
    #[must_use]
    pub fn precedence(&self) -> &[String] {
        &self.precedence
    }

    /// Returns the position of a role in the precedence table.
    #[must_use]
    pub fn precedence_of(&self, role: &str) -> Option<usize> {
        self.precedence.iter().position(|r| r == role)
    }

    /// Looks up a role definition.
    #[must_use]
    pub fn role(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.get(name)
    }

    /// Looks up a claim-set.
    #[must_use]
    pub fn claim_set(&self, name: &str) -> Option<&ClaimSet> {
        self.claim_sets.get(name)
    }

    /// Returns the role name a directory group stands for.
    #[must_use]
    pub fn role_for_group<'a>(&'a self, group: &'a str) -> &'a str {
        self.group_roles.get(group).map_or(group, String::as_str)
    }

    /// Describes every name the catalog references but does not define.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for role in &self.precedence {
            if !self.roles.contains_key(role) {
                problems.push(format!("precedence lists undefined role '{role}'"));
            }
        }
        for (role, definition) in &self.roles {
            for set in &definition.claim_sets {
                if !self.claim_sets.contains_key(set) {
                    problems.push(format!("role '{role}' includes undefined claim set '{set}'"));
                }
            }
        }
        for (group, role) in &self.group_roles {
            if !self.roles.contains_key(role) {
                problems.push(format!("group '{group}' maps to undefined role '{role}'"));
            }
        }
        problems
    }
}

fn all_granted(claims: &[&str]) -> ClaimSet {
    claims
        .iter()
        .map(|claim| ((*claim).to_string(), ClaimValue::Bool(true)))
        .collect()
}

impl Default for ClaimsCatalog {
    /// The storefront's built-in roles: admins manage users and content,
    /// curators manage content, and everyone who can sign in can buy.
    fn default() -> Self {
        let claim_sets = BTreeMap::from([
            (
                "content_management".to_string(),
                all_granted(&["canCreateContent", "canEditContent", "canUnlistContent"]),
            ),
            (
                "user_management".to_string(),
                all_granted(&[
                    "canViewUsers",
                    "canCreateUsers",
                    "canUpdateUsers",
                    "canDeleteUsers",
                ]),
            ),
            (
                "buyer".to_string(),
                all_granted(&["canPlaceMyOrder", "canManageMyCart", "canUpdateMyProfile"]),
            ),
        ]);

        let roles = BTreeMap::from([
            (
                "admin".to_string(),
                RoleDefinition::new(["user_management", "content_management", "buyer"]),
            ),
            (
                "curator".to_string(),
                RoleDefinition::new(["content_management", "buyer"]),
            ),
            ("customer".to_string(), RoleDefinition::new(["buyer"])),
        ]);

        let precedence = vec![
            "admin".to_string(),
            "curator".to_string(),
            "customer".to_string(),
        ];

        Self::new(precedence, roles, claim_sets)
            .with_group_role("admins", "admin")
            .with_group_role("curators", "curator")
            .with_group_role("customers", "customer")
    }
}
