//! Role ordering and claim aggregation.
//!
//! Both steps are pure functions of the catalog and their input. Neither can
//! fail: names the catalog does not know are logged and carried along or
//! skipped.

use crate::catalog::{ClaimValue, ClaimsCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The merged claims for one user.
///
/// Keys are kept sorted so the encoded attribute is identical for identical
/// inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedClaims(BTreeMap<String, ClaimValue>);

impl ResolvedClaims {
    /// Creates an empty claims map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a claim, replacing any earlier value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: ClaimValue) {
        self.0.insert(key.into(), value);
    }

    /// Returns the value of a claim.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ClaimValue> {
        self.0.get(key)
    }

    /// Returns true if the claim is a boolean `true`.
    #[must_use]
    pub fn is_granted(&self, key: &str) -> bool {
        self.get(key).is_some_and(ClaimValue::is_granted)
    }

    /// Returns the number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no claims resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates claims in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClaimValue)> {
        self.0.iter()
    }

    /// Encodes the claims as the JSON string stored on the user record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_attribute_value(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Decodes claims previously written with [`Self::to_attribute_value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object of claim values.
    pub fn from_attribute_value(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}

/// Maps directory groups to role names and orders them by precedence.
///
/// Names missing from the precedence table sort before every listed role.
/// Their relative order is kept. Only the iteration order is affected: the
/// aggregator still visits every name, and only defined roles contribute.
#[must_use]
pub fn order_by_precedence(catalog: &ClaimsCatalog, groups: &[String]) -> Vec<String> {
    let mut roles: Vec<String> = groups
        .iter()
        .map(|group| catalog.role_for_group(group).to_string())
        .collect();

    for role in &roles {
        if catalog.precedence_of(role).is_none() {
            info!(%role, "role has no precedence entry, ordering it first");
        }
    }

    // `None < Some(_)`: unranked names lead.
    roles.sort_by_key(|role| catalog.precedence_of(role));
    debug!(?roles, "ordered user roles");
    roles
}

/// Expands roles into their claim-sets and merges every claim.
///
/// Roles are visited in the given order and claim-sets in declared order;
/// the last pair defining a key wins.
#[must_use]
pub fn aggregate_claims(catalog: &ClaimsCatalog, roles: &[String]) -> ResolvedClaims {
    let mut resolved = ResolvedClaims::new();

    for role in roles {
        let Some(definition) = catalog.role(role) else {
            warn!(%role, "role not found in definitions, skipping");
            continue;
        };

        for set_name in &definition.claim_sets {
            let Some(claim_set) = catalog.claim_set(set_name) else {
                warn!(%role, claim_set = %set_name, "claim set not found, skipping");
                continue;
            };
            for (claim, value) in claim_set {
                resolved.insert(claim.clone(), value.clone());
            }
        }
    }

    debug!(claims = resolved.len(), "resolved claims");
    resolved
}

/// Orders the groups and aggregates their claims in one step.
#[must_use]
pub fn resolve_groups(catalog: &ClaimsCatalog, groups: &[String]) -> ResolvedClaims {
    aggregate_claims(catalog, &order_by_precedence(catalog, groups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClaimSet, RoleDefinition};
    use proptest::prelude::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    /// Two roles whose claim-sets disagree on `tier`.
    fn conflicting_catalog() -> ClaimsCatalog {
        let bronze: ClaimSet = [
            ("tier".to_string(), ClaimValue::from("bronze")),
            ("canBrowse".to_string(), ClaimValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        let gold: ClaimSet = [
            ("tier".to_string(), ClaimValue::from("gold")),
            ("maxDiscount".to_string(), ClaimValue::from(20)),
        ]
        .into_iter()
        .collect();

        ClaimsCatalog::new(
            strings(&["first", "second"]),
            BTreeMap::from([
                ("first".to_string(), RoleDefinition::new(["bronze"])),
                ("second".to_string(), RoleDefinition::new(["gold"])),
                ("both".to_string(), RoleDefinition::new(["gold", "bronze"])),
            ]),
            BTreeMap::from([("bronze".to_string(), bronze), ("gold".to_string(), gold)]),
        )
    }

    #[test]
    fn orders_groups_by_precedence() {
        let catalog = ClaimsCatalog::default();
        let ordered = order_by_precedence(&catalog, &strings(&["customers", "curators"]));
        assert_eq!(ordered, strings(&["curator", "customer"]));
    }

    #[test]
    fn unknown_groups_sort_first_and_are_kept() {
        let catalog = ClaimsCatalog::default();
        let ordered =
            order_by_precedence(&catalog, &strings(&["customers", "guest", "admins", "vip"]));
        assert_eq!(ordered, strings(&["guest", "vip", "admin", "customer"]));
    }

    #[test]
    fn empty_groups_order_to_empty() {
        let catalog = ClaimsCatalog::default();
        assert!(order_by_precedence(&catalog, &[]).is_empty());
    }

    #[test]
    fn curator_and_customer_resolve_to_content_and_buyer() {
        let catalog = ClaimsCatalog::default();
        let claims = resolve_groups(&catalog, &strings(&["customers", "curators"]));

        let expected = [
            "canCreateContent",
            "canEditContent",
            "canUnlistContent",
            "canPlaceMyOrder",
            "canManageMyCart",
            "canUpdateMyProfile",
        ];
        assert_eq!(claims.len(), expected.len());
        for key in expected {
            assert!(claims.is_granted(key), "{key} should be granted");
        }
        assert!(claims.get("canViewUsers").is_none());
    }

    #[test]
    fn unknown_group_contributes_nothing() {
        let catalog = ClaimsCatalog::default();
        let claims = resolve_groups(&catalog, &strings(&["guest", "customers"]));
        let buyer_only = resolve_groups(&catalog, &strings(&["customers"]));
        assert_eq!(claims, buyer_only);
        assert_eq!(claims.len(), 3);
    }

    #[test]
    fn admin_gets_every_default_claim() {
        let catalog = ClaimsCatalog::default();
        let claims = resolve_groups(&catalog, &strings(&["admins"]));
        assert_eq!(claims.len(), 10);
        assert!(claims.is_granted("canDeleteUsers"));
    }

    #[test]
    fn later_role_wins_conflicting_key() {
        let catalog = conflicting_catalog();
        let claims = aggregate_claims(&catalog, &strings(&["first", "second"]));
        assert_eq!(claims.get("tier"), Some(&ClaimValue::from("gold")));
        assert_eq!(claims.get("maxDiscount"), Some(&ClaimValue::from(20)));
        assert!(claims.is_granted("canBrowse"));

        let reversed = aggregate_claims(&catalog, &strings(&["second", "first"]));
        assert_eq!(reversed.get("tier"), Some(&ClaimValue::from("bronze")));
    }

    #[test]
    fn later_claim_set_within_role_wins() {
        let catalog = conflicting_catalog();
        let claims = aggregate_claims(&catalog, &strings(&["both"]));
        assert_eq!(claims.get("tier"), Some(&ClaimValue::from("bronze")));
    }

    #[test]
    fn unknown_claim_set_is_skipped() {
        let catalog = ClaimsCatalog::new(
            strings(&["partial"]),
            BTreeMap::from([(
                "partial".to_string(),
                RoleDefinition::new(["missing", "real"]),
            )]),
            BTreeMap::from([(
                "real".to_string(),
                [("canRead".to_string(), ClaimValue::Bool(true))]
                    .into_iter()
                    .collect(),
            )]),
        );
        let claims = aggregate_claims(&catalog, &strings(&["partial"]));
        assert_eq!(claims.len(), 1);
        assert!(claims.is_granted("canRead"));
    }

    #[test]
    fn empty_roles_encode_as_empty_object() {
        let claims = aggregate_claims(&ClaimsCatalog::default(), &[]);
        assert!(claims.is_empty());
        assert_eq!(claims.to_attribute_value().expect("encode"), "{}");
    }

    #[test]
    fn attribute_value_is_sorted_json() {
        let catalog = ClaimsCatalog::default();
        let claims = resolve_groups(&catalog, &strings(&["customers"]));
        assert_eq!(
            claims.to_attribute_value().expect("encode"),
            r#"{"canManageMyCart":true,"canPlaceMyOrder":true,"canUpdateMyProfile":true}"#
        );
        let decoded =
            ResolvedClaims::from_attribute_value(&claims.to_attribute_value().expect("encode"))
                .expect("decode");
        assert_eq!(decoded, claims);
    }

    fn role_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("admin".to_string()),
            Just("curator".to_string()),
            Just("customer".to_string()),
            Just("admins".to_string()),
            Just("customers".to_string()),
            "[a-z]{1,8}",
        ]
    }

    proptest! {
        #[test]
        fn resolution_is_deterministic(groups in proptest::collection::vec(role_name(), 0..8)) {
            let catalog = ClaimsCatalog::default();
            let first = resolve_groups(&catalog, &groups);
            let second = resolve_groups(&catalog, &groups);
            prop_assert_eq!(
                first.to_attribute_value().unwrap(),
                second.to_attribute_value().unwrap()
            );
            prop_assert_eq!(first, second);
        }

        #[test]
        fn undefined_roles_do_not_change_claims(
            roles in proptest::collection::vec(role_name(), 0..8),
            noise in proptest::collection::vec("zz[a-z]{1,6}", 0..4),
        ) {
            let catalog = ClaimsCatalog::default();
            let mut noisy = roles.clone();
            noisy.extend(noise);
            prop_assert_eq!(
                aggregate_claims(&catalog, &roles),
                aggregate_claims(&catalog, &noisy)
            );
        }
    }
}
