//! Built-in family calculators.
//!
//! One [`FamilyRules`] implementation per entity family. Each declares the
//! family's canonical shape, the nested objects it default-initializes, and
//! optionally a path filter. MARC bib and authority records share one
//! calculator, instantiated per record type.

pub mod holdings;
pub mod instance;
pub mod item;
pub mod marc;
pub mod user;

use std::sync::Arc;

use trail_types::EntityFamily;

use crate::rules::FamilyRules;
use crate::shape::{ObjectShape, ScalarKind};

pub use holdings::HoldingsRules;
pub use instance::InstanceRules;
pub use item::ItemRules;
pub use marc::MarcRules;
pub use user::UserRules;

/// The built-in rules for `family`.
pub fn default_rules(family: EntityFamily) -> Arc<dyn FamilyRules> {
    match family {
        EntityFamily::Item => Arc::new(ItemRules::new()),
        EntityFamily::Holdings => Arc::new(HoldingsRules::new()),
        EntityFamily::Instance => Arc::new(InstanceRules::new()),
        EntityFamily::User => Arc::new(UserRules::new()),
        EntityFamily::MarcBib | EntityFamily::MarcAuthority => Arc::new(MarcRules::new(family)),
    }
}

// ---------------------------------------------------------------------------
// Family markers
// ---------------------------------------------------------------------------

/// Top-level keys only one family's snapshots carry. Generic keys such as
/// `id`, `hrid` or `metadata` never appear here.
const MARKERS: &[(EntityFamily, &[&str])] = &[
    (
        EntityFamily::Item,
        &["holdingsRecordId", "materialTypeId", "permanentLoanTypeId"],
    ),
    (
        EntityFamily::Holdings,
        &["instanceId", "holdingsTypeId", "holdingsStatements"],
    ),
    (
        EntityFamily::Instance,
        &["title", "instanceTypeId", "modeOfIssuanceId"],
    ),
    (EntityFamily::User, &["username", "patronGroup", "personal"]),
    (EntityFamily::MarcBib, &["leader", "parsedRecord"]),
    (EntityFamily::MarcAuthority, &["leader", "parsedRecord"]),
];

/// Returns `true` if `key` marks some family other than `family` and not
/// `family` itself.
pub(crate) fn marks_other_family(family: EntityFamily, key: &str) -> bool {
    let mut other = false;
    for (owner, keys) in MARKERS {
        if keys.iter().any(|k| *k == key) {
            if *owner == family {
                return false;
            }
            other = true;
        }
    }
    other
}

// ---------------------------------------------------------------------------
// Shapes shared across inventory families
// ---------------------------------------------------------------------------

pub(crate) fn electronic_access() -> ObjectShape {
    ObjectShape::new("ElectronicAccess").strings(&[
        "uri",
        "linkText",
        "materialsSpecification",
        "publicNote",
        "relationshipId",
    ])
}

pub(crate) fn tags() -> ObjectShape {
    ObjectShape::new("Tags").scalars("tagList", ScalarKind::String)
}

pub(crate) fn note(type_name: &'static str, type_field: &'static str) -> ObjectShape {
    ObjectShape::new(type_name)
        .strings(&[type_field, "note"])
        .scalar("staffOnly", ScalarKind::Boolean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FamilyCalculator;
    use serde_json::json;

    #[test]
    fn every_family_has_rules_for_itself() {
        for family in EntityFamily::ALL {
            assert_eq!(default_rules(family).family(), family);
        }
    }

    #[test]
    fn markers_are_declared_by_their_own_family() {
        for (family, keys) in MARKERS {
            let rules = default_rules(*family);
            for key in *keys {
                assert!(
                    rules.shape().declares(key) || *key == "parsedRecord",
                    "{family}: marker `{key}` is not declared"
                );
                assert!(!rules.is_foreign_key(key));
            }
        }
    }

    #[test]
    fn wrong_family_payloads_carrying_shared_keys_are_rejected() {
        let cases = [
            (EntityFamily::Item, json!({"id": "in1", "hrid": "in001", "title": "A", "languages": ["en"]})),
            (EntityFamily::Item, json!({"id": "h1", "instanceId": "in1", "callNumber": "QA76"})),
            (EntityFamily::Instance, json!({"id": "u1", "username": "jdoe"})),
            (EntityFamily::Holdings, json!({"id": "i1", "hrid": "it1", "holdingsRecordId": "h1"})),
            (EntityFamily::User, json!({"id": "in1", "title": "A"})),
            (EntityFamily::Instance, json!({"id": "s1", "recordType": "MARC_BIB", "parsedRecord": {"content": {}}})),
        ];
        for (family, raw) in cases {
            let calculator = FamilyCalculator::new(default_rules(family));
            let err = calculator.diff(Some(&raw), Some(&raw)).unwrap_err();
            assert!(err.is_mapping(), "{family} accepted {raw}");
            assert!(calculator.diff(None, Some(&raw)).is_err());
        }
    }

    #[test]
    fn own_payloads_with_generic_keys_are_accepted() {
        let cases = [
            (EntityFamily::Item, json!({"id": "i1", "hrid": "it1", "holdingsRecordId": "h1", "metadata": {}})),
            (EntityFamily::Holdings, json!({"id": "h1", "instanceId": "in1", "metadata": {}})),
            (EntityFamily::Instance, json!({"id": "in1", "title": "A", "metadata": {}})),
            (EntityFamily::User, json!({"id": "u1", "username": "jdoe", "metadata": {}})),
        ];
        for (family, raw) in cases {
            let calculator = FamilyCalculator::new(default_rules(family));
            assert!(calculator.diff(None, Some(&raw)).is_ok(), "{family} rejected {raw}");
        }
    }

    #[test]
    fn default_objects_resolve_to_declared_objects() {
        for family in EntityFamily::ALL {
            let rules = default_rules(family);
            for path in rules.default_objects() {
                assert!(
                    rules.shape().object_at(path).is_some(),
                    "{family}: `{path}` is not an object field"
                );
            }
        }
    }
}
