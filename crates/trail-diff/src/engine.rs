use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use trail_types::{ChangeRecord, EntityFamily};

use crate::adapter::{normalize, CanonicalEntity};
use crate::assemble::assemble;
use crate::compare::compare;
use crate::config::EngineConfig;
use crate::correlate::correlate;
use crate::error::{DiffError, DiffResult};
use crate::families::default_rules;
use crate::rules::{FamilyRules, IgnorePaths};

// ---------------------------------------------------------------------------
// FamilyCalculator
// ---------------------------------------------------------------------------

/// The diff pipeline bound to one family's rules:
/// normalize -> compare -> correlate -> assemble.
#[derive(Clone)]
pub struct FamilyCalculator {
    rules: Arc<dyn FamilyRules>,
}

impl FamilyCalculator {
    pub fn new(rules: Arc<dyn FamilyRules>) -> Self {
        Self { rules }
    }

    pub fn family(&self) -> EntityFamily {
        self.rules.family()
    }

    pub fn rules(&self) -> &dyn FamilyRules {
        self.rules.as_ref()
    }

    /// Normalize one snapshot into this family's canonical shape.
    pub fn normalize(&self, raw: Option<&Value>) -> DiffResult<CanonicalEntity> {
        normalize(self.rules.as_ref(), raw)
    }

    /// Diff two snapshots. `None` stands for an absent snapshot (creation or
    /// deletion). Returns `Ok(None)` when nothing reportable changed.
    pub fn diff(&self, old: Option<&Value>, new: Option<&Value>) -> DiffResult<Option<ChangeRecord>> {
        let rules = self.rules.as_ref();
        let old = normalize(rules, old)?;
        let new = normalize(rules, new)?;

        let raw = compare(rules, &old, &new)?;
        let raw_count = raw.len();
        let correlation = correlate(raw);
        let record = assemble(&correlation);

        debug!(
            family = %rules.family(),
            raw_changes = raw_count,
            groups = correlation.len(),
            changes = record.as_ref().map_or(0, ChangeRecord::len),
            "diff computed"
        );
        Ok(record)
    }
}

impl std::fmt::Debug for FamilyCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyCalculator")
            .field("family", &self.family())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DiffEngine
// ---------------------------------------------------------------------------

/// Registry of family calculators keyed by [`EntityFamily`].
///
/// Rules are immutable once registered and shared through `Arc`, so one
/// engine can serve concurrent diff calls from many threads.
#[derive(Clone, Default)]
pub struct DiffEngine {
    families: HashMap<EntityFamily, Arc<dyn FamilyRules>>,
}

impl DiffEngine {
    /// Create an engine with no families registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the built-in rules for every family.
    pub fn with_default_families() -> Self {
        let mut engine = Self::new();
        for family in EntityFamily::ALL {
            engine.register(default_rules(family));
        }
        engine
    }

    /// Build an engine from configuration: the listed families, each with
    /// its configured ignored paths layered over the built-in filter.
    pub fn from_config(config: &EngineConfig) -> DiffResult<Self> {
        let mut ignored = config.resolve_ignored()?;
        let mut engine = Self::new();
        for &family in &config.families {
            let rules = default_rules(family);
            match ignored.remove(&family) {
                Some(prefixes) if !prefixes.is_empty() => {
                    engine.register(Arc::new(IgnorePaths::new(rules, prefixes)));
                }
                _ => engine.register(rules),
            }
        }
        if let Some(family) = ignored.into_keys().next() {
            return Err(DiffError::Config(format!(
                "ignored paths configured for `{family}`, which is not in `families`"
            )));
        }
        Ok(engine)
    }

    /// Register (or replace) the rules for their family.
    pub fn register(&mut self, rules: Arc<dyn FamilyRules>) {
        let family = rules.family();
        debug!(%family, shape = rules.shape().type_name(), "registered family calculator");
        self.families.insert(family, rules);
    }

    /// The calculator for `family`.
    pub fn calculator(&self, family: EntityFamily) -> DiffResult<FamilyCalculator> {
        self.families
            .get(&family)
            .cloned()
            .map(FamilyCalculator::new)
            .ok_or(DiffError::UnsupportedFamily(family))
    }

    /// Registered families, sorted.
    pub fn families(&self) -> Vec<EntityFamily> {
        let mut families: Vec<_> = self.families.keys().copied().collect();
        families.sort();
        families
    }

    pub fn supports(&self, family: EntityFamily) -> bool {
        self.families.contains_key(&family)
    }

    /// Diff two snapshots of a `family` entity.
    pub fn diff(
        &self,
        family: EntityFamily,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> DiffResult<Option<ChangeRecord>> {
        self.calculator(family)?.diff(old, new)
    }
}

impl std::fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffEngine")
            .field("families", &self.families())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use trail_types::ChangeType;

    fn engine() -> DiffEngine {
        DiffEngine::with_default_families()
    }

    #[test]
    fn all_families_registered_by_default() {
        assert_eq!(engine().families(), EntityFamily::ALL.to_vec());
    }

    #[test]
    fn unregistered_family_is_unsupported() {
        let engine = DiffEngine::new();
        let err = engine
            .diff(EntityFamily::Item, None, Some(&json!({"id": "i1"})))
            .unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedFamily(EntityFamily::Item)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn register_replaces_existing_rules() {
        let mut engine = DiffEngine::new();
        engine.register(default_rules(EntityFamily::Item));
        engine.register(Arc::new(IgnorePaths::new(
            default_rules(EntityFamily::Item),
            vec!["barcode".into()],
        )));
        assert_eq!(engine.families(), vec![EntityFamily::Item]);
        let diff = engine
            .diff(
                EntityFamily::Item,
                Some(&json!({"barcode": "1"})),
                Some(&json!({"barcode": "2"})),
            )
            .unwrap();
        assert!(diff.is_none());
    }

    #[test]
    fn wrong_family_snapshot_fails() {
        let user = json!({"id": "u1", "username": "jdoe", "personal": {"lastName": "Doe"}});
        let err = engine()
            .diff(EntityFamily::Holdings, Some(&user), Some(&user))
            .unwrap_err();
        assert!(err.is_mapping());

        let old = json!({"id": "in1", "hrid": "in001", "title": "A", "languages": ["en"]});
        let new = json!({"id": "in1", "hrid": "in001", "title": "B", "languages": ["fr"]});
        let err = engine()
            .diff(EntityFamily::Item, Some(&old), Some(&new))
            .unwrap_err();
        assert!(err.is_mapping());
        assert!(engine().diff(EntityFamily::Instance, Some(&old), Some(&new)).unwrap().is_some());
    }

    #[test]
    fn creation_reports_every_populated_field() {
        let instance = json!({
            "title": "A",
            "hrid": "in1",
            "languages": ["en", "fr"],
            "dates": {"date1": "1999"}
        });
        let record = engine()
            .diff(EntityFamily::Instance, None, Some(&instance))
            .unwrap()
            .unwrap();
        let paths: Vec<_> = record.field_changes.iter().map(|c| c.full_path.as_str()).collect();
        assert_eq!(paths, vec!["hrid", "title", "dates.date1"]);
        assert!(record.field_changes.iter().all(|c| c.change_type == ChangeType::Added));
        assert_eq!(record.collection("languages").unwrap().item_changes.len(), 2);
        assert_eq!(record.removals(), 0);
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiffEngine>();
        assert_send_sync::<FamilyCalculator>();

        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine
                        .diff(
                            EntityFamily::Instance,
                            Some(&json!({"title": "A"})),
                            Some(&json!({"title": format!("B{i}")})),
                        )
                        .unwrap()
                        .map(|r| r.len())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
    }

    fn languages() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-z]{2,3}", 0..6).prop_map(|set| set.into_iter().collect())
    }

    fn instance() -> impl Strategy<Value = Value> {
        ("[A-Za-z ]{1,16}", languages(), prop::option::of("[0-9]{4}")).prop_map(
            |(title, languages, date1)| {
                let mut instance = json!({"title": title, "languages": languages});
                if let Some(date1) = date1 {
                    instance["dates"] = json!({"date1": date1});
                }
                instance
            },
        )
    }

    proptest! {
        #[test]
        fn diff_with_itself_is_empty(entity in instance()) {
            let diff = engine().diff(EntityFamily::Instance, Some(&entity), Some(&entity)).unwrap();
            prop_assert!(diff.is_none());
        }

        #[test]
        fn member_order_is_irrelevant(
            (langs, shuffled) in languages().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let old = json!({"title": "A", "languages": langs});
            let new = json!({"title": "A", "languages": shuffled});
            let diff = engine().diff(EntityFamily::Instance, Some(&old), Some(&new)).unwrap();
            prop_assert!(diff.is_none());
        }

        #[test]
        fn creation_adds_one_item_per_element(entity in instance()) {
            let record = engine()
                .diff(EntityFamily::Instance, None, Some(&entity))
                .unwrap()
                .unwrap();
            let elements = entity["languages"].as_array().map_or(0, Vec::len);
            prop_assert_eq!(record.additions(), record.field_changes.len() + elements);
            prop_assert_eq!(record.removals(), 0);
        }

        #[test]
        fn deletion_mirrors_creation(entity in instance()) {
            let created = engine().diff(EntityFamily::Instance, None, Some(&entity)).unwrap().unwrap();
            let deleted = engine().diff(EntityFamily::Instance, Some(&entity), None).unwrap().unwrap();

            prop_assert_eq!(created.field_changes.len(), deleted.field_changes.len());
            for (c, d) in created.field_changes.iter().zip(&deleted.field_changes) {
                prop_assert_eq!(c.change_type, ChangeType::Added);
                prop_assert_eq!(d.change_type, ChangeType::Removed);
                prop_assert_eq!(&c.full_path, &d.full_path);
                prop_assert_eq!(&c.new_value, &d.old_value);
                prop_assert_eq!(&c.old_value, &d.new_value);
            }

            prop_assert_eq!(created.collection_changes.len(), deleted.collection_changes.len());
            for (c, d) in created.collection_changes.iter().zip(&deleted.collection_changes) {
                prop_assert_eq!(&c.collection_name, &d.collection_name);
                prop_assert_eq!(c.item_changes.len(), d.item_changes.len());
                for (ci, di) in c.item_changes.iter().zip(&d.item_changes) {
                    prop_assert_eq!(ci.change_type, ChangeType::Added);
                    prop_assert_eq!(di.change_type, ChangeType::Removed);
                    prop_assert_eq!(&ci.new_value, &di.old_value);
                }
            }
        }
    }
}
