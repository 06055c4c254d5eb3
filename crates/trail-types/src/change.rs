//! Change records: the public result shape of one diff invocation.
//!
//! A [`ChangeRecord`] only exists when something changed. The constructor
//! returns `None` for an empty set of changes so "nothing changed" can never
//! be confused with "changed to empty".
//!
//! Serialized field names are camelCase and change types SCREAMING_SNAKE_CASE.
//! Unknown attributes are ignored on read and optional values default to
//! `null`, so new optional attributes can be added without breaking stored
//! rows.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of a single change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// Present only on the new side.
    Added,
    /// Present only on the old side.
    Removed,
    /// Present on both sides with different values.
    Modified,
    /// Equal on both sides (including both absent). Never emitted in a final result.
    Nothing,
}

impl ChangeType {
    /// Classify a value pair from its presence on each side and whether the
    /// two present values are equal.
    pub fn classify(old_present: bool, new_present: bool, equal: bool) -> Self {
        match (old_present, new_present) {
            (false, false) => Self::Nothing,
            (false, true) => Self::Added,
            (true, false) => Self::Removed,
            (true, true) if equal => Self::Nothing,
            (true, true) => Self::Modified,
        }
    }

    /// Returns `true` unless this is [`ChangeType::Nothing`].
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Nothing)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "ADDED",
            Self::Removed => "REMOVED",
            Self::Modified => "MODIFIED",
            Self::Nothing => "NOTHING",
        };
        f.write_str(s)
    }
}

/// A scalar or nested-object-valued field that differs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub change_type: ChangeType,
    /// Local name of the field, e.g. `date1`.
    pub field_name: String,
    /// Dotted path from the entity root, e.g. `dates.date1`.
    pub full_path: String,
    #[serde(default)]
    pub old_value: Option<Value>,
    #[serde(default)]
    pub new_value: Option<Value>,
}

impl FieldChange {
    pub fn new(
        change_type: ChangeType,
        field_name: impl Into<String>,
        full_path: impl Into<String>,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Self {
        Self {
            change_type,
            field_name: field_name.into(),
            full_path: full_path.into(),
            old_value,
            new_value,
        }
    }
}

/// A change to one member of a collection.
///
/// ADDED carries only `new_value`, REMOVED only `old_value`, MODIFIED both
/// correlated snapshots of the element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItemChange {
    pub change_type: ChangeType,
    #[serde(default)]
    pub old_value: Option<Value>,
    #[serde(default)]
    pub new_value: Option<Value>,
}

impl CollectionItemChange {
    pub fn added(value: Value) -> Self {
        Self {
            change_type: ChangeType::Added,
            old_value: None,
            new_value: Some(value),
        }
    }

    pub fn removed(value: Value) -> Self {
        Self {
            change_type: ChangeType::Removed,
            old_value: Some(value),
            new_value: None,
        }
    }

    pub fn modified(old: Value, new: Value) -> Self {
        Self {
            change_type: ChangeType::Modified,
            old_value: Some(old),
            new_value: Some(new),
        }
    }
}

/// All changes within one named collection field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionChange {
    /// Dotted path of the collection field, e.g. `languages` or `personal.addresses`.
    pub collection_name: String,
    #[serde(default)]
    pub item_changes: Vec<CollectionItemChange>,
}

impl CollectionChange {
    /// Create an empty collection change for `collection_name`.
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            item_changes: Vec::new(),
        }
    }

    /// Append an item change unless an equal one is already recorded.
    pub fn push(&mut self, item: CollectionItemChange) {
        if !self.item_changes.contains(&item) {
            self.item_changes.push(item);
        }
    }
}

/// The complete diff result for one old/new snapshot pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    #[serde(default)]
    pub field_changes: Vec<FieldChange>,
    #[serde(default)]
    pub collection_changes: Vec<CollectionChange>,
}

impl ChangeRecord {
    /// Build a record from assembled changes.
    ///
    /// NOTHING field changes and collection changes without items are dropped.
    /// Returns `None` when nothing is left.
    pub fn new(
        field_changes: Vec<FieldChange>,
        collection_changes: Vec<CollectionChange>,
    ) -> Option<Self> {
        let field_changes: Vec<FieldChange> = field_changes
            .into_iter()
            .filter(|c| c.change_type.is_change())
            .collect();
        let collection_changes: Vec<CollectionChange> = collection_changes
            .into_iter()
            .map(|mut c| {
                c.item_changes.retain(|i| i.change_type.is_change());
                c
            })
            .filter(|c| !c.item_changes.is_empty())
            .collect();

        if field_changes.is_empty() && collection_changes.is_empty() {
            None
        } else {
            Some(Self {
                field_changes,
                collection_changes,
            })
        }
    }

    /// Returns `true` if the record carries no changes.
    ///
    /// Records built through [`ChangeRecord::new`] are never empty; this only
    /// holds for deserialized blobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of field changes plus number of collection item changes.
    pub fn len(&self) -> usize {
        self.field_changes.len()
            + self
                .collection_changes
                .iter()
                .map(|c| c.item_changes.len())
                .sum::<usize>()
    }

    /// Number of ADDED field and item changes.
    pub fn additions(&self) -> usize {
        self.count(ChangeType::Added)
    }

    /// Number of REMOVED field and item changes.
    pub fn removals(&self) -> usize {
        self.count(ChangeType::Removed)
    }

    /// Number of MODIFIED field and item changes.
    pub fn modifications(&self) -> usize {
        self.count(ChangeType::Modified)
    }

    /// Look up a field change by its full path.
    pub fn field(&self, full_path: &str) -> Option<&FieldChange> {
        self.field_changes.iter().find(|c| c.full_path == full_path)
    }

    /// Look up a collection change by collection name.
    pub fn collection(&self, name: &str) -> Option<&CollectionChange> {
        self.collection_changes
            .iter()
            .find(|c| c.collection_name == name)
    }

    fn count(&self, change_type: ChangeType) -> usize {
        let fields = self
            .field_changes
            .iter()
            .filter(|c| c.change_type == change_type)
            .count();
        let items = self
            .collection_changes
            .iter()
            .flat_map(|c| &c.item_changes)
            .filter(|i| i.change_type == change_type)
            .count();
        fields + items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_covers_all_cases() {
        assert_eq!(ChangeType::classify(false, false, true), ChangeType::Nothing);
        assert_eq!(ChangeType::classify(false, true, false), ChangeType::Added);
        assert_eq!(ChangeType::classify(true, false, false), ChangeType::Removed);
        assert_eq!(ChangeType::classify(true, true, true), ChangeType::Nothing);
        assert_eq!(ChangeType::classify(true, true, false), ChangeType::Modified);
    }

    #[test]
    fn empty_changes_are_no_record() {
        assert!(ChangeRecord::new(Vec::new(), Vec::new()).is_none());
        assert!(ChangeRecord::new(Vec::new(), vec![CollectionChange::new("languages")]).is_none());
    }

    #[test]
    fn nothing_entries_are_dropped() {
        let nothing = FieldChange::new(ChangeType::Nothing, "title", "title", None, None);
        assert!(ChangeRecord::new(vec![nothing], Vec::new()).is_none());
    }

    #[test]
    fn counts_span_fields_and_items() {
        let mut languages = CollectionChange::new("languages");
        languages.push(CollectionItemChange::removed(json!("en")));
        languages.push(CollectionItemChange::added(json!("de")));
        let record = ChangeRecord::new(
            vec![FieldChange::new(
                ChangeType::Modified,
                "title",
                "title",
                Some(json!("A")),
                Some(json!("B")),
            )],
            vec![languages],
        )
        .unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.additions(), 1);
        assert_eq!(record.removals(), 1);
        assert_eq!(record.modifications(), 1);
        assert!(record.field("title").is_some());
        assert!(record.collection("languages").is_some());
        assert!(record.collection("subjects").is_none());
    }

    #[test]
    fn duplicate_items_collapse() {
        let mut c = CollectionChange::new("languages");
        c.push(CollectionItemChange::added(json!("de")));
        c.push(CollectionItemChange::added(json!("de")));
        assert_eq!(c.item_changes.len(), 1);
    }

    #[test]
    fn serialized_shape_is_stable() {
        let record = ChangeRecord::new(
            vec![FieldChange::new(
                ChangeType::Added,
                "date1",
                "dates.date1",
                None,
                Some(json!("D1")),
            )],
            Vec::new(),
        )
        .unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "fieldChanges": [{
                    "changeType": "ADDED",
                    "fieldName": "date1",
                    "fullPath": "dates.date1",
                    "oldValue": null,
                    "newValue": "D1"
                }],
                "collectionChanges": []
            })
        );
    }

    #[test]
    fn unknown_attributes_are_tolerated() {
        let blob = json!({
            "fieldChanges": [{
                "changeType": "REMOVED",
                "fieldName": "barcode",
                "fullPath": "barcode",
                "oldValue": "123",
                "severity": "low"
            }],
            "schemaVersion": 2
        });
        let record: ChangeRecord = serde_json::from_value(blob).unwrap();
        assert_eq!(record.removals(), 1);
        assert_eq!(record.field_changes[0].new_value, None);
        assert!(record.collection_changes.is_empty());
    }
}
