use trail_types::EntityFamily;

use crate::families::{electronic_access, note, tags};
use crate::rules::FamilyRules;
use crate::shape::{ObjectShape, ScalarKind};

/// Inventory item.
///
/// `status` and `effectiveCallNumberComponents` are always reported leaf by
/// leaf, so they are default-initialized. Circulation notes carry their own
/// `id`; other notes do not.
pub struct ItemRules {
    shape: ObjectShape,
}

const DEFAULT_OBJECTS: &[&str] = &["status", "effectiveCallNumberComponents", "tags"];

impl ItemRules {
    pub fn new() -> Self {
        Self { shape: shape() }
    }
}

impl Default for ItemRules {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyRules for ItemRules {
    fn family(&self) -> EntityFamily {
        EntityFamily::Item
    }

    fn shape(&self) -> &ObjectShape {
        &self.shape
    }

    fn is_foreign_key(&self, key: &str) -> bool {
        crate::families::marks_other_family(self.family(), key)
    }

    fn default_objects(&self) -> &[&'static str] {
        DEFAULT_OBJECTS
    }
}

fn shape() -> ObjectShape {
    ObjectShape::new("Item")
        .strings(&[
            "id",
            "hrid",
            "holdingsRecordId",
            "barcode",
            "accessionNumber",
            "itemIdentifier",
            "copyNumber",
            "volume",
            "enumeration",
            "chronology",
            "numberOfPieces",
            "descriptionOfPieces",
            "numberOfMissingPieces",
            "missingPieces",
            "itemDamagedStatusId",
            "itemLevelCallNumber",
            "itemLevelCallNumberPrefix",
            "itemLevelCallNumberSuffix",
            "itemLevelCallNumberTypeId",
            "materialTypeId",
            "permanentLoanTypeId",
            "temporaryLoanTypeId",
            "permanentLocationId",
            "temporaryLocationId",
            "effectiveLocationId",
            "inTransitDestinationServicePointId",
            "effectiveShelvingOrder",
            "purchaseOrderLineIdentifier",
        ])
        .scalar("missingPiecesDate", ScalarKind::DateTime)
        .scalar("itemDamagedStatusDate", ScalarKind::DateTime)
        .scalar("discoverySuppress", ScalarKind::Boolean)
        .object(
            "status",
            ObjectShape::new("ItemStatus")
                .string("name")
                .scalar("date", ScalarKind::DateTime),
        )
        .object(
            "effectiveCallNumberComponents",
            ObjectShape::new("CallNumberComponents").strings(&[
                "callNumber",
                "prefix",
                "suffix",
                "typeId",
            ]),
        )
        .object(
            "lastCheckIn",
            ObjectShape::new("LastCheckIn")
                .scalar("dateTime", ScalarKind::DateTime)
                .strings(&["servicePointId", "staffMemberId"]),
        )
        .scalars("yearCaption", ScalarKind::String)
        .scalars("formerIds", ScalarKind::String)
        .scalars("statisticalCodeIds", ScalarKind::String)
        .scalars("administrativeNotes", ScalarKind::String)
        .objects("notes", note("ItemNote", "itemNoteTypeId"))
        .identified(
            "circulationNotes",
            ObjectShape::new("CirculationNote")
                .strings(&["id", "noteType", "note"])
                .scalar("staffOnly", ScalarKind::Boolean)
                .scalar("date", ScalarKind::DateTime),
            "id",
        )
        .objects("electronicAccess", electronic_access())
        .object("tags", tags())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use trail_types::ChangeType;

    use super::*;
    use crate::engine::FamilyCalculator;

    fn calculator() -> FamilyCalculator {
        FamilyCalculator::new(Arc::new(ItemRules::new()))
    }

    #[test]
    fn status_change_attributed_to_leaf() {
        let old = json!({"id": "i1", "status": {"name": "Available"}});
        let new = json!({"id": "i1", "status": {"name": "Checked out"}});
        let record = calculator().diff(Some(&old), Some(&new)).unwrap().unwrap();
        let change = record.field("status.name").unwrap();
        assert_eq!(change.change_type, ChangeType::Modified);
        assert_eq!(change.field_name, "name");
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn missing_status_reads_as_empty() {
        let old = json!({"id": "i1"});
        let new = json!({"id": "i1", "status": {"name": "Available"}});
        let record = calculator().diff(Some(&old), Some(&new)).unwrap().unwrap();
        assert_eq!(record.field("status.name").unwrap().change_type, ChangeType::Added);
        assert!(record.field("status").is_none());
    }

    #[test]
    fn explicit_empty_containers_are_not_changes() {
        let old = json!({"id": "i1", "effectiveCallNumberComponents": {}, "tags": {"tagList": []}});
        let new = json!({"id": "i1"});
        assert!(calculator().diff(Some(&old), Some(&new)).unwrap().is_none());
    }

    #[test]
    fn circulation_note_edit_is_single_modified_item() {
        let old = json!({"id": "i1", "circulationNotes": [
            {"id": "n1", "noteType": "Check in", "note": "fragile"},
            {"id": "n2", "noteType": "Check out", "note": "keep"}
        ]});
        let new = json!({"id": "i1", "circulationNotes": [
            {"id": "n2", "noteType": "Check out", "note": "keep"},
            {"id": "n1", "noteType": "Check in", "note": "very fragile"}
        ]});
        let record = calculator().diff(Some(&old), Some(&new)).unwrap().unwrap();
        let notes = record.collection("circulationNotes").unwrap();
        assert_eq!(notes.item_changes.len(), 1);
        assert_eq!(notes.item_changes[0].change_type, ChangeType::Modified);
        assert_eq!(
            notes.item_changes[0].new_value.as_ref().unwrap()["note"],
            json!("very fragile")
        );
    }

    #[test]
    fn unidentified_note_edit_is_remove_and_add() {
        let old = json!({"id": "i1", "notes": [{"itemNoteTypeId": "t", "note": "a", "staffOnly": false}]});
        let new = json!({"id": "i1", "notes": [{"itemNoteTypeId": "t", "note": "b", "staffOnly": false}]});
        let record = calculator().diff(Some(&old), Some(&new)).unwrap().unwrap();
        assert_eq!(record.removals(), 1);
        assert_eq!(record.additions(), 1);
        assert_eq!(record.modifications(), 0);
    }

    #[test]
    fn non_boolean_suppress_flag_is_mapping_error() {
        let new = json!({"id": "i1", "discoverySuppress": "yes"});
        assert!(calculator().diff(None, Some(&new)).unwrap_err().is_mapping());
    }
}
