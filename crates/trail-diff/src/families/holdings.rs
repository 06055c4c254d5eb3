use trail_types::EntityFamily;

use crate::families::{electronic_access, note, tags};
use crate::rules::FamilyRules;
use crate::shape::{ObjectShape, ScalarKind};

/// Inventory holdings record.
pub struct HoldingsRules {
    shape: ObjectShape,
}

const DEFAULT_OBJECTS: &[&str] = &["receivingHistory", "tags"];

impl HoldingsRules {
    pub fn new() -> Self {
        Self { shape: shape() }
    }
}

impl Default for HoldingsRules {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyRules for HoldingsRules {
    fn family(&self) -> EntityFamily {
        EntityFamily::Holdings
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

fn statement(type_name: &'static str) -> ObjectShape {
    ObjectShape::new(type_name).strings(&["statement", "note", "staffNote"])
}

fn shape() -> ObjectShape {
    ObjectShape::new("HoldingsRecord")
        .strings(&[
            "id",
            "hrid",
            "holdingsTypeId",
            "instanceId",
            "permanentLocationId",
            "temporaryLocationId",
            "effectiveLocationId",
            "callNumberTypeId",
            "callNumberPrefix",
            "callNumber",
            "callNumberSuffix",
            "shelvingTitle",
            "acquisitionFormat",
            "acquisitionMethod",
            "receiptStatus",
            "illPolicyId",
            "retentionPolicy",
            "digitizationPolicy",
            "copyNumber",
            "numberOfItems",
            "sourceId",
        ])
        .scalar("discoverySuppress", ScalarKind::Boolean)
        .scalars("formerIds", ScalarKind::String)
        .scalars("statisticalCodeIds", ScalarKind::String)
        .scalars("administrativeNotes", ScalarKind::String)
        .objects("holdingsStatements", statement("HoldingsStatement"))
        .objects(
            "holdingsStatementsForSupplements",
            statement("SupplementStatement"),
        )
        .objects("holdingsStatementsForIndexes", statement("IndexStatement"))
        .objects("notes", note("HoldingsNote", "holdingsNoteTypeId"))
        .objects("electronicAccess", electronic_access())
        .object(
            "receivingHistory",
            ObjectShape::new("ReceivingHistory")
                .string("displayType")
                .objects(
                    "entries",
                    ObjectShape::new("ReceivingHistoryEntry")
                        .scalar("publicDisplay", ScalarKind::Boolean)
                        .strings(&["enumeration", "chronology"]),
                ),
        )
        .object("tags", tags())
}
