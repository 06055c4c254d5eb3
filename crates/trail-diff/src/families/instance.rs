use trail_types::EntityFamily;

use crate::families::{electronic_access, note, tags};
use crate::rules::FamilyRules;
use crate::shape::{ObjectShape, ScalarKind};

/// Inventory instance.
///
/// Subjects are correlated by their heading `value`, so a subject whose
/// type or source changes is one modified item.
pub struct InstanceRules {
    shape: ObjectShape,
}

const DEFAULT_OBJECTS: &[&str] = &["dates", "publicationPeriod", "tags"];

impl InstanceRules {
    pub fn new() -> Self {
        Self { shape: shape() }
    }
}

impl Default for InstanceRules {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyRules for InstanceRules {
    fn family(&self) -> EntityFamily {
        EntityFamily::Instance
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
    ObjectShape::new("Instance")
        .strings(&[
            "id",
            "hrid",
            "source",
            "title",
            "indexTitle",
            "instanceTypeId",
            "modeOfIssuanceId",
            "catalogedDate",
            "statusId",
        ])
        .scalar("statusUpdatedDate", ScalarKind::DateTime)
        .scalar("previouslyHeld", ScalarKind::Boolean)
        .scalar("staffSuppress", ScalarKind::Boolean)
        .scalar("discoverySuppress", ScalarKind::Boolean)
        .object(
            "dates",
            ObjectShape::new("Dates").strings(&["dateTypeId", "date1", "date2"]),
        )
        .object(
            "publicationPeriod",
            ObjectShape::new("PublicationPeriod")
                .scalar("start", ScalarKind::Integer)
                .scalar("end", ScalarKind::Integer),
        )
        .scalars("languages", ScalarKind::String)
        .scalars("editions", ScalarKind::String)
        .scalars("physicalDescriptions", ScalarKind::String)
        .scalars("instanceFormatIds", ScalarKind::String)
        .scalars("natureOfContentTermIds", ScalarKind::String)
        .scalars("statisticalCodeIds", ScalarKind::String)
        .scalars("publicationFrequency", ScalarKind::String)
        .scalars("publicationRange", ScalarKind::String)
        .scalars("administrativeNotes", ScalarKind::String)
        .objects(
            "identifiers",
            ObjectShape::new("Identifier").strings(&["identifierTypeId", "value"]),
        )
        .objects(
            "alternativeTitles",
            ObjectShape::new("AlternativeTitle").strings(&[
                "alternativeTitleTypeId",
                "alternativeTitle",
                "authorityId",
            ]),
        )
        .objects(
            "contributors",
            ObjectShape::new("Contributor")
                .strings(&[
                    "name",
                    "contributorTypeId",
                    "contributorTypeText",
                    "contributorNameTypeId",
                    "authorityId",
                ])
                .scalar("primary", ScalarKind::Boolean),
        )
        .identified(
            "subjects",
            ObjectShape::new("Subject").strings(&["value", "authorityId", "sourceId", "typeId"]),
            "value",
        )
        .objects(
            "series",
            ObjectShape::new("Series").strings(&["value", "authorityId"]),
        )
        .objects(
            "classifications",
            ObjectShape::new("Classification")
                .strings(&["classificationNumber", "classificationTypeId"]),
        )
        .objects(
            "publication",
            ObjectShape::new("Publication").strings(&[
                "publisher",
                "place",
                "dateOfPublication",
                "role",
            ]),
        )
        .objects("electronicAccess", electronic_access())
        .objects("notes", note("InstanceNote", "instanceNoteTypeId"))
        .object("tags", tags())
}
