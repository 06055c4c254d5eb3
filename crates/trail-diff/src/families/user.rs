use trail_types::EntityFamily;

use crate::rules::{path_within, FamilyRules};
use crate::shape::{ObjectShape, ScalarKind};

/// Bookkeeping timestamps bumped on every write.
const NOISE: &str = "metadata";

const DEFAULT_OBJECTS: &[&str] = &["personal"];

/// User record.
///
/// `personal` is always reported leaf by leaf, and addresses are correlated
/// by their `id`. `metadata` is read (and type-checked) but never reported.
pub struct UserRules {
    shape: ObjectShape,
}

impl UserRules {
    pub fn new() -> Self {
        Self { shape: shape() }
    }
}

impl Default for UserRules {
    fn default() -> Self {
        Self::new()
    }
}

impl FamilyRules for UserRules {
    fn family(&self) -> EntityFamily {
        EntityFamily::User
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

    fn is_reportable(&self, path: &str) -> bool {
        !path_within(path, NOISE)
    }
}

fn address() -> ObjectShape {
    ObjectShape::new("Address")
        .strings(&[
            "id",
            "countryId",
            "addressLine1",
            "addressLine2",
            "city",
            "region",
            "postalCode",
            "addressTypeId",
        ])
        .scalar("primaryAddress", ScalarKind::Boolean)
}

fn shape() -> ObjectShape {
    ObjectShape::new("User")
        .strings(&["id", "username", "externalSystemId", "barcode"])
        .scalar("active", ScalarKind::Boolean)
        .strings(&["type", "patronGroup"])
        .scalar("enrollmentDate", ScalarKind::DateTime)
        .scalar("expirationDate", ScalarKind::DateTime)
        .object(
            "personal",
            ObjectShape::new("Personal")
                .strings(&[
                    "lastName",
                    "firstName",
                    "middleName",
                    "preferredFirstName",
                    "email",
                    "phone",
                    "mobilePhone",
                ])
                .scalar("dateOfBirth", ScalarKind::DateTime)
                .strings(&["preferredContactTypeId", "profilePictureLink"])
                .identified("addresses", address(), "id"),
        )
        .scalars("preferredEmailCommunication", ScalarKind::String)
        .scalars("departments", ScalarKind::String)
        .map("customFields")
        .object(
            "metadata",
            ObjectShape::new("Metadata")
                .scalar("createdDate", ScalarKind::DateTime)
                .scalar("updatedDate", ScalarKind::DateTime)
                .strings(&["createdByUserId", "updatedByUserId"]),
        )
}
