//! MARC bibliographic and authority records.
//!
//! Records arrive as MARC-JSON, either bare or wrapped in a source record
//! (`{"recordType": ..., "parsedRecord": {"content": {...}}}`). Before
//! normalization each MARC-JSON field is rewritten into a flat element:
//!
//! ```text
//! {"001": "in001"}                        -> {"tag": "001", "value": "in001"}
//! {"245": {"ind1": "1", "ind2": "0",
//!          "subfields": [{"a": "Title"}]}} -> {"tag": "245", "ind1": "1",
//!                                              "ind2": "0",
//!                                              "subfields": ["$a Title"]}
//! ```
//!
//! Fields have no identity (tags repeat), so an edited field is reported as
//! the old field removed and the new one added.

use std::borrow::Cow;

use serde_json::{json, Map, Value};
use tracing::warn;
use trail_types::EntityFamily;

use crate::error::{DiffError, DiffResult};
use crate::rules::FamilyRules;
use crate::shape::{ObjectShape, ScalarKind};

const RECORD_TYPE: &str = "recordType";
const PARSED_RECORD: &str = "parsedRecord";
const CONTENT: &str = "content";
const FIELDS: &str = "fields";

/// Rules shared by [`EntityFamily::MarcBib`] and [`EntityFamily::MarcAuthority`].
pub struct MarcRules {
    family: EntityFamily,
    shape: ObjectShape,
}

impl MarcRules {
    /// Rules for one MARC family. Non-MARC families fall back to MARC bib.
    pub fn new(family: EntityFamily) -> Self {
        let family = if family.is_marc() {
            family
        } else {
            EntityFamily::MarcBib
        };
        Self {
            family,
            shape: shape(),
        }
    }

    /// The `recordType` discriminator carried by records of this family.
    pub fn record_type(&self) -> &'static str {
        match self.family {
            EntityFamily::MarcAuthority => "MARC_AUTHORITY",
            _ => "MARC_BIB",
        }
    }

    fn check_record_type(&self, raw: &Map<String, Value>) -> DiffResult<()> {
        match raw.get(RECORD_TYPE) {
            None | Some(Value::Null) => Ok(()),
            Some(Value::String(found)) if found == self.record_type() => Ok(()),
            Some(found) => {
                warn!(family = %self.family, %found, "record type does not match family");
                Err(DiffError::mapping(
                    self.family,
                    RECORD_TYPE,
                    format!("expected `{}`, found {found}", self.record_type()),
                ))
            }
        }
    }

    fn field(&self, index: usize, entry: &Value) -> DiffResult<Value> {
        let path = format!("{FIELDS}[{index}]");
        let malformed = |reason: &str| DiffError::mapping(self.family, path.as_str(), reason);

        let Value::Object(entry) = entry else {
            return Err(malformed("expected a single-tag object"));
        };
        if entry.contains_key("tag") {
            return Ok(Value::Object(entry.clone()));
        }
        let mut pairs = entry.iter();
        let (Some((tag, body)), None) = (pairs.next(), pairs.next()) else {
            return Err(malformed("expected exactly one tag per field"));
        };

        match body {
            Value::String(_) => Ok(json!({"tag": tag, "value": body})),
            Value::Object(data) => {
                let mut field = Map::new();
                field.insert("tag".into(), Value::String(tag.clone()));
                for indicator in ["ind1", "ind2"] {
                    if let Some(value) = data.get(indicator) {
                        field.insert(indicator.into(), value.clone());
                    }
                }
                let subfields = match data.get("subfields") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(subfield)
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| malformed("subfields must be single-code string entries"))?,
                    Some(_) => return Err(malformed("subfields must be an array")),
                };
                field.insert("subfields".into(), Value::Array(subfields));
                Ok(Value::Object(field))
            }
            _ => Err(malformed("field body must be a string or an object")),
        }
    }
}

/// `{"a": "Title"}` -> `"$a Title"`.
fn subfield(entry: &Value) -> Option<Value> {
    let map = entry.as_object()?;
    let mut pairs = map.iter();
    match (pairs.next(), pairs.next()) {
        (Some((code, Value::String(data))), None) => Some(Value::String(format!("${code} {data}"))),
        _ => None,
    }
}

impl FamilyRules for MarcRules {
    fn family(&self) -> EntityFamily {
        self.family
    }

    fn shape(&self) -> &ObjectShape {
        &self.shape
    }

    fn is_foreign_key(&self, key: &str) -> bool {
        crate::families::marks_other_family(self.family(), key)
    }

    fn reshape<'a>(&self, raw: &'a Map<String, Value>) -> DiffResult<Cow<'a, Map<String, Value>>> {
        self.check_record_type(raw)?;

        let content = match raw.get(PARSED_RECORD) {
            None | Some(Value::Null) => raw,
            Some(parsed) => parsed
                .get(CONTENT)
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    DiffError::mapping(self.family, "parsedRecord.content", "expected an object")
                })?,
        };

        let mut canonical = Map::new();
        for (key, value) in content {
            if key != FIELDS {
                canonical.insert(key.clone(), value.clone());
            }
        }
        if let Some(record_type) = raw.get(RECORD_TYPE) {
            canonical.insert(RECORD_TYPE.into(), record_type.clone());
        }
        match content.get(FIELDS) {
            Some(Value::Array(entries)) => {
                let fields = entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| !entry.is_null())
                    .map(|(i, entry)| self.field(i, entry))
                    .collect::<DiffResult<Vec<_>>>()?;
                canonical.insert(FIELDS.into(), Value::Array(fields));
            }
            Some(other) => {
                canonical.insert(FIELDS.into(), other.clone());
            }
            None => {}
        }
        Ok(Cow::Owned(canonical))
    }
}

fn shape() -> ObjectShape {
    ObjectShape::new("MarcRecord")
        .strings(&[RECORD_TYPE, "leader"])
        .objects(
            FIELDS,
            ObjectShape::new("MarcField")
                .strings(&["tag", "ind1", "ind2", "value"])
                .scalars("subfields", ScalarKind::String),
        )
}
