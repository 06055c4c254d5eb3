//! Shape adapter: raw snapshot -> canonical entity graph.
//!
//! Reads a loosely-typed JSON map against the family's declared shape.
//! Undeclared keys are dropped, JSON `null` reads as absent, and every leaf is
//! type-checked against its [`ScalarKind`]. A value that cannot be coerced is
//! a [`DiffError::Mapping`]. After reading, the family's default objects are
//! initialized so that an absent container and an empty one compare equal.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::warn;
use trail_types::EntityFamily;

use crate::error::{DiffError, DiffResult};
use crate::node::{canonical_json, Node, ObjectNode, Scalar};
use crate::rules::FamilyRules;
use crate::shape::{ElementShape, FieldKind, FieldShape, ObjectShape, ScalarKind};

/// A snapshot normalized into its family's canonical shape.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalEntity {
    family: EntityFamily,
    root: ObjectNode,
}

impl CanonicalEntity {
    pub fn family(&self) -> EntityFamily {
        self.family
    }

    pub fn root(&self) -> &ObjectNode {
        &self.root
    }

    /// Render the entity as JSON (declared fields only).
    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }
}

/// Normalize a raw snapshot. `None` (or JSON `null`) is an absent snapshot
/// and normalizes to an entity holding only the default objects.
pub fn normalize(rules: &dyn FamilyRules, raw: Option<&Value>) -> DiffResult<CanonicalEntity> {
    let family = rules.family();
    let shape = rules.shape();

    let mut root = match raw {
        None | Some(Value::Null) => ObjectNode::new(),
        Some(Value::Object(map)) => {
            let map = rules.reshape(map)?;
            check_family(rules, &map)?;
            read_object(family, shape, &map, "")?
        }
        Some(other) => {
            return Err(DiffError::mapping(
                family,
                "",
                format!("expected an object, found {}", kind_name(other)),
            ))
        }
    };

    for path in rules.default_objects() {
        initialize(&mut root, shape, path);
    }

    Ok(CanonicalEntity { family, root })
}

/// A snapshot belongs to some other family if it is non-empty and shares no
/// key with the declared shape, or if it carries a key that marks another
/// family.
fn check_family(rules: &dyn FamilyRules, map: &Map<String, Value>) -> DiffResult<()> {
    let family = rules.family();
    let shape = rules.shape();
    if !map.is_empty() && !map.keys().any(|k| shape.declares(k)) {
        warn!(%family, keys = map.len(), "snapshot shares no field with the family shape");
        return Err(DiffError::mapping(
            family,
            "",
            format!("snapshot has none of the fields declared by {}", shape.type_name()),
        ));
    }
    if let Some(key) = map
        .keys()
        .find(|k| !shape.declares(k) && rules.is_foreign_key(k))
    {
        warn!(%family, %key, "snapshot carries a field of another family");
        return Err(DiffError::mapping(
            family,
            key.as_str(),
            format!("field is not part of {} and marks another family", shape.type_name()),
        ));
    }
    Ok(())
}

/// Replace an absent nested object at `path` (and its absent parents) with
/// an empty object. Paths that do not resolve to object fields are ignored.
fn initialize(root: &mut ObjectNode, shape: &ObjectShape, path: &str) {
    if shape.object_at(path).is_none() {
        return;
    }
    let mut node = root;
    let mut current = shape;
    for segment in path.split('.') {
        let Some(field) = current.field(segment) else {
            return;
        };
        let FieldKind::Object(child) = &field.kind else {
            return;
        };
        let Some(next) = node.object_entry(field.name) else {
            return;
        };
        node = next;
        current = child;
    }
}

fn read_object(
    family: EntityFamily,
    shape: &ObjectShape,
    map: &Map<String, Value>,
    prefix: &str,
) -> DiffResult<ObjectNode> {
    let mut node = ObjectNode::new();
    for field in shape.fields() {
        let Some(value) = map.get(field.name) else {
            continue;
        };
        let path = join(prefix, field.name);
        if let Some(child) = read_field(family, field, value, &path)? {
            node.insert(field.name, child);
        }
    }
    Ok(node)
}

fn read_field(
    family: EntityFamily,
    field: &FieldShape,
    value: &Value,
    path: &str,
) -> DiffResult<Option<Node>> {
    if value.is_null() {
        return Ok(None);
    }
    let node = match &field.kind {
        FieldKind::Scalar(kind) => Node::Scalar(read_scalar(family, *kind, value, path)?),
        FieldKind::Object(shape) => {
            let map = expect_object(family, value, path)?;
            Node::Object(read_object(family, shape, map, path)?)
        }
        FieldKind::Collection(element) => {
            let Value::Array(items) = value else {
                return Err(DiffError::mapping(
                    family,
                    path,
                    format!("expected an array, found {}", kind_name(value)),
                ));
            };
            let mut nodes = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                if item.is_null() {
                    continue;
                }
                let item_path = format!("{path}[{i}]");
                let node = match element {
                    ElementShape::Scalar(kind) => {
                        Node::Scalar(read_scalar(family, *kind, item, &item_path)?)
                    }
                    ElementShape::Object { shape, .. } => {
                        let map = expect_object(family, item, &item_path)?;
                        Node::Object(read_object(family, shape, map, &item_path)?)
                    }
                };
                nodes.push(node);
            }
            Node::Collection(nodes)
        }
        FieldKind::Map => Node::Map(expect_object(family, value, path)?.clone()),
    };
    Ok(Some(node))
}

fn read_scalar(
    family: EntityFamily,
    kind: ScalarKind,
    value: &Value,
    path: &str,
) -> DiffResult<Scalar> {
    let mismatch = |expected: &str| {
        DiffError::mapping(
            family,
            path,
            format!("expected {expected}, found {}", kind_name(value)),
        )
    };
    let key = match kind {
        ScalarKind::String => match value {
            Value::String(_) => canonical_json(value),
            _ => return Err(mismatch("a string")),
        },
        ScalarKind::Integer if value.is_i64() || value.is_u64() => value.to_string(),
        ScalarKind::Integer => return Err(mismatch("an integer")),
        ScalarKind::Number => match value.as_f64() {
            Some(n) => n.to_string(),
            None => return Err(mismatch("a number")),
        },
        ScalarKind::Boolean => match value {
            Value::Bool(b) => b.to_string(),
            _ => return Err(mismatch("a boolean")),
        },
        ScalarKind::DateTime => match value.as_str() {
            Some(s) => parse_instant(s)
                .ok_or_else(|| {
                    DiffError::mapping(family, path, format!("`{s}` is not a valid date-time"))
                })?
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            None => return Err(mismatch("a date-time string")),
        },
        ScalarKind::Any => canonical_json(value),
    };
    Ok(Scalar::new(value.clone(), key))
}

/// Parse an RFC 3339 timestamp, an ISO timestamp with a colon-less offset,
/// or a bare date (midnight UTC).
fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

fn expect_object<'v>(
    family: EntityFamily,
    value: &'v Value,
    path: &str,
) -> DiffResult<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        DiffError::mapping(
            family,
            path,
            format!("expected an object, found {}", kind_name(value)),
        )
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
