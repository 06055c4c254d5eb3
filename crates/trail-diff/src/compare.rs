//! Structural comparator.
//!
//! Walks two canonical entities in lock-step over the declared shape and
//! emits a flat list of [`RawChange`]s. Each change is tagged with the
//! [`OwnerId`] of the object it was found on, which is what the correlator
//! groups by.
//!
//! # Rules
//!
//! - Scalars classify as ADDED / REMOVED / MODIFIED by canonical key;
//!   equal values (including both absent) emit nothing.
//! - Nested objects present on both sides (default objects always are)
//!   recurse, so leaf changes carry dotted paths. A nested object present on
//!   one side only is reported once, as a whole value. An empty non-default
//!   object counts as absent.
//! - Collections are sets. Scalar members and identity-less object members
//!   are matched by whole value. Identified members are matched by identity
//!   and compared field by field; a [`RawChange::Matched`] marker precedes
//!   the member's own changes.
//! - Free-form maps are walked key by key, recursing into nested objects.
//!
//! Paths rejected by [`FamilyRules::is_reportable`] are skipped together
//! with everything below them.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use trail_types::{ChangeType, FieldChange};

use crate::adapter::{join, CanonicalEntity};
use crate::error::{DiffError, DiffResult};
use crate::node::{Node, ObjectNode, Scalar};
use crate::rules::FamilyRules;
use crate::shape::{ElementShape, FieldKind, ObjectShape};

const SCALAR_TYPE: &str = "Value";

/// Identity of the object a change was found on: its type name plus an
/// identity string. The root entity has an empty identity; collection
/// members get `<parent>/<collection>[<key>]`, which is unique across the
/// whole graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId {
    pub type_name: &'static str,
    pub identity: String,
}

impl OwnerId {
    pub fn root(type_name: &'static str) -> Self {
        Self {
            type_name,
            identity: String::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.identity.is_empty()
    }

    fn member(&self, type_name: &'static str, collection: &str, key: &str) -> Self {
        Self {
            type_name,
            identity: format!("{}/{collection}[{key}]", self.identity),
        }
    }
}

/// Where a collection lives: its owner and its dotted schema path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Site {
    pub owner: OwnerId,
    pub collection: String,
}

/// A low-level difference found by the comparator.
#[derive(Clone, Debug, PartialEq)]
pub enum RawChange {
    /// A scalar, whole-object, or free-form leaf change on `owner`.
    Field { owner: OwnerId, change: FieldChange },
    /// `member` is present on one side of the collection at `site` only.
    Member {
        site: Site,
        member: OwnerId,
        change_type: ChangeType,
        value: Value,
    },
    /// `member`'s identity is present on both sides of the collection at
    /// `site`; its field changes, if any, follow under `member`.
    Matched {
        site: Site,
        member: OwnerId,
        old: Value,
        new: Value,
    },
}

impl RawChange {
    /// The object this change is attributed to.
    pub fn owner(&self) -> &OwnerId {
        match self {
            Self::Field { owner, .. } => owner,
            Self::Member { member, .. } | Self::Matched { member, .. } => member,
        }
    }
}

/// Compare two canonical entities of the same family. Entities normalized
/// for another family are a mapping error.
pub fn compare(
    rules: &dyn FamilyRules,
    old: &CanonicalEntity,
    new: &CanonicalEntity,
) -> DiffResult<Vec<RawChange>> {
    let family = rules.family();
    if let Some(other) = [old, new].iter().find(|e| e.family() != family) {
        return Err(DiffError::mapping(
            family,
            "",
            format!("entity was normalized as {}", other.family()),
        ));
    }

    let shape = rules.shape();
    let mut walker = Walker {
        rules,
        changes: Vec::new(),
    };
    walker.object(&OwnerId::root(shape.type_name()), "", shape, old.root(), new.root());
    Ok(walker.changes)
}

struct Walker<'r> {
    rules: &'r dyn FamilyRules,
    changes: Vec<RawChange>,
}

impl Walker<'_> {
    fn object(
        &mut self,
        owner: &OwnerId,
        prefix: &str,
        shape: &ObjectShape,
        old: &ObjectNode,
        new: &ObjectNode,
    ) {
        for field in shape.fields() {
            let path = join(prefix, field.name);
            if !self.rules.is_reportable(&path) {
                continue;
            }
            let (o, n) = (old.get(field.name), new.get(field.name));
            match &field.kind {
                FieldKind::Scalar(_) => self.scalar(
                    owner,
                    field.name,
                    &path,
                    o.and_then(Node::as_scalar),
                    n.and_then(Node::as_scalar),
                ),
                FieldKind::Object(child) => self.nested(
                    owner,
                    field.name,
                    &path,
                    child,
                    o.and_then(Node::as_object),
                    n.and_then(Node::as_object),
                ),
                FieldKind::Collection(element) => self.collection(
                    owner,
                    &path,
                    element,
                    o.and_then(Node::as_collection).unwrap_or_default(),
                    n.and_then(Node::as_collection).unwrap_or_default(),
                ),
                FieldKind::Map => self.free(
                    owner,
                    &path,
                    o.and_then(Node::as_map),
                    n.and_then(Node::as_map),
                ),
            }
        }
    }

    fn scalar(
        &mut self,
        owner: &OwnerId,
        name: &str,
        path: &str,
        old: Option<&Scalar>,
        new: Option<&Scalar>,
    ) {
        let equal = matches!((old, new), (Some(a), Some(b)) if a.key() == b.key());
        let change_type = ChangeType::classify(old.is_some(), new.is_some(), equal);
        if change_type.is_change() {
            self.field(
                owner,
                FieldChange::new(
                    change_type,
                    name,
                    path,
                    old.map(|s| s.raw().clone()),
                    new.map(|s| s.raw().clone()),
                ),
            );
        }
    }

    fn nested(
        &mut self,
        owner: &OwnerId,
        name: &str,
        path: &str,
        shape: &ObjectShape,
        old: Option<&ObjectNode>,
        new: Option<&ObjectNode>,
    ) {
        // Outside default objects, `{}` reads the same as an absent object.
        let is_default = self.rules.default_objects().iter().any(|p| *p == path);
        let old = old.filter(|o| is_default || !o.is_empty());
        let new = new.filter(|n| is_default || !n.is_empty());
        match (old, new) {
            (Some(o), Some(n)) => self.object(owner, path, shape, o, n),
            (Some(o), None) => self.field(
                owner,
                FieldChange::new(ChangeType::Removed, name, path, Some(o.to_value()), None),
            ),
            (None, Some(n)) => self.field(
                owner,
                FieldChange::new(ChangeType::Added, name, path, None, Some(n.to_value())),
            ),
            (None, None) => {}
        }
    }

    fn collection(
        &mut self,
        owner: &OwnerId,
        path: &str,
        element: &ElementShape,
        old: &[Node],
        new: &[Node],
    ) {
        match element {
            ElementShape::Scalar(_) => self.by_value(owner, path, SCALAR_TYPE, old, new),
            ElementShape::Object {
                shape,
                identity: None,
            } => self.by_value(owner, path, shape.type_name(), old, new),
            ElementShape::Object {
                shape,
                identity: Some(identity),
            } => self.by_identity(owner, path, shape, identity, old, new),
        }
    }

    /// Set difference on canonical keys.
    fn by_value(
        &mut self,
        owner: &OwnerId,
        path: &str,
        type_name: &'static str,
        old: &[Node],
        new: &[Node],
    ) {
        let old_keys: Vec<String> = old.iter().map(Node::canonical_key).collect();
        let new_keys: Vec<String> = new.iter().map(Node::canonical_key).collect();
        let in_old: HashSet<&str> = old_keys.iter().map(String::as_str).collect();
        let in_new: HashSet<&str> = new_keys.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        for (node, key) in old.iter().zip(&old_keys) {
            if !in_new.contains(key.as_str()) && seen.insert(key.as_str()) {
                self.member(owner, path, type_name, key, ChangeType::Removed, node.to_value());
            }
        }
        let mut seen = HashSet::new();
        for (node, key) in new.iter().zip(&new_keys) {
            if !in_old.contains(key.as_str()) && seen.insert(key.as_str()) {
                self.member(owner, path, type_name, key, ChangeType::Added, node.to_value());
            }
        }
    }

    /// Correlate object members by the value of their identity field.
    /// Members without one fall back to whole-value matching.
    fn by_identity(
        &mut self,
        owner: &OwnerId,
        path: &str,
        shape: &ObjectShape,
        identity: &str,
        old: &[Node],
        new: &[Node],
    ) {
        let old_members = index_members(old, identity);
        let new_members = index_members(new, identity);
        let old_lookup: HashMap<&str, &ObjectNode> =
            old_members.iter().map(|(k, o)| (k.as_str(), *o)).collect();
        let new_lookup: HashMap<&str, &ObjectNode> =
            new_members.iter().map(|(k, o)| (k.as_str(), *o)).collect();
        let type_name = shape.type_name();

        for (key, old_member) in &old_members {
            match new_lookup.get(key.as_str()) {
                None => self.member(
                    owner,
                    path,
                    type_name,
                    key,
                    ChangeType::Removed,
                    old_member.to_value(),
                ),
                Some(new_member) => {
                    let member = owner.member(type_name, path, key);
                    self.changes.push(RawChange::Matched {
                        site: site(owner, path),
                        member: member.clone(),
                        old: old_member.to_value(),
                        new: new_member.to_value(),
                    });
                    self.object(&member, path, shape, old_member, new_member);
                }
            }
        }
        for (key, new_member) in &new_members {
            if !old_lookup.contains_key(key.as_str()) {
                self.member(
                    owner,
                    path,
                    type_name,
                    key,
                    ChangeType::Added,
                    new_member.to_value(),
                );
            }
        }
    }

    /// Walk a free-form map key by key.
    fn free(
        &mut self,
        owner: &OwnerId,
        path: &str,
        old: Option<&Map<String, Value>>,
        new: Option<&Map<String, Value>>,
    ) {
        let empty = Map::new();
        let (old, new) = (old.unwrap_or(&empty), new.unwrap_or(&empty));
        let keys = old.keys().chain(new.keys().filter(|k| !old.contains_key(*k)));

        for key in keys {
            let child = join(path, key);
            if !self.rules.is_reportable(&child) {
                continue;
            }
            let o = old.get(key).filter(|v| !v.is_null());
            let n = new.get(key).filter(|v| !v.is_null());
            match (o, n) {
                (Some(Value::Object(a)), Some(Value::Object(b))) => {
                    self.free(owner, &child, Some(a), Some(b));
                }
                _ => {
                    let equal = o == n;
                    let change_type = ChangeType::classify(o.is_some(), n.is_some(), equal);
                    if change_type.is_change() {
                        self.field(
                            owner,
                            FieldChange::new(change_type, key.as_str(), child, o.cloned(), n.cloned()),
                        );
                    }
                }
            }
        }
    }

    fn field(&mut self, owner: &OwnerId, change: FieldChange) {
        self.changes.push(RawChange::Field {
            owner: owner.clone(),
            change,
        });
    }

    fn member(
        &mut self,
        owner: &OwnerId,
        path: &str,
        type_name: &'static str,
        key: &str,
        change_type: ChangeType,
        value: Value,
    ) {
        self.changes.push(RawChange::Member {
            site: site(owner, path),
            member: owner.member(type_name, path, key),
            change_type,
            value,
        });
    }
}

fn site(owner: &OwnerId, path: &str) -> Site {
    Site {
        owner: owner.clone(),
        collection: path.to_string(),
    }
}

/// Key object members by identity, first occurrence wins. Members missing
/// the identity field are keyed by their whole value.
fn index_members<'n>(items: &'n [Node], identity: &str) -> Vec<(String, &'n ObjectNode)> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(Node::as_object)
        .map(|member| {
            let key = match member.get(identity) {
                Some(id) => format!("#{}", id.canonical_key()),
                None => format!("~{}", member.canonical_key()),
            };
            (key, member)
        })
        .filter(|(key, _)| seen.insert(key.clone()))
        .collect()
}
