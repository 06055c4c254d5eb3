//! Canonical entity graph.
//!
//! A [`Node`] tree is what the shape adapter builds from a raw snapshot and
//! what the comparator walks. Only declared fields are present. Every node
//! can render itself back to JSON and produce a canonical key: two nodes
//! are logically equal iff their keys are equal.
//!
//! Keys are insensitive to object key order and to collection order and
//! multiplicity, matching the set semantics used for collections.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

/// A typed leaf: the raw value as received plus its equality key.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalar {
    raw: Value,
    key: String,
}

impl Scalar {
    pub fn new(raw: Value, key: String) -> Self {
        Self { raw, key }
    }

    /// The value as it appeared in the raw snapshot.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Equality key. Two scalars of the same kind are equal iff keys match.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// One node of a canonical entity graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Object(ObjectNode),
    Collection(Vec<Node>),
    Map(Map<String, Value>),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Node]> {
        match self {
            Self::Collection(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Render the node as JSON, declared fields only.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Scalar(s) => s.raw.clone(),
            Self::Object(o) => o.to_value(),
            Self::Collection(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            Self::Map(m) => Value::Object(m.clone()),
        }
    }

    /// Canonical equality key.
    pub fn canonical_key(&self) -> String {
        match self {
            Self::Scalar(s) => s.key.clone(),
            Self::Object(o) => o.canonical_key(),
            Self::Collection(items) => {
                let keys: BTreeSet<String> = items.iter().map(Node::canonical_key).collect();
                format!("[{}]", keys.into_iter().collect::<Vec<_>>().join(","))
            }
            Self::Map(m) => canonical_json(&Value::Object(m.clone())),
        }
    }
}

/// An object node: present declared fields by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectNode {
    fields: BTreeMap<&'static str, Node>,
}

impl ObjectNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: &'static str, node: Node) {
        self.fields.insert(name, node);
    }

    /// Returns `true` if no declared field is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Get the nested object at `name`, inserting an empty one if the field
    /// is absent. Returns `None` if the field holds a non-object node.
    pub fn object_entry(&mut self, name: &'static str) -> Option<&mut ObjectNode> {
        let node = self
            .fields
            .entry(name)
            .or_insert_with(|| Node::Object(ObjectNode::new()));
        match node {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, node)| ((*name).to_string(), node.to_value()))
            .collect();
        Value::Object(map)
    }

    pub fn canonical_key(&self) -> String {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(name, node)| format!("{name}:{}", node.canonical_key()))
            .collect();
        format!("{{{}}}", parts.join(","))
    }
}

/// Serialize a JSON value with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, String> =
                map.iter().map(|(k, v)| (k, canonical_json(v))).collect();
            let parts: Vec<String> = sorted
                .into_iter()
                .map(|(k, v)| format!("{}:{v}", Value::String(k.clone())))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}
