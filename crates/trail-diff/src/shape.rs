//! Declared entity shapes.
//!
//! A family describes its canonical shape once, at startup, as an
//! [`ObjectShape`] tree. The shape decides which raw keys survive
//! normalization, how each leaf is typed, and how collection members are
//! correlated across snapshots. Keys that are not declared never reach the
//! comparator.
//!
//! ```rust
//! use trail_diff::shape::{ObjectShape, ScalarKind};
//!
//! let shape = ObjectShape::new("Instance")
//!     .string("title")
//!     .object("dates", ObjectShape::new("Dates").strings(&["date1", "date2"]))
//!     .scalars("languages", ScalarKind::String)
//!     .identified("subjects", ObjectShape::new("Subject").strings(&["value", "typeId"]), "value");
//!
//! assert_eq!(shape.fields().len(), 4);
//! assert!(shape.field("publisher").is_none());
//! ```

/// Type of a leaf value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
    /// RFC 3339 timestamp (or bare date), compared as an instant.
    DateTime,
    /// Any JSON value, compared by JSON equality.
    Any,
}

/// Kind of a declared field.
#[derive(Clone, Debug)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Object(ObjectShape),
    Collection(ElementShape),
    /// Free-form object with dynamic keys.
    Map,
}

/// Shape of the members of a collection field.
#[derive(Clone, Debug)]
pub enum ElementShape {
    Scalar(ScalarKind),
    /// Object members. With an `identity` field, members are correlated by
    /// that field's value; without one they are compared as whole values.
    Object {
        shape: ObjectShape,
        identity: Option<&'static str>,
    },
}

/// One declared field of an object shape.
#[derive(Clone, Debug)]
pub struct FieldShape {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// A declared object: a type name plus its ordered fields.
#[derive(Clone, Debug)]
pub struct ObjectShape {
    type_name: &'static str,
    fields: Vec<FieldShape>,
}

impl ObjectShape {
    /// Create a shape with no fields.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns `true` if `name` is a declared field.
    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Resolve a dotted path of nested object fields to its shape.
    pub fn object_at(&self, path: &str) -> Option<&ObjectShape> {
        path.split('.').try_fold(self, |shape, segment| {
            match shape.field(segment).map(|f| &f.kind) {
                Some(FieldKind::Object(child)) => Some(child),
                _ => None,
            }
        })
    }

    /// Declare a field of any kind.
    pub fn field_of(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldShape { name, kind });
        self
    }

    /// Declare a scalar field.
    pub fn scalar(self, name: &'static str, kind: ScalarKind) -> Self {
        self.field_of(name, FieldKind::Scalar(kind))
    }

    /// Declare a string field.
    pub fn string(self, name: &'static str) -> Self {
        self.scalar(name, ScalarKind::String)
    }

    /// Declare several string fields at once.
    pub fn strings(self, names: &[&'static str]) -> Self {
        names.iter().copied().fold(self, |shape, name| shape.string(name))
    }

    /// Declare a nested object field.
    pub fn object(self, name: &'static str, shape: ObjectShape) -> Self {
        self.field_of(name, FieldKind::Object(shape))
    }

    /// Declare a collection of scalars.
    pub fn scalars(self, name: &'static str, kind: ScalarKind) -> Self {
        self.field_of(name, FieldKind::Collection(ElementShape::Scalar(kind)))
    }

    /// Declare a collection of objects without identity.
    pub fn objects(self, name: &'static str, shape: ObjectShape) -> Self {
        self.field_of(
            name,
            FieldKind::Collection(ElementShape::Object {
                shape,
                identity: None,
            }),
        )
    }

    /// Declare a collection of objects correlated by their `identity` field.
    pub fn identified(
        self,
        name: &'static str,
        shape: ObjectShape,
        identity: &'static str,
    ) -> Self {
        self.field_of(
            name,
            FieldKind::Collection(ElementShape::Object {
                shape,
                identity: Some(identity),
            }),
        )
    }

    /// Declare a free-form map field.
    pub fn map(self, name: &'static str) -> Self {
        self.field_of(name, FieldKind::Map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObjectShape {
        ObjectShape::new("Item")
            .string("barcode")
            .object(
                "status",
                ObjectShape::new("ItemStatus")
                    .string("name")
                    .object("detail", ObjectShape::new("Detail").string("code")),
            )
            .scalars("yearCaption", ScalarKind::String)
    }

    #[test]
    fn fields_keep_declaration_order() {
        let names: Vec<_> = sample().fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["barcode", "status", "yearCaption"]);
    }

    #[test]
    fn object_at_resolves_nested_objects() {
        let shape = sample();
        assert_eq!(shape.object_at("status").unwrap().type_name(), "ItemStatus");
        assert_eq!(shape.object_at("status.detail").unwrap().type_name(), "Detail");
        assert!(shape.object_at("barcode").is_none());
        assert!(shape.object_at("yearCaption").is_none());
        assert!(shape.object_at("missing").is_none());
    }

    #[test]
    fn identified_collection_records_identity() {
        let shape = ObjectShape::new("Instance").identified(
            "subjects",
            ObjectShape::new("Subject").string("value"),
            "value",
        );
        match &shape.field("subjects").unwrap().kind {
            FieldKind::Collection(ElementShape::Object { identity, shape }) => {
                assert_eq!(*identity, Some("value"));
                assert_eq!(shape.type_name(), "Subject");
            }
            other => panic!("expected object collection, got {other:?}"),
        }
    }
}
