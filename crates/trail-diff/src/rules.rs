use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Map, Value};
use trail_types::EntityFamily;

use crate::error::DiffResult;
use crate::shape::ObjectShape;

// ---------------------------------------------------------------------------
// FamilyRules trait
// ---------------------------------------------------------------------------

/// Per-family diff rules: the canonical shape plus the hooks that adapt it.
///
/// The trait is object-safe and `Send + Sync` so rules can be shared as
/// `Arc<dyn FamilyRules>` across worker threads. All hooks are read-only.
pub trait FamilyRules: Send + Sync {
    /// The family these rules apply to.
    fn family(&self) -> EntityFamily;

    /// The family's canonical shape.
    fn shape(&self) -> &ObjectShape;

    /// Dotted paths of optional nested objects that are replaced by an empty
    /// object when absent, before comparison. Parents are initialized first.
    fn default_objects(&self) -> &[&'static str] {
        &[]
    }

    /// Whether a change at the dotted schema path `path` is worth reporting.
    fn is_reportable(&self, _path: &str) -> bool {
        true
    }

    /// Whether the undeclared top-level key `key` marks a snapshot as
    /// belonging to some other family.
    fn is_foreign_key(&self, _key: &str) -> bool {
        false
    }

    /// Rewrite a raw snapshot into the canonical key layout before it is
    /// read against the shape. Also the place for discriminator checks.
    fn reshape<'a>(&self, raw: &'a Map<String, Value>) -> DiffResult<Cow<'a, Map<String, Value>>> {
        Ok(Cow::Borrowed(raw))
    }
}

/// Returns `true` if `path` equals `prefix` or lies under it.
pub fn path_within(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

// ---------------------------------------------------------------------------
// IgnorePaths
// ---------------------------------------------------------------------------

/// Wraps a family's rules with extra path prefixes that are never reported.
pub struct IgnorePaths {
    inner: Arc<dyn FamilyRules>,
    prefixes: Vec<String>,
}

impl IgnorePaths {
    pub fn new(inner: Arc<dyn FamilyRules>, prefixes: Vec<String>) -> Self {
        Self { inner, prefixes }
    }
}

impl FamilyRules for IgnorePaths {
    fn family(&self) -> EntityFamily {
        self.inner.family()
    }

    fn shape(&self) -> &ObjectShape {
        self.inner.shape()
    }

    fn default_objects(&self) -> &[&'static str] {
        self.inner.default_objects()
    }

    fn is_reportable(&self, path: &str) -> bool {
        self.inner.is_reportable(path) && !self.prefixes.iter().any(|p| path_within(path, p))
    }

    fn is_foreign_key(&self, key: &str) -> bool {
        self.inner.is_foreign_key(key)
    }

    fn reshape<'a>(&self, raw: &'a Map<String, Value>) -> DiffResult<Cow<'a, Map<String, Value>>> {
        self.inner.reshape(raw)
    }
}
