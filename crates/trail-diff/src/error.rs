//! Error types for the diff crate.

use trail_types::EntityFamily;

/// Errors that can occur during diff operations.
///
/// No variant is retryable: the same input always fails the same way, so
/// callers route the originating event to their failure path.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A raw snapshot could not be coerced into the family's canonical shape.
    #[error("cannot map {family} snapshot at `{path}`: {reason}")]
    Mapping {
        family: EntityFamily,
        path: String,
        reason: String,
    },

    /// No calculator is registered for the requested family.
    #[error("no calculator registered for entity family `{0}`")]
    UnsupportedFamily(EntityFamily),

    /// Engine configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DiffError {
    /// Create a mapping error for `path` within a `family` snapshot.
    pub fn mapping(
        family: EntityFamily,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self::Mapping {
            family,
            path: if path.is_empty() { "<root>".into() } else { path },
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`DiffError::Mapping`].
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }

    /// Whether retrying with the same input could succeed. Always `false`.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
