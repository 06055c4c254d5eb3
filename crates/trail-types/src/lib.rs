//! Foundation types for the audit trail.
//!
//! This crate provides the result shapes produced by the diff engine and the
//! envelope that persistence collaborators store next to them. Every other
//! trail crate depends on `trail-types`.
//!
//! # Key Types
//!
//! - [`ChangeRecord`] -- The complete diff result for one old/new snapshot pair
//! - [`FieldChange`] -- A scalar or nested-object field that differs
//! - [`CollectionChange`] / [`CollectionItemChange`] -- Membership changes within a collection field
//! - [`ChangeType`] -- ADDED / REMOVED / MODIFIED / NOTHING classification
//! - [`EntityFamily`] -- Tag selecting the family-specific calculator
//! - [`AuditEntry`] -- Persistence envelope (event, entity, actor, timestamp, diff)

pub mod change;
pub mod entry;
pub mod error;
pub mod family;

pub use change::{ChangeRecord, ChangeType, CollectionChange, CollectionItemChange, FieldChange};
pub use entry::{AuditAction, AuditEntry};
pub use error::TypeError;
pub use family::EntityFamily;
