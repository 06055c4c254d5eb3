//! Structural diff engine for the audit trail.
//!
//! Given a before and an after snapshot of an entity, computes a minimal,
//! deterministic [`ChangeRecord`] describing which fields and collection
//! members changed. Snapshots are loosely-typed JSON; each entity family
//! declares the shape that matters, and everything outside it is ignored.
//!
//! # Pipeline
//!
//! 1. [`adapter::normalize`] -- raw JSON -> canonical entity graph
//! 2. [`compare::compare`] -- lock-step walk -> flat raw changes
//! 3. [`correlate::correlate`] -- raw changes grouped by owning identity
//! 4. [`assemble::assemble`] -- groups -> [`ChangeRecord`], or `None`
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- Registry of family calculators
//! - [`FamilyCalculator`] -- The pipeline bound to one family's rules
//! - [`FamilyRules`] -- Per-family shape and hooks
//! - [`ObjectShape`] -- Declared canonical shape
//! - [`EngineConfig`] -- TOML configuration
//!
//! ```rust
//! use serde_json::json;
//! use trail_diff::DiffEngine;
//! use trail_types::{ChangeType, EntityFamily};
//!
//! let engine = DiffEngine::with_default_families();
//! let record = engine
//!     .diff(EntityFamily::Instance, Some(&json!({"title": "A"})), Some(&json!({"title": "B"})))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(record.field_changes[0].change_type, ChangeType::Modified);
//! ```
//!
//! [`ChangeRecord`]: trail_types::ChangeRecord

pub mod adapter;
pub mod assemble;
pub mod compare;
pub mod config;
pub mod correlate;
pub mod engine;
pub mod error;
pub mod families;
pub mod node;
pub mod rules;
pub mod shape;

pub use adapter::{normalize, CanonicalEntity};
pub use assemble::assemble;
pub use compare::{compare, OwnerId, RawChange, Site};
pub use config::EngineConfig;
pub use correlate::{correlate, Correlation, Group};
pub use engine::{DiffEngine, FamilyCalculator};
pub use error::{DiffError, DiffResult};
pub use families::default_rules;
pub use rules::{path_within, FamilyRules, IgnorePaths};
pub use shape::{ElementShape, FieldKind, FieldShape, ObjectShape, ScalarKind};
