//! Diff assembler: grouped changes -> public [`ChangeRecord`].
//!
//! - Root field changes become [`FieldChange`] entries.
//! - Membership of root-level collections becomes ADDED / REMOVED items.
//! - A correlated member whose own group, or any group nested below it,
//!   holds a change becomes one MODIFIED item carrying both snapshots.
//! - Changes below a non-root member only mark that member dirty.
//!
//! An identity that entered or left a collection is reported at that
//! granularity only; its field-level detail is not exploded.

use std::collections::BTreeSet;

use trail_types::{ChangeRecord, ChangeType, CollectionChange, CollectionItemChange, FieldChange};

use crate::compare::OwnerId;
use crate::correlate::Correlation;

/// Assemble the final record. Returns `None` when nothing changed.
pub fn assemble(correlation: &Correlation) -> Option<ChangeRecord> {
    let ordered = correlation.ordered();
    let dirty = dirty_members(correlation);

    let mut field_changes: Vec<FieldChange> = Vec::new();
    let mut collections: Vec<CollectionChange> = Vec::new();

    for (owner, group) in ordered {
        if owner.is_root() {
            field_changes.extend(
                group
                    .fields
                    .iter()
                    .filter(|c| c.change_type.is_change())
                    .cloned(),
            );
        }

        if group.is_membership() {
            for m in group.membership.iter().filter(|m| m.site.owner.is_root()) {
                let item = match m.change_type {
                    ChangeType::Removed => CollectionItemChange::removed(m.value.clone()),
                    ChangeType::Added => CollectionItemChange::added(m.value.clone()),
                    _ => continue,
                };
                collection_mut(&mut collections, &m.site.collection).push(item);
            }
            continue;
        }

        if let Some(matched) = &group.matched {
            if matched.site.owner.is_root() && dirty.contains(owner) {
                collection_mut(&mut collections, &matched.site.collection).push(
                    CollectionItemChange::modified(matched.old.clone(), matched.new.clone()),
                );
            }
        }
    }

    ChangeRecord::new(field_changes, collections)
}

/// Non-root identities that hold a change themselves or below them.
fn dirty_members(correlation: &Correlation) -> BTreeSet<&OwnerId> {
    let mut dirty: BTreeSet<&OwnerId> = BTreeSet::new();

    for (owner, group) in correlation.ordered() {
        if group.is_membership() {
            for m in &group.membership {
                if !m.site.owner.is_root() {
                    dirty.insert(&m.site.owner);
                }
            }
        } else if !owner.is_root() && group.has_field_changes() {
            dirty.insert(owner);
        }
    }

    let mut pending: Vec<&OwnerId> = dirty.iter().copied().collect();
    while let Some(owner) = pending.pop() {
        if let Some(parent) = correlation.parent_of(owner) {
            if !parent.is_root() && dirty.insert(parent) {
                pending.push(parent);
            }
        }
    }

    dirty
}

fn collection_mut<'c>(
    collections: &'c mut Vec<CollectionChange>,
    name: &str,
) -> &'c mut CollectionChange {
    let index = match collections.iter().position(|c| c.collection_name == name) {
        Some(index) => index,
        None => {
            collections.push(CollectionChange::new(name));
            collections.len() - 1
        }
    };
    &mut collections[index]
}
