//! Change correlator: group raw changes by the identity they belong to.
//!
//! Built in one pass over the comparator output. Each [`Group`] answers
//! "what happened to this identity": its field changes, whether it entered
//! or left a collection, and, if it is present on both sides, the two
//! correlated snapshots. Groups remember the order in which they were first
//! seen so assembly stays deterministic.

use std::collections::BTreeMap;

use serde_json::Value;
use trail_types::{ChangeType, FieldChange};

use crate::compare::{OwnerId, RawChange, Site};

/// Collection membership change of one identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Membership {
    pub site: Site,
    pub change_type: ChangeType,
    pub value: Value,
}

/// Both-side snapshots of an identity found in a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Correlated {
    pub site: Site,
    pub old: Value,
    pub new: Value,
}

/// Every raw change attributed to one identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub first_seen: usize,
    pub fields: Vec<FieldChange>,
    pub membership: Vec<Membership>,
    pub matched: Option<Correlated>,
}

impl Group {
    fn new(first_seen: usize) -> Self {
        Self {
            first_seen,
            fields: Vec::new(),
            membership: Vec::new(),
            matched: None,
        }
    }

    /// Returns `true` if the identity entered or left a collection.
    /// Membership takes precedence over field-level detail.
    pub fn is_membership(&self) -> bool {
        !self.membership.is_empty()
    }

    /// Returns `true` if any recorded field change is an actual change.
    pub fn has_field_changes(&self) -> bool {
        self.fields.iter().any(|c| c.change_type.is_change())
    }
}

/// Raw changes grouped by `(type name, identity)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Correlation {
    groups: BTreeMap<OwnerId, Group>,
}

impl Correlation {
    pub fn get(&self, owner: &OwnerId) -> Option<&Group> {
        self.groups.get(owner)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in first-seen order.
    pub fn ordered(&self) -> Vec<(&OwnerId, &Group)> {
        let mut groups: Vec<_> = self.groups.iter().collect();
        groups.sort_by_key(|(_, g)| g.first_seen);
        groups
    }

    /// The owner of the collection holding a correlated identity.
    pub fn parent_of(&self, owner: &OwnerId) -> Option<&OwnerId> {
        self.groups
            .get(owner)
            .and_then(|g| g.matched.as_ref())
            .map(|m| &m.site.owner)
    }
}

/// Group raw changes by the identity of the object they were found on.
pub fn correlate(changes: Vec<RawChange>) -> Correlation {
    let mut groups: BTreeMap<OwnerId, Group> = BTreeMap::new();

    for (seq, change) in changes.into_iter().enumerate() {
        match change {
            RawChange::Field { owner, change } => {
                groups
                    .entry(owner)
                    .or_insert_with(|| Group::new(seq))
                    .fields
                    .push(change);
            }
            RawChange::Member {
                site,
                member,
                change_type,
                value,
            } => {
                groups
                    .entry(member)
                    .or_insert_with(|| Group::new(seq))
                    .membership
                    .push(Membership {
                        site,
                        change_type,
                        value,
                    });
            }
            RawChange::Matched {
                site,
                member,
                old,
                new,
            } => {
                groups.entry(member).or_insert_with(|| Group::new(seq)).matched =
                    Some(Correlated { site, old, new });
            }
        }
    }

    Correlation { groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> OwnerId {
        OwnerId::root("Instance")
    }

    fn subject(id: &str) -> OwnerId {
        OwnerId {
            type_name: "Subject",
            identity: format!("/subjects[{id}]"),
        }
    }

    fn subjects_site() -> Site {
        Site {
            owner: root(),
            collection: "subjects".into(),
        }
    }

    #[test]
    fn groups_by_owner_in_first_seen_order() {
        let changes = vec![
            RawChange::Field {
                owner: root(),
                change: FieldChange::new(ChangeType::Modified, "title", "title", Some(json!("A")), Some(json!("B"))),
            },
            RawChange::Matched {
                site: subjects_site(),
                member: subject("x"),
                old: json!({"value": "x", "typeId": "1"}),
                new: json!({"value": "x", "typeId": "2"}),
            },
            RawChange::Field {
                owner: subject("x"),
                change: FieldChange::new(ChangeType::Modified, "typeId", "subjects.typeId", Some(json!("1")), Some(json!("2"))),
            },
            RawChange::Field {
                owner: root(),
                change: FieldChange::new(ChangeType::Added, "hrid", "hrid", None, Some(json!("in1"))),
            },
        ];

        let correlation = correlate(changes);
        assert_eq!(correlation.len(), 2);

        let ordered = correlation.ordered();
        assert!(ordered[0].0.is_root());
        assert_eq!(ordered[0].1.fields.len(), 2);

        let group = correlation.get(&subject("x")).unwrap();
        assert!(group.matched.is_some());
        assert!(group.has_field_changes());
        assert!(!group.is_membership());
        assert_eq!(correlation.parent_of(&subject("x")), Some(&root()));
        assert_eq!(correlation.parent_of(&root()), None);
    }

    #[test]
    fn membership_recorded_on_member_identity() {
        let correlation = correlate(vec![RawChange::Member {
            site: subjects_site(),
            member: subject("y"),
            change_type: ChangeType::Added,
            value: json!({"value": "y"}),
        }]);
        let group = correlation.get(&subject("y")).unwrap();
        assert!(group.is_membership());
        assert_eq!(group.membership[0].site.collection, "subjects");
        assert!(correlation.get(&root()).is_none());
    }

    #[test]
    fn empty_input_is_empty_correlation() {
        assert!(correlate(Vec::new()).is_empty());
    }
}
