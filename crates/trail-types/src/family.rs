use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A category of domain object with its own canonical shape and diff rules.
///
/// The tag selects which family calculator the engine applies to a pair of
/// snapshots. Serialized in kebab-case (`marc-bib`), which is also the
/// `Display` / `FromStr` form used by configuration files and the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityFamily {
    /// Inventory item.
    Item,
    /// Inventory holdings record.
    Holdings,
    /// Inventory instance.
    Instance,
    /// User record.
    User,
    /// Bibliographic MARC record.
    MarcBib,
    /// Authority MARC record.
    MarcAuthority,
}

impl EntityFamily {
    /// Every family, in declaration order.
    pub const ALL: [EntityFamily; 6] = [
        Self::Item,
        Self::Holdings,
        Self::Instance,
        Self::User,
        Self::MarcBib,
        Self::MarcAuthority,
    ];

    /// The kebab-case name of this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Holdings => "holdings",
            Self::Instance => "instance",
            Self::User => "user",
            Self::MarcBib => "marc-bib",
            Self::MarcAuthority => "marc-authority",
        }
    }

    /// Returns `true` for the MARC-backed families.
    pub fn is_marc(&self) -> bool {
        matches!(self, Self::MarcBib | Self::MarcAuthority)
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityFamily {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| TypeError::UnknownFamily(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_roundtrip() {
        for family in EntityFamily::ALL {
            assert_eq!(family.to_string().parse::<EntityFamily>(), Ok(family));
        }
    }

    #[test]
    fn unknown_family_rejected() {
        let err = "acquisition".parse::<EntityFamily>().unwrap_err();
        assert_eq!(err, TypeError::UnknownFamily("acquisition".into()));
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&EntityFamily::MarcAuthority).unwrap();
        assert_eq!(json, "\"marc-authority\"");
        let back: EntityFamily = serde_json::from_str("\"marc-bib\"").unwrap();
        assert_eq!(back, EntityFamily::MarcBib);
    }

    #[test]
    fn marc_families() {
        assert!(EntityFamily::MarcBib.is_marc());
        assert!(!EntityFamily::Item.is_marc());
    }
}
