use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trail_types::EntityFamily;

use crate::error::{DiffError, DiffResult};

/// Engine configuration, usually loaded from a TOML file.
///
/// ```toml
/// families = ["item", "instance", "user"]
///
/// [ignored_paths]
/// item = ["effectiveShelvingOrder"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Families whose calculators are registered at startup.
    #[serde(default = "all_families")]
    pub families: Vec<EntityFamily>,
    /// Per family, dotted path prefixes whose changes are never reported.
    /// Keyed by family name as written in the file.
    #[serde(default)]
    pub ignored_paths: BTreeMap<String, Vec<String>>,
}

fn all_families() -> Vec<EntityFamily> {
    EntityFamily::ALL.to_vec()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            families: all_families(),
            ignored_paths: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> DiffResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))?;
        config.resolve_ignored()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> DiffResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DiffError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> DiffResult<String> {
        toml::to_string_pretty(self).map_err(|e| DiffError::Config(e.to_string()))
    }

    /// Ignored path prefixes keyed by parsed family.
    pub fn resolve_ignored(&self) -> DiffResult<BTreeMap<EntityFamily, Vec<String>>> {
        let mut resolved = BTreeMap::new();
        for (name, prefixes) in &self.ignored_paths {
            let family: EntityFamily = name
                .parse()
                .map_err(|e| DiffError::Config(format!("ignored_paths: {e}")))?;
            if let Some(empty) = prefixes.iter().find(|p| p.trim().is_empty()) {
                return Err(DiffError::Config(format!(
                    "ignored_paths.{name}: blank prefix `{empty}`"
                )));
            }
            resolved.insert(family, prefixes.clone());
        }
        Ok(resolved)
    }
}
