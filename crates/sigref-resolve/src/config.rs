use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Knobs for building the initial environment and bounding lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Units opened in every initial environment, in order.
    #[serde(default)]
    pub open_modules: Vec<String>,

    /// How many aliases and module-type paths a single lookup may chase.
    #[serde(default = "default_max_alias_depth")]
    pub max_alias_depth: usize,

    /// Strengthen the expansion of `include M` by the path `M`.
    #[serde(default = "default_strengthen_includes")]
    pub strengthen_includes: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            open_modules: vec![],
            max_alias_depth: default_max_alias_depth(),
            strengthen_includes: default_strengthen_includes(),
        }
    }
}

pub fn default_max_alias_depth() -> usize {
    64
}

pub fn default_strengthen_includes() -> bool {
    true
}

impl ResolverOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let options = Self::from_toml_str(&content)?;
        log::debug!("Loaded resolver options from {}", path.as_ref().display());
        Ok(options)
    }
}
