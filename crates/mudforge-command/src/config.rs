//! Extra aliases loaded from configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Additional command words, each mapped onto an existing one.
///
/// ```json
/// { "aliases": { "peer": "look", "bye": "quit" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    pub aliases: BTreeMap<String, String>,
}

impl AliasConfig {
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
