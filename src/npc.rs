use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// NPC Handle
// ============================================================================

/// The host NPC a player is interacting with. Quest logic only ever looks at
/// the internal name, which is stable across localisations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Npc {
    /// Internal name (e.g., "Clint", "Wizard")
    pub name: String,
    /// Localised name shown in dialogue boxes
    pub display_name: String,
}

impl Npc {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
        }
    }

    /// True if this NPC's internal name is any of `names`.
    pub fn is_any(&self, names: &[&str]) -> bool {
        names.iter().any(|n| *n == self.name)
    }
}

impl fmt::Display for Npc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
