//! Engine configuration (v0.4.0)
//!
//! Level thresholds, title bands, streak milestones and the unlock catalog
//! are static data owned by the caller. Each section falls back to the
//! built-in table when omitted. Tables validate while deserializing, so an
//! invalid table is rejected before it can be used.
//!
//! Example (TOML):
//!
//! ```toml
//! [levels]
//! thresholds = [0, 100, 300]
//! growthStep = 100
//!
//! [[titles]]
//! minLevel = 1
//! maxLevel = 4
//! title = "Novice"
//!
//! [[titles]]
//! minLevel = 5
//! title = "Expert"
//!
//! [[milestones]]
//! threshold = 3
//! bonusPercent = 10
//!
//! [[unlocks]]
//! id = "first_challenge"
//! criteria = [{ label = "Challenges", fieldSelector = "challengesCompleted", target = 1 }]
//! ```

use crate::criteria::UnlockDefinition;
use crate::defaults;
use crate::error::{EngineError, Result};
use crate::levels::{LevelTable, TitleTable};
use crate::streaks::MilestoneTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// All tables the engine consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub levels: LevelTable,

    #[serde(default)]
    pub titles: TitleTable,

    #[serde(default)]
    pub milestones: MilestoneTable,

    #[serde(default = "defaults::unlock_catalog")]
    pub unlocks: Vec<UnlockDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            levels: LevelTable::default(),
            titles: TitleTable::default(),
            milestones: MilestoneTable::default(),
            unlocks: defaults::unlock_catalog(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks spanning tables: unique unlock ids, positive finite targets
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for definition in &self.unlocks {
            if !seen.insert(definition.id.as_str()) {
                return Err(EngineError::InvalidTable(format!(
                    "duplicate unlock id '{}'",
                    definition.id
                )));
            }
            definition.validate()?;
        }
        Ok(())
    }

    /// Look up an unlock definition by id
    pub fn unlock(&self, id: &str) -> Option<&UnlockDefinition> {
        self.unlocks.iter().find(|d| d.id == id)
    }
}
