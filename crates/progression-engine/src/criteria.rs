//! Declarative unlock criteria for badges and certificates.
//!
//! A definition is an AND-list of `(field, target)` comparisons. Field
//! selectors are written as strings in catalogs:
//!
//! - `totalXp`, `level`, `currentStreak`, `longestStreak`
//! - `challengesCompleted`, `correctAnswers`, `accuracyPercent`
//! - `category:<id>` for a category tally (missing categories read as 0)

use crate::error::{EngineError, Result};
use crate::levels::LevelTable;
use crate::snapshot::StatsSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const CATEGORY_PREFIX: &str = "category:";

/// Which snapshot value a criterion reads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldSelector {
    TotalXp,
    /// Derived from `total_xp` through the level table
    Level,
    CurrentStreak,
    LongestStreak,
    ChallengesCompleted,
    CorrectAnswers,
    AccuracyPercent,
    Category(String),
}

impl FieldSelector {
    /// Read the current value from a snapshot
    pub fn read(&self, stats: &StatsSnapshot, levels: &LevelTable) -> f64 {
        match self {
            FieldSelector::TotalXp => stats.total_xp as f64,
            FieldSelector::Level => levels.level_for(stats.total_xp) as f64,
            FieldSelector::CurrentStreak => stats.current_streak as f64,
            FieldSelector::LongestStreak => stats.longest_streak as f64,
            FieldSelector::ChallengesCompleted => stats.challenges_completed as f64,
            FieldSelector::CorrectAnswers => stats.correct_answers as f64,
            FieldSelector::AccuracyPercent => stats.accuracy_percent(),
            FieldSelector::Category(id) => stats.category(id) as f64,
        }
    }
}

impl FromStr for FieldSelector {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let selector = match s {
            "totalXp" => FieldSelector::TotalXp,
            "level" => FieldSelector::Level,
            "currentStreak" => FieldSelector::CurrentStreak,
            "longestStreak" => FieldSelector::LongestStreak,
            "challengesCompleted" => FieldSelector::ChallengesCompleted,
            "correctAnswers" => FieldSelector::CorrectAnswers,
            "accuracyPercent" => FieldSelector::AccuracyPercent,
            other => match other.strip_prefix(CATEGORY_PREFIX) {
                Some(id) if !id.is_empty() => FieldSelector::Category(id.to_string()),
                _ => {
                    return Err(EngineError::InvalidTable(format!(
                        "unknown field selector '{}'",
                        other
                    )))
                }
            },
        };
        Ok(selector)
    }
}

impl TryFrom<String> for FieldSelector {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FieldSelector> for String {
    fn from(selector: FieldSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSelector::TotalXp => write!(f, "totalXp"),
            FieldSelector::Level => write!(f, "level"),
            FieldSelector::CurrentStreak => write!(f, "currentStreak"),
            FieldSelector::LongestStreak => write!(f, "longestStreak"),
            FieldSelector::ChallengesCompleted => write!(f, "challengesCompleted"),
            FieldSelector::CorrectAnswers => write!(f, "correctAnswers"),
            FieldSelector::AccuracyPercent => write!(f, "accuracyPercent"),
            FieldSelector::Category(id) => write!(f, "{}{}", CATEGORY_PREFIX, id),
        }
    }
}

/// One named comparison: `field >= target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockCriterion {
    pub label: String,
    pub field_selector: FieldSelector,
    pub target: f64,
}

impl UnlockCriterion {
    pub fn new(label: &str, field_selector: FieldSelector, target: f64) -> Self {
        Self {
            label: label.to_string(),
            field_selector,
            target,
        }
    }
}

/// Badge or certificate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockKind {
    #[default]
    Badge,
    Certificate,
}

/// Named AND-set of criteria with display metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockDefinition {
    pub id: String,
    #[serde(default)]
    pub kind: UnlockKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Short ASCII badge symbol (e.g. "[10]", "<7d>")
    #[serde(default)]
    pub badge: String,
    pub criteria: Vec<UnlockCriterion>,
}

impl UnlockDefinition {
    pub fn new(id: &str, kind: UnlockKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: String::new(),
            description: String::new(),
            badge: String::new(),
            criteria: Vec::new(),
        }
    }

    pub fn named(mut self, badge: &str, name: &str, description: &str) -> Self {
        self.badge = badge.to_string();
        self.name = name.to_string();
        self.description = description.to_string();
        self
    }

    /// Append a criterion
    pub fn require(mut self, label: &str, field_selector: FieldSelector, target: f64) -> Self {
        self.criteria
            .push(UnlockCriterion::new(label, field_selector, target));
        self
    }

    /// Strict validation: non-empty, every target finite and positive
    pub fn validate(&self) -> Result<()> {
        if self.criteria.is_empty() {
            return Err(EngineError::criterion(&self.id, "", "definition has no criteria"));
        }
        for criterion in &self.criteria {
            if !criterion.target.is_finite() {
                return Err(EngineError::criterion(
                    &self.id,
                    &criterion.label,
                    format!("target is not finite ({})", criterion.target),
                ));
            }
            if criterion.target <= 0.0 {
                return Err(EngineError::criterion(
                    &self.id,
                    &criterion.label,
                    format!("target must be positive, found {}", criterion.target),
                ));
            }
        }
        Ok(())
    }
}
