//! User statistics snapshot (v0.2.0).
//!
//! The caller aggregates activity from its own storage and hands the engine
//! an immutable `StatsSnapshot`. Nothing here is persisted or mutated.
//!
//! `RawStats` mirrors the loosely typed JSON produced upstream (numbers may
//! arrive as floats); converting it into a `StatsSnapshot` is where negative,
//! non-finite and inconsistent values are rejected.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validated statistics for one user at one point in time.
///
/// Deserializing goes through `RawStats`, so the same checks apply to
/// `serde_json::from_str::<StatsSnapshot>` as to `from_json_str`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawStats")]
pub struct StatsSnapshot {
    /// Cumulative experience points
    pub total_xp: u64,
    /// Consecutive active days up to the last activity
    pub current_streak: u32,
    /// Best streak ever reached
    pub longest_streak: u32,
    /// Challenges attempted to completion
    pub challenges_completed: u64,
    /// Challenges answered correctly
    pub correct_answers: u64,
    /// Per-category counters (e.g. "physics", "experiments")
    pub category_tallies: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    pub fn new(total_xp: u64) -> Self {
        Self {
            total_xp,
            ..Default::default()
        }
    }

    /// Set streak counters; `longest` is raised to `current` if lower
    pub fn with_streak(mut self, current: u32, longest: u32) -> Self {
        self.current_streak = current;
        self.longest_streak = longest.max(current);
        self
    }

    /// Set challenge counters
    pub fn with_challenges(mut self, completed: u64, correct: u64) -> Self {
        self.challenges_completed = completed;
        self.correct_answers = correct;
        self
    }

    /// Set one category tally
    pub fn with_category(mut self, category: &str, count: u64) -> Self {
        self.category_tallies.insert(category.to_string(), count);
        self
    }

    /// Accuracy as a percentage (0.0 - 100.0), 0 when nothing was completed
    pub fn accuracy_percent(&self) -> f64 {
        if self.challenges_completed == 0 {
            return 0.0;
        }
        self.correct_answers as f64 / self.challenges_completed as f64 * 100.0
    }

    /// Tally for a category, 0 when the category was never recorded
    pub fn category(&self, category: &str) -> u64 {
        self.category_tallies.get(category).copied().unwrap_or(0)
    }
}

/// Unvalidated statistics as they arrive from the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStats {
    pub total_xp: f64,
    pub current_streak: f64,
    pub longest_streak: f64,
    pub challenges_completed: f64,
    pub correct_answers: f64,
    pub category_tallies: BTreeMap<String, f64>,
}

impl TryFrom<RawStats> for StatsSnapshot {
    type Error = EngineError;

    fn try_from(raw: RawStats) -> Result<Self> {
        let current_streak = streak_count("currentStreak", raw.current_streak)?;
        let longest_streak = streak_count("longestStreak", raw.longest_streak)?;
        if longest_streak < current_streak {
            return Err(EngineError::stat(
                "longestStreak",
                format!(
                    "longest streak {} is below current streak {}",
                    longest_streak, current_streak
                ),
            ));
        }

        let challenges_completed = count("challengesCompleted", raw.challenges_completed)?;
        let correct_answers = count("correctAnswers", raw.correct_answers)?;
        if correct_answers > challenges_completed {
            return Err(EngineError::stat(
                "correctAnswers",
                format!(
                    "{} correct answers exceed {} completed challenges",
                    correct_answers, challenges_completed
                ),
            ));
        }

        let mut category_tallies = BTreeMap::new();
        for (category, value) in raw.category_tallies {
            let tally = count(&format!("categoryTallies.{}", category), value)?;
            category_tallies.insert(category, tally);
        }

        Ok(Self {
            total_xp: count("totalXp", raw.total_xp)?,
            current_streak,
            longest_streak,
            challenges_completed,
            correct_answers,
            category_tallies,
        })
    }
}

impl StatsSnapshot {
    /// Parse and validate a JSON snapshot in one step
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawStats = serde_json::from_str(json)?;
        Self::try_from(raw)
    }
}

/// Reject negative integer input, e.g. XP sent as a signed value
pub fn non_negative(field: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| EngineError::stat(field, format!("value is negative ({})", value)))
}

fn count(field: &str, value: f64) -> Result<u64> {
    if !value.is_finite() {
        return Err(EngineError::stat(field, format!("value is not finite ({})", value)));
    }
    if value < 0.0 {
        return Err(EngineError::stat(field, format!("value is negative ({})", value)));
    }
    if value.fract() != 0.0 {
        return Err(EngineError::stat(field, format!("value is not a whole number ({})", value)));
    }
    if value > u64::MAX as f64 {
        return Err(EngineError::stat(field, format!("value is out of range ({})", value)));
    }
    Ok(value as u64)
}

fn streak_count(field: &str, value: f64) -> Result<u32> {
    let days = count(field, value)?;
    u32::try_from(days)
        .map_err(|_| EngineError::stat(field, format!("streak is out of range ({})", days)))
}
