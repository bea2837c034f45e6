//! Progression, streak and unlock engine.
//!
//! Pure computations over a caller-supplied `StatsSnapshot`:
//!
//! - levels: XP -> level, title and progress
//! - streaks: next streak value, active milestone bonus
//! - unlocks: badge/certificate criteria scoring
//! - daily: date-seeded pick from a fixed catalog
//!
//! Nothing here performs I/O or keeps state between calls. The caller owns
//! persistence, awards XP and records earned unlocks.

pub mod config;
pub mod criteria;
pub mod daily;
pub mod defaults;
pub mod error;
pub mod levels;
pub mod snapshot;
pub mod streaks;
pub mod unlocks;

pub use config::EngineConfig;
pub use criteria::{FieldSelector, UnlockCriterion, UnlockDefinition, UnlockKind};
pub use daily::{date_key, select_daily, select_daily_index};
pub use error::{EngineError, Result};
pub use levels::{LevelState, LevelTable, TitleBand, TitleTable};
pub use snapshot::{RawStats, StatsSnapshot};
pub use streaks::{
    apply_streak_event, Milestone, MilestoneTable, StreakBonus, StreakEvent, StreakState,
    StreakTracker,
};
pub use unlocks::{
    CatalogEvaluation, CriterionDetail, UnlockEvaluation, UnlockEvaluator, ValidationMode,
};

/// Level state for raw XP using the built-in tables.
/// Negative XP is rejected with `InvalidStatInput`.
pub fn compute_level(total_xp: i64) -> Result<LevelState> {
    let xp = snapshot::non_negative("totalXp", total_xp)?;
    Ok(LevelTable::default().compute(xp, &TitleTable::default()))
}

/// Active and next milestone for a streak using the built-in milestones
pub fn evaluate_streak_bonus(current_streak: u32) -> StreakBonus {
    MilestoneTable::default().evaluate(current_streak)
}

/// Streak counters with their bonus tier using the built-in milestones
pub fn evaluate_streak(current_streak: u32, longest_streak: u32) -> Result<StreakState> {
    StreakState::new(current_streak, longest_streak, &MilestoneTable::default())
}

/// Score one definition with the built-in level table and default mode
pub fn evaluate(definition: &UnlockDefinition, stats: &StatsSnapshot) -> Result<UnlockEvaluation> {
    let levels = LevelTable::default();
    UnlockEvaluator::new(&levels).evaluate(definition, stats)
}

/// Engine bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct ProgressionEngine {
    config: EngineConfig,
    mode: ValidationMode,
}

impl ProgressionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            mode: ValidationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compute_level(&self, total_xp: u64) -> LevelState {
        self.config.levels.compute(total_xp, &self.config.titles)
    }

    pub fn evaluate_streak_bonus(&self, current_streak: u32) -> StreakBonus {
        self.config.milestones.evaluate(current_streak)
    }

    pub fn evaluate_streak(&self, current_streak: u32, longest_streak: u32) -> Result<StreakState> {
        StreakState::new(current_streak, longest_streak, &self.config.milestones)
    }

    pub fn evaluator(&self) -> UnlockEvaluator<'_> {
        UnlockEvaluator::new(&self.config.levels).with_mode(self.mode)
    }

    pub fn evaluate(
        &self,
        definition: &UnlockDefinition,
        stats: &StatsSnapshot,
    ) -> Result<UnlockEvaluation> {
        self.evaluator().evaluate(definition, stats)
    }

    /// Score the configured catalog in catalog order
    pub fn evaluate_unlocks(&self, stats: &StatsSnapshot) -> Result<Vec<CatalogEvaluation>> {
        self.evaluator().evaluate_catalog(&self.config.unlocks, stats)
    }

    /// Configured unlocks newly satisfied between two snapshots
    pub fn newly_unlocked(
        &self,
        before: &StatsSnapshot,
        after: &StatsSnapshot,
    ) -> Result<Vec<String>> {
        self.evaluator()
            .newly_satisfied(&self.config.unlocks, before, after)
    }
}
