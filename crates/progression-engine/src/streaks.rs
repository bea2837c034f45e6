//! Streak tracking and milestone bonuses (v0.3.0).
//!
//! Streaks count consecutive calendar days with activity. The caller owns the
//! stored counters; everything here takes the previous values and returns the
//! next ones.
//!
//! Milestones are `(threshold, bonus_percent)` tiers. The active tier is the
//! highest one reached. Bonuses never stack: once the last tier is reached its
//! bonus is the ceiling no matter how long the streak grows.

use crate::defaults;
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Streak-length threshold and the XP bonus it grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Days of streak required
    pub threshold: u32,
    /// Bonus applied to earned XP, in percent
    pub bonus_percent: u32,
    /// Optional display label (e.g. "Week Warrior")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Milestone {
    pub fn new(threshold: u32, bonus_percent: u32) -> Self {
        Self {
            threshold,
            bonus_percent,
            label: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Ascending milestone tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Milestone>", into = "Vec<Milestone>")]
pub struct MilestoneTable {
    milestones: Vec<Milestone>,
}

impl TryFrom<Vec<Milestone>> for MilestoneTable {
    type Error = EngineError;

    fn try_from(milestones: Vec<Milestone>) -> Result<Self> {
        MilestoneTable::new(milestones)
    }
}

impl From<MilestoneTable> for Vec<Milestone> {
    fn from(table: MilestoneTable) -> Self {
        table.milestones
    }
}

impl MilestoneTable {
    /// Thresholds must be >= 1 and strictly increasing, bonuses non-decreasing.
    /// An empty table is allowed and never grants a bonus.
    pub fn new(milestones: Vec<Milestone>) -> Result<Self> {
        if let Some(first) = milestones.first() {
            if first.threshold == 0 {
                return Err(EngineError::InvalidTable(
                    "milestone threshold must be at least 1 day".to_string(),
                ));
            }
        }
        for pair in milestones.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(EngineError::InvalidTable(format!(
                    "milestone thresholds must strictly increase ({} then {})",
                    pair[0].threshold, pair[1].threshold
                )));
            }
            if pair[1].bonus_percent < pair[0].bonus_percent {
                return Err(EngineError::InvalidTable(format!(
                    "milestone bonus drops from {}% to {}% at {} days",
                    pair[0].bonus_percent, pair[1].bonus_percent, pair[1].threshold
                )));
            }
        }
        Ok(Self { milestones })
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Highest milestone whose threshold is <= `current_streak`
    pub fn active_for(&self, current_streak: u32) -> Option<&Milestone> {
        let reached = self
            .milestones
            .partition_point(|m| m.threshold <= current_streak);
        reached.checked_sub(1).map(|idx| &self.milestones[idx])
    }

    /// First milestone whose threshold is > `current_streak`
    pub fn next_after(&self, current_streak: u32) -> Option<&Milestone> {
        let reached = self
            .milestones
            .partition_point(|m| m.threshold <= current_streak);
        self.milestones.get(reached)
    }

    /// Bonus ceiling (last tier), 0 for an empty table
    pub fn max_bonus(&self) -> u32 {
        self.milestones.last().map(|m| m.bonus_percent).unwrap_or(0)
    }

    pub fn evaluate(&self, current_streak: u32) -> StreakBonus {
        let active = self.active_for(current_streak).cloned();
        let next = self.next_after(current_streak).cloned();
        StreakBonus {
            bonus_percent: active.as_ref().map(|m| m.bonus_percent).unwrap_or(0),
            days_to_next: next.as_ref().map(|m| m.threshold - current_streak),
            active_milestone: active,
            next_milestone: next,
        }
    }
}

impl Default for MilestoneTable {
    fn default() -> Self {
        Self {
            milestones: defaults::milestones(),
        }
    }
}

/// Active bonus tier for a streak length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakBonus {
    pub active_milestone: Option<Milestone>,
    pub next_milestone: Option<Milestone>,
    pub bonus_percent: u32,
    /// Days until the next tier, `None` once the last tier is reached
    pub days_to_next: Option<u32>,
}

impl StreakBonus {
    /// Reward multiplier, e.g. 1.25 for a 25% bonus
    pub fn multiplier(&self) -> f64 {
        1.0 + self.bonus_percent as f64 / 100.0
    }

    /// Apply the bonus to base XP (integer, rounded down)
    pub fn apply(&self, base_xp: u64) -> u64 {
        let bonus = base_xp as u128 * self.bonus_percent as u128 / 100;
        u64::try_from(base_xp as u128 + bonus).unwrap_or(u64::MAX)
    }
}

/// Streak counters together with their bonus tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(flatten)]
    pub bonus: StreakBonus,
}

impl StreakState {
    pub fn new(current_streak: u32, longest_streak: u32, table: &MilestoneTable) -> Result<Self> {
        if longest_streak < current_streak {
            return Err(EngineError::stat(
                "longestStreak",
                format!(
                    "longest streak {} is below current streak {}",
                    longest_streak, current_streak
                ),
            ));
        }
        Ok(Self {
            current_streak,
            longest_streak,
            bonus: table.evaluate(current_streak),
        })
    }
}

/// How a new activity relates to the last active day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakEvent {
    /// Already active on this calendar day
    SameDay,
    /// Exactly one day after the last active day
    NextDay,
    /// More than one day later, or no previous activity
    Gap,
}

impl StreakEvent {
    /// Classify from caller-computed flags; same day wins over consecutive
    pub fn from_flags(activity_occurred_today: bool, is_consecutive_day: bool) -> Self {
        if activity_occurred_today {
            StreakEvent::SameDay
        } else if is_consecutive_day {
            StreakEvent::NextDay
        } else {
            StreakEvent::Gap
        }
    }

    /// Classify from calendar dates. A date before `last_active` never changes
    /// the streak and counts as the same day.
    pub fn between(last_active: Option<NaiveDate>, today: NaiveDate) -> Self {
        let Some(last) = last_active else {
            return StreakEvent::Gap;
        };
        match (today - last).num_days() {
            0 => StreakEvent::SameDay,
            1 => StreakEvent::NextDay,
            d if d < 0 => {
                warn!(%last, %today, "activity date precedes last active day, ignoring");
                StreakEvent::SameDay
            }
            _ => StreakEvent::Gap,
        }
    }

    pub fn apply(self, previous_streak: u32) -> u32 {
        match self {
            StreakEvent::SameDay => previous_streak,
            StreakEvent::NextDay => previous_streak.saturating_add(1),
            StreakEvent::Gap => 1,
        }
    }
}

/// Next streak value after an activity
pub fn apply_streak_event(
    previous_streak: u32,
    activity_occurred_today: bool,
    is_consecutive_day: bool,
) -> u32 {
    StreakEvent::from_flags(activity_occurred_today, is_consecutive_day).apply(previous_streak)
}

/// Caller-persisted streak record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakTracker {
    pub current: u32,
    pub longest: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<NaiveDate>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an already classified event; `last_active` is left as is
    pub fn apply_event(&self, event: StreakEvent) -> Self {
        let current = event.apply(self.current);
        Self {
            current,
            longest: self.longest.max(current),
            last_active: self.last_active,
        }
    }

    /// Record activity on `date`, returning the record to persist
    pub fn record_activity(&self, date: NaiveDate) -> Self {
        let mut next = self.apply_event(StreakEvent::between(self.last_active, date));
        next.last_active = match self.last_active {
            Some(last) if last > date => Some(last),
            _ => Some(date),
        };
        next
    }

    /// Whether the streak lapsed (no activity yesterday or today)
    pub fn is_broken_on(&self, today: NaiveDate) -> bool {
        match self.last_active {
            Some(last) => (today - last).num_days() > 1,
            None => false,
        }
    }

    /// Streak that still counts on `today`
    pub fn current_on(&self, today: NaiveDate) -> u32 {
        if self.is_broken_on(today) {
            0
        } else {
            self.current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table() -> MilestoneTable {
        MilestoneTable::new(vec![
            Milestone::new(3, 10),
            Milestone::new(7, 25),
            Milestone::new(15, 50),
        ])
        .unwrap()
    }

    #[test]
    fn test_streak_event_rules() {
        assert_eq!(apply_streak_event(5, true, false), 5);
        assert_eq!(apply_streak_event(5, false, true), 6);
        assert_eq!(apply_streak_event(5, false, false), 1);
        // Same day wins when both flags are set
        assert_eq!(apply_streak_event(5, true, true), 5);
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let once = apply_streak_event(4, true, false);
        let twice = apply_streak_event(once, true, false);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_milestone_lookup() {
        let t = table();
        let bonus = t.evaluate(10);
        assert_eq!(bonus.active_milestone, Some(Milestone::new(7, 25)));
        assert_eq!(bonus.next_milestone, Some(Milestone::new(15, 50)));
        assert_eq!(bonus.bonus_percent, 25);
        assert_eq!(bonus.days_to_next, Some(5));
    }

    #[test]
    fn test_milestone_boundaries() {
        let t = table();
        assert!(t.evaluate(0).active_milestone.is_none());
        assert!(t.evaluate(2).active_milestone.is_none());
        assert_eq!(t.evaluate(3).bonus_percent, 10);
        assert_eq!(t.evaluate(7).bonus_percent, 25);
        assert_eq!(t.evaluate(14).bonus_percent, 25);
        assert_eq!(t.evaluate(15).bonus_percent, 50);
    }

    #[test]
    fn test_bonus_capped_at_last_tier() {
        let t = table();
        let bonus = t.evaluate(400);
        assert_eq!(bonus.bonus_percent, 50);
        assert_eq!(bonus.bonus_percent, t.max_bonus());
        assert!(bonus.next_milestone.is_none());
        assert!(bonus.days_to_next.is_none());
    }

    #[test]
    fn test_empty_table() {
        let t = MilestoneTable::new(vec![]).unwrap();
        let bonus = t.evaluate(100);
        assert_eq!(bonus.bonus_percent, 0);
        assert!(bonus.active_milestone.is_none());
        assert!(bonus.next_milestone.is_none());
        assert_eq!(bonus.multiplier(), 1.0);
    }

    #[test]
    fn test_invalid_milestone_tables() {
        assert!(MilestoneTable::new(vec![Milestone::new(0, 5)]).is_err());
        assert!(MilestoneTable::new(vec![Milestone::new(3, 10), Milestone::new(3, 20)]).is_err());
        assert!(MilestoneTable::new(vec![Milestone::new(7, 25), Milestone::new(3, 10)]).is_err());
        assert!(MilestoneTable::new(vec![Milestone::new(3, 25), Milestone::new(7, 10)]).is_err());
    }

    #[test]
    fn test_bonus_apply() {
        let bonus = table().evaluate(7);
        assert_eq!(bonus.apply(100), 125);
        assert_eq!(bonus.apply(3), 3);
        assert_eq!(bonus.multiplier(), 1.25);
    }

    #[test]
    fn test_streak_state_rejects_inconsistent_counters() {
        assert!(StreakState::new(5, 3, &table()).is_err());
        let state = StreakState::new(5, 9, &table()).unwrap();
        assert_eq!(state.bonus.bonus_percent, 10);
    }

    #[test]
    fn test_event_between_dates() {
        let d = date(2025, 2, 10);
        assert_eq!(StreakEvent::between(None, d), StreakEvent::Gap);
        assert_eq!(StreakEvent::between(Some(d), d), StreakEvent::SameDay);
        assert_eq!(StreakEvent::between(Some(date(2025, 2, 9)), d), StreakEvent::NextDay);
        assert_eq!(StreakEvent::between(Some(date(2025, 2, 7)), d), StreakEvent::Gap);
        assert_eq!(StreakEvent::between(Some(date(2025, 2, 12)), d), StreakEvent::SameDay);
    }

    #[test]
    fn test_event_across_month_boundary() {
        assert_eq!(
            StreakEvent::between(Some(date(2024, 2, 29)), date(2024, 3, 1)),
            StreakEvent::NextDay
        );
    }

    #[test]
    fn test_tracker_sequence() {
        let t = StreakTracker::new()
            .record_activity(date(2025, 1, 1))
            .record_activity(date(2025, 1, 2))
            .record_activity(date(2025, 1, 2))
            .record_activity(date(2025, 1, 3));
        assert_eq!(t.current, 3);
        assert_eq!(t.longest, 3);

        let t = t.record_activity(date(2025, 1, 10));
        assert_eq!(t.current, 1);
        assert_eq!(t.longest, 3);
        assert_eq!(t.last_active, Some(date(2025, 1, 10)));
    }

    #[test]
    fn test_tracker_ignores_out_of_order_date() {
        let t = StreakTracker::new()
            .record_activity(date(2025, 1, 5))
            .record_activity(date(2025, 1, 6));
        let late = t.record_activity(date(2025, 1, 3));
        assert_eq!(late, t);
    }

    #[test]
    fn test_tracker_broken_streak() {
        let t = StreakTracker::new()
            .record_activity(date(2025, 1, 1))
            .record_activity(date(2025, 1, 2));
        assert!(!t.is_broken_on(date(2025, 1, 3)));
        assert_eq!(t.current_on(date(2025, 1, 3)), 2);
        assert!(t.is_broken_on(date(2025, 1, 4)));
        assert_eq!(t.current_on(date(2025, 1, 4)), 0);
    }

    #[test]
    fn test_tracker_flag_events_keep_longest() {
        let t = StreakTracker::new()
            .apply_event(StreakEvent::from_flags(false, false))
            .apply_event(StreakEvent::from_flags(false, true))
            .apply_event(StreakEvent::from_flags(false, true))
            .apply_event(StreakEvent::from_flags(true, true));
        assert_eq!((t.current, t.longest), (3, 3));

        let t = t.apply_event(StreakEvent::from_flags(false, false));
        assert_eq!((t.current, t.longest), (1, 3));
        assert_eq!(t.last_active, None);
    }
}
