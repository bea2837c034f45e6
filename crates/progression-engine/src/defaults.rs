//! Built-in tables used when the caller supplies none.
//!
//! Every table here is also accepted by the validating constructors; the
//! tests below keep it that way.

use crate::criteria::{FieldSelector, UnlockDefinition, UnlockKind};
use crate::levels::TitleBand;
use crate::streaks::Milestone;

/// XP for levels 1-10
pub const LEVEL_THRESHOLDS: &[u64] = &[0, 100, 250, 500, 1000, 1750, 2750, 4000, 5500, 7500];

/// Extra XP each level past 10 costs over the previous one
pub const LEVEL_GROWTH_STEP: u64 = 500;

pub fn title_bands() -> Vec<TitleBand> {
    vec![
        TitleBand::new(1, Some(2), "Curious Mind"),
        TitleBand::new(3, Some(4), "Lab Assistant"),
        TitleBand::new(5, Some(9), "Junior Scientist"),
        TitleBand::new(10, Some(19), "Researcher"),
        TitleBand::new(20, Some(34), "Senior Researcher"),
        TitleBand::new(35, None, "Principal Investigator"),
    ]
}

pub fn milestones() -> Vec<Milestone> {
    vec![
        Milestone::new(3, 10).with_label("On Fire"),
        Milestone::new(7, 25).with_label("Week Warrior"),
        Milestone::new(15, 50).with_label("Fortnight Focus"),
        Milestone::new(30, 75).with_label("Monthly Master"),
        Milestone::new(60, 100).with_label("Unstoppable"),
    ]
}

fn category(id: &str) -> FieldSelector {
    FieldSelector::Category(id.to_string())
}

/// Badges followed by certificates
pub fn unlock_catalog() -> Vec<UnlockDefinition> {
    use FieldSelector::*;

    vec![
        // Challenge milestones
        UnlockDefinition::new("first_challenge", UnlockKind::Badge)
            .named("[1]", "First Steps", "Complete your first challenge")
            .require("Challenges completed", ChallengesCompleted, 1.0),
        UnlockDefinition::new("ten_challenges", UnlockKind::Badge)
            .named("[10]", "Getting Started", "Complete 10 challenges")
            .require("Challenges completed", ChallengesCompleted, 10.0),
        UnlockDefinition::new("fifty_challenges", UnlockKind::Badge)
            .named("[50]", "Regular", "Complete 50 challenges")
            .require("Challenges completed", ChallengesCompleted, 50.0),
        UnlockDefinition::new("hundred_challenges", UnlockKind::Badge)
            .named("[100]", "Centurion", "Complete 100 challenges")
            .require("Challenges completed", ChallengesCompleted, 100.0),
        // Streaks
        UnlockDefinition::new("streak_3", UnlockKind::Badge)
            .named("<3d>", "On Fire", "Reach a 3-day streak")
            .require("Longest streak", LongestStreak, 3.0),
        UnlockDefinition::new("streak_7", UnlockKind::Badge)
            .named("<7d>", "Week Warrior", "Reach a 7-day streak")
            .require("Longest streak", LongestStreak, 7.0),
        UnlockDefinition::new("streak_30", UnlockKind::Badge)
            .named("<30d>", "Monthly Master", "Reach a 30-day streak")
            .require("Longest streak", LongestStreak, 30.0),
        // Quality
        UnlockDefinition::new("sharp_shooter", UnlockKind::Badge)
            .named("(90+)", "Sharp Shooter", "Keep 90% accuracy over 20+ challenges")
            .require("Challenges completed", ChallengesCompleted, 20.0)
            .require("Accuracy", AccuracyPercent, 90.0),
        // Lab work
        UnlockDefinition::new("first_experiment", UnlockKind::Badge)
            .named("{lab}", "First Experiment", "Run your first experiment")
            .require("Experiments run", category("experiments"), 1.0),
        UnlockDefinition::new("lab_regular", UnlockKind::Badge)
            .named("{lab+}", "Lab Regular", "Run 25 experiments")
            .require("Experiments run", category("experiments"), 25.0),
        // Certificates
        UnlockDefinition::new("foundations", UnlockKind::Certificate)
            .named("|F|", "Foundations of Science", "Level 5, 25 challenges, 70% accuracy")
            .require("Level", Level, 5.0)
            .require("Challenges completed", ChallengesCompleted, 25.0)
            .require("Accuracy", AccuracyPercent, 70.0),
        UnlockDefinition::new("physics_track", UnlockKind::Certificate)
            .named("|P|", "Physics Track", "20 physics challenges at 75% accuracy")
            .require("Physics challenges", category("physics"), 20.0)
            .require("Accuracy", AccuracyPercent, 75.0),
        UnlockDefinition::new("chemistry_track", UnlockKind::Certificate)
            .named("|C|", "Chemistry Track", "20 chemistry challenges at 75% accuracy")
            .require("Chemistry challenges", category("chemistry"), 20.0)
            .require("Accuracy", AccuracyPercent, 75.0),
        UnlockDefinition::new("master_scientist", UnlockKind::Certificate)
            .named("|M|", "Master Scientist", "Level 20, 30-day streak, 200 challenges, 85% accuracy")
            .require("Level", Level, 20.0)
            .require("Longest streak", LongestStreak, 30.0)
            .require("Challenges completed", ChallengesCompleted, 200.0)
            .require("Accuracy", AccuracyPercent, 85.0),
    ]
}
