//! Level System v0.4.0
//!
//! Maps cumulative XP to a level number and a display title.
//!
//! ## XP Curve
//!
//! Levels come from an explicit threshold table `T[1] = 0 < T[2] < ... < T[n]`.
//! Beyond the last defined threshold every extra level costs `growth_step`
//! more XP than the previous one:
//!
//! ```text
//! d = T[n] - T[n-1]
//! T[n + k] = T[n] + k*d + growth_step * k*(k+1)/2
//! ```
//!
//! so `level_for` is total over every `u64` of XP. With `growth_step = 0`
//! the extrapolated levels all cost `d`.
//!
//! A table whose curve would put `u64::MAX` XP at level `u64::MAX` (only
//! possible with `d = 1` and no growth) is rejected, so the next level is
//! always representable and `xp_into_level` stays below the level span.
//!
//! ## Titles
//!
//! Titles are assigned by contiguous inclusive level bands. The first band
//! starts at level 1 and the last band is open-ended.

use crate::defaults;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Ordered XP thresholds plus the extrapolation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LevelTableSpec", into = "LevelTableSpec")]
pub struct LevelTable {
    thresholds: Vec<u64>,
    growth_step: u64,
}

/// Serialized shape of a level table, validated into `LevelTable`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelTableSpec {
    thresholds: Vec<u64>,
    #[serde(default)]
    growth_step: u64,
}

impl TryFrom<LevelTableSpec> for LevelTable {
    type Error = EngineError;

    fn try_from(spec: LevelTableSpec) -> Result<Self> {
        LevelTable::new(spec.thresholds, spec.growth_step)
    }
}

impl From<LevelTable> for LevelTableSpec {
    fn from(table: LevelTable) -> Self {
        Self {
            thresholds: table.thresholds,
            growth_step: table.growth_step,
        }
    }
}

impl LevelTable {
    /// Build a validated table; `thresholds[0]` is the XP for level 1
    pub fn new(thresholds: Vec<u64>, growth_step: u64) -> Result<Self> {
        if thresholds.len() < 2 {
            return Err(EngineError::InvalidTable(
                "level table needs at least two thresholds".to_string(),
            ));
        }
        if thresholds[0] != 0 {
            return Err(EngineError::InvalidTable(format!(
                "level 1 must start at 0 XP, found {}",
                thresholds[0]
            )));
        }
        if let Some(pos) = thresholds.windows(2).position(|w| w[1] <= w[0]) {
            return Err(EngineError::InvalidTable(format!(
                "level thresholds must strictly increase (level {} = {}, level {} = {})",
                pos + 1,
                thresholds[pos],
                pos + 2,
                thresholds[pos + 1]
            )));
        }
        let table = Self {
            thresholds,
            growth_step,
        };
        let top = table
            .defined_levels()
            .checked_add(table.extra_levels(u64::MAX - table.last_threshold()))
            .filter(|&level| level < u64::MAX);
        if top.is_none() {
            return Err(EngineError::InvalidTable(
                "level curve reaches the maximum level before the maximum XP".to_string(),
            ));
        }
        Ok(table)
    }

    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    pub fn growth_step(&self) -> u64 {
        self.growth_step
    }

    /// Number of explicitly defined levels
    pub fn defined_levels(&self) -> u64 {
        self.thresholds.len() as u64
    }

    /// Calculate level from total XP (always >= 1)
    pub fn level_for(&self, total_xp: u64) -> u64 {
        let reached = self.thresholds.partition_point(|&t| t <= total_xp) as u64;
        if reached < self.defined_levels() {
            return reached;
        }

        let past_last = total_xp - self.last_threshold();
        let extra = self.extra_levels(past_last);
        trace!(total_xp, extra, "extrapolated level past table");
        self.defined_levels().saturating_add(extra)
    }

    /// XP required to reach `level` from 0, saturating at `u64::MAX`
    pub fn threshold(&self, level: u64) -> u64 {
        u64::try_from(self.threshold_wide(level)).unwrap_or(u64::MAX)
    }

    /// Full level state for an XP total
    pub fn compute(&self, total_xp: u64, titles: &TitleTable) -> LevelState {
        let level = self.level_for(total_xp);
        let current = self.threshold_wide(level);
        let next = self.threshold_wide(level.saturating_add(1));

        let xp_into_level = (total_xp as u128).saturating_sub(current);
        let xp_to_next_level = next.saturating_sub(total_xp as u128);

        LevelState {
            level,
            title: titles.title_for(level).to_string(),
            total_xp,
            xp_into_level: u64::try_from(xp_into_level).unwrap_or(u64::MAX),
            xp_to_next_level: u64::try_from(xp_to_next_level).unwrap_or(u64::MAX),
        }
    }

    fn last_threshold(&self) -> u64 {
        self.thresholds[self.thresholds.len() - 1]
    }

    fn last_delta(&self) -> u64 {
        let n = self.thresholds.len();
        self.thresholds[n - 1] - self.thresholds[n - 2]
    }

    fn threshold_wide(&self, level: u64) -> u128 {
        if level == 0 {
            return 0;
        }
        if level <= self.defined_levels() {
            return self.thresholds[(level - 1) as usize] as u128;
        }
        let k = level - self.defined_levels();
        (self.last_threshold() as u128).saturating_add(self.extrapolated_cost(k))
    }

    /// Total XP for `k` levels past the last defined threshold
    fn extrapolated_cost(&self, k: u64) -> u128 {
        let k = k as u128;
        let linear = k * self.last_delta() as u128;
        let triangle = k * (k + 1) / 2;
        linear.saturating_add(triangle.saturating_mul(self.growth_step as u128))
    }

    /// Largest `k` with `extrapolated_cost(k) <= xp`
    fn extra_levels(&self, xp: u64) -> u64 {
        let d = self.last_delta();
        let s = self.growth_step;
        if s == 0 {
            return xp / d;
        }

        // Closed-form estimate of the quadratic root, corrected with exact integers.
        let b = d as f64 + s as f64 / 2.0;
        let disc = b * b + 2.0 * s as f64 * xp as f64;
        let mut k = ((disc.sqrt() - b) / s as f64).floor().max(0.0) as u64;

        let xp = xp as u128;
        while k > 0 && self.extrapolated_cost(k) > xp {
            k -= 1;
        }
        while self.extrapolated_cost(k + 1) <= xp {
            k += 1;
        }
        k
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            thresholds: defaults::LEVEL_THRESHOLDS.to_vec(),
            growth_step: defaults::LEVEL_GROWTH_STEP,
        }
    }
}

/// One inclusive title range; `max_level = None` means open-ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleBand {
    pub min_level: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<u64>,
    pub title: String,
}

impl TitleBand {
    pub fn new(min_level: u64, max_level: Option<u64>, title: &str) -> Self {
        Self {
            min_level,
            max_level,
            title: title.to_string(),
        }
    }
}

/// Title bands partitioning every level >= 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TitleBand>", into = "Vec<TitleBand>")]
pub struct TitleTable {
    bands: Vec<TitleBand>,
}

impl TryFrom<Vec<TitleBand>> for TitleTable {
    type Error = EngineError;

    fn try_from(bands: Vec<TitleBand>) -> Result<Self> {
        TitleTable::new(bands)
    }
}

impl From<TitleTable> for Vec<TitleBand> {
    fn from(table: TitleTable) -> Self {
        table.bands
    }
}

impl TitleTable {
    pub fn new(bands: Vec<TitleBand>) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| EngineError::InvalidTable("title table is empty".to_string()))?;
        if first.min_level != 1 {
            return Err(EngineError::InvalidTable(format!(
                "first title band must start at level 1, found {}",
                first.min_level
            )));
        }

        for pair in bands.windows(2) {
            let (band, next) = (&pair[0], &pair[1]);
            let max = band.max_level.ok_or_else(|| {
                EngineError::InvalidTable(format!(
                    "only the last title band may be open-ended ('{}')",
                    band.title
                ))
            })?;
            if max < band.min_level {
                return Err(EngineError::InvalidTable(format!(
                    "title band '{}' ends before it starts ({}..={})",
                    band.title, band.min_level, max
                )));
            }
            if max.checked_add(1) != Some(next.min_level) {
                return Err(EngineError::InvalidTable(format!(
                    "title bands '{}' and '{}' are not contiguous ({} then {})",
                    band.title, next.title, max, next.min_level
                )));
            }
        }

        if let Some(last) = bands.last() {
            if last.max_level.is_some() {
                return Err(EngineError::InvalidTable(format!(
                    "last title band '{}' must be open-ended",
                    last.title
                )));
            }
        }

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[TitleBand] {
        &self.bands
    }

    /// Get title for a level
    pub fn title_for(&self, level: u64) -> &str {
        let idx = self.bands.partition_point(|b| b.min_level <= level);
        &self.bands[idx.saturating_sub(1)].title
    }
}

impl Default for TitleTable {
    fn default() -> Self {
        Self {
            bands: defaults::title_bands(),
        }
    }
}

/// Derived level state, recomputed on every call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelState {
    pub level: u64,
    pub title: String,
    pub total_xp: u64,
    pub xp_into_level: u64,
    pub xp_to_next_level: u64,
}

impl LevelState {
    /// XP width of the current level
    pub fn level_span(&self) -> u64 {
        self.xp_into_level.saturating_add(self.xp_to_next_level)
    }

    /// Progress to next level as a whole percentage (0-100, floored)
    pub fn progress_percent(&self) -> u8 {
        let span = self.level_span() as u128;
        if span == 0 {
            return 100;
        }
        ((self.xp_into_level as u128 * 100) / span).min(100) as u8
    }
}

impl std::fmt::Display for LevelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Level {} {} ({}/{} XP)",
            self.level,
            self.title,
            self.xp_into_level,
            self.level_span()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LevelTable {
        LevelTable::new(vec![0, 100, 250, 500], 50).unwrap()
    }

    #[test]
    fn test_level_from_xp() {
        let t = table();
        assert_eq!(t.level_for(0), 1);
        assert_eq!(t.level_for(99), 1);
        assert_eq!(t.level_for(100), 2);
        assert_eq!(t.level_for(249), 2);
        assert_eq!(t.level_for(250), 3);
        assert_eq!(t.level_for(500), 4);
    }

    #[test]
    fn test_extrapolated_thresholds() {
        let t = table();
        // d = 250, step = 50: +300, +350, +400
        assert_eq!(t.threshold(5), 800);
        assert_eq!(t.threshold(6), 1150);
        assert_eq!(t.threshold(7), 1550);
        assert_eq!(t.level_for(799), 4);
        assert_eq!(t.level_for(800), 5);
        assert_eq!(t.level_for(1149), 5);
        assert_eq!(t.level_for(1150), 6);
    }

    #[test]
    fn test_flat_extrapolation() {
        let t = LevelTable::new(vec![0, 100], 0).unwrap();
        assert_eq!(t.level_for(100), 2);
        assert_eq!(t.level_for(199), 2);
        assert_eq!(t.level_for(200), 3);
        assert_eq!(t.level_for(1_000_000), 10_001);
    }

    #[test]
    fn test_extrapolation_matches_threshold_walk() {
        let t = table();
        for level in 1..200u64 {
            let at = t.threshold(level);
            assert_eq!(t.level_for(at), level, "at threshold of level {}", level);
            assert!(t.level_for(at + 1) >= level);
            if at > 0 {
                assert_eq!(t.level_for(at - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_max_xp_is_total() {
        let t = table();
        let state = t.compute(u64::MAX, &TitleTable::default());
        assert!(state.level > t.defined_levels());
        assert!(state.xp_to_next_level > 0);
    }

    #[test]
    fn test_saturating_curve_rejected() {
        assert!(LevelTable::new(vec![0, 1], 0).is_err());
        assert!(LevelTable::new(vec![0, 1, 2, 3], 0).is_err());

        // Smallest tables that stay below the level ceiling
        for t in [
            LevelTable::new(vec![0, 2], 0).unwrap(),
            LevelTable::new(vec![0, 1], 1).unwrap(),
            LevelTable::new(vec![0, 1, 3], 0).unwrap(),
        ] {
            let state = t.compute(u64::MAX, &TitleTable::default());
            assert!(state.level < u64::MAX);
            assert!(state.xp_to_next_level > 0);
            assert!(state.xp_into_level < state.level_span());
        }
    }

    #[test]
    fn test_compute_state() {
        let t = table();
        let state = t.compute(300, &TitleTable::default());
        assert_eq!(state.level, 3);
        assert_eq!(state.xp_into_level, 50);
        assert_eq!(state.xp_to_next_level, 200);
        assert_eq!(state.level_span(), 250);
        assert_eq!(state.progress_percent(), 20);
    }

    #[test]
    fn test_invalid_level_tables() {
        assert!(LevelTable::new(vec![], 0).is_err());
        assert!(LevelTable::new(vec![0], 0).is_err());
        assert!(LevelTable::new(vec![10, 100], 0).is_err());
        assert!(LevelTable::new(vec![0, 100, 100], 0).is_err());
        assert!(LevelTable::new(vec![0, 100, 50], 0).is_err());
    }

    #[test]
    fn test_default_tables_are_valid() {
        let levels = LevelTable::default();
        assert!(LevelTable::new(levels.thresholds().to_vec(), levels.growth_step()).is_ok());
        let titles = TitleTable::default();
        assert!(TitleTable::new(titles.bands().to_vec()).is_ok());
    }

    #[test]
    fn test_title_bands() {
        let titles = TitleTable::new(vec![
            TitleBand::new(1, Some(4), "Novice"),
            TitleBand::new(5, Some(9), "Adept"),
            TitleBand::new(10, None, "Master"),
        ])
        .unwrap();
        assert_eq!(titles.title_for(1), "Novice");
        assert_eq!(titles.title_for(4), "Novice");
        assert_eq!(titles.title_for(5), "Adept");
        assert_eq!(titles.title_for(9), "Adept");
        assert_eq!(titles.title_for(10), "Master");
        assert_eq!(titles.title_for(u64::MAX), "Master");
    }

    #[test]
    fn test_invalid_title_tables() {
        assert!(TitleTable::new(vec![]).is_err());
        // Does not start at 1
        assert!(TitleTable::new(vec![TitleBand::new(2, None, "A")]).is_err());
        // Gap between 4 and 6
        assert!(TitleTable::new(vec![
            TitleBand::new(1, Some(4), "A"),
            TitleBand::new(6, None, "B"),
        ])
        .is_err());
        // Overlap
        assert!(TitleTable::new(vec![
            TitleBand::new(1, Some(4), "A"),
            TitleBand::new(4, None, "B"),
        ])
        .is_err());
        // Closed last band
        assert!(TitleTable::new(vec![TitleBand::new(1, Some(99), "A")]).is_err());
        // Open band in the middle
        assert!(TitleTable::new(vec![
            TitleBand::new(1, None, "A"),
            TitleBand::new(5, None, "B"),
        ])
        .is_err());
    }

    #[test]
    fn test_display() {
        let state = table().compute(300, &TitleTable::default());
        assert_eq!(state.to_string(), "Level 3 Lab Assistant (50/250 XP)");
    }
}
