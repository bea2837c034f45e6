//! Unlock evaluation for badges and certificates (v0.4.0).
//!
//! Scores one definition against one snapshot. Each criterion reports a
//! capped completion ratio `min(1, current / target)`; the definition's
//! percentage is the rounded mean of those ratios, held at 99 while any
//! criterion is still unmet so a locked unlock never shows 100. The
//! evaluator never picks a "next" unlock and never remembers what was
//! earned: callers persist earned unlocks and decide presentation order.

use crate::criteria::{UnlockCriterion, UnlockDefinition};
use crate::error::{EngineError, Result};
use crate::levels::LevelTable;
use crate::snapshot::StatsSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How malformed definitions are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Non-positive targets and empty definitions are errors
    Strict,
    /// Non-positive targets count as met, empty definitions as satisfied
    Lenient,
}

impl Default for ValidationMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ValidationMode::Strict
        } else {
            ValidationMode::Lenient
        }
    }
}

/// Result of one criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionDetail {
    pub label: String,
    pub current: f64,
    pub target: f64,
    pub met: bool,
    /// Capped completion ratio (0.0 - 1.0)
    pub ratio: f64,
}

impl std::fmt::Display for CriterionDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.met { "[x]" } else { "[ ]" };
        write!(f, "{} {}: {}/{}", mark, self.label, self.current, self.target)
    }
}

/// Result of scoring one definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockEvaluation {
    pub satisfied: bool,
    /// Mean criterion completion, 0-100
    pub percentage: u8,
    pub per_criterion_detail: Vec<CriterionDetail>,
}

impl UnlockEvaluation {
    /// Criteria still missing, in definition order
    pub fn remaining(&self) -> Vec<&CriterionDetail> {
        self.per_criterion_detail.iter().filter(|d| !d.met).collect()
    }
}

/// Evaluation of one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEvaluation {
    pub id: String,
    #[serde(flatten)]
    pub evaluation: UnlockEvaluation,
}

/// Scores unlock definitions against snapshots
#[derive(Debug, Clone)]
pub struct UnlockEvaluator<'a> {
    levels: &'a LevelTable,
    mode: ValidationMode,
}

impl<'a> UnlockEvaluator<'a> {
    pub fn new(levels: &'a LevelTable) -> Self {
        Self {
            levels,
            mode: ValidationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Score one definition
    pub fn evaluate(
        &self,
        definition: &UnlockDefinition,
        stats: &StatsSnapshot,
    ) -> Result<UnlockEvaluation> {
        if definition.criteria.is_empty() {
            if self.mode == ValidationMode::Strict {
                return Err(EngineError::criterion(
                    &definition.id,
                    "",
                    "definition has no criteria",
                ));
            }
            warn!(id = %definition.id, "definition has no criteria, treating as satisfied");
            return Ok(UnlockEvaluation {
                satisfied: true,
                percentage: 100,
                per_criterion_detail: Vec::new(),
            });
        }

        let details = definition
            .criteria
            .iter()
            .map(|c| self.evaluate_criterion(&definition.id, c, stats))
            .collect::<Result<Vec<_>>>()?;

        let satisfied = details.iter().all(|d| d.met);
        let mean = details.iter().map(|d| d.ratio).sum::<f64>() / details.len() as f64;
        let mut percentage = (mean * 100.0).round().clamp(0.0, 100.0) as u8;
        if !satisfied {
            percentage = percentage.min(99);
        }

        debug!(
            id = %definition.id,
            satisfied,
            percentage,
            "evaluated unlock definition"
        );

        Ok(UnlockEvaluation {
            satisfied,
            percentage,
            per_criterion_detail: details,
        })
    }

    fn evaluate_criterion(
        &self,
        definition_id: &str,
        criterion: &UnlockCriterion,
        stats: &StatsSnapshot,
    ) -> Result<CriterionDetail> {
        let target = criterion.target;
        if !target.is_finite() {
            return Err(EngineError::criterion(
                definition_id,
                &criterion.label,
                format!("target is not finite ({})", target),
            ));
        }

        let current = criterion.field_selector.read(stats, self.levels);

        if target <= 0.0 {
            if self.mode == ValidationMode::Strict {
                return Err(EngineError::criterion(
                    definition_id,
                    &criterion.label,
                    format!("target must be positive, found {}", target),
                ));
            }
            warn!(
                id = %definition_id,
                label = %criterion.label,
                target,
                "non-positive target, criterion treated as met"
            );
            return Ok(CriterionDetail {
                label: criterion.label.clone(),
                current,
                target,
                met: true,
                ratio: 1.0,
            });
        }

        let met = current >= target;
        let ratio = if met { 1.0 } else { (current / target).clamp(0.0, 1.0) };

        Ok(CriterionDetail {
            label: criterion.label.clone(),
            current,
            target,
            met,
            ratio,
        })
    }

    /// Score every definition independently, keeping catalog order
    pub fn evaluate_catalog(
        &self,
        catalog: &[UnlockDefinition],
        stats: &StatsSnapshot,
    ) -> Result<Vec<CatalogEvaluation>> {
        catalog
            .iter()
            .map(|definition| {
                Ok(CatalogEvaluation {
                    id: definition.id.clone(),
                    evaluation: self.evaluate(definition, stats)?,
                })
            })
            .collect()
    }

    /// Ids satisfied by `after` but not by `before`, in catalog order
    pub fn newly_satisfied(
        &self,
        catalog: &[UnlockDefinition],
        before: &StatsSnapshot,
        after: &StatsSnapshot,
    ) -> Result<Vec<String>> {
        let mut unlocked = Vec::new();
        for definition in catalog {
            let was = self.evaluate(definition, before)?.satisfied;
            let is = self.evaluate(definition, after)?.satisfied;
            if is && !was {
                unlocked.push(definition.id.clone());
            }
        }
        Ok(unlocked)
    }
}
