use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, TargetProfile};
use super::modifiers::ModifierTable;
use super::tier::Tier;
use super::weights::WeightSet;
use crate::dataset::Course;

/// What happens to a final score pushed above 100 by a country modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Keep the value; a modifier above 1.0 can lift the score past 100
    #[default]
    None,
    /// Cap at 100
    Cap100,
}

impl ClampPolicy {
    pub fn from_flag(clamp: bool) -> Self {
        if clamp {
            ClampPolicy::Cap100
        } else {
            ClampPolicy::None
        }
    }

    fn apply(&self, score: f64) -> f64 {
        match self {
            ClampPolicy::None => score,
            ClampPolicy::Cap100 => score.min(100.0),
        }
    }
}

/// Everything the engine needs besides the entity itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub catalog: &'a Catalog,
    pub profile: TargetProfile,
    pub weights: &'a WeightSet,
    pub modifiers: &'a ModifierTable,
    pub clamp: ClampPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CriterionContribution {
    pub key: &'static str,
    pub label: &'static str,
    pub value: f64,
    pub weight: f64,
    pub multiplier: f64,
    pub contribution: f64,     // value * weight * multiplier
    pub max_contribution: f64, // criterion max * weight * multiplier
}

impl CriterionContribution {
    /// Share of this criterion's attainable points that the entity earned
    pub fn percentage(&self) -> f64 {
        if self.max_contribution > 0.0 {
            self.contribution / self.max_contribution * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub contributions: Vec<CriterionContribution>,
    pub max_raw: f64,
}

/// Scored view of one entity. Scores are rounded to two decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub raw_score: f64,
    pub base_score: f64,
    pub country_modifier: f64,
    pub final_score: f64,
    pub tier: Tier,
    pub breakdown: ScoreBreakdown,
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn calculate_score(course: &Course, ctx: &ScoringContext) -> ScoreResult {
    let multipliers = ctx.catalog.multipliers(ctx.profile);

    let mut raw = 0.0;
    let mut max_raw = 0.0;
    let mut contributions = Vec::with_capacity(ctx.catalog.len());

    for (i, criterion) in ctx.catalog.criteria.iter().enumerate() {
        let value = course.value(i).clamp(0.0, criterion.max);
        // Negative or non-finite weights count as 0
        let weight = match ctx.weights.get(criterion.key) {
            w if w.is_finite() && w > 0.0 => w,
            _ => 0.0,
        };
        let multiplier = multipliers.get(i).copied().unwrap_or(0.0);

        let contribution = value * weight * multiplier;
        let max_contribution = criterion.max * weight * multiplier;
        raw += contribution;
        max_raw += max_contribution;

        contributions.push(CriterionContribution {
            key: criterion.key,
            label: criterion.label,
            value,
            weight,
            multiplier,
            contribution,
            max_contribution,
        });
    }

    // All weights or multipliers at zero leaves nothing to normalize against
    let base = if max_raw > 0.0 { raw / max_raw * 100.0 } else { 0.0 };

    // Final is derived from the reported base so the two always agree
    let base_score = round2(base);
    let country_modifier = ctx.modifiers.resolve(&course.country);
    let final_score = round2(ctx.clamp.apply(base_score * country_modifier));

    ScoreResult {
        raw_score: round2(raw),
        base_score,
        country_modifier,
        final_score,
        tier: Tier::classify(final_score),
        breakdown: ScoreBreakdown {
            contributions,
            max_raw,
        },
    }
}
