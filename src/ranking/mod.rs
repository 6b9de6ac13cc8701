pub mod filter;
pub mod session;
pub mod sort;

pub use filter::{distinct_archetypes, distinct_countries, filter_courses, Filters};
pub use session::{RankingSession, SessionSettings, WeightPreset};
pub use sort::{sort_rows, SortDirection, SortField, SortState};

use crate::dataset::Course;
use crate::scoring::{calculate_score, round2, ScoreResult, ScoringContext, Tier};

/// A scored course together with its position in the loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCourse<'a> {
    /// Position in the dataset, stable across filtering and sorting
    pub index: usize,
    pub course: &'a Course,
    pub result: ScoreResult,
}

/// Filter, score and sort `courses` under one configuration.
///
/// An empty dataset, or a filter that matches nothing, yields an empty ranking.
pub fn rank<'a>(
    courses: &'a [Course],
    filters: &Filters,
    ctx: &ScoringContext,
    sort: SortState,
) -> Vec<RankedCourse<'a>> {
    let mut rows: Vec<RankedCourse<'a>> = filter_courses(courses, filters)
        .map(|(index, course)| RankedCourse {
            index,
            course,
            result: calculate_score(course, ctx),
        })
        .collect();
    sort_rows(&mut rows, sort);
    rows
}

/// Aggregate figures shown under a ranking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankingSummary {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Indexed by tier number
    pub tier_counts: [usize; 4],
}

impl RankingSummary {
    pub fn count_for(&self, tier: Tier) -> usize {
        self.tier_counts[usize::from(tier.number())]
    }
}

/// Summarize final scores. All figures are 0 for an empty ranking.
pub fn summarize<'r>(results: impl IntoIterator<Item = &'r ScoreResult>) -> RankingSummary {
    let mut summary = RankingSummary {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        ..Default::default()
    };
    let mut total = 0.0;

    for result in results {
        summary.count += 1;
        total += result.final_score;
        summary.min = summary.min.min(result.final_score);
        summary.max = summary.max.max(result.final_score);
        summary.tier_counts[usize::from(result.tier.number())] += 1;
    }

    if summary.count == 0 {
        return RankingSummary::default();
    }
    summary.average = round2(total / summary.count as f64);
    summary
}
