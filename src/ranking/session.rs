use serde::{Deserialize, Serialize};
use tracing::debug;

use super::filter::Filters;
use super::sort::{SortField, SortState};
use super::{rank, summarize, RankedCourse, RankingSummary};
use crate::dataset::Course;
use crate::scoring::{
    Catalog, ClampPolicy, ModifierTable, ScoreResult, ScoringContext, TargetProfile, WeightSet,
};

/// Which weights a session starts from before user overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPreset {
    /// The model's preset for the active target profile
    #[default]
    ProfileDefaults,
    /// Flat per-criterion base weights from the catalog. Models without
    /// base weights use the profile preset instead.
    BaseWeights,
}

impl WeightPreset {
    fn weights(&self, catalog: &Catalog, profile: TargetProfile) -> WeightSet {
        match self {
            WeightPreset::ProfileDefaults => WeightSet::profile_defaults(catalog, profile),
            WeightPreset::BaseWeights if catalog.has_base_weights() => WeightSet::base_weights(catalog),
            WeightPreset::BaseWeights => {
                debug!("{} model has no base weights, using profile defaults", catalog.model);
                WeightSet::profile_defaults(catalog, profile)
            }
        }
    }
}

/// Everything that shapes a ranking besides the courses themselves.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub catalog: &'static Catalog,
    pub profile: TargetProfile,
    pub preset: WeightPreset,
    pub weight_overrides: WeightSet,
    pub modifiers: ModifierTable,
    pub clamp: ClampPolicy,
    pub filters: Filters,
    pub sort: SortState,
}

impl SessionSettings {
    pub fn new(catalog: &'static Catalog) -> Self {
        Self {
            catalog,
            profile: TargetProfile::default(),
            preset: WeightPreset::default(),
            weight_overrides: WeightSet::default(),
            modifiers: ModifierTable::default(),
            clamp: ClampPolicy::default(),
            filters: Filters::default(),
            sort: SortState::default(),
        }
    }
}

/// A loaded dataset plus the current configuration.
///
/// Every setter recomputes the full ranking, so `rows` always reflects
/// exactly the settings in effect and nothing older.
#[derive(Debug)]
pub struct RankingSession {
    courses: Vec<Course>,
    settings: SessionSettings,
    weights: WeightSet,
    ranked: Vec<(usize, ScoreResult)>,
}

impl RankingSession {
    pub fn new(courses: Vec<Course>, settings: SessionSettings) -> Self {
        let mut session = Self {
            courses,
            settings,
            weights: WeightSet::default(),
            ranked: Vec::new(),
        };
        session.recompute();
        session
    }

    fn recompute(&mut self) {
        let s = &self.settings;
        self.weights = s.preset.weights(s.catalog, s.profile).merged(&s.weight_overrides);

        let ctx = ScoringContext {
            catalog: s.catalog,
            profile: s.profile,
            weights: &self.weights,
            modifiers: &s.modifiers,
            clamp: s.clamp,
        };
        self.ranked = rank(&self.courses, &s.filters, &ctx, s.sort)
            .into_iter()
            .map(|row| (row.index, row.result))
            .collect();

        debug!(
            "Ranked {} of {} courses (profile {}, sort {} {:?})",
            self.ranked.len(),
            self.courses.len(),
            s.profile,
            s.sort.field,
            s.sort.direction
        );
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.settings.catalog
    }

    pub fn profile(&self) -> TargetProfile {
        self.settings.profile
    }

    /// Weights in effect: the preset with user overrides layered on top
    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    pub fn modifiers(&self) -> &ModifierTable {
        &self.settings.modifiers
    }

    pub fn filters(&self) -> &Filters {
        &self.settings.filters
    }

    pub fn sort(&self) -> SortState {
        self.settings.sort
    }

    pub fn clamp(&self) -> ClampPolicy {
        self.settings.clamp
    }

    /// Replace all user weight overrides
    pub fn set_weights(&mut self, overrides: WeightSet) {
        self.settings.weight_overrides = overrides;
        self.recompute();
    }

    pub fn set_weight(&mut self, key: impl Into<String>, weight: f64) {
        self.settings.weight_overrides.set(key, weight);
        self.recompute();
    }

    /// Drop weight overrides, leaving the preset
    pub fn reset_weights(&mut self) {
        self.settings.weight_overrides = WeightSet::default();
        self.recompute();
    }

    /// Switch profile. Preset weights follow the new profile; user
    /// overrides are kept.
    pub fn set_target_profile(&mut self, profile: TargetProfile) {
        self.settings.profile = profile;
        self.recompute();
    }

    pub fn set_segment_modifier_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.settings.modifiers.set_overrides(overrides);
        self.recompute();
    }

    pub fn reset_modifiers(&mut self) {
        self.settings.modifiers.reset();
        self.recompute();
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.settings.filters = filters;
        self.recompute();
    }

    pub fn set_clamp(&mut self, clamp: ClampPolicy) {
        self.settings.clamp = clamp;
        self.recompute();
    }

    /// Sort by `field`, flipping direction if it is already the sort field
    pub fn select_sort(&mut self, field: SortField) {
        self.settings.sort.select(field);
        self.recompute();
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Filtered courses in sort order
    pub fn rows(&self) -> Vec<RankedCourse<'_>> {
        self.ranked
            .iter()
            .filter_map(|(index, result)| self.to_row(*index, result))
            .collect()
    }

    /// Row at `position` (0-based) in the current sort order
    pub fn row(&self, position: usize) -> Option<RankedCourse<'_>> {
        let (index, result) = self.ranked.get(position)?;
        self.to_row(*index, result)
    }

    fn to_row(&self, index: usize, result: &ScoreResult) -> Option<RankedCourse<'_>> {
        self.courses.get(index).map(|course| RankedCourse {
            index,
            course,
            result: result.clone(),
        })
    }

    pub fn summary(&self) -> RankingSummary {
        summarize(self.ranked.iter().map(|(_, result)| result))
    }
}
