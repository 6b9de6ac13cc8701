use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::{Course, CourseKey};
use crate::ranking::Filters;
use crate::scoring::{Catalog, Model};

pub const STATE_VERSION: u32 = 1;

/// User edits that survive between runs: per-course criterion scores and the
/// last saved filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    pub version: u32,
    #[serde(default, with = "entries")]
    pub scores: BTreeMap<CourseKey, CourseScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filters>,
}

/// Criterion values entered for one course, keyed by criterion key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseScores {
    pub model: Model,
    pub values: BTreeMap<String, f64>,
    pub updated_at: DateTime<Utc>,
}

impl Default for UserState {
    fn default() -> Self {
        Self::new()
    }
}

impl UserState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            scores: BTreeMap::new(),
            filters: None,
        }
    }

    /// Record one criterion value for a course. Scores saved under another
    /// model are replaced, since their keys do not carry over.
    pub fn set_score(&mut self, key: CourseKey, model: Model, criterion: &str, value: f64) {
        let now = Utc::now();
        let entry = self.scores.entry(key).or_insert_with(|| CourseScores {
            model,
            values: BTreeMap::new(),
            updated_at: now,
        });
        if entry.model != model {
            entry.model = model;
            entry.values.clear();
        }
        entry.values.insert(criterion.to_string(), value);
        entry.updated_at = now;
    }

    /// Saved values for a course under `model`
    pub fn scores_for(&self, key: &CourseKey, model: Model) -> Option<&CourseScores> {
        self.scores.get(key).filter(|s| s.model == model)
    }

    /// Forget a course's saved values. Returns whether anything was removed.
    pub fn clear(&mut self, key: &CourseKey) -> bool {
        self.scores.remove(key).is_some()
    }

    pub fn clear_all(&mut self) {
        self.scores.clear();
    }
}

/// Overlay saved scores onto loaded courses. Returns how many courses
/// picked up at least one saved value.
pub fn apply_saved_scores(courses: &mut [Course], catalog: &Catalog, state: &UserState) -> usize {
    let mut applied = 0;
    for course in courses.iter_mut() {
        let Some(saved) = state.scores_for(&course.key(), catalog.model) else {
            continue;
        };
        let mut touched = false;
        for (criterion, value) in &saved.values {
            if let Some(i) = catalog.index_of(criterion) {
                if course.values.len() <= i {
                    course.values.resize(catalog.len(), None);
                }
                course.values[i] = Some(*value);
                touched = true;
            }
        }
        if touched {
            applied += 1;
        }
    }
    applied
}

/// Score map stored as a list of `{university, course, model, values, ...}`
/// objects so the composite key stays readable in JSON.
mod entries {
    use super::CourseScores;
    use crate::dataset::CourseKey;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct EntryRef<'a> {
        #[serde(flatten)]
        key: &'a CourseKey,
        #[serde(flatten)]
        scores: &'a CourseScores,
    }

    #[derive(Deserialize)]
    struct Entry {
        #[serde(flatten)]
        key: CourseKey,
        #[serde(flatten)]
        scores: CourseScores,
    }

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<CourseKey, CourseScores>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter().map(|(key, scores)| EntryRef { key, scores }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<CourseKey, CourseScores>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.key, e.scores)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_course(university: &str, archetype: &str) -> Course {
        Course {
            country: "Brazil".to_string(),
            university: university.to_string(),
            region: String::new(),
            archetype: archetype.to_string(),
            notes: String::new(),
            values: vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_new_state_is_versioned() {
        let state = UserState::new();
        assert_eq!(state.version, 1);
        assert!(state.scores.is_empty());
        assert!(state.filters.is_none());
    }

    #[test]
    fn test_set_and_clear_scores() {
        let mut state = UserState::new();
        let key = CourseKey::new("USP", "Data Science");
        state.set_score(key.clone(), Model::Simple, "quality", 3.0);
        state.set_score(key.clone(), Model::Simple, "geo_fit", 2.0);

        let saved = state.scores_for(&key, Model::Simple).unwrap();
        assert_eq!(saved.values.len(), 2);
        assert!(state.scores_for(&key, Model::Full).is_none());

        assert!(state.clear(&key));
        assert!(!state.clear(&key));
    }

    #[test]
    fn test_switching_model_replaces_values() {
        let mut state = UserState::new();
        let key = CourseKey::new("USP", "Data Science");
        state.set_score(key.clone(), Model::Simple, "quality", 3.0);
        state.set_score(key.clone(), Model::Full, "curriculum_depth", 8.0);

        let saved = state.scores_for(&key, Model::Full).unwrap();
        assert_eq!(saved.values.len(), 1);
        assert_eq!(saved.values.get("curriculum_depth"), Some(&8.0));
    }

    #[test]
    fn test_apply_saved_scores_matches_university_and_course() {
        let catalog = Catalog::for_model(Model::Simple);
        let mut courses = vec![
            create_test_course("USP", "Data Science"),
            create_test_course("USP", "Statistics"),
        ];
        let mut state = UserState::new();
        state.set_score(CourseKey::new("USP", "Statistics"), Model::Simple, "employability", 3.0);

        assert_eq!(apply_saved_scores(&mut courses, catalog, &state), 1);
        assert_eq!(courses[0].values[2], Some(1.0));
        assert_eq!(courses[1].values[2], Some(3.0));
    }

    #[test]
    fn test_json_shape_uses_entry_list() {
        let mut state = UserState::new();
        state.set_score(CourseKey::new("UNAM", "Actuarial Science"), Model::Simple, "scale", 2.0);
        state.filters = Some(Filters::new(vec!["Mexico".to_string()], vec![]));

        let json = serde_json::to_value(&state).unwrap();
        let entry = &json["scores"][0];
        assert_eq!(entry["university"], "UNAM");
        assert_eq!(entry["course"], "Actuarial Science");
        assert_eq!(entry["model"], "simple");
        assert_eq!(entry["values"]["scale"], 2.0);

        let back: UserState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
