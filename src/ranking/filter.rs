use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dataset::Course;

/// Country and archetype selection. An empty set selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Filters {
    #[serde(default)]
    pub countries: BTreeSet<String>,
    #[serde(default)]
    pub archetypes: BTreeSet<String>,
}

impl Filters {
    pub fn new<C, A>(countries: C, archetypes: A) -> Self
    where
        C: IntoIterator<Item = String>,
        A: IntoIterator<Item = String>,
    {
        Self {
            countries: countries.into_iter().collect(),
            archetypes: archetypes.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.archetypes.is_empty()
    }

    pub fn matches(&self, course: &Course) -> bool {
        (self.countries.is_empty() || self.countries.contains(&course.country))
            && (self.archetypes.is_empty() || self.archetypes.contains(&course.archetype))
    }

    /// "Brazil, Mexico" or "All"
    pub fn describe_countries(&self) -> String {
        describe(&self.countries)
    }

    pub fn describe_archetypes(&self) -> String {
        describe(&self.archetypes)
    }

    /// Selected countries and archetypes that no course in `courses` carries
    pub fn unmatched(&self, courses: &[Course]) -> Vec<String> {
        let countries = distinct_countries(courses);
        let archetypes = distinct_archetypes(courses);

        let missing_countries = self
            .countries
            .iter()
            .filter(|c| !countries.contains(*c))
            .map(|c| format!("country '{}' (available: {})", c, countries.join(", ")));
        let missing_archetypes = self
            .archetypes
            .iter()
            .filter(|a| !archetypes.contains(*a))
            .map(|a| format!("archetype '{}' (available: {})", a, archetypes.join(", ")));

        missing_countries.chain(missing_archetypes).collect()
    }
}

fn describe(set: &BTreeSet<String>) -> String {
    if set.is_empty() {
        "All".to_string()
    } else {
        set.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Courses passing `filters`, paired with their dataset position
pub fn filter_courses<'a, 'f>(
    courses: &'a [Course],
    filters: &'f Filters,
) -> impl Iterator<Item = (usize, &'a Course)> + 'f
where
    'a: 'f,
{
    courses
        .iter()
        .enumerate()
        .filter(move |(_, course)| filters.matches(course))
}

/// Sorted distinct countries in the dataset
pub fn distinct_countries(courses: &[Course]) -> Vec<String> {
    distinct(courses.iter().map(|c| c.country.as_str()))
}

/// Sorted distinct course archetypes in the dataset
pub fn distinct_archetypes(courses: &[Course]) -> Vec<String> {
    distinct(courses.iter().map(|c| c.archetype.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
