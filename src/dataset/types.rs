use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One course offered by one university, as loaded from the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub country: String,
    pub university: String,
    pub region: String,   // "City/Region" column
    pub archetype: String, // course archetype label, e.g. "Data Science"
    pub notes: String,
    /// Criterion values aligned with the active catalog; `None` when missing
    pub values: Vec<Option<f64>>,
    /// Columns the loader does not interpret (sources, links, comments)
    pub extra: BTreeMap<String, String>,
}

impl Course {
    /// Value of criterion `index`, with missing or non-finite values read as 0
    pub fn value(&self, index: usize) -> f64 {
        self.values
            .get(index)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn key(&self) -> CourseKey {
        CourseKey::new(&self.university, &self.archetype)
    }
}

/// Identifies a course across dataset reloads: (university, course label).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct CourseKey {
    pub university: String,
    pub course: String,
}

impl CourseKey {
    pub fn new(university: impl Into<String>, course: impl Into<String>) -> Self {
        Self {
            university: university.into(),
            course: course.into(),
        }
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.university, self.course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(values: Vec<Option<f64>>) -> Course {
        Course {
            country: "Brazil".to_string(),
            university: "USP".to_string(),
            region: "Sao Paulo".to_string(),
            archetype: "Computer Science".to_string(),
            notes: String::new(),
            values,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_value_defaults() {
        let c = course(vec![Some(2.0), None, Some(f64::INFINITY)]);
        assert_eq!(c.value(0), 2.0);
        assert_eq!(c.value(1), 0.0);
        assert_eq!(c.value(2), 0.0);
        assert_eq!(c.value(9), 0.0);
    }

    #[test]
    fn test_key_uses_university_and_archetype() {
        let c = course(vec![]);
        assert_eq!(c.key(), CourseKey::new("USP", "Computer Science"));
        assert_eq!(c.key().to_string(), "USP / Computer Science");
    }
}
