use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::RankedCourse;
use crate::scoring::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("invalid sort direction '{}' (expected asc or desc)", s)),
        }
    }
}

/// Column a ranking can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    FinalScore,
    BaseScore,
    RawScore,
    CountryModifier,
    Tier,
    University,
    Country,
    Region,
    Archetype,
    /// Raw value of the criterion at this catalog index
    Criterion(usize),
}

impl SortField {
    /// Parse a field name. Criterion fields accept the criterion key or its
    /// dataset column name.
    pub fn parse(name: &str, catalog: &Catalog) -> Option<SortField> {
        let normalized = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let field = match normalized.as_str() {
            "final" | "final_score" | "finalscore" | "score" => SortField::FinalScore,
            "base" | "base_score" | "basescore" => SortField::BaseScore,
            "raw" | "raw_score" | "rawscore" => SortField::RawScore,
            "modifier" | "country_modifier" => SortField::CountryModifier,
            "tier" => SortField::Tier,
            "university" | "name" => SortField::University,
            "country" => SortField::Country,
            "region" | "city" | "city/region" => SortField::Region,
            "archetype" | "course" | "course_archetype" => SortField::Archetype,
            _ => return catalog.index_of(name.trim()).map(SortField::Criterion),
        };
        Some(field)
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            SortField::University | SortField::Country | SortField::Region | SortField::Archetype
        )
    }

    /// Names read best A-Z and tiers best-first; scores read best-first
    pub fn default_direction(&self) -> SortDirection {
        if self.is_text() || *self == SortField::Tier {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    pub fn label(&self, catalog: &Catalog) -> String {
        match self {
            SortField::FinalScore => "final score".to_string(),
            SortField::BaseScore => "base score".to_string(),
            SortField::RawScore => "raw score".to_string(),
            SortField::CountryModifier => "country modifier".to_string(),
            SortField::Tier => "tier".to_string(),
            SortField::University => "university".to_string(),
            SortField::Country => "country".to_string(),
            SortField::Region => "city/region".to_string(),
            SortField::Archetype => "course".to_string(),
            SortField::Criterion(i) => catalog
                .criteria
                .get(*i)
                .map(|c| c.label.to_string())
                .unwrap_or_else(|| format!("criterion {}", i)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Criterion(i) => write!(f, "criterion #{}", i),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self::new(SortField::FinalScore)
    }
}

impl SortState {
    /// Sort by `field` in its default direction
    pub fn new(field: SortField) -> Self {
        Self {
            field,
            direction: field.default_direction(),
        }
    }

    /// Choosing the active field again flips the direction; choosing a new
    /// field starts from that field's default direction.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.toggled();
        } else {
            *self = Self::new(field);
        }
    }
}

enum SortKey<'a> {
    Number(f64),
    Text(&'a str),
}

fn sort_key<'a>(row: &'a RankedCourse<'_>, field: SortField) -> SortKey<'a> {
    match field {
        SortField::FinalScore => SortKey::Number(row.result.final_score),
        SortField::BaseScore => SortKey::Number(row.result.base_score),
        SortField::RawScore => SortKey::Number(row.result.raw_score),
        SortField::CountryModifier => SortKey::Number(row.result.country_modifier),
        SortField::Tier => SortKey::Number(f64::from(row.result.tier.number())),
        SortField::University => SortKey::Text(&row.course.university),
        SortField::Country => SortKey::Text(&row.course.country),
        SortField::Region => SortKey::Text(&row.course.region),
        SortField::Archetype => SortKey::Text(&row.course.archetype),
        SortField::Criterion(i) => SortKey::Number(row.course.value(i)),
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(y.chars().flat_map(char::to_lowercase)),
        // A field always yields the same kind of key
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
    }
}

/// Sort rows in place. Equal keys keep dataset order, whatever the direction.
pub fn sort_rows(rows: &mut [RankedCourse<'_>], state: SortState) {
    rows.sort_by(|a, b| {
        let ordering = compare_keys(&sort_key(a, state.field), &sort_key(b, state.field));
        let ordering = match state.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        ordering.then(a.index.cmp(&b.index))
    });
}
