use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ranking::{Filters, SortDirection};
use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dataset file (JSON or CSV) used when `--dataset` is not given
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    /// Filters applied when none are given on the command line
    #[serde(default)]
    pub filters: Option<Filters>,

    #[serde(default)]
    pub sort: Option<SortConfig>,
}

/// Initial ranking order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SortConfig {
    /// Field name, e.g. `final_score`, `university` or a criterion key
    pub field: String,
    /// Defaults to the field's natural direction
    #[serde(default)]
    pub direction: Option<SortDirection>,
}
