pub mod catalog;
pub mod config;
pub mod engine;
pub mod modifiers;
pub mod tier;
pub mod validation;
pub mod weights;

pub use catalog::{Catalog, Criterion, Model, TargetProfile};
pub use config::ScoringConfig;
pub use engine::{
    calculate_score, round2, ClampPolicy, CriterionContribution, ScoreBreakdown, ScoreResult,
    ScoringContext,
};
pub use modifiers::{ModifierTable, DEFAULT_COUNTRY_MODIFIERS, DEFAULT_MODIFIER};
pub use tier::Tier;
pub use validation::validate_scoring;
pub use weights::WeightSet;

/// Failure to interpret a user-supplied name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown target profile '{0}' (expected AE, BA or DS/MLE)")]
    UnknownProfile(String),
    #[error("unknown model '{0}' (expected full or simple)")]
    UnknownModel(String),
    #[error("unknown tier '{0}'")]
    UnknownTier(String),
}
