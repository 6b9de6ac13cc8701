use super::catalog::{Catalog, Model, TargetProfile};
use super::config::ScoringConfig;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let model = match config.model.as_deref().map(str::parse::<Model>) {
        Some(Err(e)) => {
            errors.push(format!("scoring.model: {}", e));
            None
        }
        Some(Ok(model)) => Some(model),
        None => Some(Model::default()),
    };

    if let Some(Err(e)) = config.profile.as_deref().map(str::parse::<TargetProfile>) {
        errors.push(format!("scoring.profile: {}", e));
    }

    for (key, weight) in &config.weights {
        // Keys can only be checked once the model is known
        if let Some(model) = model {
            let catalog = Catalog::for_model(model);
            if !catalog.keys().any(|k| k == key) {
                errors.push(format!(
                    "scoring.weights.{}: unknown criterion for the {} model (expected one of: {})",
                    key,
                    model,
                    catalog.keys().collect::<Vec<_>>().join(", ")
                ));
            }
        }
        if !weight.is_finite() || *weight < 0.0 {
            errors.push(format!(
                "scoring.weights.{}: must be a non-negative number, got {}",
                key, weight
            ));
        }
    }

    for (country, modifier) in &config.country_modifiers {
        if !modifier.is_finite() || *modifier <= 0.0 {
            errors.push(format!(
                "scoring.country_modifiers.{}: must be positive, got {}",
                country, modifier
            ));
        }
    }

    if let Some(fallback) = config.default_modifier {
        if !fallback.is_finite() || fallback <= 0.0 {
            errors.push(format!(
                "scoring.default_modifier: must be positive, got {}",
                fallback
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_valid_config() {
        let config = ScoringConfig {
            model: Some("simple".to_string()),
            profile: Some("DS/MLE".to_string()),
            weights: BTreeMap::from([("quality".to_string(), 1.5)]),
            country_modifiers: BTreeMap::from([("Chile".to_string(), 1.1)]),
            default_modifier: Some(0.9),
            ..Default::default()
        };
        assert!(validate_scoring(&config).is_ok());
    }

    #[test]
    fn test_empty_config() {
        assert!(validate_scoring(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn test_unknown_profile() {
        let config = ScoringConfig {
            profile: Some("PM".to_string()),
            ..Default::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.profile"));
        assert!(errors[0].contains("PM"));
    }

    #[test]
    fn test_unknown_criterion_for_model() {
        // geo_fit belongs to the simple model, not the default full model
        let config = ScoringConfig {
            weights: BTreeMap::from([("geo_fit".to_string(), 1.0)]),
            ..Default::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.weights.geo_fit"));
    }

    #[test]
    fn test_negative_weight() {
        let config = ScoringConfig {
            weights: BTreeMap::from([("curriculum_depth".to_string(), -1.0)]),
            ..Default::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("non-negative"));
    }

    #[test]
    fn test_non_positive_modifiers() {
        let config = ScoringConfig {
            country_modifiers: BTreeMap::from([("Chile".to_string(), 0.0)]),
            default_modifier: Some(f64::NAN),
            ..Default::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_collects_all_errors() {
        let config = ScoringConfig {
            model: Some("huge".to_string()),
            profile: Some("XX".to_string()),
            weights: BTreeMap::from([("anything".to_string(), -2.0)]),
            ..Default::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        // Bad model skips the key check; the negative weight is still reported
        assert_eq!(errors.len(), 3);
    }
}
