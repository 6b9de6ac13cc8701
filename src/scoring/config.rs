use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::catalog::{Catalog, Model, TargetProfile};
use super::engine::ClampPolicy;
use super::modifiers::ModifierTable;
use super::weights::WeightSet;

/// Scoring section of the config file.
///
/// Model and profile stay as strings here so that validation can report a
/// bad value alongside every other problem instead of failing the parse.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   model: simple
///   profile: BA
///   weights:
///     geo_fit: 1.5
///   country_modifiers:
///     Chile: 1.05
///   default_modifier: 0.9
///   clamp_final_score: true
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// `full` (11 criteria) or `simple` (4 criteria)
    #[serde(default)]
    pub model: Option<String>,

    /// `AE`, `BA` or `DS/MLE`
    #[serde(default)]
    pub profile: Option<String>,

    /// Start from the catalog's flat base weights instead of profile presets
    #[serde(default)]
    pub base_weights: bool,

    /// Weight overrides by criterion key
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,

    /// Country modifier overrides
    #[serde(default)]
    pub country_modifiers: BTreeMap<String, f64>,

    /// Modifier for countries without a built-in or overridden value
    #[serde(default)]
    pub default_modifier: Option<f64>,

    /// Cap final scores at 100
    #[serde(default)]
    pub clamp_final_score: bool,
}

impl ScoringConfig {
    /// Configured model, or the default when unset or unparseable
    pub fn model(&self) -> Model {
        self.model
            .as_deref()
            .and_then(|m| m.parse().ok())
            .unwrap_or_default()
    }

    pub fn profile(&self) -> TargetProfile {
        self.profile
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default()
    }

    pub fn catalog(&self) -> &'static Catalog {
        Catalog::for_model(self.model())
    }

    pub fn weight_overrides(&self) -> WeightSet {
        self.weights
            .iter()
            .map(|(k, w)| (k.clone(), *w))
            .collect()
    }

    pub fn modifier_table(&self) -> ModifierTable {
        let table = ModifierTable::new().with_overrides(
            self.country_modifiers
                .iter()
                .map(|(c, m)| (c.clone(), *m)),
        );
        match self.default_modifier {
            Some(fallback) => table.with_fallback(fallback),
            None => table,
        }
    }

    pub fn clamp(&self) -> ClampPolicy {
        ClampPolicy::from_flag(self.clamp_final_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.model(), Model::Full);
        assert_eq!(config.profile(), TargetProfile::DsMle);
        assert_eq!(config.clamp(), ClampPolicy::None);
        assert!(config.weight_overrides().is_empty());
        assert_eq!(config.modifier_table(), ModifierTable::new());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
model: simple
profile: BA
weights:
  geo_fit: 1.5
country_modifiers:
  Chile: 1.05
default_modifier: 0.8
clamp_final_score: true
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.model(), Model::Simple);
        assert_eq!(config.profile(), TargetProfile::Ba);
        assert_eq!(config.weight_overrides().get("geo_fit"), 1.5);
        let table = config.modifier_table();
        assert_eq!(table.resolve("Chile"), 1.05);
        assert_eq!(table.resolve("Peru"), 0.8);
        assert_eq!(table.resolve("Brazil"), 1.20);
        assert_eq!(config.clamp(), ClampPolicy::Cap100);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "base_score: 100\n";
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let mut config = ScoringConfig {
            model: Some("full".to_string()),
            profile: Some("AE".to_string()),
            ..Default::default()
        };
        config.weights.insert("curriculum_depth".to_string(), 2.0);
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
