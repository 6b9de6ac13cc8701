use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::catalog::{Catalog, TargetProfile};

/// Per-criterion weights, keyed by criterion key.
///
/// Criteria without an entry weigh 1.0. One weight set applies to every
/// entity scored under the same configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct WeightSet(BTreeMap<String, f64>);

impl WeightSet {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    /// Every criterion at 1.0
    pub fn uniform() -> Self {
        Self::default()
    }

    /// Weights a profile starts with: the model's preset for the profile,
    /// or uniform weights when the model has no presets.
    pub fn profile_defaults(catalog: &Catalog, profile: TargetProfile) -> Self {
        match catalog.profile_weights(profile) {
            Some(values) => Self::from_values(catalog, values),
            None => Self::uniform(),
        }
    }

    /// Flat base weights from the catalog (full model only; other models
    /// fall back to uniform).
    pub fn base_weights(catalog: &Catalog) -> Self {
        Self(
            catalog
                .criteria
                .iter()
                .filter_map(|c| c.base_weight.map(|w| (c.key.to_string(), w)))
                .collect(),
        )
    }

    fn from_values(catalog: &Catalog, values: &[f64]) -> Self {
        Self(
            catalog
                .keys()
                .zip(values.iter())
                .map(|(k, w)| (k.to_string(), *w))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(Self::DEFAULT_WEIGHT)
    }

    pub fn set(&mut self, key: impl Into<String>, weight: f64) {
        self.0.insert(key.into(), weight);
    }

    /// Layer `overrides` on top of `self`, returning the merged set
    pub fn merged(&self, overrides: &WeightSet) -> WeightSet {
        let mut merged = self.clone();
        for (k, w) in &overrides.0 {
            merged.0.insert(k.clone(), *w);
        }
        merged
    }

    /// Weights resolved for every criterion of `catalog`, in catalog order
    pub fn resolve(&self, catalog: &Catalog) -> Vec<f64> {
        catalog.keys().map(|k| self.get(k)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for WeightSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::catalog::Model;

    #[test]
    fn test_missing_key_defaults_to_one() {
        let weights = WeightSet::uniform();
        assert_eq!(weights.get("quality"), 1.0);
    }

    #[test]
    fn test_simple_profile_defaults() {
        let catalog = Catalog::for_model(Model::Simple);
        let weights = WeightSet::profile_defaults(catalog, TargetProfile::Ae);
        assert_eq!(weights.resolve(catalog), vec![0.8, 1.2, 1.0, 0.8]);
    }

    #[test]
    fn test_full_profile_defaults_are_uniform() {
        let catalog = Catalog::for_model(Model::Full);
        let weights = WeightSet::profile_defaults(catalog, TargetProfile::Ba);
        assert!(weights.resolve(catalog).iter().all(|w| *w == 1.0));
    }

    #[test]
    fn test_base_weights() {
        let catalog = Catalog::for_model(Model::Full);
        let weights = WeightSet::base_weights(catalog);
        assert_eq!(
            weights.resolve(catalog),
            vec![10.0, 8.0, 7.0, 8.0, 9.0, 7.0, 6.0, 6.0, 7.0, 7.0, 5.0]
        );
    }

    #[test]
    fn test_merged_overrides_win() {
        let catalog = Catalog::for_model(Model::Simple);
        let defaults = WeightSet::profile_defaults(catalog, TargetProfile::DsMle);
        let overrides: WeightSet = vec![("scale".to_string(), 2.0)].into_iter().collect();
        let merged = defaults.merged(&overrides);
        assert_eq!(merged.resolve(catalog), vec![1.2, 2.0, 1.2, 0.8]);
    }

    #[test]
    fn test_yaml_map_roundtrip() {
        let weights: WeightSet = serde_saphyr::from_str("quality: 2.5\ngeo_fit: 0\n").unwrap();
        assert_eq!(weights.get("quality"), 2.5);
        assert_eq!(weights.get("geo_fit"), 0.0);
    }
}
