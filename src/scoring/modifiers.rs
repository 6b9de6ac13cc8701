use std::collections::BTreeMap;

/// Built-in country priority modifiers.
pub const DEFAULT_COUNTRY_MODIFIERS: &[(&str, f64)] = &[
    ("Brazil", 1.20),
    ("Mexico", 1.10),
    ("Colombia", 1.05),
    ("United States", 0.95),
];

/// Modifier for countries that have neither an override nor a default.
pub const DEFAULT_MODIFIER: f64 = 0.90;

/// Country -> multiplier lookup with user overrides layered on top of the
/// built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierTable {
    defaults: BTreeMap<String, f64>,
    overrides: BTreeMap<String, f64>,
    fallback: f64,
}

impl Default for ModifierTable {
    fn default() -> Self {
        Self {
            defaults: DEFAULT_COUNTRY_MODIFIERS
                .iter()
                .map(|(c, m)| (c.to_string(), *m))
                .collect(),
            overrides: BTreeMap::new(),
            fallback: DEFAULT_MODIFIER,
        }
    }
}

fn usable(m: f64) -> bool {
    m.is_finite() && m > 0.0
}

impl ModifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fallback used for unmapped countries. Unusable values
    /// (non-finite or non-positive) are ignored.
    pub fn with_fallback(mut self, fallback: f64) -> Self {
        if usable(fallback) {
            self.fallback = fallback;
        }
        self
    }

    pub fn with_overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.set_overrides(overrides);
        self
    }

    /// Resolve the modifier for a country: override, then built-in default,
    /// then fallback. Always finite and positive.
    pub fn resolve(&self, country: &str) -> f64 {
        self.overrides
            .get(country)
            .copied()
            .filter(|m| usable(*m))
            .unwrap_or_else(|| self.default_for(country))
    }

    /// Built-in value for a country, ignoring overrides
    pub fn default_for(&self, country: &str) -> f64 {
        self.defaults.get(country).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    pub fn set_override(&mut self, country: impl Into<String>, modifier: f64) {
        self.overrides.insert(country.into(), modifier);
    }

    /// Replace all overrides at once
    pub fn set_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.overrides = overrides.into_iter().collect();
    }

    /// Drop every override so each country resolves to its default again
    pub fn reset(&mut self) {
        self.overrides.clear();
    }

    pub fn overrides(&self) -> &BTreeMap<String, f64> {
        &self.overrides
    }

    pub fn is_overridden(&self, country: &str) -> bool {
        self.overrides
            .get(country)
            .is_some_and(|m| usable(*m) && *m != self.default_for(country))
    }

    /// Effective modifier for each of `countries`, in the given order
    pub fn effective<'a, I>(&self, countries: I) -> Vec<(String, f64)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        countries
            .into_iter()
            .map(|c| (c.to_string(), self.resolve(c)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_country_defaults() {
        let table = ModifierTable::new();
        assert_eq!(table.resolve("Brazil"), 1.20);
        assert_eq!(table.resolve("Mexico"), 1.10);
        assert_eq!(table.resolve("Colombia"), 1.05);
        assert_eq!(table.resolve("United States"), 0.95);
    }

    #[test]
    fn test_unknown_country_falls_back() {
        let table = ModifierTable::new();
        assert_eq!(table.resolve("France"), 0.90);
        assert_eq!(table.resolve(""), 0.90);
    }

    #[test]
    fn test_override_wins() {
        let mut table = ModifierTable::new();
        table.set_override("Brazil", 1.5);
        table.set_override("Chile", 1.0);
        assert_eq!(table.resolve("Brazil"), 1.5);
        assert_eq!(table.resolve("Chile"), 1.0);
        assert!(table.is_overridden("Brazil"));
        assert!(!table.is_overridden("Mexico"));
    }

    #[test]
    fn test_unusable_override_ignored() {
        let mut table = ModifierTable::new();
        table.set_override("Brazil", f64::NAN);
        table.set_override("Mexico", 0.0);
        table.set_override("Chile", -1.0);
        assert_eq!(table.resolve("Brazil"), 1.20);
        assert_eq!(table.resolve("Mexico"), 1.10);
        assert_eq!(table.resolve("Chile"), 0.90);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut table = ModifierTable::new().with_overrides(vec![("Brazil".to_string(), 2.0)]);
        assert_eq!(table.resolve("Brazil"), 2.0);
        table.reset();
        assert_eq!(table.resolve("Brazil"), 1.20);
        assert!(table.overrides().is_empty());
    }

    #[test]
    fn test_custom_fallback() {
        let table = ModifierTable::new().with_fallback(0.5);
        assert_eq!(table.resolve("Peru"), 0.5);
        let table = ModifierTable::new().with_fallback(-3.0);
        assert_eq!(table.resolve("Peru"), DEFAULT_MODIFIER);
    }

    #[test]
    fn test_effective_listing() {
        let table = ModifierTable::new();
        let listed = table.effective(["Brazil", "Peru"]);
        assert_eq!(
            listed,
            vec![("Brazil".to_string(), 1.20), ("Peru".to_string(), 0.90)]
        );
    }
}
