mod schema;

pub use schema::{Config, SortConfig};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::ranking::SortField;
use crate::scoring::validate_scoring;

/// Get the config directory path (~/.config/uni-tiers/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("uni-tiers")
}

/// Get the default config file path (~/.config/uni-tiers/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/uni-tiers/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
///
/// A missing file at the default path is not an error; defaults are used.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        debug!("No config at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    debug!("Loaded config from {}", config_path.display());
    Ok(config)
}

/// Validate the whole config, collecting every problem
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let scoring = config.scoring.clone().unwrap_or_default();
    let mut errors = match validate_scoring(&scoring) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if let Some(sort) = &config.sort {
        if SortField::parse(&sort.field, scoring.catalog()).is_none() {
            errors.push(format!("sort.field: unknown field '{}'", sort.field));
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
    use crate::ranking::SortDirection;
    use crate::scoring::{Model, TargetProfile};

    const FULL_CONFIG: &str = r#"
dataset: data/universities.csv
scoring:
  model: simple
  profile: AE
  weights:
    quality: 2.0
filters:
  countries: [Brazil, Mexico]
sort:
  field: university
  direction: asc
"#;

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, FULL_CONFIG).unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("data/universities.csv")));
        let scoring = config.scoring.clone().unwrap();
        assert_eq!(scoring.model(), Model::Simple);
        assert_eq!(scoring.profile(), TargetProfile::Ae);
        assert_eq!(config.filters.as_ref().unwrap().countries.len(), 2);
        let sort = config.sort.as_ref().unwrap();
        assert_eq!(sort.direction, Some(SortDirection::Asc));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("nope.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "queries:\n  - query: x\n").unwrap();
        assert!(load_config(Some(path)).is_err());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_reports_sort_and_scoring_errors() {
        let config: Config = serde_saphyr::from_str(
            "scoring:\n  profile: XX\nsort:\n  field: popularity\n",
        )
        .unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("sort.field")));
    }

    #[test]
    fn test_config_dir_name() {
        assert!(get_config_path().ends_with("uni-tiers/config.yaml"));
    }
}
