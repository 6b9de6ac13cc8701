use super::types::{UserState, STATE_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default user state file path (~/.config/uni-tiers/state.json)
pub fn get_state_path() -> PathBuf {
    crate::config::get_config_dir().join("state.json")
}

/// Load user state from a JSON file
///
/// A missing file yields an empty state. A file with an unsupported version
/// is an error.
pub fn load_user_state(path: &Path) -> Result<UserState> {
    if !path.exists() {
        debug!("No saved state at {}", path.display());
        return Ok(UserState::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open state file at {}", path.display()))?;

    let state: UserState = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load state from {}", path.display()))?;

    if state.version != STATE_VERSION {
        anyhow::bail!("Unsupported state file version: {}", state.version);
    }

    debug!(
        "Loaded {} saved course score(s) from {}",
        state.scores.len(),
        path.display()
    );
    Ok(state)
}

/// Save user state atomically, creating the parent directory if needed
pub fn save_user_state(path: &Path, state: &UserState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, state).context("Failed to serialize state")?;

    file.commit().context("Failed to save state")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CourseKey;
    use crate::ranking::Filters;
    use crate::scoring::Model;

    #[test]
    fn test_load_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_user_state(&dir.path().join("state.json")).unwrap();
        assert_eq!(state.version, 1);
        assert!(state.scores.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut state = UserState::new();
        state.set_score(CourseKey::new("USP", "Data Science"), Model::Full, "curriculum_depth", 9.0);
        state.filters = Some(Filters::new(vec!["Brazil".to_string()], vec![]));

        save_user_state(&path, &state).unwrap();
        let loaded = load_user_state(&path).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"version": 2, "scores": []}"#).unwrap();

        let err = load_user_state(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported state file version"));
    }
}
