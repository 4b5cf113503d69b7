//! Local JSON persistence
//!
//! Small JSON files under the per-platform application data directory.
//! A missing file reads back as the type's default, so first launch
//! needs no setup step.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::APP_DIR_NAME;

/// Per-platform application data directory, created on first use
pub fn app_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", APP_DIR_NAME)
        .context("could not determine the local data directory")?;
    let dir = dirs.data_local_dir().to_path_buf();
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(dir)
}

/// Load a JSON file, returning the type's default when it does not exist
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(value)
}

/// Save a value as pretty-printed JSON, creating parent directories
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("buswatch-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let path = temp_path("roundtrip");
        let ids = vec!["bus-001".to_string(), "bus-002".to_string()];
        save_json(&path, &ids).expect("save");
        let loaded: Vec<String> = load_json(&path).expect("load");
        assert_eq!(loaded, ids);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_loads_default() {
        let path = temp_path("missing");
        let loaded: Vec<String> = load_json(&path).expect("load default");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = temp_path("malformed");
        fs::write(&path, "not json").expect("write");
        let result: Result<Vec<String>> = load_json(&path);
        assert!(result.is_err());
        let _ = fs::remove_file(&path);
    }
}
