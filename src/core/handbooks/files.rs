//! Handbook file persistence
//!
//! One JSON file per table under the configured directory; files are read
//! whole on load and overwritten whole on resync.

use crate::domain::{HygeiaError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

fn handbook_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

/// Load one handbook from disk
///
/// # Errors
///
/// I/O failures (including a missing file) and parse failures; callers
/// treat any failure as "needs resync".
pub async fn load_handbook(dir: &Path, name: &str) -> Result<Value> {
    let path = handbook_path(dir, name);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| HygeiaError::Io(format!("handbook {name}: {e}")))?;

    let table: Value = serde_json::from_str(&contents)
        .map_err(|e| HygeiaError::Serialization(format!("handbook {name} is corrupt: {e}")))?;

    tracing::info!(handbook = name, path = %path.display(), "Handbook loaded from file");
    Ok(table)
}

/// Persist one handbook to disk, overwriting any previous version
///
/// # Errors
///
/// `HygeiaError::Persistence` on any write failure.
pub async fn save_handbook(dir: &Path, name: &str, table: &Value) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        HygeiaError::Persistence(format!(
            "failed to create handbook directory {}: {e}",
            dir.display()
        ))
    })?;

    let path = handbook_path(dir, name);
    let contents = serde_json::to_string_pretty(table)
        .map_err(|e| HygeiaError::Persistence(format!("failed to encode handbook {name}: {e}")))?;

    tokio::fs::write(&path, contents).await.map_err(|e| {
        HygeiaError::Persistence(format!("failed to write handbook {}: {e}", path.display()))
    })?;

    tracing::info!(handbook = name, path = %path.display(), "Handbook persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let table = json!({"data": {"АО МАКС-М": [{"smocod": "77001"}]}});

        save_handbook(dir.path(), "insurance_companies", &table)
            .await
            .unwrap();
        let loaded = load_handbook(dir.path(), "insurance_companies")
            .await
            .unwrap();
        assert_eq!(loaded, table);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_handbook(dir.path(), "absent").await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("broken.json"), "{oops")
            .await
            .unwrap();
        assert!(load_handbook(dir.path(), "broken").await.is_err());
    }
}
