//! File-based fact storage for Multiplay.
//!
//! Layout under the data directory:
//!
//! ```text
//! profiles/<profile>/facts/<factId>.json
//! profiles/<profile>/settings.json
//! ```
//!
//! Atomic writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::data_dir;
use crate::core::Fact;
use crate::error::{MultiplayError, Result};
use crate::storage::FactStore;

/// File-based fact storage.
#[derive(Debug, Clone)]
pub struct FileFactStore {
    /// Root data directory.
    root: PathBuf,
}

impl FileFactStore {
    /// Create a file store in the default data directory.
    ///
    /// Uses `~/.multiplay/data/` or `$MULTIPLAY_HOME/data/`.
    pub fn new() -> Result<Self> {
        let dir = data_dir().ok_or_else(|| {
            MultiplayError::config("Could not determine data directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a file store rooted at a custom directory.
    pub fn with_dir(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| MultiplayError::storage(&root, e))?;
        }
        Ok(Self { root })
    }

    /// Root data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_dir(&self, profile_id: &str) -> Result<PathBuf> {
        validate_name(profile_id, "profile id")?;
        Ok(self.root.join("profiles").join(profile_id))
    }

    fn facts_dir(&self, profile_id: &str) -> Result<PathBuf> {
        Ok(self.profile_dir(profile_id)?.join("facts"))
    }

    fn fact_path(&self, profile_id: &str, fact_id: &str) -> Result<PathBuf> {
        validate_name(fact_id, "fact id")?;
        Ok(self.facts_dir(profile_id)?.join(format!("{}.json", fact_id)))
    }

    fn settings_path(&self, profile_id: &str) -> Result<PathBuf> {
        Ok(self.profile_dir(profile_id)?.join("settings.json"))
    }

    fn read_settings(&self, profile_id: &str) -> Result<Map<String, Value>> {
        let path = self.settings_path(profile_id)?;
        if !path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| MultiplayError::storage(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Reject names that would escape the data directory.
fn validate_name(name: &str, what: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(MultiplayError::storage(
            name,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid {}: {:?}", what, name),
            ),
        ))
    }
}

/// Write `content` to `path` atomically via a sibling temp file.
fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| MultiplayError::serde(format!("no parent for {}", path.display())))?;
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| MultiplayError::storage(dir, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{}.tmp", file_name));

    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| MultiplayError::storage(&temp_path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| MultiplayError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| MultiplayError::storage(&temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| MultiplayError::storage(path, e))?;
    Ok(())
}

impl FactStore for FileFactStore {
    fn get_all_facts(&self, profile_id: &str) -> Result<Vec<Fact>> {
        let dir = self.facts_dir(profile_id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut facts = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| MultiplayError::storage(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| MultiplayError::storage(&dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            if path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true)
            {
                continue;
            }

            let content =
                fs::read_to_string(&path).map_err(|e| MultiplayError::storage(&path, e))?;
            let fact: Fact = serde_json::from_str(&content).map_err(|e| {
                MultiplayError::serde(format!("{}: {}", path.display(), e))
            })?;
            facts.push(fact);
        }

        facts.sort_by_key(|f| f.factors);
        Ok(facts)
    }

    fn save_facts(&self, profile_id: &str, facts: &[Fact]) -> Result<()> {
        for fact in facts {
            self.update_fact(profile_id, fact)?;
        }
        Ok(())
    }

    fn update_fact(&self, profile_id: &str, fact: &Fact) -> Result<()> {
        let path = self.fact_path(profile_id, &fact.id)?;
        let json = serde_json::to_string_pretty(fact)?;
        atomic_write(&path, &json)
    }

    fn get_setting(&self, profile_id: &str, key: &str) -> Result<Option<Value>> {
        Ok(self.read_settings(profile_id)?.get(key).cloned())
    }

    fn set_setting(&self, profile_id: &str, key: &str, value: Value) -> Result<()> {
        let mut settings = self.read_settings(profile_id)?;
        settings.insert(key.to_string(), value);
        let json = serde_json::to_string_pretty(&settings)?;
        atomic_write(&self.settings_path(profile_id)?, &json)
    }

    fn clear_all(&self, profile_id: &str) -> Result<()> {
        let dir = self.profile_dir(profile_id)?;
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| MultiplayError::storage(&dir, e))?;
        }
        Ok(())
    }
}
