//! Persistent map of attribute names.
//!
//! munin-node hands each plugin a state file (`MUNIN_STATEFILE`). This
//! plugin keeps a JSON object there mapping attribute id to attribute name:
//!
//! ```json
//! {
//!   "187": "Reported_Uncorrect",
//!   "5": "Reallocated_Sector_Ct"
//! }
//! ```
//!
//! Fetch runs add the names they observe; config runs only read them to
//! label graphs. Entries are never removed, including entries whose value is
//! not a string: they are written back untouched and never used as labels.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PluginError, Result};

/// Attribute id to attribute name, sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownNames(BTreeMap<String, Value>);

impl KnownNames {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The name stored for `id`, if it is a string.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Store `name` for `id`. Returns whether the stored value changed.
    fn update(&mut self, id: String, name: String) -> bool {
        if self.get(&id) == Some(name.as_str()) {
            return false;
        }
        self.0.insert(id, Value::String(name));
        true
    }
}

impl FromIterator<(String, String)> for KnownNames {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut names = Self::new();
        for (id, name) in iter {
            names.update(id, name);
        }
        names
    }
}

/// Outcome of reading the state file.
///
/// A missing or unreadable file is the normal first-run condition, not an
/// error; both variants other than `Loaded` mean "no names known yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateLoad {
    Loaded(KnownNames),
    Missing,
    Corrupt,
}

impl StateLoad {
    /// The names read, or an empty map.
    pub fn into_names(self) -> KnownNames {
        match self {
            StateLoad::Loaded(names) => names,
            StateLoad::Missing | StateLoad::Corrupt => KnownNames::new(),
        }
    }
}

/// The JSON state file.
///
/// Writes overwrite the whole file without locking; munin-node never runs
/// two instances of a plugin at once.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Create a handle for the given path. Nothing is read yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the state file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and classify the state file.
    pub fn load(&self) -> StateLoad {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "state file not readable");
                return StateLoad::Missing;
            }
        };

        match serde_json::from_str(&content) {
            Ok(names) => StateLoad::Loaded(names),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed state file");
                StateLoad::Corrupt
            }
        }
    }

    /// Current known names; empty if the file is missing or malformed.
    pub fn read(&self) -> KnownNames {
        self.load().into_names()
    }

    /// Merge `updates` into the stored names.
    ///
    /// The file is rewritten only if some value is new or differs from the
    /// stored one. Returns whether a write happened.
    pub fn merge<I>(&self, updates: I) -> Result<bool>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut names = self.read();
        let mut modified = false;

        for (id, name) in updates {
            modified |= names.update(id, name);
        }

        if modified {
            self.write(&names)?;
        }
        Ok(modified)
    }

    /// Serialize `names` as indented JSON with sorted keys.
    fn write(&self, names: &KnownNames) -> Result<()> {
        let json = serde_json::to_string_pretty(names)?;
        fs::write(&self.path, json).map_err(|source| PluginError::StateWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), entries = names.len(), "state file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let state = StateFile::new("/nonexistent/path/state.json");
        assert_eq!(state.load(), StateLoad::Missing);
        assert!(state.read().is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let state = StateFile::new(file.path());
        assert!(matches!(state.load(), StateLoad::Corrupt));
        assert!(state.read().is_empty());
    }

    #[test]
    fn test_non_object_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"["5", "197"]"#).unwrap();

        assert!(StateFile::new(file.path()).read().is_empty());
    }

    #[test]
    fn test_foreign_values_survive_merge() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, r#"{"5": "Reallocated_Sector_Ct", "x": 1}"#).unwrap();
        let state = StateFile::new(&path);

        let names = state.read();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("5"), Some("Reallocated_Sector_Ct"));
        assert_eq!(names.get("x"), None);

        assert!(state.merge(pairs(&[("197", "Current_Pending_Sector")])).unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\n  \"197\": \"Current_Pending_Sector\",\n  \"5\": \"Reallocated_Sector_Ct\",\n  \"x\": 1\n}"
        );
    }

    #[test]
    fn test_string_replaces_foreign_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, r#"{"9": null}"#).unwrap();
        let state = StateFile::new(&path);

        assert!(state.merge(pairs(&[("9", "Power_On_Hours")])).unwrap());
        assert_eq!(state.read().get("9"), Some("Power_On_Hours"));
    }

    #[test]
    fn test_merge_writes_sorted_pretty_json() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state"));

        let written = state
            .merge(pairs(&[
                ("5", "Reallocated_Sector_Ct"),
                ("197", "Current_Pending_Sector"),
                ("187", "Reported_Uncorrect"),
            ]))
            .unwrap();
        assert!(written);

        let content = fs::read_to_string(state.path()).unwrap();
        assert_eq!(
            content,
            "{\n  \"187\": \"Reported_Uncorrect\",\n  \"197\": \"Current_Pending_Sector\",\n  \"5\": \"Reallocated_Sector_Ct\"\n}"
        );
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state"));
        let updates = pairs(&[("9", "Power_On_Hours"), ("194", "Temperature_Celsius")]);

        state.merge(updates.clone()).unwrap();

        let expected: KnownNames = updates.into_iter().collect();
        assert_eq!(state.read(), expected);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state"));
        let updates = pairs(&[("5", "Reallocated_Sector_Ct")]);

        assert!(state.merge(updates.clone()).unwrap());
        assert!(!state.merge(updates).unwrap());
        assert!(!state.merge(Vec::new()).unwrap());
    }

    #[test]
    fn test_merge_keeps_existing_entries() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state"));

        state.merge(pairs(&[("5", "Reallocated_Sector_Ct")])).unwrap();
        state.merge(pairs(&[("197", "Current_Pending_Sector")])).unwrap();
        assert!(state.merge(pairs(&[("5", "Retired_Block_Count")])).unwrap());

        let names = state.read();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("5"), Some("Retired_Block_Count"));
        assert_eq!(names.get("197"), Some("Current_Pending_Sector"));
    }

    #[test]
    fn test_non_ascii_preserved() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::new(dir.path().join("state"));

        state.merge(pairs(&[("231", "Température")])).unwrap();

        let content = fs::read_to_string(state.path()).unwrap();
        assert!(content.contains("Température"));
        assert_eq!(state.read().get("231"), Some("Température"));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let state = StateFile::new("/nonexistent/path/state.json");
        let err = state.merge(pairs(&[("5", "Reallocated_Sector_Ct")])).unwrap_err();
        assert!(matches!(err, PluginError::StateWrite { .. }));
    }
}
