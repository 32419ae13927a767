//! Persistent set of already-forwarded items (message ids and attachment urls).
//!
//! The file is a flat JSON object `{ item_key: recorded_at }`, rewritten whole on
//! every save. The pipeline reloads it before each message and saves it right after,
//! so a crash mid-run neither loses records nor resends anything already sent.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::Result;

/// In-memory view of the history file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    entries: BTreeMap<String, String>,
}

impl History {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Mark `key` as sent at `timestamp` (ISO-8601). Re-recording overwrites the time.
    pub fn record(&mut self, key: impl Into<String>, timestamp: impl Into<String>) {
        self.entries.insert(key.into(), timestamp.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle to the on-disk history file.
#[derive(Clone, Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current history. A missing or unreadable-as-JSON file is an empty history.
    pub fn load(&self) -> Result<History> {
        if !self.path.exists() {
            return Ok(History::default());
        }
        let txt = fs::read_to_string(&self.path)?;
        if txt.trim().is_empty() {
            return Ok(History::default());
        }
        match serde_json::from_str::<BTreeMap<String, String>>(&txt) {
            Ok(entries) => Ok(History { entries }),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "history file is not valid JSON; starting from an empty history"
                );
                Ok(History::default())
            }
        }
    }

    /// Overwrite the file with `history`. Writes a sibling temp file, then renames it
    /// over the target.
    pub fn save(&self, history: &History) -> Result<()> {
        let txt = serde_json::to_string_pretty(&history.entries)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, txt)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
