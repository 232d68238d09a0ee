//! File-backed key-value preferences
//!
//! Each namespace is one JSON object stored at `<dir>/<namespace>.json`.
//! Writes go through a temp file and rename so a reader in another process
//! sees either the old or the new map, never a partial one. Concurrent
//! writers are last-writer-wins.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// A single preferences namespace
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Preferences {
    /// Open (without creating) the namespace `name` under `dir`
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", name)),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.load().get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.load().get(key) {
            Some(Value::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Start a batch of changes, applied together by [`Editor::apply`]
    pub fn edit(&self) -> Editor<'_> {
        Editor {
            prefs: self,
            changes: Vec::new(),
        }
    }

    fn load(&self) -> BTreeMap<String, Value> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read preferences {}: {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!("Discarding unreadable preferences {}: {}", self.path.display(), e);
            BTreeMap::new()
        })
    }

    fn store(&self, map: &BTreeMap<String, Value>) -> io::Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let bytes = serde_json::to_vec_pretty(map)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote preferences {}", self.path.display());
        Ok(())
    }
}

/// Pending changes to a [`Preferences`] namespace
pub struct Editor<'a> {
    prefs: &'a Preferences,
    changes: Vec<(String, Option<Value>)>,
}

impl Editor<'_> {
    /// Set `key` to `value`; `None` removes the key
    pub fn put_string(mut self, key: &str, value: Option<&str>) -> Self {
        self.changes
            .push((key.to_string(), value.map(|v| Value::String(v.to_string()))));
        self
    }

    pub fn put_bool(mut self, key: &str, value: bool) -> Self {
        self.changes.push((key.to_string(), Some(Value::Bool(value))));
        self
    }

    /// Merge the changes into the latest on-disk map and persist it
    pub fn apply(self) -> io::Result<()> {
        let _guard = self
            .prefs
            .write_lock
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to lock preferences: {}", e)))?;

        let mut map = self.prefs.load();
        for (key, value) in self.changes {
            match value {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        self.prefs.store(&map)
    }
}
