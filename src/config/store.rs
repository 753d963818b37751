//! Persisted key/value store
//!
//! One JSON document under the user config dir holding every runtime
//! setting: the pause flag, the recorded app version, reminder timestamps,
//! first-run defaults. Reads and writes are synchronous and last-write-wins;
//! persistence failures are logged, never fatal.

use anyhow::Result;
use log::warn;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Process-wide key/value configuration.
pub struct Store {
    path: PathBuf,
    values: RwLock<HashMap<String, Value>>,
}

impl Store {
    /// Open the store at the default config location, creating an empty one
    /// if none exists yet.
    pub fn open() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("com", "github.sentra-monitor", "sentra")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::open_at(dirs.config_dir().join("store.json"))
    }

    /// Open the store backed by a specific file.
    pub fn open_at(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    /// Set a key and persist immediately.
    pub fn set(&self, key: &str, value: Value) {
        if let Ok(mut map) = self.values.write() {
            map.insert(key.to_string(), value);
            self.persist(&map);
        }
    }

    /// Remove every key and persist the empty document.
    pub fn reset(&self) {
        if let Ok(mut map) = self.values.write() {
            map.clear();
            self.persist(&map);
        }
    }

    pub fn bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        self.set(key, Value::from(value));
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn set_string(&self, key: &str, value: &str) {
        self.set(key, Value::from(value));
    }

    pub fn i64(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
    }

    pub fn set_i64(&self, key: &str, value: i64) {
        self.set(key, Value::from(value));
    }

    /// Seed a key only if it is missing. Returns true when the default was
    /// written.
    pub fn set_default(&self, key: &str, value: Value) -> bool {
        if let Ok(mut map) = self.values.write() {
            if map.contains_key(key) {
                return false;
            }
            map.insert(key.to_string(), value);
            self.persist(&map);
            true
        } else {
            false
        }
    }

    fn persist(&self, map: &HashMap<String, Value>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(map) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&self.path, content) {
                    warn!("Failed to persist store to {:?}: {e}", self.path);
                }
            }
            Err(e) => warn!("Failed to serialize store: {e}"),
        }
    }
}
