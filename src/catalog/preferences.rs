use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference suite {path} is unreadable: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("preference suite {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Read-only view of a preference suite written by the catalog tool.
pub trait PreferenceStore: Send + Sync {
    fn string(&self, key: &str) -> Option<String>;
    fn integer(&self, key: &str) -> Option<i64>;
    /// Raw bytes of a blob value.
    ///
    /// `Ok(None)` means the suite or the key does not exist; a suite that
    /// exists but cannot be parsed is an error.
    fn data(&self, key: &str) -> Result<Option<Vec<u8>>, PreferenceError>;
}

/// A suite stored as a single JSON object at `<dir>/<suite>.json`.
///
/// The file is re-read on every lookup so values written by the privileged
/// side are visible immediately.
#[derive(Clone, Debug)]
pub struct SuitePreferences {
    path: PathBuf,
}

impl SuitePreferences {
    pub fn new(dir: impl AsRef<Path>, suite: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", suite)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<Map<String, Value>>, PreferenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(PreferenceError::Unreadable {
                    path: self.path.display().to_string(),
                    reason: err.to_string(),
                });
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => Err(PreferenceError::Corrupt {
                path: self.path.display().to_string(),
                reason: "top-level value is not an object".to_string(),
            }),
            Err(err) => Err(PreferenceError::Corrupt {
                path: self.path.display().to_string(),
                reason: err.to_string(),
            }),
        }
    }

    fn value(&self, key: &str) -> Result<Option<Value>, PreferenceError> {
        Ok(self.load()?.and_then(|mut map| map.remove(key)))
    }

    /// Lookup for plain settings values, where a broken suite reads as unset.
    fn setting(&self, key: &str) -> Option<Value> {
        match self.value(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        }
    }
}

impl PreferenceStore for SuitePreferences {
    fn string(&self, key: &str) -> Option<String> {
        match self.setting(key)? {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    fn integer(&self, key: &str) -> Option<i64> {
        value_as_integer(&self.setting(key)?)
    }

    fn data(&self, key: &str) -> Result<Option<Vec<u8>>, PreferenceError> {
        Ok(self.value(key)?.and_then(value_as_data))
    }
}

/// Blobs are either a string holding serialized text or an inline JSON value.
fn value_as_data(value: Value) -> Option<Vec<u8>> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.into_bytes()),
        other => serde_json::to_vec(&other).ok(),
    }
}

fn value_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

/// In-process store, used when no suite file is wanted and in tests.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value);
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.values.read().ok()?.get(key).cloned()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn string(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    fn integer(&self, key: &str) -> Option<i64> {
        value_as_integer(&self.value(key)?)
    }

    fn data(&self, key: &str) -> Result<Option<Vec<u8>>, PreferenceError> {
        Ok(self.value(key).and_then(value_as_data))
    }
}
