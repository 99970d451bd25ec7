//! JSON-backed configuration and saved-network store.
//!
//! Settings live in a single flat JSON object on disk. Unknown keys are
//! preserved across load/save cycles, missing or corrupt files fall back
//! to defaults, and every mutation is persisted immediately. Disk write
//! failures are logged and swallowed; the in-memory state stays
//! authoritative for the session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, warn};
use serde_json::{json, Map, Value};

use crate::constants::timeouts;

const CONFIG_DIR: &str = "wifiscout";
const CONFIG_FILE: &str = "config.json";

pub struct ConfigStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

fn default_values() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("theme".into(), json!("dark"));
    map.insert("auto_scan".into(), json!(true));
    map.insert("auto_connect".into(), json!(false));
    map.insert("scan_interval".into(), json!(60));
    map.insert("notifications".into(), json!(true));
    map.insert("use_mock_data".into(), json!(false));
    map.insert("saved_networks".into(), json!({}));
    map
}

impl ConfigStore {
    /// Opens the store at the platform config location, creating the file
    /// with defaults if it does not exist yet.
    pub fn new() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR);
        Self::at_path(dir.join(CONFIG_FILE))
    }

    /// Opens the store at an explicit path. Intended for tests.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load_values(&path);
        let store = Self {
            path,
            values: Mutex::new(values),
        };
        if !store.path.exists() {
            store.persist();
        }
        store
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().ok()?;
        values.get(key).cloned()
    }

    /// Sets a key and writes the whole store back to disk.
    pub fn set(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
        self.persist();
    }

    pub fn use_mock_data(&self) -> bool {
        self.get("use_mock_data")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Grace period between issuing a connect and re-checking the current
    /// connection, from the `connect_grace_ms` key.
    pub fn connect_grace(&self) -> Duration {
        let ms = self
            .get("connect_grace_ms")
            .and_then(|v| v.as_u64())
            .unwrap_or(timeouts::CONNECT_GRACE_MS);
        Duration::from_millis(ms)
    }

    /// Stored password for a saved network, if any.
    pub fn saved_password(&self, ssid: &str) -> Option<String> {
        let values = self.values.lock().ok()?;
        values
            .get("saved_networks")?
            .get(ssid)?
            .get("password")?
            .as_str()
            .map(str::to_string)
    }

    /// Records a network (and optionally its password) as saved.
    pub fn save_network(&self, ssid: &str, password: Option<&str>) {
        if let Ok(mut values) = self.values.lock() {
            let saved = values
                .entry("saved_networks")
                .or_insert_with(|| json!({}));
            if let Some(map) = saved.as_object_mut() {
                let mut entry = Map::new();
                if let Some(pw) = password {
                    entry.insert("password".into(), json!(pw));
                }
                map.insert(ssid.to_string(), Value::Object(entry));
            }
        }
        self.persist();
    }

    /// Removes a saved network. Returns whether an entry existed.
    pub fn forget_network(&self, ssid: &str) -> bool {
        let removed = self
            .values
            .lock()
            .ok()
            .and_then(|mut values| {
                values
                    .get_mut("saved_networks")
                    .and_then(Value::as_object_mut)
                    .map(|map| map.remove(ssid).is_some())
            })
            .unwrap_or(false);
        if removed {
            self.persist();
        }
        removed
    }

    pub fn saved_network_ssids(&self) -> Vec<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| {
                values
                    .get("saved_networks")
                    .and_then(Value::as_object)
                    .map(|map| map.keys().cloned().collect())
            })
            .unwrap_or_default()
    }

    fn persist(&self) {
        let Ok(values) = self.values.lock() else {
            return;
        };
        if let Some(parent) = self.path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("could not create config dir {}: {e}", parent.display());
            return;
        }
        match serde_json::to_string_pretty(&Value::Object(values.clone())) {
            Ok(text) => {
                if let Err(e) = fs::write(&self.path, text) {
                    warn!("could not write {}: {e}", self.path.display());
                }
            }
            Err(e) => warn!("could not serialize config: {e}"),
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn load_values(path: &Path) -> Map<String, Value> {
    let mut values = default_values();
    match fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(loaded)) => {
                // Defaults fill gaps; stored keys (known or not) win.
                for (k, v) in loaded {
                    values.insert(k, v);
                }
            }
            Ok(_) | Err(_) => {
                warn!("config at {} is not a JSON object, using defaults", path.display());
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config at {}, starting from defaults", path.display());
        }
        Err(e) => warn!("could not read {}: {e}", path.display()),
    }
    values
}
