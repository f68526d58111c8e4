//! Target parameters
//!
//! The user half of the configuration namespace. Two parameter sets are
//! loaded per run, `config/_default/` and `config/{target}/`, and the target
//! set is deep-merged over the default set.

use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::namespace::ReservedKey;

/// Directory holding parameters shared by every target
pub const DEFAULT_TARGET_DIR: &str = "_default";

const PARAMETER_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// User-supplied namespace entries, in load order
///
/// No key begins with the reserved prefix; every constructor checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetParameters {
    values: IndexMap<String, Value>,
}

impl TargetParameters {
    /// Load and merge the default and target parameter directories
    ///
    /// Missing directories count as empty parameter sets.
    ///
    /// # Errors
    /// - `ModelError::Io` if a directory or file cannot be read
    /// - `ModelError::InvalidTargetConfig` if a file is not a JSON/YAML object
    /// - `ModelError::ReservedKey` if a key uses the reserved prefix
    pub fn load(config_dir: &Path, target: &str) -> ModelResult<Self> {
        let defaults = read_parameter_dir(&config_dir.join(DEFAULT_TARGET_DIR))?;
        let specific = read_parameter_dir(&config_dir.join(target))?;
        Self::from_layers(defaults, specific)
    }

    /// Merge a target layer over a default layer
    ///
    /// # Errors
    /// - `ModelError::ReservedKey` if a key uses the reserved prefix
    pub fn from_layers(
        defaults: IndexMap<String, Value>,
        target: IndexMap<String, Value>,
    ) -> ModelResult<Self> {
        let mut merged = defaults;
        merge_into(&mut merged, target);
        Self::from_map(merged)
    }

    /// Wrap an already-merged map
    ///
    /// # Errors
    /// - `ModelError::ReservedKey` if a key uses the reserved prefix
    pub fn from_map(values: IndexMap<String, Value>) -> ModelResult<Self> {
        if let Some(key) = values.keys().find(|k| ReservedKey::is_reserved_name(k)) {
            return Err(ModelError::ReservedKey(key.clone()));
        }
        Ok(Self { values })
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read every parameter file of a directory, merged in file-name order
fn read_parameter_dir(dir: &Path) -> ModelResult<IndexMap<String, Value>> {
    let mut merged = IndexMap::new();
    if !dir.is_dir() {
        return Ok(merged);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ModelError::io_error(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ModelError::io_error(dir, e))?.path();
        let is_parameter_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PARAMETER_EXTENSIONS.contains(&ext));
        if path.is_file() && is_parameter_file {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        merge_into(&mut merged, read_parameter_file(&path)?);
    }
    Ok(merged)
}

fn read_parameter_file(path: &Path) -> ModelResult<IndexMap<String, Value>> {
    let text = std::fs::read_to_string(path).map_err(|e| ModelError::io_error(path, e))?;

    let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .map_err(|e| ModelError::invalid_target_config(path, format!("JSON parse error: {e}")))?,
        _ => serde_yaml::from_str(&text)
            .map_err(|e| ModelError::invalid_target_config(path, format!("YAML parse error: {e}")))?,
    };

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(IndexMap::new()),
        _ => Err(ModelError::invalid_target_config(
            path,
            "top level must be an object",
        )),
    }
}

/// Deep merge: objects merge recursively, anything else is replaced
fn merge_into(base: &mut IndexMap<String, Value>, overlay: IndexMap<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
