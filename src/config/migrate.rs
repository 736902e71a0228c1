//! Detect and fill fields missing from an older configuration file.

use crate::config::{
    default_biweekly_anchor, default_log_level, default_period_type, default_slot_minutes,
    default_timezone,
};
use crate::errors::{AppError, AppResult};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

fn defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("default_timezone", Value::String(default_timezone())),
        ("default_period_type", Value::String(default_period_type())),
        ("biweekly_anchor", Value::String(default_biweekly_anchor())),
        (
            "default_slot_minutes",
            Value::Number(default_slot_minutes().into()),
        ),
        ("log_level", Value::String(default_log_level())),
    ]
}

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path)?;
    let yaml: Value = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    match yaml {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{} is not a YAML mapping",
            path.display()
        ))),
    }
}

/// Names of optional fields not present in the file.
pub fn missing_fields(path: &Path) -> AppResult<Vec<&'static str>> {
    let map = read_mapping(path)?;
    Ok(defaults()
        .into_iter()
        .filter(|(k, _)| !map.contains_key(Value::String((*k).to_string())))
        .map(|(k, _)| k)
        .collect())
}

/// Write defaults for every missing field. Returns the fields added.
pub fn fill_missing_fields(path: &Path) -> AppResult<Vec<&'static str>> {
    let mut map = read_mapping(path)?;
    let mut added = Vec::new();

    for (key, value) in defaults() {
        let k = Value::String(key.to_string());
        if !map.contains_key(&k) {
            map.insert(k, value);
            added.push(key);
        }
    }

    if !added.is_empty() {
        let serialized = serde_yaml::to_string(&Value::Mapping(map))
            .map_err(|e| AppError::Config(e.to_string()))?;
        fs::write(path, serialized)?;
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_only_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tutorclock.conf");
        fs::write(&path, "database: /tmp/t.sqlite\nlog_level: debug\n").unwrap();

        let missing = missing_fields(&path).unwrap();
        assert!(missing.contains(&"default_timezone"));
        assert!(!missing.contains(&"log_level"));

        let added = fill_missing_fields(&path).unwrap();
        assert_eq!(added, missing);
        assert!(missing_fields(&path).unwrap().is_empty());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("log_level: debug"));
    }
}
