use crate::errors::{AppError, AppResult};
use crate::utils::path::ensure_parent_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod migrate; // missing-field detection / upgrade of the YAML file

/// Environment variable that overrides `signing_secret`.
pub const SIGNING_SECRET_ENV: &str = "TUTORCLOCK_SIGNING_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_period_type")]
    pub default_period_type: String,
    #[serde(default = "default_biweekly_anchor")]
    pub biweekly_anchor: String,
    #[serde(default = "default_slot_minutes")]
    pub default_slot_minutes: i64,
    /// HMAC key for schedule snapshots. Unset means signing is off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

pub(crate) fn default_timezone() -> String {
    "America/New_York".to_string()
}
pub(crate) fn default_period_type() -> String {
    "biweekly".to_string()
}
pub(crate) fn default_biweekly_anchor() -> String {
    "2024-01-01".to_string()
}
pub(crate) fn default_slot_minutes() -> i64 {
    60
}
pub(crate) fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            default_timezone: default_timezone(),
            default_period_type: default_period_type(),
            biweekly_anchor: default_biweekly_anchor(),
            default_slot_minutes: default_slot_minutes(),
            signing_secret: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("tutorclock")
        } else {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            home.join(".tutorclock")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("tutorclock.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("tutorclock.sqlite")
    }

    /// Load configuration from file, or return defaults if not found.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Environment first, then the config file.
    pub fn effective_signing_secret(&self) -> Option<String> {
        env::var(SIGNING_SECRET_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.signing_secret.clone())
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Initialize configuration and database paths. Returns the database path.
    ///
    /// In test mode the config file is left untouched.
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();

        let db_path = match custom_db {
            Some(name) => {
                let p = PathBuf::from(&name);
                if p.is_absolute() { p } else { dir.join(p) }
            }
            None => Self::database_file(),
        };

        if !is_test {
            fs::create_dir_all(&dir)?;
            let config = Config {
                database: db_path.to_string_lossy().to_string(),
                ..Config::default()
            };
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(config.to_yaml()?.as_bytes())?;
        }

        ensure_parent_dir(&db_path)?;
        Ok(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = serde_yaml::from_str("database: /tmp/x.sqlite\n").unwrap();
        assert_eq!(cfg.default_timezone, "America/New_York");
        assert_eq!(cfg.default_period_type, "biweekly");
        assert_eq!(cfg.default_slot_minutes, 60);
        assert!(cfg.signing_secret.is_none());
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.conf")).unwrap();
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn broken_yaml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.conf");
        fs::write(&path, "database: [unterminated").unwrap();
        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }
}
