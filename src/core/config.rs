use crate::config::{Config, migrate};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, info, success, warning};
use std::fs;
use std::path::Path;
use std::process::Command;

pub struct ConfigLogic;

impl ConfigLogic {
    /// Print the effective configuration, secret masked.
    pub fn print(cfg: &Config) -> AppResult<()> {
        let mut shown = cfg.clone();
        if shown.signing_secret.is_some() {
            shown.signing_secret = Some("********".into());
        }
        println!("📄 Current configuration:\n");
        println!("{}", shown.to_yaml()?);
        if cfg.effective_signing_secret().is_none() {
            warning("No signing secret configured: unsigned schedule snapshots are accepted.");
        }
        Ok(())
    }

    /// Report (and with `fix`, fill) fields missing from the config file.
    pub fn check(path: &Path, fix: bool) -> AppResult<()> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "configuration file not found: {} (run `tutorclock init`)",
                path.display()
            )));
        }

        let missing = migrate::missing_fields(path)?;
        if missing.is_empty() {
            success("Configuration file is complete.");
            return Ok(());
        }

        if fix {
            let added = migrate::fill_missing_fields(path)?;
            success(format!("Added missing fields: {}", added.join(", ")));
        } else {
            warning(format!("Missing fields: {}", missing.join(", ")));
            info("Run `tutorclock config --migrate` to add them with defaults.");
        }
        Ok(())
    }

    pub fn edit(path: &Path, editor: &Option<String>) -> AppResult<()> {
        if !path.exists() {
            fs::write(path, Config::default().to_yaml()?)?;
        }

        let default_editor = std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            });
        let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

        match Command::new(&editor_to_use).arg(path).status() {
            Ok(s) if s.success() => {
                success(format!("Configuration file edited using '{editor_to_use}'"));
                Ok(())
            }
            _ if editor_to_use != default_editor => {
                warning(format!(
                    "Editor '{editor_to_use}' not available, falling back to '{default_editor}'"
                ));
                match Command::new(&default_editor).arg(path).status() {
                    Ok(s) if s.success() => Ok(()),
                    _ => {
                        error(format!("Failed to edit configuration with '{default_editor}'"));
                        Err(AppError::Config("no usable editor".into()))
                    }
                }
            }
            _ => Err(AppError::Config(format!(
                "failed to run editor '{editor_to_use}'"
            ))),
        }
    }
}
