//! Settings validation

use std::path::Path;

use crate::error::{DepsError, Result};
use crate::models::config::Settings;

/// Settings validator for ensuring configuration is valid
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate settings and return errors if invalid
    pub fn validate(settings: &Settings) -> Result<()> {
        if !settings.basedir.is_dir() {
            return Err(DepsError::config_error(format!(
                "basedir '{}' is not a directory",
                settings.basedir.display()
            )));
        }

        for pattern in &settings.noparse {
            Self::validate_pattern(pattern)?;
        }

        if settings.concurrency == 0 {
            return Err(DepsError::config_error("concurrency must be at least 1"));
        }

        for extension in &settings.extensions {
            if !extension.starts_with('.') || extension.len() < 2 {
                return Err(DepsError::config_error(format!(
                    "extension '{}' must start with a dot",
                    extension
                )));
            }
        }

        if let Some(key) = &settings.transform_key {
            if key.is_empty() {
                return Err(DepsError::config_error("transform_key must name at least one field"));
            }
        }

        for (name, command) in &settings.transform_commands {
            if command.command.trim().is_empty() {
                return Err(DepsError::config_error(format!(
                    "transform command '{}' has an empty command",
                    name
                )));
            }
        }

        if let Some(path) = &settings.output_file {
            Self::validate_output_path(path)?;
        }

        Ok(())
    }

    /// Validate a noparse entry, a path or a glob pattern
    pub fn validate_pattern(pattern: &str) -> Result<()> {
        if pattern.trim().is_empty() {
            return Err(DepsError::config_error("empty noparse pattern"));
        }
        glob::Pattern::new(pattern)?;
        Ok(())
    }

    /// Validate that an output path is writable
    fn validate_output_path(path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => return Ok(()),
        };

        if !parent.is_dir() {
            return Err(DepsError::config_error(format!(
                "output directory '{}' does not exist",
                parent.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(parent)?.permissions().mode();
            if mode & 0o200 == 0 {
                return Err(DepsError::config_error(format!(
                    "output directory '{}' is not writable",
                    parent.display()
                )));
            }
        }

        Ok(())
    }
}
