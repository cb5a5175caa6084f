//! Configuration file parsing utilities

use std::fs;
use std::path::{Path, PathBuf};

use super::file::DEFAULT_CONFIG_FILE;
use super::settings::SettingsValidator;
use crate::error::{DepsError, Result};
use crate::models::config::PartialSettings;

/// Parse a TOML configuration file into PartialSettings
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DepsError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| DepsError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_config_content(&content, path)
}

/// Parse TOML configuration content into PartialSettings
pub fn parse_config_content<P: AsRef<Path>>(content: &str, path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    let settings: PartialSettings = toml::from_str(content).map_err(|e| DepsError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_partial_settings(&settings, path)?;

    Ok(settings)
}

/// Validate partial settings for obvious errors
pub fn validate_partial_settings<P: AsRef<Path>>(settings: &PartialSettings, path: P) -> Result<()> {
    let path = path.as_ref();
    let invalid = |what: &str| {
        DepsError::config_error(format!("{} in config file: {}", what, path.display()))
    };

    if let Some(basedir) = &settings.basedir {
        if basedir.as_os_str().is_empty() {
            return Err(invalid("Invalid empty basedir"));
        }
    }

    if let Some(patterns) = &settings.noparse {
        for pattern in patterns {
            SettingsValidator::validate_pattern(pattern).map_err(|e| {
                invalid(&format!("Invalid noparse pattern '{}' ({})", pattern, e))
            })?;
        }
    }

    if settings.concurrency == Some(0) {
        return Err(invalid("Invalid concurrency 0"));
    }

    if let Some(output_file) = &settings.output_file {
        if output_file.as_os_str().is_empty() {
            return Err(invalid("Invalid empty output_file"));
        }
    }

    if let Some(cache_dir) = &settings.cache_dir {
        if cache_dir.as_os_str().is_empty() {
            return Err(invalid("Invalid empty cache_dir"));
        }
    }

    Ok(())
}

/// Candidate default config locations, most specific first
pub fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(home_dir) = dirs::home_dir() {
        locations.push(home_dir.join(DEFAULT_CONFIG_FILE));
    }
    if let Some(config_dir) = dirs::config_dir() {
        locations.push(config_dir.join("mdeps").join("config.toml"));
    }
    locations
}

/// Find and load configuration from default locations
pub fn find_default_config() -> Result<Option<PartialSettings>> {
    for location in default_config_locations() {
        if location.is_file() {
            tracing::debug!(path = %location.display(), "using default config");
            return parse_config_file(location).map(Some);
        }
    }
    Ok(None)
}

/// Create a default configuration file at the specified path
pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, include_str!("default_config.toml")).map_err(|e| DepsError::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
