//! Configuration file and environment sources

use std::path::{Path, PathBuf};

use super::{parser, ConfigSource};
use crate::error::{DepsError, Result};
use crate::models::config::PartialSettings;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".mdeps.toml";

/// Configuration file source
pub struct FileConfig {
    path: PathBuf,
    name: String,
}

impl FileConfig {
    /// Create a new file configuration source with a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            name: format!("config file ({})", path.as_ref().display()),
        }
    }

    /// Get the path of this configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<PartialSettings> {
        if !self.is_available() {
            return Err(DepsError::ConfigNotFound {
                path: self.path.clone(),
            });
        }

        parser::parse_config_file(&self.path)
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Variables read by [`EnvConfig`], without their prefix
const ENV_KEYS: &[&str] = &[
    "BASEDIR",
    "ENTRIES",
    "EXTENSIONS",
    "NOPARSE",
    "PATHS",
    "TRANSFORM_KEY",
    "IGNORE_MISSING",
    "CONCURRENCY",
    "CACHE_DIR",
    "OUTPUT_FORMAT",
];

/// Environment variable configuration source
pub struct EnvConfig {
    prefix: String,
    name: String,
}

impl EnvConfig {
    /// Create a new environment variable configuration source
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("{} environment variables", &prefix),
            prefix,
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, key))
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.var(key).map(|value| split_list(&value))
    }
}

/// Comma separated values, trimmed, empties dropped
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `browserify.transform` style dotted key path
pub(crate) fn split_key_path(value: &str) -> Vec<String> {
    value
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<PartialSettings> {
        let mut settings = PartialSettings::default();

        if let Some(basedir) = self.var("BASEDIR") {
            settings.basedir = Some(PathBuf::from(basedir));
        }
        settings.entries = self.list("ENTRIES");
        settings.extensions = self.list("EXTENSIONS");
        settings.noparse = self.list("NOPARSE");
        settings.paths = self
            .list("PATHS")
            .map(|paths| paths.into_iter().map(PathBuf::from).collect());
        settings.transform_key = self.var("TRANSFORM_KEY").map(|key| split_key_path(&key));

        if let Some(value) = self.var("IGNORE_MISSING") {
            settings.ignore_missing = parse_flag(&value);
        }

        if let Some(value) = self.var("CONCURRENCY") {
            let concurrency = value.trim().parse().map_err(|_| {
                DepsError::config_error(format!(
                    "{}_CONCURRENCY must be a number, got '{}'",
                    self.prefix, value
                ))
            })?;
            settings.concurrency = Some(concurrency);
        }

        if let Some(cache_dir) = self.var("CACHE_DIR") {
            settings.cache_dir = Some(PathBuf::from(cache_dir));
        }

        if let Some(format) = self.var("OUTPUT_FORMAT") {
            settings.output_format = Some(format.parse().map_err(DepsError::config_error)?);
        }

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        ENV_KEYS.iter().any(|key| self.var(key).is_some())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
