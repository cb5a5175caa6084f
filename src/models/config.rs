//! Configuration-related data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::models::transform::{TransformOrder, TransformSpec};

/// Main configuration settings for mdeps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory relative references of entries and top-level checks start from
    pub basedir: PathBuf,

    /// Entry modules to walk
    pub entries: Vec<String>,

    /// Extensions tried, in order, when a reference has none
    pub extensions: Vec<String>,

    /// Transforms applied to top-level files only
    pub transforms: Vec<TransformSpec>,

    /// Transforms applied to every file
    pub global_transforms: Vec<TransformSpec>,

    /// Whether global transforms run before or after manifest transforms
    pub global_transform_order: TransformOrder,

    /// Key path into package.json listing transforms; `None` ignores manifests
    pub transform_key: Option<Vec<String>>,

    /// Absolute paths or glob patterns of files never parsed for dependencies
    pub noparse: Vec<String>,

    /// Global search paths for bare references
    pub paths: Vec<PathBuf>,

    /// Record unresolved references as absent instead of failing
    pub ignore_missing: bool,

    /// Worker threads used by the walk
    pub concurrency: usize,

    /// Directory of the on-disk persistent cache
    pub cache_dir: Option<PathBuf>,

    /// External commands usable as transforms, by name
    pub transform_commands: BTreeMap<String, TransformCommand>,

    /// Output format (json, ndjson, text)
    pub output_format: OutputFormat,

    /// Output file path (if not specified, output to stdout)
    pub output_file: Option<PathBuf>,

    /// Whether to suppress non-essential output
    pub quiet: bool,

    /// Whether to show debug information
    pub verbose: bool,

    /// Whether to use colors in text output
    pub use_colors: bool,

    /// Whether to show a progress spinner
    pub show_progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            basedir: PathBuf::from("."),
            entries: Vec::new(),
            extensions: vec![".js".to_string(), ".json".to_string()],
            transforms: Vec::new(),
            global_transforms: Vec::new(),
            global_transform_order: TransformOrder::After,
            transform_key: None,
            noparse: Vec::new(),
            paths: node_path(),
            ignore_missing: false,
            concurrency: num_cpus::get(),
            cache_dir: None,
            transform_commands: BTreeMap::new(),
            output_format: OutputFormat::Json,
            output_file: None,
            quiet: false,
            verbose: false,
            use_colors: true,
            show_progress: true,
        }
    }
}

/// Global search paths taken from `NODE_PATH`
pub fn node_path() -> Vec<PathBuf> {
    std::env::var_os("NODE_PATH")
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// An external program used as a source transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON array of every record
    Json,
    /// One JSON record per line, written as emitted
    Ndjson,
    /// Human-readable summary
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "ndjson" => Ok(OutputFormat::Ndjson),
            "text" => Ok(OutputFormat::Text),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Partial settings for configuration merging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialSettings {
    pub basedir: Option<PathBuf>,
    pub entries: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    pub transforms: Option<Vec<TransformSpec>>,
    pub global_transforms: Option<Vec<TransformSpec>>,
    pub global_transform_order: Option<TransformOrder>,
    pub transform_key: Option<Vec<String>>,
    pub noparse: Option<Vec<String>>,
    pub paths: Option<Vec<PathBuf>>,
    pub ignore_missing: Option<bool>,
    pub concurrency: Option<usize>,
    pub cache_dir: Option<PathBuf>,
    pub transform_commands: Option<BTreeMap<String, TransformCommand>>,
    pub output_format: Option<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub quiet: Option<bool>,
    pub verbose: Option<bool>,
    pub use_colors: Option<bool>,
    pub show_progress: Option<bool>,
}

impl PartialSettings {
    /// Merge another PartialSettings into this one
    /// Fields from `other` take precedence over existing fields
    pub fn merge_from(&mut self, other: PartialSettings) {
        if other.basedir.is_some() {
            self.basedir = other.basedir;
        }
        if other.entries.is_some() {
            self.entries = other.entries;
        }
        if other.extensions.is_some() {
            self.extensions = other.extensions;
        }
        if other.transforms.is_some() {
            self.transforms = other.transforms;
        }
        if other.global_transforms.is_some() {
            self.global_transforms = other.global_transforms;
        }
        if other.global_transform_order.is_some() {
            self.global_transform_order = other.global_transform_order;
        }
        if other.transform_key.is_some() {
            self.transform_key = other.transform_key;
        }
        if other.noparse.is_some() {
            self.noparse = other.noparse;
        }
        if other.paths.is_some() {
            self.paths = other.paths;
        }
        if other.ignore_missing.is_some() {
            self.ignore_missing = other.ignore_missing;
        }
        if other.concurrency.is_some() {
            self.concurrency = other.concurrency;
        }
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir;
        }
        // Command tables from several sources add up; later names win
        if let Some(commands) = other.transform_commands {
            self.transform_commands
                .get_or_insert_with(BTreeMap::new)
                .extend(commands);
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.output_file.is_some() {
            self.output_file = other.output_file;
        }
        if other.quiet.is_some() {
            self.quiet = other.quiet;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.use_colors.is_some() {
            self.use_colors = other.use_colors;
        }
        if other.show_progress.is_some() {
            self.show_progress = other.show_progress;
        }
    }

    /// Convert partial settings to full settings
    /// Uses defaults for any fields that are None
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();

        if let Some(basedir) = &self.basedir {
            settings.basedir = basedir.clone();
        }
        if let Some(entries) = &self.entries {
            settings.entries = entries.clone();
        }
        if let Some(extensions) = &self.extensions {
            settings.extensions = extensions.clone();
        }
        if let Some(transforms) = &self.transforms {
            settings.transforms = transforms.clone();
        }
        if let Some(global_transforms) = &self.global_transforms {
            settings.global_transforms = global_transforms.clone();
        }
        if let Some(order) = self.global_transform_order {
            settings.global_transform_order = order;
        }
        if let Some(transform_key) = &self.transform_key {
            settings.transform_key = Some(transform_key.clone());
        }
        if let Some(noparse) = &self.noparse {
            settings.noparse = noparse.clone();
        }
        if let Some(paths) = &self.paths {
            settings.paths = paths.clone();
        }
        if let Some(ignore_missing) = self.ignore_missing {
            settings.ignore_missing = ignore_missing;
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(cache_dir) = &self.cache_dir {
            settings.cache_dir = Some(cache_dir.clone());
        }
        if let Some(commands) = &self.transform_commands {
            settings.transform_commands = commands.clone();
        }
        if let Some(output_format) = self.output_format {
            settings.output_format = output_format;
        }
        if let Some(output_file) = &self.output_file {
            settings.output_file = Some(output_file.clone());
        }
        if let Some(quiet) = self.quiet {
            settings.quiet = quiet;
        }
        if let Some(verbose) = self.verbose {
            settings.verbose = verbose;
        }
        if let Some(use_colors) = self.use_colors {
            settings.use_colors = use_colors;
        }
        if let Some(show_progress) = self.show_progress {
            settings.show_progress = show_progress;
        }

        settings
    }
}
