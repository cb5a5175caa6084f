//! Command-line argument configuration source

use std::path::PathBuf;

use super::file::split_key_path;
use super::ConfigSource;
use crate::cli::args::{Args, GlobalOrder, OutputFormat as CliOutputFormat};
use crate::error::Result;
use crate::models::config::{OutputFormat, PartialSettings};
use crate::models::{TransformOrder, TransformSpec};

/// Command-line argument configuration source
#[derive(Debug)]
pub struct CliConfig {
    args: CliArgs,
    name: String,
}

/// Command-line arguments that feed the settings
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub entries: Vec<String>,
    pub basedir: Option<PathBuf>,
    pub transforms: Vec<String>,
    pub global_transforms: Vec<String>,
    pub global_transform_order: Option<TransformOrder>,
    pub transform_key: Option<String>,
    pub noparse: Vec<String>,
    pub ignore_missing: bool,
    pub extensions: Vec<String>,
    pub paths: Vec<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub quiet: bool,
    pub verbose: bool,
    pub no_colors: bool,
    pub no_progress: bool,
    pub config: Option<PathBuf>,
}

impl From<&Args> for CliArgs {
    fn from(args: &Args) -> Self {
        Self {
            entries: args.entries.clone(),
            basedir: args.basedir.clone(),
            transforms: args.transforms.clone(),
            global_transforms: args.global_transforms.clone(),
            global_transform_order: args.global_order.map(|order| match order {
                GlobalOrder::Before => TransformOrder::Before,
                GlobalOrder::After => TransformOrder::After,
            }),
            transform_key: args.transform_key.clone(),
            noparse: args.noparse.clone(),
            ignore_missing: args.ignore_missing,
            extensions: args.extensions.clone(),
            paths: args.paths.clone(),
            output_format: args.output.map(|format| match format {
                CliOutputFormat::Json => OutputFormat::Json,
                CliOutputFormat::Ndjson => OutputFormat::Ndjson,
                CliOutputFormat::Text => OutputFormat::Text,
            }),
            output_file: args.output_file.clone(),
            cache_dir: args.cache_dir.clone(),
            concurrency: args.concurrency,
            quiet: args.quiet,
            verbose: args.verbose > 0,
            no_colors: args.no_colors,
            no_progress: args.no_progress,
            config: args.config.clone(),
        }
    }
}

impl CliConfig {
    /// Create a new CLI configuration source
    pub fn new(args: CliArgs) -> Self {
        Self {
            args,
            name: "command-line arguments".to_string(),
        }
    }

    /// Create a CLI configuration source from parsed arguments
    pub fn from_args(args: &Args) -> Self {
        Self::new(CliArgs::from(args))
    }

    /// Get the config file path if specified
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.args.config.as_ref()
    }
}

/// Repeatable flags only override when given at least once
fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

impl ConfigSource for CliConfig {
    fn load(&self) -> Result<PartialSettings> {
        let args = &self.args;
        let mut settings = PartialSettings {
            basedir: args.basedir.clone(),
            entries: non_empty(&args.entries),
            extensions: non_empty(&args.extensions),
            noparse: non_empty(&args.noparse),
            paths: non_empty(&args.paths),
            global_transform_order: args.global_transform_order,
            transform_key: args.transform_key.as_deref().map(split_key_path),
            concurrency: args.concurrency,
            cache_dir: args.cache_dir.clone(),
            output_format: args.output_format,
            output_file: args.output_file.clone(),
            ..Default::default()
        };

        if !args.transforms.is_empty() {
            settings.transforms = Some(
                args.transforms
                    .iter()
                    .map(|name| TransformSpec::new(name.as_str()))
                    .collect(),
            );
        }

        if !args.global_transforms.is_empty() {
            settings.global_transforms = Some(
                args.global_transforms
                    .iter()
                    .map(|name| TransformSpec::new(name.as_str()))
                    .collect(),
            );
        }

        // Boolean flags
        if args.ignore_missing {
            settings.ignore_missing = Some(true);
        }

        if args.quiet {
            settings.quiet = Some(true);
        }

        if args.verbose {
            settings.verbose = Some(true);
        }

        if args.no_colors {
            settings.use_colors = Some(false);
        }

        if args.no_progress {
            settings.show_progress = Some(false);
        }

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}
