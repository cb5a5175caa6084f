//! Command implementations

use std::path::PathBuf;
use std::sync::Arc;

use super::Args;
use crate::config::{self, CliArgs, DEFAULT_CONFIG_FILE};
use crate::core::{ModuleDeps, TransformRegistry};
use crate::error::{DepsError, ErrorKind, Result};
use crate::models::{EntryInput, Settings};
use crate::output::{create_formatter, create_writer, ProgressReporter};

/// Available commands
#[derive(Debug)]
pub enum Command {
    /// Walk the dependency graph of the configured entries
    Walk(Args),
    /// Initialize a default configuration file
    Init,
}

impl Command {
    /// Create a command from parsed arguments
    pub fn from_args(args: Args) -> Self {
        if args.init {
            return Command::Init;
        }
        Command::Walk(args)
    }

    /// Execute the command
    pub fn execute(&self) -> Result<()> {
        match self {
            Command::Walk(args) => {
                let settings = config::load_config(CliArgs::from(args))?;
                if settings.verbose {
                    tracing::debug!(?settings, "resolved settings");
                }
                walk(&settings, TransformRegistry::new())
            }
            Command::Init => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);

                if config_path.exists() {
                    eprintln!(
                        "Configuration file already exists at: {}",
                        config_path.display()
                    );
                    eprintln!("To overwrite it, delete the file first and run this command again.");
                    return Ok(());
                }

                config::create_default_config(&config_path)?;

                eprintln!("Created default configuration file at: {}", config_path.display());
                Ok(())
            }
        }
    }

    /// Run the command and map the outcome to an exit code
    pub fn run(&self) -> i32 {
        match self.execute() {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("Error: {}", err.user_message());
                exit_code(&err)
            }
        }
    }
}

/// 2 for configuration problems, 1 for everything that stopped a walk
pub fn exit_code(err: &DepsError) -> i32 {
    match err.kind() {
        ErrorKind::Config => 2,
        _ => 1,
    }
}

/// Walk the configured entries and write every record as it arrives
pub fn walk(settings: &Settings, registry: TransformRegistry) -> Result<()> {
    if settings.entries.is_empty() {
        return Err(DepsError::config_error(
            "no entry modules given; pass them as arguments or set `entries`",
        ));
    }

    let reporter = Arc::new(ProgressReporter::new(settings.show_progress, settings.quiet));

    let deps = ModuleDeps::from_settings(settings, registry)?.with_observer(reporter.clone());
    let entries = settings.entries.iter().cloned().map(EntryInput::Path);
    let mut stream = deps.walk(entries)?;

    let formatter = create_formatter(
        settings.output_format,
        settings.use_colors && settings.output_file.is_none(),
        settings.verbose,
        settings.quiet,
    );
    let mut writer = create_writer(settings.output_file.as_ref())?;

    writer.write(&formatter.begin()?)?;
    for (index, item) in stream.by_ref().enumerate() {
        match item {
            Ok(record) => writer.write(&formatter.record(&record, index)?)?,
            Err(err) => {
                reporter.abandon();
                writer.flush()?;
                return Err(err);
            }
        }
    }

    let stats = stream.stats().cloned().unwrap_or_default();
    writer.write(&formatter.finish(&stats)?)?;
    writer.flush()?;
    reporter.finish(&stats);

    Ok(())
}
