//! Command-line argument parsing

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// mdeps - walk the dependency graph of JavaScript modules
#[derive(Parser, Debug)]
#[command(name = "mdeps")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve, transform and list every module reachable from a set of entry files")]
#[command(long_about = "mdeps starts from one or more entry modules, resolves each require/import with \
Node's algorithm (honouring the package.json browser field), runs the configured source transforms, \
and prints one record per module with its source and resolved dependencies.")]
#[command(after_help = "EXAMPLES:

Basic Usage:
    # Walk from a single entry
    mdeps ./main.js

    # Several entries, resolved against another directory
    mdeps --basedir ./app ./main.js ./worker.js

Transforms:
    # Apply a transform to top-level files
    mdeps -t envify ./main.js

    # Apply a transform to every file, including node_modules
    mdeps -g uglifyify ./main.js

    # Honour transforms listed in package.json
    mdeps --transform-key browserify.transform ./main.js

Output Options:
    # One record per line, as modules are finished
    mdeps -o ndjson ./main.js

    # Human-readable summary
    mdeps -o text ./main.js

Configuration:
    # Use a specific configuration file
    mdeps --config ./mdeps.toml

    # Create a default configuration file
    mdeps --init
")]
pub struct Args {
    /// Entry modules
    #[arg(value_name = "ENTRY", help = "Entry modules to start the walk from")]
    pub entries: Vec<String>,

    /// Base directory
    #[arg(short, long, value_name = "DIR", help = "Directory entries and top-level checks are relative to (defaults to the current directory)")]
    pub basedir: Option<PathBuf>,

    /// Top-level transforms
    #[arg(short = 't', long = "transform", value_name = "NAME", help = "Transform applied to files outside node_modules (repeatable)")]
    pub transforms: Vec<String>,

    /// Global transforms
    #[arg(short = 'g', long = "global-transform", value_name = "NAME", help = "Transform applied to every file (repeatable)")]
    pub global_transforms: Vec<String>,

    /// Order of global transforms relative to package transforms
    #[arg(long, value_enum, value_name = "ORDER", help = "Run global transforms before or after package.json transforms")]
    pub global_order: Option<GlobalOrder>,

    /// Key path of package.json transforms
    #[arg(long, value_name = "KEY", help = "Dotted package.json key listing transforms, e.g. browserify.transform")]
    pub transform_key: Option<String>,

    /// Files never parsed for dependencies
    #[arg(long, value_name = "PATTERN", help = "Absolute path or glob of files emitted without parsing (repeatable)")]
    pub noparse: Vec<String>,

    /// Tolerate unresolved references
    #[arg(long, help = "Record unresolved references as false instead of failing the walk")]
    pub ignore_missing: bool,

    /// Resolution extensions
    #[arg(short = 'e', long = "extension", value_name = "EXT", help = "Extension tried for references without one, in order (repeatable, e.g. --extension .ts)")]
    pub extensions: Vec<String>,

    /// Global search paths
    #[arg(long = "path", value_name = "DIR", help = "Extra directory searched for bare references (repeatable, defaults to NODE_PATH)")]
    pub paths: Vec<PathBuf>,

    /// Output format (json, ndjson, text)
    #[arg(short, long, value_enum, value_name = "FORMAT", help = "Output format: 'json' array, 'ndjson' record per line, or 'text' summary")]
    pub output: Option<OutputFormat>,

    /// Output file path (stdout if not specified)
    #[arg(long, value_name = "FILE", help = "File to write output to (uses stdout if not specified)")]
    pub output_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", help = "Path to configuration file (defaults to .mdeps.toml in the current directory)")]
    pub config: Option<PathBuf>,

    /// Persistent cache directory
    #[arg(long, value_name = "DIR", help = "Cache transformed sources and dependencies on disk")]
    pub cache_dir: Option<PathBuf>,

    /// Worker threads
    #[arg(short = 'j', long, value_name = "N", help = "Number of worker threads (defaults to the number of CPUs)")]
    pub concurrency: Option<usize>,

    /// Suppress non-essential output
    #[arg(short, long, help = "Suppress progress and summary output")]
    pub quiet: bool,

    /// Increase log verbosity
    #[arg(short, long, action = ArgAction::Count, help = "Log more (-v debug, -vv trace)")]
    pub verbose: u8,

    /// Log as JSON lines
    #[arg(long, help = "Write logs to stderr as JSON lines")]
    pub log_json: bool,

    /// Disable colored output
    #[arg(long, help = "Disable colored text output")]
    pub no_colors: bool,

    /// Disable progress spinner
    #[arg(long, help = "Disable the progress spinner")]
    pub no_progress: bool,

    /// Create default configuration file
    #[arg(long, help = "Create a default configuration file (.mdeps.toml) and exit")]
    pub init: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Ndjson,
    Text,
}

/// Global transform placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GlobalOrder {
    Before,
    After,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
