//! Error types and definitions for mdeps
//!
//! Every failure a walk can produce maps onto one `DepsError` variant, and
//! every variant knows the stage it came from (`ErrorKind`) so callers can
//! report file, reference and stage together.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity levels for different error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Warning level errors - operation can continue
    Warning,
    /// Error level - the walk fails but the process can report it
    Error,
    /// Critical level - process should terminate before doing any work
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Stage of the pipeline an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolution,
    Read,
    Transform,
    Detection,
    PersistentCache,
    Config,
    Output,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Resolution => "resolve",
            ErrorKind::Read => "read",
            ErrorKind::Transform => "transform",
            ErrorKind::Detection => "detect",
            ErrorKind::PersistentCache => "persistent-cache",
            ErrorKind::Config => "config",
            ErrorKind::Output => "output",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Main error type for mdeps operations
#[derive(Debug, Error)]
pub enum DepsError {
    /// A reference could not be mapped to a file
    #[error("Cannot find module '{reference}' from '{}'", from.display())]
    Resolution { reference: String, from: PathBuf },

    /// Reading a source file or manifest failed
    #[error("Error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest file is not valid JSON
    #[error("JSON parsing error in {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest file is valid JSON but not a usable descriptor
    #[error("Invalid package.json structure in {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },

    /// A transform rejected the source of a file
    #[error("Transform '{transform}' failed on {}: {message}", file.display())]
    Transform {
        transform: String,
        file: PathBuf,
        message: String,
    },

    /// The source could not be parsed for dependency references
    #[error("Failed to parse {} for dependencies: {message}", file.display())]
    Detection { file: PathBuf, message: String },

    /// The external persistent cache handler failed
    #[error("Persistent cache error for {}: {message}", file.display())]
    PersistentCache { file: PathBuf, message: String },

    /// Standard IO errors without file context
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration file not found
    #[error("Configuration file not found at {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration file read errors
    #[error("Error reading configuration file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file parse errors
    #[error("Error parsing configuration file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Glob pattern errors
    #[error("Glob pattern error: {source}")]
    GlobPattern {
        #[source]
        source: glob::PatternError,
    },

    /// Output file write errors
    #[error("Error writing to output file {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stdout write errors
    #[error("Error writing to stdout: {source}")]
    StdoutWrite {
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON serialization error: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },

    /// Worker pool could not be set up
    #[error("Parallel execution error: {message}")]
    ParallelExecution { message: String },

    /// Context-wrapped foreign error
    #[error("{message}")]
    Other { message: String },
}

impl DepsError {
    /// The pipeline stage this error originated from
    pub fn kind(&self) -> ErrorKind {
        match self {
            DepsError::Resolution { .. } => ErrorKind::Resolution,
            DepsError::Read { .. }
            | DepsError::ManifestParse { .. }
            | DepsError::InvalidManifest { .. }
            | DepsError::Io { .. } => ErrorKind::Read,
            DepsError::Transform { .. } => ErrorKind::Transform,
            DepsError::Detection { .. } => ErrorKind::Detection,
            DepsError::PersistentCache { .. } => ErrorKind::PersistentCache,
            DepsError::Config { .. }
            | DepsError::ConfigNotFound { .. }
            | DepsError::ConfigRead { .. }
            | DepsError::ConfigParse { .. }
            | DepsError::GlobPattern { .. } => ErrorKind::Config,
            DepsError::OutputWrite { .. }
            | DepsError::StdoutWrite { .. }
            | DepsError::JsonSerialize { .. } => ErrorKind::Output,
            DepsError::ParallelExecution { .. } | DepsError::Other { .. } => ErrorKind::Internal,
        }
    }

    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Config | ErrorKind::Output => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Check if this is a critical error that should terminate the process
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// The file the error is about, when there is one
    pub fn file(&self) -> Option<&std::path::Path> {
        match self {
            DepsError::Resolution { from, .. } => Some(from),
            DepsError::Read { path, .. }
            | DepsError::ManifestParse { path, .. }
            | DepsError::InvalidManifest { path, .. } => Some(path),
            DepsError::Transform { file, .. }
            | DepsError::Detection { file, .. }
            | DepsError::PersistentCache { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            DepsError::Resolution { reference, from } => {
                format!(
                    "[{}] Cannot find module '{}' required from '{}'. Use --ignore-missing to skip unresolved references.",
                    self.kind(),
                    reference,
                    from.display()
                )
            }
            DepsError::Read { path, source } => {
                format!("[{}] Cannot read '{}': {}.", self.kind(), path.display(), source)
            }
            DepsError::Transform { transform, file, message } => {
                format!(
                    "[{}] Transform '{}' rejected '{}': {}",
                    self.kind(),
                    transform,
                    file.display(),
                    message
                )
            }
            DepsError::Detection { file, message } => {
                format!(
                    "[{}] Could not extract dependencies from '{}': {}. Add it to --noparse if it has none.",
                    self.kind(),
                    file.display(),
                    message
                )
            }
            DepsError::ConfigNotFound { path } => {
                format!(
                    "Configuration file not found at '{}'. Create one with --init or use command line options.",
                    path.display()
                )
            }
            _ => format!("[{}] {}", self.kind(), self),
        }
    }

    /// Create a resolution error
    pub fn resolution(reference: impl Into<String>, from: impl Into<PathBuf>) -> Self {
        DepsError::Resolution {
            reference: reference.into(),
            from: from.into(),
        }
    }

    /// Create a read error with file context
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DepsError::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a transform error
    pub fn transform(
        transform: impl Into<String>,
        file: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        DepsError::Transform {
            transform: transform.into(),
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a detection error
    pub fn detection(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DepsError::Detection {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a persistent cache error
    pub fn persistent_cache(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DepsError::PersistentCache {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create an IO error without file context
    pub fn io_error(source: std::io::Error) -> Self {
        DepsError::Io { source }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        DepsError::Config {
            message: message.into(),
        }
    }
}

// Implement From for common error types
impl From<std::io::Error> for DepsError {
    fn from(err: std::io::Error) -> Self {
        DepsError::io_error(err)
    }
}

impl From<glob::PatternError> for DepsError {
    fn from(err: glob::PatternError) -> Self {
        DepsError::GlobPattern { source: err }
    }
}

impl From<serde_json::Error> for DepsError {
    fn from(err: serde_json::Error) -> Self {
        DepsError::JsonSerialize { source: err }
    }
}

/// Result type alias for mdeps operations
pub type Result<T> = std::result::Result<T, DepsError>;
