//! Error context utilities for mdeps
//!
//! Helpers for attaching path context to foreign errors so every error
//! surfaced by a walk names the file it is about.

use crate::error::{DepsError, Result};
use std::path::Path;

/// Extension trait for Result to add context to errors
pub trait ResultExt<T, E> {
    /// Add context to an error with a custom message
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;

    /// Add file context to an error
    fn with_file_context<P: AsRef<Path>>(self, path: P) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|err| DepsError::Other {
            message: format!("{}: {}", context(), err),
        })
    }

    fn with_file_context<P: AsRef<Path>>(self, path: P) -> Result<T> {
        self.map_err(|err| {
            let message = err.to_string();
            let kind = (&err as &dyn std::error::Error)
                .downcast_ref::<std::io::Error>()
                .map(|io_err| io_err.kind())
                .unwrap_or(std::io::ErrorKind::Other);

            DepsError::Read {
                path: path.as_ref().to_path_buf(),
                source: std::io::Error::new(kind, message),
            }
        })
    }
}
