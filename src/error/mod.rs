//! Error handling for mdeps
//!
//! This module provides the crate error type, result alias, and error
//! context utilities.

pub mod context;
pub mod types;

pub use context::ResultExt;
pub use types::{DepsError, ErrorKind, ErrorSeverity, Result};
