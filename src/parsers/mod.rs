//! Parsing functionality for package manifests and module sources
//!
//! `package_json` reads manifests; `ast_parser` and `module_detector`
//! extract dependency references from (already transformed) source text.

pub mod ast_parser;
pub mod module_detector;
pub mod package_json;

pub use ast_parser::{AllocatorPool, RequireDetector};
pub use module_detector::ModuleDetector;
pub use package_json::ManifestParser;

use crate::error::Result;
use std::path::Path;

/// Extracts the literal dependency references a source text contains.
///
/// Implementations must derive their answer from `source` alone; `file` is
/// only a hint for the syntax flavor and for error context.
pub trait Detector: Send + Sync {
    fn detect(&self, source: &str, file: &Path) -> Result<Vec<String>>;
}

impl<F> Detector for F
where
    F: Fn(&str, &Path) -> Result<Vec<String>> + Send + Sync,
{
    fn detect(&self, source: &str, file: &Path) -> Result<Vec<String>> {
        self(source, file)
    }
}
