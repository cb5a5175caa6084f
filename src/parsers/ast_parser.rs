//! AST-based dependency detection using OXC

use crate::error::{DepsError, Result};
use crate::parsers::module_detector::ModuleDetector;
use crate::parsers::Detector;
use oxc_allocator::Allocator;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use parking_lot::Mutex;
use std::path::Path;

/// Thread-safe allocator pool for reuse across parses
pub struct AllocatorPool {
    allocators: Mutex<Vec<Allocator>>,
}

impl AllocatorPool {
    /// Create a new allocator pool
    pub fn new(size: usize) -> Self {
        let allocators = (0..size).map(|_| Allocator::default()).collect();
        Self {
            allocators: Mutex::new(allocators),
        }
    }

    /// Take an allocator from the pool, or a fresh one if it is empty
    pub fn take(&self) -> Allocator {
        self.allocators.lock().pop().unwrap_or_default()
    }

    /// Reset an allocator and return it to the pool
    pub fn return_allocator(&self, mut allocator: Allocator) {
        allocator.reset();
        self.allocators.lock().push(allocator);
    }
}

/// Default detector: parses JavaScript or TypeScript with oxc and collects
/// `require`, `import` and `export ... from` references
pub struct RequireDetector {
    parse_options: ParseOptions,
    allocator_pool: AllocatorPool,
}

impl RequireDetector {
    /// Create a new detector
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions {
                allow_return_outside_function: true,
                ..ParseOptions::default()
            },
            allocator_pool: AllocatorPool::new(num_cpus::get()),
        }
    }

    /// Source type for a file; unknown extensions parse as unambiguous JavaScript
    fn source_type(file: &Path) -> SourceType {
        match SourceType::from_path(file) {
            Ok(source_type) if source_type.is_typescript() => source_type,
            Ok(source_type) => source_type.with_unambiguous(true),
            Err(_) => SourceType::unambiguous(),
        }
    }

    fn parse_references(&self, allocator: &Allocator, source: &str, file: &Path) -> Result<Vec<String>> {
        let ret = Parser::new(allocator, source, Self::source_type(file))
            .with_options(self.parse_options.clone())
            .parse();

        if ret.panicked || !ret.errors.is_empty() {
            let message = ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "parser aborted".to_string());
            return Err(DepsError::detection(file, message));
        }

        Ok(ModuleDetector::collect(&ret.program))
    }
}

impl Default for RequireDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for RequireDetector {
    fn detect(&self, source: &str, file: &Path) -> Result<Vec<String>> {
        if file.extension().is_some_and(|ext| ext == "json") {
            return Ok(Vec::new());
        }

        let allocator = self.allocator_pool.take();
        let result = self.parse_references(&allocator, source, file);
        self.allocator_pool.return_allocator(allocator);
        result
    }
}
