//! mdeps - a recursive module dependency resolver with a transform pipeline
//!
//! Starting from one or more entry modules, mdeps reads each file, runs the
//! configured source transforms, extracts its `require`/`import` references,
//! resolves them with Node's algorithm (including the `browser` field of
//! package.json) and streams one [`DependencyRecord`] per reachable file.
//!
//! ```no_run
//! use mdeps::ModuleDeps;
//!
//! let stream = ModuleDeps::new("/work/app").walk(["./main.js"])?;
//! for record in stream {
//!     let record = record?;
//!     println!("{} -> {:?}", record.file.display(), record.deps.keys());
//! }
//! # Ok::<(), mdeps::DepsError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod output;
pub mod parsers;
pub mod resolver;

// Re-export commonly used types
pub use crate::core::{
    DepsStream, DiskCache, ModuleDeps, PersistentCache, Transform, TransformPipeline,
    TransformRegistry, WalkCache, WalkEvent, WalkObserver,
};
pub use error::{DepsError, ErrorKind, ErrorSeverity, Result, ResultExt};
pub use models::{
    CachedModule, DependencyRecord, EntryInput, InputRow, Manifest, ResolvedModule, Settings,
    TransformSpec, WalkStats,
};
pub use parsers::{Detector, RequireDetector};
pub use resolver::{NodeResolver, ResolveContext, Resolver};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
