//! Core functionality: the graph walker and the machinery it drives

pub mod cache;
pub mod events;
pub mod persistent;
pub mod streaming;
pub mod transform;
pub mod walker;

pub use cache::WalkCache;
pub use events::{Observers, TracingObserver, WalkObserver};
pub use persistent::{DiskCache, Fallback, PersistentCache, PersistentKey};
pub use streaming::{DepsStream, WalkEvent};
pub use transform::{
    CommandTransform, FnTransform, Transform, TransformContext, TransformPipeline, TransformRegistry,
};
pub use walker::{ModuleDeps, PackageFilter, PostFilter, ReferenceFilter};
