//! Observational notifications raised during a walk
//!
//! Observers never influence the walk; they are told what happened after
//! it happened.

use crate::models::Manifest;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Receives side-channel notifications from a walk
pub trait WalkObserver: Send + Sync {
    /// A transform finished rewriting `file`
    fn on_transform(&self, _transform: &str, _file: &Path) {}

    /// A source file was read from disk
    fn on_file(&self, _file: &Path, _id: &str) {}

    /// A manifest was parsed for the first time
    fn on_package(&self, _manifest: &Manifest) {}

    /// A reference did not resolve and the walk tolerates it
    fn on_missing(&self, _reference: &str, _parent: &Path) {}
}

/// Forwards notifications to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl WalkObserver for TracingObserver {
    fn on_transform(&self, transform: &str, file: &Path) {
        trace!(transform, file = %file.display(), "transform");
    }

    fn on_file(&self, file: &Path, id: &str) {
        debug!(file = %file.display(), id, "file");
    }

    fn on_package(&self, manifest: &Manifest) {
        debug!(
            package = manifest.name.as_deref().unwrap_or("<unnamed>"),
            dir = %manifest.dir.display(),
            "package"
        );
    }

    fn on_missing(&self, reference: &str, parent: &Path) {
        warn!(reference, parent = %parent.display(), "missing module");
    }
}

/// Every observer attached to a walk
#[derive(Default, Clone)]
pub struct Observers {
    observers: Vec<Arc<dyn WalkObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: Arc<dyn WalkObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl WalkObserver for Observers {
    fn on_transform(&self, transform: &str, file: &Path) {
        for observer in &self.observers {
            observer.on_transform(transform, file);
        }
    }

    fn on_file(&self, file: &Path, id: &str) {
        for observer in &self.observers {
            observer.on_file(file, id);
        }
    }

    fn on_package(&self, manifest: &Manifest) {
        for observer in &self.observers {
            observer.on_package(manifest);
        }
    }

    fn on_missing(&self, reference: &str, parent: &Path) {
        for observer in &self.observers {
            observer.on_missing(reference, parent);
        }
    }
}
