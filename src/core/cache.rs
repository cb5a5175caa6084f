//! In-memory caches scoped to a walk
//!
//! A `WalkCache` is created per walk unless the caller hands one in, in
//! which case the entries it already holds are reused. Entries are only
//! ever added; a walk's view of a file is fixed at first read.

use crate::error::{Result, ResultExt};
use crate::models::{CachedModule, Manifest, ResolvedModule};
use crate::parsers::ManifestParser;
use crate::resolver::ManifestSource;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Key of a resolution cache entry: the reference and the directory it was
/// written in
pub type ResolutionKey = (String, PathBuf);

/// Thread-safe caches shared by every job of a walk
#[derive(Default)]
pub struct WalkCache {
    files: DashMap<PathBuf, Arc<str>>,
    packages: DashMap<PathBuf, Option<Arc<Manifest>>>,
    resolutions: DashMap<ResolutionKey, Option<ResolvedModule>>,
    modules: DashMap<PathBuf, CachedModule>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl WalkCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the raw source of a file
    pub fn insert_file(&self, file: impl Into<PathBuf>, source: impl Into<Arc<str>>) {
        self.files.insert(file.into(), source.into());
    }

    /// Pre-seed a manifest, keyed by the directory that holds it
    pub fn insert_package(&self, manifest: Manifest) {
        self.packages.insert(manifest.dir.clone(), Some(Arc::new(manifest)));
    }

    /// Pre-seed the transformed source and references of a file
    pub fn insert_module(&self, file: impl Into<PathBuf>, module: CachedModule) {
        self.modules.insert(file.into(), module);
    }

    /// Raw source of `file`, reading it on first use.
    ///
    /// The flag is `true` when this call performed the read.
    pub fn read_source(&self, file: &Path) -> Result<(Arc<str>, bool)> {
        if let Some(source) = self.files.get(file) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((Arc::clone(&source), false));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let content = std::fs::read_to_string(file).with_file_context(file)?;
        let source: Arc<str> = Arc::from(content);

        // Another job may have read it meanwhile; the first stored copy wins
        let stored = self
            .files
            .entry(file.to_path_buf())
            .or_insert(source)
            .value()
            .clone();
        Ok((stored, true))
    }

    /// Cached manifest lookup for `dir`.
    ///
    /// Returns `None` when `dir` was never looked at, `Some(None)` when it is
    /// known to hold no manifest.
    pub fn cached_package(&self, dir: &Path) -> Option<Option<Arc<Manifest>>> {
        self.packages.get(dir).map(|entry| entry.value().clone())
    }

    /// Manifest in `dir`, parsing it on first use and passing the freshly
    /// parsed value through `prepare` before it is stored.
    ///
    /// The flag is `true` when this call stored a newly parsed manifest.
    pub fn load_package(
        &self,
        dir: &Path,
        prepare: impl FnOnce(Manifest) -> Manifest,
    ) -> Result<(Option<Arc<Manifest>>, bool)> {
        if let Some(cached) = self.cached_package(dir) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((cached, false));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let parsed = if dir.join("package.json").is_file() {
            Some(Arc::new(prepare(ManifestParser::parse_file(dir)?)))
        } else {
            None
        };

        let mut fresh = false;
        let stored = self
            .packages
            .entry(dir.to_path_buf())
            .or_insert_with(|| {
                fresh = true;
                parsed
            })
            .value()
            .clone();
        let fresh = fresh && stored.is_some();
        Ok((stored, fresh))
    }

    /// Previously resolved reference written in `dir`
    pub fn cached_resolution(&self, reference: &str, dir: &Path) -> Option<Option<ResolvedModule>> {
        let key = (reference.to_string(), dir.to_path_buf());
        let found = self.resolutions.get(&key).map(|entry| entry.value().clone());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Remember how a reference written in `dir` resolved
    pub fn insert_resolution(&self, reference: &str, dir: &Path, resolved: Option<ResolvedModule>) {
        self.resolutions
            .insert((reference.to_string(), dir.to_path_buf()), resolved);
    }

    /// Transformed source and references of `file`, if known
    pub fn cached_module(&self, file: &Path) -> Option<CachedModule> {
        let found = self.modules.get(file).map(|entry| entry.value().clone());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Get cache statistics: (entries, hits, misses)
    pub fn stats(&self) -> (usize, usize, usize) {
        let entries = self.files.len() + self.packages.len() + self.resolutions.len() + self.modules.len();
        (
            entries,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    /// Number of cache hits so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

impl ManifestSource for WalkCache {
    fn manifest_in(&self, dir: &Path) -> Result<Option<Arc<Manifest>>> {
        self.load_package(dir, |manifest| manifest).map(|(manifest, _)| manifest)
    }
}
