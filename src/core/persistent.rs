//! Persistent cache consulted before transforming and parsing a file
//!
//! The walker hands a persistent cache the identity of a file plus a
//! fallback that performs the transform and detection work. The cache
//! either answers from storage or runs the fallback exactly once and keeps
//! its result. Either way the walk's output is the same.

use crate::error::{DepsError, Result};
use crate::models::{CachedModule, Manifest, TransformSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Identity of the module a persistent lookup is about
#[derive(Debug, Clone, Copy)]
pub struct PersistentKey<'a> {
    pub file: &'a Path,
    pub id: &'a str,
    pub manifest: Option<&'a Manifest>,
    /// Raw source the walk is about to transform
    pub source: &'a str,
    /// Transforms that will run on `source`, in order
    pub plan: &'a [TransformSpec],
}

/// Work performed on a cache miss
pub type Fallback<'a> = Box<dyn FnOnce() -> Result<CachedModule> + 'a>;

/// External store of transformed sources and their references
pub trait PersistentCache: Send + Sync {
    /// Return the stored module for `key`, or run `fallback`, store its
    /// result and return it. Errors from `fallback` are passed through.
    fn get_or_compute(&self, key: PersistentKey<'_>, fallback: Fallback<'_>) -> Result<CachedModule>;
}

/// One stored entry on disk
#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry {
    file: PathBuf,
    source_hash: String,
    module: CachedModule,
}

/// Persistent cache keeping one JSON document per source file in a
/// directory. Entries are named by the blake3 hash of the cache
/// fingerprint, the transform plan and the file path, and are only
/// trusted while the blake3 hash of the raw source matches.
pub struct DiskCache {
    dir: PathBuf,
    fingerprint: String,
}

impl DiskCache {
    /// Create a disk cache rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fingerprint: String::new(),
        }
    }

    /// Mix a fingerprint (for instance of the transform configuration)
    /// into every entry name
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    /// Directory holding the entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &PersistentKey<'_>) -> Result<PathBuf> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.fingerprint.as_bytes());
        hasher.update(&[0]);
        hasher.update(serde_json::to_string(key.plan)?.as_bytes());
        hasher.update(&[0]);
        hasher.update(key.file.to_string_lossy().as_bytes());
        Ok(self.dir.join(format!("{}.json", hasher.finalize().to_hex())))
    }

    fn load(&self, entry_path: &Path, file: &Path, source_hash: &str) -> Option<CachedModule> {
        let content = fs::read_to_string(entry_path).ok()?;
        match serde_json::from_str::<DiskEntry>(&content) {
            Ok(entry) if entry.file == file && entry.source_hash == source_hash => Some(entry.module),
            Ok(_) => None,
            Err(e) => {
                warn!(entry = %entry_path.display(), error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn store(&self, entry_path: &Path, file: &Path, source_hash: String, module: &CachedModule) -> Result<()> {
        let entry = DiskEntry {
            file: file.to_path_buf(),
            source_hash,
            module: module.clone(),
        };
        let json = serde_json::to_string(&entry)?;

        fs::create_dir_all(&self.dir).map_err(|e| DepsError::persistent_cache(file, e.to_string()))?;

        // Write then rename so a concurrent reader never sees half an entry
        let tmp = entry_path.with_extension(format!("{}.tmp", std::process::id()));
        fs::write(&tmp, json).map_err(|e| DepsError::persistent_cache(file, e.to_string()))?;
        fs::rename(&tmp, entry_path).map_err(|e| DepsError::persistent_cache(file, e.to_string()))?;
        Ok(())
    }
}

impl PersistentCache for DiskCache {
    fn get_or_compute(&self, key: PersistentKey<'_>, fallback: Fallback<'_>) -> Result<CachedModule> {
        let entry_path = self.entry_path(&key)?;
        let source_hash = blake3::hash(key.source.as_bytes()).to_hex().to_string();
        if let Some(module) = self.load(&entry_path, key.file, &source_hash) {
            debug!(file = %key.file.display(), "persistent cache hit");
            return Ok(module);
        }

        let module = fallback()?;
        self.store(&entry_path, key.file, source_hash, &module)?;
        Ok(module)
    }
}
