//! Node-style module path resolution

use crate::error::{DepsError, Result};
use crate::models::{Manifest, ResolvedModule};
use crate::resolver::{is_path_reference, nearest_manifest, normalize, ResolveContext, Resolver};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::trace;

const PROBE_CACHE_SIZE: usize = 4096;

/// Outcome of looking a key up in a browser field
enum Remap {
    Keep,
    Disabled,
    Target(String),
}

/// Default resolver: relative and absolute paths against the filesystem,
/// bare names through `node_modules` and global search paths, honoring
/// manifest `main` and `browser` fields
pub struct NodeResolver {
    file_exists_cache: Mutex<LruCache<PathBuf, bool>>,
}

impl NodeResolver {
    /// Create a new resolver
    pub fn new() -> Self {
        let capacity = NonZeroUsize::new(PROBE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            file_exists_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Check if a regular file exists, with caching
    fn check_file_exists(&self, path: &Path) -> bool {
        if let Some(cached) = self.file_exists_cache.lock().get(path) {
            return *cached;
        }

        let exists = path.is_file();
        self.file_exists_cache.lock().put(path.to_path_buf(), exists);
        exists
    }

    /// Browser remap of `key` in `manifest`, if the manifest has one
    fn browser_remap(manifest: Option<&Manifest>, key: &str) -> Remap {
        match manifest.and_then(|m| m.browser_remap(key)) {
            None => Remap::Keep,
            Some(None) => Remap::Disabled,
            Some(Some(target)) => Remap::Target(target.to_string()),
        }
    }

    /// Try `path` itself, then `path` with each extension appended
    fn load_as_file(&self, path: &Path, extensions: &[String]) -> Option<PathBuf> {
        if self.check_file_exists(path) {
            return Some(path.to_path_buf());
        }

        let base = path.as_os_str();
        extensions.iter().find_map(|ext| {
            let mut candidate = base.to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            self.check_file_exists(&candidate).then_some(candidate)
        })
    }

    /// Resolve a directory through its manifest entry point, then `index`
    fn load_as_directory(&self, dir: &Path, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>> {
        if let Some(manifest) = ctx.manifests.manifest_in(dir)? {
            if let Some(entry) = manifest.entry_point() {
                let main = normalize(&dir.join(entry));
                if let Some(found) = self.load_as_file(&main, ctx.extensions) {
                    return Ok(Some(found));
                }
                if let Some(found) = self.load_index(&main, ctx.extensions) {
                    return Ok(Some(found));
                }
            }
        }

        Ok(self.load_index(dir, ctx.extensions))
    }

    fn load_index(&self, dir: &Path, extensions: &[String]) -> Option<PathBuf> {
        self.load_as_file(&dir.join("index"), extensions)
    }

    fn load_file_or_directory(&self, path: &Path, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>> {
        if let Some(found) = self.load_as_file(path, ctx.extensions) {
            return Ok(Some(found));
        }
        self.load_as_directory(path, ctx)
    }

    /// `node_modules` directories from `start` upwards, then the global paths
    fn package_search_dirs(start: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = start
            .ancestors()
            .filter(|dir| dir.file_name().is_none_or(|name| name != "node_modules"))
            .map(|dir| dir.join("node_modules"))
            .collect();
        dirs.extend(paths.iter().cloned());
        dirs
    }

    fn resolve_package(&self, reference: &str, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>> {
        for dir in Self::package_search_dirs(ctx.basedir, ctx.paths) {
            let candidate = dir.join(reference);
            if let Some(found) = self.load_file_or_directory(&candidate, ctx)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Find the file a (possibly remapped) reference names
    fn locate(&self, reference: &str, ctx: &ResolveContext<'_>) -> Result<Option<PathBuf>> {
        if is_path_reference(reference) {
            let candidate = normalize(&ctx.basedir.join(reference));
            self.load_file_or_directory(&candidate, ctx)
        } else {
            self.resolve_package(reference, ctx)
        }
    }

    /// Apply the owning manifest's per-file browser remap to a located file
    fn remap_file(
        &self,
        file: PathBuf,
        manifest: Option<&Manifest>,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<PathBuf>> {
        let Some(manifest) = manifest else {
            return Ok(Some(file));
        };
        let Ok(relative) = file.strip_prefix(&manifest.dir) else {
            return Ok(Some(file));
        };

        let key = format!("./{}", relative.to_string_lossy().replace('\\', "/"));
        match Self::browser_remap(Some(manifest), &key) {
            Remap::Keep => Ok(Some(file)),
            Remap::Disabled => Ok(None),
            Remap::Target(target) => {
                let candidate = normalize(&manifest.dir.join(target));
                Ok(Some(self.load_file_or_directory(&candidate, ctx)?.unwrap_or(file)))
            }
        }
    }
}

impl Default for NodeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for NodeResolver {
    fn resolve(&self, reference: &str, ctx: &ResolveContext<'_>) -> Result<Option<ResolvedModule>> {
        // A remap in the requesting package's manifest replaces the reference
        // before any probing
        let located = match Self::browser_remap(ctx.manifest, reference) {
            Remap::Disabled => return Ok(None),
            Remap::Keep => self.locate(reference, ctx)?,
            Remap::Target(target) => {
                let manifest_dir = ctx.manifest.map(|m| m.dir.as_path()).unwrap_or(ctx.basedir);
                let remapped = ResolveContext {
                    basedir: if is_path_reference(&target) { manifest_dir } else { ctx.basedir },
                    ..*ctx
                };
                self.locate(&target, &remapped)?
            }
        };

        let Some(file) = located else {
            return Err(DepsError::resolution(reference, ctx.parent));
        };

        let file_dir = file.parent().unwrap_or(Path::new("/"));
        let manifest = nearest_manifest(file_dir, ctx.manifests)?;

        let Some(file) = self.remap_file(file, manifest.as_deref(), ctx)? else {
            return Ok(None);
        };

        trace!(reference, file = %file.display(), "resolved");
        Ok(Some(ResolvedModule::new(reference, file, manifest)))
    }
}
