//! Module reference resolution
//!
//! A [`Resolver`] maps a reference written in one file to the file it
//! names. [`NodeResolver`] is the default Node-style implementation;
//! callers may substitute any other implementation (or a closure).

pub mod path_resolver;

pub use path_resolver::NodeResolver;

use crate::error::Result;
use crate::models::{Manifest, ResolvedModule};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Source of parsed manifests, keyed by the directory that holds them
pub trait ManifestSource: Send + Sync {
    /// The manifest stored directly in `dir`, if any
    fn manifest_in(&self, dir: &Path) -> Result<Option<Arc<Manifest>>>;
}

/// Everything a resolver may consult about the requesting side
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Directory of the requesting file
    pub basedir: &'a Path,
    /// The requesting file, used in error context
    pub parent: &'a Path,
    /// Nearest manifest governing the requesting file
    pub manifest: Option<&'a Manifest>,
    /// Global search paths for bare references
    pub paths: &'a [PathBuf],
    /// Extensions tried when a candidate has none
    pub extensions: &'a [String],
    pub manifests: &'a dyn ManifestSource,
}

/// Maps a reference to a file.
///
/// `Ok(None)` means the reference is deliberately disabled (for instance by
/// a browser-field `false` entry). A reference that names nothing is an
/// `Err(DepsError::Resolution { .. })`.
pub trait Resolver: Send + Sync {
    fn resolve(&self, reference: &str, ctx: &ResolveContext<'_>) -> Result<Option<ResolvedModule>>;
}

impl<F> Resolver for F
where
    F: Fn(&str, &ResolveContext<'_>) -> Result<Option<ResolvedModule>> + Send + Sync,
{
    fn resolve(&self, reference: &str, ctx: &ResolveContext<'_>) -> Result<Option<ResolvedModule>> {
        self(reference, ctx)
    }
}

/// Whether a reference is a path rather than a package name
pub fn is_path_reference(reference: &str) -> bool {
    reference == "."
        || reference == ".."
        || reference.starts_with("./")
        || reference.starts_with("../")
        || Path::new(reference).is_absolute()
}

/// Lexically remove `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// The nearest manifest at or above `dir`.
///
/// The search stops at a `node_modules` directory so a package never
/// inherits the manifest of the project that installed it.
pub fn nearest_manifest(dir: &Path, manifests: &dyn ManifestSource) -> Result<Option<Arc<Manifest>>> {
    for ancestor in dir.ancestors() {
        if ancestor.file_name().is_some_and(|name| name == "node_modules") {
            break;
        }
        if let Some(manifest) = manifests.manifest_in(ancestor)? {
            return Ok(Some(manifest));
        }
    }
    Ok(None)
}
