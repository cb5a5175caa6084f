//! Records produced and consumed by a walk

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::manifest::Manifest;

/// Outcome of mapping a reference to a concrete file.
///
/// Two resolved modules are the same graph node when their `file` matches.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModule {
    /// The reference as written at the dependency site
    pub id: String,
    pub file: PathBuf,
    pub manifest: Option<Arc<Manifest>>,
}

impl ResolvedModule {
    pub fn new(id: impl Into<String>, file: impl Into<PathBuf>, manifest: Option<Arc<Manifest>>) -> Self {
        Self {
            id: id.into(),
            file: file.into(),
            manifest,
        }
    }
}

/// One fully processed module, emitted exactly once per file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyRecord {
    /// Row-supplied id for entries, otherwise the absolute file path; the
    /// reference as written only appears as a key in the parent's `deps`
    pub id: String,
    pub file: PathBuf,
    pub entry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose: Option<String>,
    /// Source text after every transform ran
    pub source: String,
    /// Reference as written -> resolution; `None` marks an absent module
    #[serde(serialize_with = "serialize_deps")]
    pub deps: BTreeMap<String, Option<ResolvedModule>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub noparse: bool,
}

impl DependencyRecord {
    /// Resolved file for a reference, if it resolved
    pub fn dep_file(&self, reference: &str) -> Option<&Path> {
        self.deps
            .get(reference)
            .and_then(|dep| dep.as_ref())
            .map(|dep| dep.file.as_path())
    }
}

/// Writes `deps` the way browser-pack style consumers expect it:
/// a file path string, or `false` for an absent module
fn serialize_deps<S>(
    deps: &BTreeMap<String, Option<ResolvedModule>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(deps.len()))?;
    for (reference, resolved) in deps {
        match resolved {
            Some(module) => map.serialize_entry(reference, &module.file)?,
            None => map.serialize_entry(reference, &false)?,
        }
    }
    map.end()
}

/// A structured entry descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    pub file: PathBuf,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_true")]
    pub entry: bool,
    #[serde(default)]
    pub expose: Option<String>,
    #[serde(default)]
    pub noparse: bool,
    /// Pre-supplied source; skips the filesystem read for this entry
    #[serde(default)]
    pub source: Option<String>,
}

fn default_true() -> bool {
    true
}

impl InputRow {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            entry: true,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_expose(mut self, expose: impl Into<String>) -> Self {
        self.expose = Some(expose.into());
        self
    }

    pub fn noparse(mut self, noparse: bool) -> Self {
        self.noparse = noparse;
        self
    }
}

/// Entry input: a bare identifier or a structured descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum EntryInput {
    Path(String),
    Row(InputRow),
}

impl From<&str> for EntryInput {
    fn from(value: &str) -> Self {
        EntryInput::Path(value.to_string())
    }
}

impl From<String> for EntryInput {
    fn from(value: String) -> Self {
        EntryInput::Path(value)
    }
}

impl From<PathBuf> for EntryInput {
    fn from(value: PathBuf) -> Self {
        EntryInput::Path(value.to_string_lossy().into_owned())
    }
}

impl From<&Path> for EntryInput {
    fn from(value: &Path) -> Self {
        EntryInput::Path(value.to_string_lossy().into_owned())
    }
}

impl From<InputRow> for EntryInput {
    fn from(value: InputRow) -> Self {
        EntryInput::Row(value)
    }
}

/// Transformed source plus the raw references detected in it.
///
/// This is what the module cache and the persistent cache store: enough to
/// skip transform and detection while still resolving per walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedModule {
    pub source: String,
    pub deps: Vec<String>,
}

/// Counters collected over one walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub modules: usize,
    pub files_read: usize,
    pub cache_hits: usize,
    pub transforms_applied: usize,
    pub missing: usize,
}
