//! Package manifest data structures

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::transform::TransformSpec;

/// The subset of a package.json that resolution and the transform
/// pipeline care about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Directory containing the manifest file
    pub dir: PathBuf,
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    pub browser: Option<BrowserField>,
    /// The full parsed document, kept so transform key paths can be looked up
    pub raw: Value,
}

/// The `browser` field of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrowserField {
    /// Replacement for `main`
    Main(String),
    /// Per-reference or per-file remaps
    Map(BTreeMap<String, BrowserTarget>),
}

/// Target of one browser-field remap entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BrowserTarget {
    Path(String),
    /// `false`: the reference is disabled for browser builds
    Disabled(bool),
}

impl Manifest {
    /// An empty manifest rooted at `dir`
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            name: None,
            version: None,
            main: None,
            browser: None,
            raw: Value::Object(Default::default()),
        }
    }

    /// Path of the manifest file itself
    pub fn path(&self) -> PathBuf {
        self.dir.join("package.json")
    }

    /// The entry point, preferring a string `browser` field over `main`
    pub fn entry_point(&self) -> Option<&str> {
        match &self.browser {
            Some(BrowserField::Main(main)) => Some(main.as_str()),
            _ => self.main.as_deref(),
        }
    }

    /// Look up a browser remap for a reference or a relative file key.
    ///
    /// Returns `Some(None)` when the entry disables the reference.
    pub fn browser_remap(&self, key: &str) -> Option<Option<&str>> {
        let Some(BrowserField::Map(map)) = &self.browser else {
            return None;
        };

        let target = map.get(key).or_else(|| {
            // "./lib/a.js" and "./lib/a" name the same file
            let trimmed = key.strip_suffix(".js")?;
            map.get(trimmed)
        })?;

        match target {
            BrowserTarget::Path(path) => Some(Some(path.as_str())),
            BrowserTarget::Disabled(false) => Some(None),
            BrowserTarget::Disabled(true) => None,
        }
    }

    /// Transforms declared under a key path such as `["browserify", "transform"]`
    pub fn declared_transforms(&self, key_path: &[String]) -> Vec<TransformSpec> {
        if key_path.is_empty() {
            return Vec::new();
        }

        let mut node = &self.raw;
        for key in key_path {
            match node.get(key) {
                Some(next) => node = next,
                None => return Vec::new(),
            }
        }

        match node {
            Value::Array(entries) => entries.iter().filter_map(TransformSpec::from_value).collect(),
            other => TransformSpec::from_value(other).into_iter().collect(),
        }
    }

    /// Whether this manifest governs `file`: no `node_modules` directory
    /// lies between the manifest directory and the file
    pub fn owns(&self, file: &Path) -> bool {
        match file.strip_prefix(&self.dir) {
            Ok(rest) => !rest.components().any(|c| c.as_os_str() == "node_modules"),
            Err(_) => false,
        }
    }
}
