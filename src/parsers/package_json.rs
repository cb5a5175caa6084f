//! Package.json parsing functionality
//!
//! Only the fields that resolution and transform selection read are
//! extracted; the full document is kept on the manifest for key-path
//! lookups.

use crate::error::{DepsError, Result, ResultExt};
use crate::models::manifest::{BrowserField, BrowserTarget, Manifest};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Parser for package.json files
pub struct ManifestParser;

impl ManifestParser {
    /// Parse package.json content for the package rooted at `dir`
    pub fn parse(content: &str, dir: &Path) -> Result<Manifest> {
        let path = dir.join("package.json");

        let json_value: Value = serde_json::from_str(content).map_err(|source| {
            DepsError::ManifestParse {
                path: path.clone(),
                source,
            }
        })?;

        let obj = match &json_value {
            Value::Object(obj) => obj,
            _ => {
                return Err(DepsError::InvalidManifest {
                    path,
                    message: "Root value is not an object".into(),
                });
            }
        };

        let mut manifest = Manifest::empty(dir);
        manifest.name = Self::extract_optional_string(obj, "name");
        manifest.version = Self::extract_optional_string(obj, "version");
        manifest.main = Self::extract_optional_string(obj, "main");
        manifest.browser = Self::extract_browser(obj);
        manifest.raw = json_value;

        Ok(manifest)
    }

    /// Read and parse the package.json inside `dir`
    pub fn parse_file(dir: &Path) -> Result<Manifest> {
        let path = dir.join("package.json");
        let content = std::fs::read_to_string(&path).with_file_context(&path)?;
        Self::parse(&content, dir)
    }

    /// Extract an optional string field from a JSON object
    fn extract_optional_string(obj: &Map<String, Value>, field: &str) -> Option<String> {
        match obj.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Extract the browser field, skipping entries of unexpected shape
    fn extract_browser(obj: &Map<String, Value>) -> Option<BrowserField> {
        match obj.get("browser") {
            Some(Value::String(s)) if !s.is_empty() => Some(BrowserField::Main(s.clone())),
            Some(Value::Object(map)) => {
                let mut remaps = BTreeMap::new();
                for (key, value) in map {
                    let target = match value {
                        Value::String(s) => BrowserTarget::Path(s.clone()),
                        Value::Bool(b) => BrowserTarget::Disabled(*b),
                        _ => continue,
                    };
                    remaps.insert(key.clone(), target);
                }
                Some(BrowserField::Map(remaps))
            }
            _ => None,
        }
    }
}
