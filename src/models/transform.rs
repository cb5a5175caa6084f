//! Transform specification data structures

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named transform plus its opaque options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpecRepr")]
pub struct TransformSpec {
    pub name: String,
    pub options: Value,
}

/// Config files may name a transform or spell out its options
#[derive(Deserialize)]
#[serde(untagged)]
enum SpecRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        options: Value,
    },
}

impl From<SpecRepr> for TransformSpec {
    fn from(repr: SpecRepr) -> Self {
        match repr {
            SpecRepr::Name(name) => Self::new(name),
            SpecRepr::Full { name, options } => Self::with_options(name, options),
        }
    }
}

impl TransformSpec {
    /// Create a spec without options
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Value::Null,
        }
    }

    /// Create a spec with options
    pub fn with_options(name: impl Into<String>, options: Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Read a manifest transform entry: `"name"` or `["name", {options}]`
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) if !name.is_empty() => Some(Self::new(name.clone())),
            Value::Array(parts) => {
                let name = parts.first()?.as_str()?;
                let options = parts.get(1).cloned().unwrap_or(Value::Null);
                Some(Self::with_options(name, options))
            }
            Value::Object(obj) => {
                let name = obj.get("name")?.as_str()?;
                let options = obj.get("options").cloned().unwrap_or(Value::Null);
                Some(Self::with_options(name, options))
            }
            _ => None,
        }
    }
}

impl From<&str> for TransformSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Where walk-wide global transforms sit relative to manifest transforms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformOrder {
    /// Global transforms run first
    Before,
    /// Global transforms run after manifest transforms
    #[default]
    After,
}

impl std::str::FromStr for TransformOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" => Ok(TransformOrder::Before),
            "after" => Ok(TransformOrder::After),
            _ => Err(format!("Invalid transform order: {}", s)),
        }
    }
}
