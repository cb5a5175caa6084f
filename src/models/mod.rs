//! Data models for mdeps

pub mod config;
pub mod manifest;
pub mod record;
pub mod transform;

pub use config::{OutputFormat, PartialSettings, Settings, TransformCommand};
pub use manifest::{BrowserField, BrowserTarget, Manifest};
pub use record::{CachedModule, DependencyRecord, EntryInput, InputRow, ResolvedModule, WalkStats};
pub use transform::{TransformOrder, TransformSpec};
