//! Source transform pipeline
//!
//! Transforms are opaque source-to-source rewrites looked up by name in a
//! [`TransformRegistry`]. The [`TransformPipeline`] decides which of them
//! apply to a given file and runs them strictly in sequence.

use crate::error::{DepsError, ErrorKind, Result};
use crate::models::{Manifest, TransformCommand, TransformOrder, TransformSpec};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::trace;

/// What a transform gets to know about the file it rewrites
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub basedir: &'a Path,
    pub file: &'a Path,
    /// Options given alongside the transform name
    pub options: &'a Value,
}

/// A source-to-source rewrite
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, source: String, ctx: &TransformContext<'_>) -> Result<String>;
}

type TransformFn = dyn Fn(String, &TransformContext<'_>) -> Result<String> + Send + Sync;

/// A transform backed by a closure
pub struct FnTransform {
    name: String,
    f: Box<TransformFn>,
}

impl FnTransform {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(String, &TransformContext<'_>) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Transform for FnTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, source: String, ctx: &TransformContext<'_>) -> Result<String> {
        (self.f)(source, ctx)
    }
}

/// A transform that pipes source through an external program.
///
/// The program reads the source on stdin and writes the result to stdout.
/// It runs in the walk's base directory with `MDEPS_FILE` and
/// `MDEPS_OPTIONS` (JSON) set.
pub struct CommandTransform {
    name: String,
    command: TransformCommand,
}

impl CommandTransform {
    pub fn new(name: impl Into<String>, command: TransformCommand) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    fn fail(&self, ctx: &TransformContext<'_>, message: impl Into<String>) -> DepsError {
        DepsError::transform(&self.name, ctx.file, message)
    }
}

impl Transform for CommandTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, source: String, ctx: &TransformContext<'_>) -> Result<String> {
        let mut command = Command::new(&self.command.command);
        command
            .args(&self.command.args)
            .env("MDEPS_FILE", ctx.file)
            .env("MDEPS_OPTIONS", ctx.options.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if ctx.basedir.is_dir() {
            command.current_dir(ctx.basedir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| self.fail(ctx, format!("cannot start '{}': {}", self.command.command, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.fail(ctx, "stdin not available"))?;
        let input = source.into_bytes();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .map_err(|e| self.fail(ctx, e.to_string()))?;

        match writer.join() {
            Ok(Ok(())) => {}
            // The program may exit without consuming all of its input
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(self.fail(ctx, format!("writing source: {}", e))),
            Err(_) => return Err(self.fail(ctx, "stdin writer panicked")),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.fail(ctx, format!("exited with {}: {}", output.status, stderr.trim())));
        }

        String::from_utf8(output.stdout).map_err(|_| self.fail(ctx, "output is not valid UTF-8"))
    }
}

/// Transforms available to a walk, by name
#[derive(Default, Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform under its own name, replacing any previous one
    pub fn register(&mut self, transform: impl Transform + 'static) -> &mut Self {
        self.transforms
            .insert(transform.name().to_string(), Arc::new(transform));
        self
    }

    /// Register a closure as a transform
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(String, &TransformContext<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.register(FnTransform::new(name, f))
    }

    /// Register external commands, one transform per table entry
    pub fn register_commands<'a>(
        &mut self,
        commands: impl IntoIterator<Item = (&'a String, &'a TransformCommand)>,
    ) -> &mut Self {
        for (name, command) in commands {
            self.register(CommandTransform::new(name.clone(), command.clone()));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.transforms.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Decides which transforms apply to a file and runs them in order
#[derive(Clone, Default)]
pub struct TransformPipeline {
    registry: TransformRegistry,
    top_level: Vec<TransformSpec>,
    global: Vec<TransformSpec>,
    order: TransformOrder,
    transform_key: Option<Vec<String>>,
}

impl TransformPipeline {
    pub fn new(registry: TransformRegistry) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    /// Transforms applied only to top-level files
    pub fn with_transforms(mut self, transforms: Vec<TransformSpec>) -> Self {
        self.top_level = transforms;
        self
    }

    /// Transforms applied to every file
    pub fn with_global_transforms(mut self, transforms: Vec<TransformSpec>, order: TransformOrder) -> Self {
        self.global = transforms;
        self.order = order;
        self
    }

    /// Manifest key path listing per-package transforms
    pub fn with_transform_key(mut self, key: Option<Vec<String>>) -> Self {
        self.transform_key = key;
        self
    }

    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Names the pipeline could schedule that nothing is registered under
    pub fn unknown_transforms(&self) -> Vec<String> {
        self.top_level
            .iter()
            .chain(&self.global)
            .filter(|spec| !self.registry.contains(&spec.name))
            .map(|spec| spec.name.clone())
            .collect()
    }

    /// The ordered transforms for `file`.
    ///
    /// Top-level transforms come first, then global and manifest transforms
    /// in the configured order. Manifest transforms only apply when the
    /// manifest owns `file`, and a name is never scheduled twice.
    pub fn plan(&self, file: &Path, manifest: Option<&Manifest>, top_level: bool) -> Vec<TransformSpec> {
        let declared = match (&self.transform_key, manifest) {
            (Some(key), Some(manifest)) if manifest.owns(file) => manifest.declared_transforms(key),
            _ => Vec::new(),
        };

        let local: &[TransformSpec] = if top_level { &self.top_level } else { &[] };
        let (first, second) = match self.order {
            TransformOrder::Before => (self.global.as_slice(), declared.as_slice()),
            TransformOrder::After => (declared.as_slice(), self.global.as_slice()),
        };

        let mut seen = HashSet::new();
        local
            .iter()
            .chain(first)
            .chain(second)
            .filter(|spec| seen.insert(spec.name.clone()))
            .cloned()
            .collect()
    }

    /// Run `plan` over `source`, calling `on_applied` after each transform
    pub fn apply(
        &self,
        mut source: String,
        plan: &[TransformSpec],
        basedir: &Path,
        file: &Path,
        mut on_applied: impl FnMut(&dyn Transform),
    ) -> Result<String> {
        for spec in plan {
            let transform = self
                .registry
                .get(&spec.name)
                .ok_or_else(|| DepsError::transform(&spec.name, file, "no transform registered under this name"))?;

            let ctx = TransformContext {
                basedir,
                file,
                options: &spec.options,
            };

            source = transform.apply(source, &ctx).map_err(|e| match e.kind() {
                ErrorKind::Transform => e,
                _ => DepsError::transform(&spec.name, file, e.to_string()),
            })?;

            trace!(transform = %spec.name, file = %file.display(), "transform applied");
            on_applied(transform.as_ref());
        }
        Ok(source)
    }
}
