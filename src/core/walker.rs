//! The dependency graph walker
//!
//! A walk starts from one or more entries and processes every reachable
//! module as a job on a rayon pool: read, transform, detect, resolve the
//! direct references, emit the record, then fan out to children nobody has
//! claimed yet. A module's record is only emitted once all of its direct
//! references have an identity, and a file is claimed by at most one job.

use crate::core::cache::WalkCache;
use crate::core::events::{Observers, TracingObserver, WalkObserver};
use crate::core::persistent::{DiskCache, PersistentCache, PersistentKey};
use crate::core::streaming::{ChannelObserver, DepsStream, StreamItem};
use crate::core::transform::{TransformPipeline, TransformRegistry};
use crate::error::{DepsError, ErrorKind, Result};
use crate::models::{
    CachedModule, DependencyRecord, EntryInput, InputRow, Manifest, ResolvedModule, Settings,
    TransformSpec, WalkStats,
};
use crate::parsers::{Detector, RequireDetector};
use crate::resolver::{nearest_manifest, normalize, ManifestSource, NodeResolver, ResolveContext, Resolver};
use dashmap::DashSet;
use glob::Pattern;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Reference predicate; `false` leaves the reference out entirely
pub type ReferenceFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Predicate on a resolved module; `false` records it as absent
pub type PostFilter = Arc<dyn Fn(&str, &Path, Option<&Manifest>) -> bool + Send + Sync>;

/// Rewrites a manifest right after it is parsed
pub type PackageFilter = Arc<dyn Fn(Manifest, &Path) -> Manifest + Send + Sync>;

/// Walks a module graph and streams one record per reachable file
#[derive(Clone)]
pub struct ModuleDeps {
    basedir: PathBuf,
    extensions: Vec<String>,
    paths: Vec<PathBuf>,
    ignore_missing: bool,
    noparse: Vec<String>,
    expose: HashMap<String, PathBuf>,
    concurrency: usize,
    resolver: Arc<dyn Resolver>,
    detector: Arc<dyn Detector>,
    pipeline: TransformPipeline,
    cache: Arc<WalkCache>,
    persistent: Option<Arc<dyn PersistentCache>>,
    filter: Option<ReferenceFilter>,
    post_filter: Option<PostFilter>,
    package_filter: Option<PackageFilter>,
    observers: Observers,
    emit_events: bool,
}

impl ModuleDeps {
    /// A walker with default resolution and detection, rooted at `basedir`
    pub fn new(basedir: impl Into<PathBuf>) -> Self {
        let defaults = Settings::default();
        Self {
            basedir: basedir.into(),
            extensions: defaults.extensions,
            paths: defaults.paths,
            ignore_missing: false,
            noparse: Vec::new(),
            expose: HashMap::new(),
            concurrency: defaults.concurrency,
            resolver: Arc::new(NodeResolver::new()),
            detector: Arc::new(RequireDetector::new()),
            pipeline: TransformPipeline::default(),
            cache: Arc::new(WalkCache::new()),
            persistent: None,
            filter: None,
            post_filter: None,
            package_filter: None,
            observers: Observers::new(),
            emit_events: false,
        }
    }

    /// A walker configured from resolved settings.
    ///
    /// `registry` supplies in-process transforms; the settings' command
    /// transforms are registered on top of it.
    pub fn from_settings(settings: &Settings, mut registry: TransformRegistry) -> Result<Self> {
        registry.register_commands(&settings.transform_commands);

        let pipeline = TransformPipeline::new(registry)
            .with_transforms(settings.transforms.clone())
            .with_global_transforms(settings.global_transforms.clone(), settings.global_transform_order)
            .with_transform_key(settings.transform_key.clone());

        let mut deps = Self::new(&settings.basedir)
            .with_pipeline(pipeline)
            .extensions(settings.extensions.clone())
            .paths(settings.paths.clone())
            .ignore_missing(settings.ignore_missing)
            .noparse(settings.noparse.clone())
            .concurrency(settings.concurrency)
            .with_observer(Arc::new(TracingObserver));

        if let Some(dir) = &settings.cache_dir {
            let fingerprint = serde_json::to_string(&(
                &settings.transforms,
                &settings.global_transforms,
                settings.global_transform_order,
                &settings.transform_key,
                &settings.transform_commands,
            ))?;
            let disk = DiskCache::new(dir).with_fingerprint(fingerprint);
            deps = deps.with_persistent_cache(Arc::new(disk));
        }

        Ok(deps)
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn with_pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Share caches with the caller, for instance across walks
    pub fn with_cache(mut self, cache: Arc<WalkCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_persistent_cache(mut self, cache: Arc<dyn PersistentCache>) -> Self {
        self.persistent = Some(cache);
        self
    }

    pub fn with_filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_post_filter(
        mut self,
        filter: impl Fn(&str, &Path, Option<&Manifest>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.post_filter = Some(Arc::new(filter));
        self
    }

    pub fn with_package_filter(mut self, filter: impl Fn(Manifest, &Path) -> Manifest + Send + Sync + 'static) -> Self {
        self.package_filter = Some(Arc::new(filter));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn WalkObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Deliver notifications as [`crate::core::WalkEvent`] values on the stream
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.emit_events = enabled;
        self
    }

    /// Resolve `name` to `file` before consulting the resolver
    pub fn expose(mut self, name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.expose.insert(name.into(), file.into());
        self
    }

    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    /// Files never transformed or parsed: absolute or basedir-relative
    /// paths, or glob patterns
    pub fn noparse(mut self, patterns: Vec<String>) -> Self {
        self.noparse = patterns;
        self
    }

    pub fn concurrency(mut self, threads: usize) -> Self {
        self.concurrency = threads;
        self
    }

    pub fn cache(&self) -> &Arc<WalkCache> {
        &self.cache
    }

    /// Start a walk from `entries`.
    ///
    /// Configuration problems are reported here; everything else arrives
    /// through the returned stream.
    pub fn walk<I>(&self, entries: I) -> Result<DepsStream>
    where
        I: IntoIterator,
        I::Item: Into<EntryInput>,
    {
        let entries: Vec<EntryInput> = entries.into_iter().map(Into::into).collect();

        let unknown = self.pipeline.unknown_transforms();
        if !unknown.is_empty() {
            return Err(DepsError::config_error(format!(
                "unknown transforms: {}",
                unknown.join(", ")
            )));
        }

        let basedir = if self.basedir.is_absolute() {
            normalize(&self.basedir)
        } else {
            normalize(&std::env::current_dir()?.join(&self.basedir))
        };

        let noparse = NoParse::compile(&self.noparse, &basedir)?;

        let mut top_dirs = vec![basedir.clone()];
        for entry in &entries {
            let file = match entry {
                EntryInput::Path(path) => PathBuf::from(path),
                EntryInput::Row(row) => row.file.clone(),
            };
            if let Some(dir) = normalize(&basedir.join(file)).parent() {
                top_dirs.push(dir.to_path_buf());
            }
        }

        let expose = self
            .expose
            .iter()
            .map(|(name, file)| (name.clone(), normalize(&basedir.join(file))))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency.max(1))
            .thread_name(|i| format!("mdeps-worker-{}", i))
            .build()
            .map_err(|e| DepsError::ParallelExecution {
                message: e.to_string(),
            })?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let mut deps = self.clone();
        let events = if self.emit_events {
            let (etx, erx) = crossbeam_channel::unbounded();
            deps.observers.push(Arc::new(ChannelObserver::new(etx)));
            Some(erx)
        } else {
            None
        };

        let state = Arc::new(WalkState {
            deps,
            basedir,
            top_dirs,
            expose,
            noparse,
            visited: DashSet::new(),
            aborted: RwLock::new(false),
            first_error: Mutex::new(None),
            tx,
            counters: Counters::default(),
        });

        info!(entries = entries.len(), threads = pool.current_num_threads(), "starting walk");

        std::thread::Builder::new()
            .name("mdeps-walk".to_string())
            .spawn(move || {
                pool.scope(|scope| {
                    for job in state.claim_entries(entries) {
                        let state = Arc::clone(&state);
                        scope.spawn(move |s| process(state, s, job));
                    }
                });
                state.finish();
            })
            .map_err(|e| DepsError::ParallelExecution {
                message: e.to_string(),
            })?;

        Ok(DepsStream::new(rx, events))
    }
}

/// Compiled "do not parse" set
struct NoParse {
    exact: HashSet<PathBuf>,
    patterns: Vec<Pattern>,
}

impl NoParse {
    fn compile(entries: &[String], basedir: &Path) -> Result<Self> {
        let mut exact = HashSet::new();
        let mut patterns = Vec::new();

        for entry in entries {
            let absolute = normalize(&basedir.join(entry));
            if entry.contains(&['*', '?', '['][..]) {
                patterns.push(Pattern::new(&absolute.to_string_lossy())?);
            } else {
                exact.insert(absolute);
            }
        }

        Ok(Self { exact, patterns })
    }

    fn matches(&self, file: &Path) -> bool {
        self.exact.contains(file) || self.patterns.iter().any(|p| p.matches_path(file))
    }
}

#[derive(Default)]
struct Counters {
    modules: AtomicUsize,
    files_read: AtomicUsize,
    cache_hits: AtomicUsize,
    transforms_applied: AtomicUsize,
    missing: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> WalkStats {
        WalkStats {
            modules: self.modules.load(Ordering::Relaxed),
            files_read: self.files_read.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            transforms_applied: self.transforms_applied.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
        }
    }
}

/// A module claimed for processing
struct Job {
    id: String,
    file: PathBuf,
    manifest: Option<Arc<Manifest>>,
    entry: bool,
    expose: Option<String>,
    noparse: bool,
    source: Option<String>,
}

impl Job {
    fn discovered(module: ResolvedModule) -> Self {
        Self {
            id: module.file.to_string_lossy().into_owned(),
            file: module.file,
            manifest: module.manifest,
            entry: false,
            expose: None,
            noparse: false,
            source: None,
        }
    }
}

/// Shared state of one running walk
struct WalkState {
    deps: ModuleDeps,
    basedir: PathBuf,
    top_dirs: Vec<PathBuf>,
    expose: HashMap<String, PathBuf>,
    noparse: NoParse,
    visited: DashSet<PathBuf>,
    /// Set once; records are only sent while holding the read side
    aborted: RwLock<bool>,
    first_error: Mutex<Option<DepsError>>,
    tx: crossbeam_channel::Sender<StreamItem>,
    counters: Counters,
}

fn parent_dir(file: &Path) -> &Path {
    file.parent().unwrap_or(file)
}

fn process(state: Arc<WalkState>, scope: &rayon::Scope<'_>, job: Job) {
    match state.run_job(job) {
        Ok(children) => {
            for child in children {
                let state = Arc::clone(&state);
                scope.spawn(move |s| process(state, s, child));
            }
        }
        Err(err) => state.fail(err),
    }
}

impl WalkState {
    fn is_aborted(&self) -> bool {
        *self.aborted.read()
    }

    /// Record the first fatal error; later ones are dropped
    fn fail(&self, err: DepsError) {
        let mut aborted = self.aborted.write();
        if !*aborted {
            *aborted = true;
            debug!(error = %err, "walk aborted");
            *self.first_error.lock() = Some(err);
        }
    }

    /// Send a record unless the walk was aborted
    fn emit(&self, record: DependencyRecord) -> bool {
        let aborted = self.aborted.read();
        if *aborted {
            return false;
        }
        Counters::bump(&self.counters.modules);
        self.tx.send(StreamItem::Record(record)).is_ok()
    }

    /// Terminate the stream with the first error or the statistics
    fn finish(&self) {
        let item = match self.first_error.lock().take() {
            Some(err) => StreamItem::Failed(err),
            None => {
                let stats = self.counters.snapshot();
                info!(modules = stats.modules, files = stats.files_read, "walk finished");
                StreamItem::Finished(stats)
            }
        };
        let _ = self.tx.send(item);
    }

    fn is_top_level(&self, file: &Path) -> bool {
        self.top_dirs.iter().any(|dir| {
            let rest = file.strip_prefix(dir).unwrap_or(file);
            !rest.components().any(|c| c.as_os_str() == "node_modules")
        })
    }

    fn context<'a>(&'a self, basedir: &'a Path, parent: &'a Path, manifest: Option<&'a Manifest>) -> ResolveContext<'a> {
        ResolveContext {
            basedir,
            parent,
            manifest,
            paths: &self.deps.paths,
            extensions: &self.deps.extensions,
            manifests: self,
        }
    }

    /// A tolerated resolution failure, when the policy allows it
    fn tolerate(&self, err: DepsError, reference: &str, parent: &Path) -> Result<()> {
        if err.kind() == ErrorKind::Resolution && self.deps.ignore_missing {
            Counters::bump(&self.counters.missing);
            self.deps.observers.on_missing(reference, parent);
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Resolve every entry and claim its file before any module is
    /// processed, so a child reaching an entry file never takes it over.
    /// The first of several entries naming the same file wins.
    fn claim_entries(&self, entries: Vec<EntryInput>) -> Vec<Job> {
        let mut jobs = Vec::new();
        for entry in entries {
            match self.resolve_entry(entry) {
                Ok(Some(job)) => {
                    if self.visited.insert(job.file.clone()) {
                        jobs.push(job);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    self.fail(err);
                    break;
                }
            }
        }
        jobs
    }

    fn resolve_entry(&self, entry: EntryInput) -> Result<Option<Job>> {
        let row = match entry {
            EntryInput::Path(path) => InputRow::new(path),
            EntryInput::Row(row) => row,
        };
        let file = normalize(&self.basedir.join(&row.file));

        let (file, manifest) = if row.source.is_some() {
            let manifest = nearest_manifest(parent_dir(&file), self)?;
            (file, manifest)
        } else {
            let reference = file.to_string_lossy().into_owned();
            let ctx = self.context(&self.basedir, &self.basedir, None);
            match self.deps.resolver.resolve(&reference, &ctx) {
                Ok(Some(module)) => (module.file, module.manifest),
                Ok(None) => return Ok(None),
                Err(err) => {
                    self.tolerate(err, &row.file.to_string_lossy(), &self.basedir)?;
                    return Ok(None);
                }
            }
        };

        let id = row.id.unwrap_or_else(|| file.to_string_lossy().into_owned());
        Ok(Some(Job {
            id,
            file,
            manifest,
            entry: row.entry,
            expose: row.expose,
            noparse: row.noparse,
            source: row.source,
        }))
    }

    fn resolve_reference(&self, reference: &str, job: &Job) -> Result<Option<ResolvedModule>> {
        if let Some(file) = self.expose.get(reference) {
            let manifest = nearest_manifest(parent_dir(file), self)?;
            return Ok(Some(ResolvedModule::new(reference, file.clone(), manifest)));
        }

        let dir = parent_dir(&job.file);
        if let Some(cached) = self.deps.cache.cached_resolution(reference, dir) {
            Counters::bump(&self.counters.cache_hits);
            return Ok(cached);
        }

        let ctx = self.context(dir, &job.file, job.manifest.as_deref());
        let resolved = self.deps.resolver.resolve(reference, &ctx)?;
        self.deps.cache.insert_resolution(reference, dir, resolved.clone());
        Ok(resolved)
    }

    /// Raw source of a job, from the row, the file cache or the disk
    fn raw_source(&self, job: &Job) -> Result<String> {
        if let Some(source) = &job.source {
            return Ok(source.clone());
        }

        let (source, fresh) = self.deps.cache.read_source(&job.file)?;
        if fresh {
            Counters::bump(&self.counters.files_read);
            self.deps.observers.on_file(&job.file, &job.id);
        } else {
            Counters::bump(&self.counters.cache_hits);
        }
        Ok(source.to_string())
    }

    fn transform_and_detect(&self, job: &Job, raw: String, plan: &[TransformSpec]) -> Result<CachedModule> {
        let source = self
            .deps
            .pipeline
            .apply(raw, plan, &self.basedir, &job.file, |transform| {
                Counters::bump(&self.counters.transforms_applied);
                self.deps.observers.on_transform(transform.name(), &job.file);
            })?;

        let deps = self.deps.detector.detect(&source, &job.file)?;
        Ok(CachedModule { source, deps })
    }

    /// Transformed source and references of a job, plus whether it is noparse
    fn load_module(&self, job: &Job) -> Result<(CachedModule, bool)> {
        if job.noparse || self.noparse.matches(&job.file) {
            let raw = self.raw_source(job)?;
            return Ok((
                CachedModule {
                    source: raw,
                    deps: Vec::new(),
                },
                true,
            ));
        }

        // The module cache describes files as read from disk
        let from_disk = job.source.is_none();
        if from_disk {
            if let Some(module) = self.deps.cache.cached_module(&job.file) {
                Counters::bump(&self.counters.cache_hits);
                return Ok((module, false));
            }
        }

        let raw = self.raw_source(job)?;
        let plan = self
            .deps
            .pipeline
            .plan(&job.file, job.manifest.as_deref(), self.is_top_level(&job.file));

        let module = match &self.deps.persistent {
            Some(persistent) => {
                let key = PersistentKey {
                    file: &job.file,
                    id: &job.id,
                    manifest: job.manifest.as_deref(),
                    source: &raw,
                    plan: &plan,
                };
                let fallback = || self.transform_and_detect(job, raw.clone(), &plan);
                persistent.get_or_compute(key, Box::new(fallback))?
            }
            None => self.transform_and_detect(job, raw, &plan)?,
        };

        if from_disk {
            self.deps.cache.insert_module(job.file.clone(), module.clone());
        }
        Ok((module, false))
    }

    /// Process one claimed module and return the children it claimed
    fn run_job(&self, job: Job) -> Result<Vec<Job>> {
        if self.is_aborted() {
            return Ok(Vec::new());
        }

        let (module, noparse) = self.load_module(&job)?;

        let mut deps = BTreeMap::new();
        let mut children = Vec::new();
        for reference in &module.deps {
            if self.is_aborted() {
                return Ok(Vec::new());
            }
            if let Some(filter) = &self.deps.filter {
                if !filter(reference) {
                    continue;
                }
            }

            let resolved = match self.resolve_reference(reference, &job) {
                Ok(resolved) => resolved,
                Err(err) => {
                    self.tolerate(err, reference, &job.file)?;
                    deps.insert(reference.clone(), None);
                    continue;
                }
            };

            let resolved = resolved.filter(|module| match &self.deps.post_filter {
                Some(post_filter) => post_filter(&module.id, &module.file, module.manifest.as_deref()),
                None => true,
            });

            if let Some(module) = &resolved {
                children.push(module.clone());
            }
            deps.insert(reference.clone(), resolved);
        }

        let record = DependencyRecord {
            id: job.id,
            file: job.file,
            entry: job.entry,
            expose: job.expose,
            source: module.source,
            deps,
            noparse,
        };
        if !self.emit(record) {
            return Ok(Vec::new());
        }

        Ok(children
            .into_iter()
            .filter(|child| self.visited.insert(child.file.clone()))
            .map(Job::discovered)
            .collect())
    }
}

impl ManifestSource for WalkState {
    fn manifest_in(&self, dir: &Path) -> Result<Option<Arc<Manifest>>> {
        let (manifest, fresh) = self.deps.cache.load_package(dir, |manifest| match &self.deps.package_filter {
            Some(filter) => filter(manifest, dir),
            None => manifest,
        })?;

        if fresh {
            if let Some(manifest) = &manifest {
                self.deps.observers.on_package(manifest);
            }
        }
        Ok(manifest)
    }
}
