//! In-memory and persistent caching across walks

use super::common::{by_file, dep_files, sorted, Fixture};
use mdeps::core::{Fallback, PersistentKey};
use mdeps::{
    CachedModule, DepsError, DiskCache, ErrorKind, InputRow, ModuleDeps, PersistentCache, Result,
    TransformPipeline, TransformRegistry, TransformSpec, WalkCache,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Persistent cache held in memory, counting how often it had to compute
#[derive(Default)]
struct CountingCache {
    entries: Mutex<HashMap<PathBuf, CachedModule>>,
    computed: AtomicUsize,
}

impl PersistentCache for CountingCache {
    fn get_or_compute(&self, key: PersistentKey<'_>, fallback: Fallback<'_>) -> Result<CachedModule> {
        if let Some(module) = self.entries.lock().get(key.file) {
            return Ok(module.clone());
        }
        self.computed.fetch_add(1, Ordering::SeqCst);
        let module = fallback()?;
        self.entries.lock().insert(key.file.to_path_buf(), module.clone());
        Ok(module)
    }
}

/// Persistent cache whose backing store is unavailable
struct BrokenCache;

impl PersistentCache for BrokenCache {
    fn get_or_compute(&self, key: PersistentKey<'_>, _fallback: Fallback<'_>) -> Result<CachedModule> {
        Err(DepsError::persistent_cache(key.file, "store unavailable"))
    }
}

fn counting_pipeline() -> TransformPipeline {
    let mut registry = TransformRegistry::new();
    registry.register_fn("noop", |source, _ctx| Ok(source));
    TransformPipeline::new(registry)
        .with_global_transforms(vec![TransformSpec::new("noop")], Default::default())
}

#[test]
fn test_shared_walk_cache_is_transparent() {
    let fixture = Fixture::four_module_project();
    let cache = Arc::new(WalkCache::new());

    let walk = || {
        ModuleDeps::new(fixture.root())
            .with_cache(Arc::clone(&cache))
            .walk(["main.js"])
            .unwrap()
            .collect_records()
            .unwrap()
    };

    let (first, first_stats) = walk();
    let (second, second_stats) = walk();

    assert_eq!(first_stats.files_read, 4);
    assert_eq!(second_stats.files_read, 0);
    assert!(second_stats.cache_hits > 0);
    assert_eq!(dep_files(&first), dep_files(&second));
    assert_eq!(sorted(first), sorted(second));
    assert!(cache.hits() > 0);
}

#[test]
fn test_preseeded_module_skips_read_and_detection() {
    let fixture = Fixture::new();
    fixture.write("main.js", "");
    fixture.write("util.js", "module.exports = 1;\n");

    let cache = Arc::new(WalkCache::new());
    cache.insert_module(
        fixture.path("main.js"),
        CachedModule {
            source: "require('./util');\n".to_string(),
            deps: vec!["./util".to_string()],
        },
    );

    let (records, stats) = ModuleDeps::new(fixture.root())
        .with_cache(cache)
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 2);
    let records = by_file(&records);
    let main = records[&fixture.path("main.js")];
    assert_eq!(main.source, "require('./util');\n");
    assert_eq!(main.dep_file("./util"), Some(fixture.path("util.js").as_path()));
    assert_eq!(stats.files_read, 1);
}

#[test]
fn test_preseeded_source_replaces_disk_content() {
    let fixture = Fixture::new();
    fixture.write("main.js", "module.exports = 'on disk';\n");

    let cache = Arc::new(WalkCache::new());
    cache.insert_file(fixture.path("main.js"), "module.exports = 'seeded';\n");

    let (records, stats) = ModuleDeps::new(fixture.root())
        .with_cache(cache)
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records[0].source, "module.exports = 'seeded';\n");
    assert_eq!(stats.files_read, 0);
}

#[test]
fn test_persistent_cache_fallback_runs_once_per_file() {
    let fixture = Fixture::four_module_project();
    let persistent = Arc::new(CountingCache::default());

    let walk = || {
        ModuleDeps::new(fixture.root())
            .with_persistent_cache(persistent.clone())
            .walk(["main.js"])
            .unwrap()
            .collect_records()
            .unwrap()
            .0
    };

    let first = walk();
    assert_eq!(persistent.computed.load(Ordering::SeqCst), 4);

    let second = walk();
    assert_eq!(persistent.computed.load(Ordering::SeqCst), 4);
    assert_eq!(sorted(first), sorted(second));
}

#[test]
fn test_disk_cache_reuse_and_invalidation() {
    let fixture = Fixture::four_module_project();
    let cache_dir = fixture.path(".cache");

    let walk = || {
        ModuleDeps::new(fixture.root())
            .with_pipeline(counting_pipeline())
            .with_persistent_cache(Arc::new(DiskCache::new(&cache_dir)))
            .walk(["main.js"])
            .unwrap()
            .collect_records()
            .unwrap()
    };

    let (_, stats) = walk();
    assert_eq!(stats.transforms_applied, 4);
    assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 4);

    let (_, stats) = walk();
    assert_eq!(stats.transforms_applied, 0);

    fixture.write("util.js", "module.exports = 'changed util';\n");
    let (records, stats) = walk();
    assert_eq!(stats.transforms_applied, 1);
    assert_eq!(
        by_file(&records)[&fixture.path("util.js")].source,
        "module.exports = 'changed util';\n"
    );
}

#[test]
fn test_disk_cache_follows_row_source() {
    let fixture = Fixture::new();
    fixture.write("main.js", "module.exports = 'disk';\n");
    fixture.write("other.js", "module.exports = 'other';\n");
    let cache_dir = fixture.path(".cache");

    let walk = |entry: InputRow| {
        ModuleDeps::new(fixture.root())
            .with_persistent_cache(Arc::new(DiskCache::new(&cache_dir)))
            .walk([entry])
            .unwrap()
            .collect_records()
            .unwrap()
            .0
    };

    let records = walk(InputRow::new("main.js"));
    assert_eq!(records[0].source, "module.exports = 'disk';\n");

    let records = walk(InputRow::new("main.js").with_source("require('./other');\n"));
    assert_eq!(records.len(), 2);
    let main = by_file(&records)[&fixture.path("main.js")];
    assert_eq!(main.source, "require('./other');\n");
    assert_eq!(main.dep_file("./other"), Some(fixture.path("other.js").as_path()));
}

#[test]
fn test_disk_cache_follows_seeded_source() {
    let fixture = Fixture::new();
    fixture.write("main.js", "module.exports = 'disk';\n");
    let cache_dir = fixture.path(".cache");

    let walk = |cache: Arc<WalkCache>| {
        ModuleDeps::new(fixture.root())
            .with_cache(cache)
            .with_persistent_cache(Arc::new(DiskCache::new(&cache_dir)))
            .walk(["main.js"])
            .unwrap()
            .collect_records()
            .unwrap()
            .0
    };

    walk(Arc::new(WalkCache::new()));

    let seeded = Arc::new(WalkCache::new());
    seeded.insert_file(fixture.path("main.js"), "module.exports = 'seeded';\n");
    let records = walk(seeded);
    assert_eq!(records[0].source, "module.exports = 'seeded';\n");
}

#[test]
fn test_disk_cache_follows_manifest_transforms() {
    let fixture = Fixture::new();
    fixture.write("package.json", r#"{ "name": "app", "browserify": { "transform": ["mark"] } }"#);
    fixture.write("main.js", "module.exports = 1;\n");
    let cache_dir = fixture.path(".cache");

    let walk = || {
        let mut registry = TransformRegistry::new();
        registry.register_fn("mark", |source, _ctx| Ok(format!("{}// mark\n", source)));
        let pipeline = TransformPipeline::new(registry)
            .with_transform_key(Some(vec!["browserify".to_string(), "transform".to_string()]));

        ModuleDeps::new(fixture.root())
            .with_pipeline(pipeline)
            .with_persistent_cache(Arc::new(DiskCache::new(&cache_dir)))
            .walk(["main.js"])
            .unwrap()
            .collect_records()
            .unwrap()
            .0
    };

    assert_eq!(walk()[0].source, "module.exports = 1;\n// mark\n");

    fixture.write("package.json", r#"{ "name": "app", "browserify": { "transform": [] } }"#);
    assert_eq!(walk()[0].source, "module.exports = 1;\n");
}

#[test]
fn test_noparse_ignores_cached_module() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./vendor/big');\n");
    fixture.write("vendor/big.js", "var big = 1;\n");

    let cache = Arc::new(WalkCache::new());
    cache.insert_module(
        fixture.path("vendor/big.js"),
        CachedModule {
            source: "require('./x');\n".to_string(),
            deps: vec!["./x".to_string()],
        },
    );

    let (records, _) = ModuleDeps::new(fixture.root())
        .with_cache(cache)
        .noparse(vec!["vendor/big.js".to_string()])
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 2);
    let big = by_file(&records)[&fixture.path("vendor/big.js")];
    assert!(big.noparse);
    assert!(big.deps.is_empty());
    assert_eq!(big.source, "var big = 1;\n");
}

#[test]
fn test_row_source_bypasses_module_cache() {
    let fixture = Fixture::four_module_project();
    let cache = Arc::new(WalkCache::new());

    let walk = |entry: InputRow| {
        ModuleDeps::new(fixture.root())
            .with_cache(Arc::clone(&cache))
            .walk([entry])
            .unwrap()
            .collect_records()
            .unwrap()
            .0
    };

    assert_eq!(walk(InputRow::new("main.js")).len(), 4);

    let records = walk(InputRow::new("main.js").with_source("require('./util');\n"));
    assert_eq!(records.len(), 2);
    assert_eq!(by_file(&records)[&fixture.path("main.js")].source, "require('./util');\n");

    // The disk-backed entry is still served from the module cache
    let records = walk(InputRow::new("main.js"));
    assert_eq!(records.len(), 4);
    assert_eq!(
        by_file(&records)[&fixture.path("main.js")].source,
        "var util = require('./util');\nvar lib = require('lib');\n"
    );
}

#[test]
fn test_persistent_cache_error_is_fatal() {
    let fixture = Fixture::new();
    fixture.write("main.js", "");

    let err = ModuleDeps::new(fixture.root())
        .with_persistent_cache(Arc::new(BrokenCache))
        .ignore_missing(true)
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PersistentCache);
    assert_eq!(err.file(), Some(fixture.path("main.js").as_path()));
}
