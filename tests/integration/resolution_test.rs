//! Resolution through manifests, browser fields and search paths

use super::common::{by_file, Fixture};
use mdeps::{DepsError, Manifest, ModuleDeps, ResolveContext, ResolvedModule, Resolver, Result};
use std::path::{Path, PathBuf};

#[test]
fn test_browser_false_disables_a_package() {
    let fixture = Fixture::new();
    fixture.write("package.json", r#"{ "name": "app", "browser": { "fs": false } }"#);
    fixture.write("main.js", "var fs = require('fs');\n");

    let (records, stats) = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].deps["fs"], None);
    assert_eq!(stats.missing, 0);
}

#[test]
fn test_browser_map_replaces_a_file() {
    let fixture = Fixture::new();
    fixture.write(
        "package.json",
        r#"{ "name": "app", "browser": { "./lib/node.js": "./lib/browser.js" } }"#,
    );
    fixture.write("main.js", "require('./lib/node');\n");
    fixture.write("lib/node.js", "require('fs');\n");
    fixture.write("lib/browser.js", "module.exports = window;\n");

    let (records, _) = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 2);
    let records = by_file(&records);
    assert_eq!(
        records[&fixture.path("main.js")].dep_file("./lib/node"),
        Some(fixture.path("lib/browser.js").as_path())
    );
    assert!(!records.contains_key(&fixture.path("lib/node.js")));
}

#[test]
fn test_browser_map_replaces_a_package() {
    let fixture = Fixture::new();
    fixture.write("package.json", r#"{ "browser": { "events": "./shims/events.js" } }"#);
    fixture.write("main.js", "require('events');\n");
    fixture.write("shims/events.js", "");

    let (records, _) = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    let main = by_file(&records)[&fixture.path("main.js")].clone();
    assert_eq!(main.dep_file("events"), Some(fixture.path("shims/events.js").as_path()));
}

#[test]
fn test_browser_string_replaces_main() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('dual');\n");
    fixture.write(
        "node_modules/dual/package.json",
        r#"{ "name": "dual", "main": "node.js", "browser": "browser.js" }"#,
    );
    fixture.write("node_modules/dual/node.js", "");
    fixture.write("node_modules/dual/browser.js", "");

    let (records, _) = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    let main = by_file(&records)[&fixture.path("main.js")].clone();
    assert_eq!(
        main.dep_file("dual"),
        Some(fixture.path("node_modules/dual/browser.js").as_path())
    );
}

#[test]
fn test_directory_index() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./widgets');\nrequire('plain');\n");
    fixture.write("widgets/index.js", "");
    fixture.write("node_modules/plain/index.js", "");

    let (records, _) = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    let main = by_file(&records)[&fixture.path("main.js")].clone();
    assert_eq!(main.dep_file("./widgets"), Some(fixture.path("widgets/index.js").as_path()));
    assert_eq!(
        main.dep_file("plain"),
        Some(fixture.path("node_modules/plain/index.js").as_path())
    );
}

#[test]
fn test_nested_node_modules_lookup() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('outer');\n");
    fixture.write("node_modules/outer/index.js", "require('inner');\n");
    fixture.write("node_modules/inner/index.js", "");

    let (records, _) = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 3);
    let outer = by_file(&records)[&fixture.path("node_modules/outer/index.js")].clone();
    assert_eq!(
        outer.dep_file("inner"),
        Some(fixture.path("node_modules/inner/index.js").as_path())
    );
}

#[test]
fn test_custom_extensions() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./typed');\n");
    fixture.write("typed.ts", "export const answer: number = 42;\n");

    let (records, _) = ModuleDeps::new(fixture.root())
        .extensions(vec![".js".to_string(), ".ts".to_string()])
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    let main = by_file(&records)[&fixture.path("main.js")].clone();
    assert_eq!(main.dep_file("./typed"), Some(fixture.path("typed.ts").as_path()));
}

#[test]
fn test_unlisted_extension_is_missing() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./typed');\n");
    fixture.write("typed.ts", "");

    let err = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap_err();

    assert!(matches!(err, DepsError::Resolution { .. }));
}

#[test]
fn test_global_search_paths() {
    let fixture = Fixture::new();
    fixture.write("app/main.js", "require('helper');\n");
    fixture.write("shared/helper.js", "");

    let (records, _) = ModuleDeps::new(fixture.root())
        .paths(vec![fixture.path("shared")])
        .walk(["app/main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    let main = by_file(&records)[&fixture.path("app/main.js")].clone();
    assert_eq!(main.dep_file("helper"), Some(fixture.path("shared/helper.js").as_path()));
}

#[test]
fn test_package_filter_rewrites_manifests() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('lib');\n");
    fixture.write("node_modules/lib/package.json", r#"{ "name": "lib", "main": "old.js" }"#);
    fixture.write("node_modules/lib/old.js", "");
    fixture.write("node_modules/lib/new.js", "");

    let (records, _) = ModuleDeps::new(fixture.root())
        .with_package_filter(|mut manifest: Manifest, _dir: &Path| {
            if manifest.name.as_deref() == Some("lib") {
                manifest.main = Some("new.js".to_string());
            }
            manifest
        })
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    let main = by_file(&records)[&fixture.path("main.js")].clone();
    assert_eq!(main.dep_file("lib"), Some(fixture.path("node_modules/lib/new.js").as_path()));
}

/// Maps `virtual:` references into a generated directory
struct VirtualResolver {
    generated: PathBuf,
}

impl Resolver for VirtualResolver {
    fn resolve(&self, reference: &str, ctx: &ResolveContext<'_>) -> Result<Option<ResolvedModule>> {
        let file = match reference.strip_prefix("virtual:") {
            Some(name) => self.generated.join(format!("{}.js", name)),
            None => PathBuf::from(reference),
        };
        if !file.is_file() {
            return Err(DepsError::resolution(reference, ctx.parent));
        }
        Ok(Some(ResolvedModule::new(reference, file, None)))
    }
}

#[test]
fn test_custom_resolver() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('virtual:config');\n");
    fixture.write("generated/config.js", "");

    let (records, _) = ModuleDeps::new(fixture.root())
        .with_resolver(VirtualResolver {
            generated: fixture.path("generated"),
        })
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 2);
    let records = by_file(&records);
    assert_eq!(
        records[&fixture.path("main.js")].dep_file("virtual:config"),
        Some(fixture.path("generated/config.js").as_path())
    );
}
