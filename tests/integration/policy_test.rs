//! Missing-module policy, filters and noparse handling

use super::common::{by_file, Fixture};
use mdeps::{DepsError, ErrorKind, InputRow, ModuleDeps, WalkEvent};

#[test]
fn test_missing_reference_fails_the_walk() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./util');\n");
    fixture.write("util.js", "require('./nope');\n");

    let err = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    match err {
        DepsError::Resolution { reference, from } => {
            assert_eq!(reference, "./nope");
            assert_eq!(from, fixture.path("util.js"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_error_terminates_the_stream() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./a');\nrequire('./b');\n");
    fixture.write("a.js", "require('missing-package');\n");
    fixture.write("b.js", "");

    let items: Vec<_> = ModuleDeps::new(fixture.root())
        .walk(["main.js"])
        .unwrap()
        .collect();

    let errors = items.iter().filter(|item| item.is_err()).count();
    assert_eq!(errors, 1);
    assert!(items.last().unwrap().is_err());
}

#[test]
fn test_missing_entry_fails_the_walk() {
    let fixture = Fixture::new();

    let err = ModuleDeps::new(fixture.root())
        .walk(["nothing-here.js"])
        .unwrap()
        .collect_records()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
}

#[test]
fn test_ignore_missing_records_absent_dependency() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./util');\nrequire('not-installed');\n");
    fixture.write("util.js", "");

    let stream = ModuleDeps::new(fixture.root())
        .ignore_missing(true)
        .with_events(true)
        .walk(["main.js"])
        .unwrap();
    let events = stream.events().unwrap().clone();
    let (records, stats) = stream.collect_records().unwrap();

    assert_eq!(records.len(), 2);
    let records = by_file(&records);
    let main = records[&fixture.path("main.js")];
    assert_eq!(main.deps["not-installed"], None);
    assert_eq!(main.dep_file("./util"), Some(fixture.path("util.js").as_path()));
    assert_eq!(stats.missing, 1);

    let missing: Vec<_> = events
        .try_iter()
        .filter_map(|event| match event {
            WalkEvent::Missing { reference, parent } => Some((reference, parent)),
            _ => None,
        })
        .collect();
    assert_eq!(missing, vec![("not-installed".to_string(), fixture.path("main.js"))]);
}

#[test]
fn test_ignore_missing_still_fails_on_syntax_errors() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./broken');\n");
    fixture.write("broken.js", "var = require(;\n");

    let err = ModuleDeps::new(fixture.root())
        .ignore_missing(true)
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Detection);
    assert_eq!(err.file(), Some(fixture.path("broken.js").as_path()));
}

#[test]
fn test_filter_leaves_references_out() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('fs');\nrequire('./util');\n");
    fixture.write("util.js", "");

    let (records, stats) = ModuleDeps::new(fixture.root())
        .with_filter(|reference: &str| reference != "fs")
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 2);
    let main = by_file(&records)[&fixture.path("main.js")].clone();
    assert!(!main.deps.contains_key("fs"));
    assert_eq!(stats.missing, 0);
}

#[test]
fn test_post_filter_marks_module_absent() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./keep');\nrequire('./skip');\n");
    fixture.write("keep.js", "");
    fixture.write("skip.js", "require('./never');\n");
    fixture.write("never.js", "");

    let (records, stats) = ModuleDeps::new(fixture.root())
        .with_post_filter(|_id, file, _manifest| !file.ends_with("skip.js"))
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 2);
    let records = by_file(&records);
    let main = records[&fixture.path("main.js")];
    assert_eq!(main.deps["./skip"], None);
    assert!(!records.contains_key(&fixture.path("skip.js")));
    assert!(!records.contains_key(&fixture.path("never.js")));
    assert_eq!(stats.missing, 0);
}

#[test]
fn test_noparse_by_path() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./vendor/big');\n");
    fixture.write("vendor/big.js", "require('./not-followed');\n");

    let (records, _) = ModuleDeps::new(fixture.root())
        .noparse(vec!["vendor/big.js".to_string()])
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 2);
    let records = by_file(&records);
    let big = records[&fixture.path("vendor/big.js")];
    assert!(big.noparse);
    assert!(big.deps.is_empty());
    assert_eq!(big.source, "require('./not-followed');\n");
    assert!(!records[&fixture.path("main.js")].noparse);
}

#[test]
fn test_noparse_by_glob() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./vendor/a.min');\n");
    fixture.write("vendor/a.min.js", "this is not even javascript (\n");

    let (records, _) = ModuleDeps::new(fixture.root())
        .noparse(vec!["**/*.min.js".to_string()])
        .walk(["main.js"])
        .unwrap()
        .collect_records()
        .unwrap();

    let records = by_file(&records);
    assert!(records[&fixture.path("vendor/a.min.js")].noparse);
}

#[test]
fn test_noparse_entry_row() {
    let fixture = Fixture::new();
    fixture.write("bundle.js", "require('./elsewhere');\n");

    let (records, _) = ModuleDeps::new(fixture.root())
        .walk([InputRow::new("bundle.js").noparse(true)])
        .unwrap()
        .collect_records()
        .unwrap();

    assert_eq!(records.len(), 1);
    assert!(records[0].noparse);
    assert!(records[0].deps.is_empty());
}
