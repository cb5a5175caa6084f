//! The command-line walk: settings in, formatted records out

use super::common::Fixture;
use mdeps::cli::{exit_code, walk};
use mdeps::config::{load_config_with_env_prefix, CliArgs};
use mdeps::models::OutputFormat;
use mdeps::{ErrorKind, Settings, TransformRegistry};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn settings(fixture: &Fixture, format: OutputFormat, output: PathBuf) -> Settings {
    Settings {
        basedir: fixture.root().to_path_buf(),
        entries: vec!["./main.js".to_string()],
        output_format: format,
        output_file: Some(output),
        quiet: true,
        use_colors: false,
        show_progress: false,
        concurrency: 2,
        ..Settings::default()
    }
}

#[test]
fn test_walk_writes_ndjson() {
    let fixture = Fixture::four_module_project();
    let output = fixture.path("out/deps.ndjson");
    fs::create_dir_all(fixture.path("out")).unwrap();

    walk(
        &settings(&fixture, OutputFormat::Ndjson, output.clone()),
        TransformRegistry::new(),
    )
    .unwrap();

    let content = fs::read_to_string(&output).unwrap();
    let rows: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 4);

    let main_file = fixture.path("main.js").to_string_lossy().into_owned();
    let main = rows.iter().find(|row| row["file"] == main_file.as_str()).unwrap();
    assert_eq!(main["entry"], true);
    let util_file = fixture.path("util.js").to_string_lossy().into_owned();
    assert_eq!(main["deps"]["./util"], util_file.as_str());
    assert!(main.get("noparse").is_none());
}

#[test]
fn test_walk_writes_json_array() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./a');\nrequire('gone');\n");
    fixture.write("a.js", "");
    let output = fixture.path("deps.json");

    let mut settings = settings(&fixture, OutputFormat::Json, output.clone());
    settings.ignore_missing = true;
    walk(&settings, TransformRegistry::new()).unwrap();

    let rows: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let main_file = fixture.path("main.js").to_string_lossy().into_owned();
    let main = rows.iter().find(|row| row["file"] == main_file.as_str()).unwrap();
    assert_eq!(main["deps"]["gone"], false);
}

#[test]
fn test_walk_writes_text() {
    let fixture = Fixture::four_module_project();
    let output = fixture.path("deps.txt");

    let mut settings = settings(&fixture, OutputFormat::Text, output.clone());
    settings.quiet = false;
    walk(&settings, TransformRegistry::new()).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains(&fixture.path("main.js").display().to_string()));
    assert!(content.contains("./util ->"));
}

#[test]
fn test_walk_failure_maps_to_exit_code_one() {
    let fixture = Fixture::new();
    fixture.write("main.js", "require('./nope');\n");

    let err = walk(
        &settings(&fixture, OutputFormat::Ndjson, fixture.path("deps.ndjson")),
        TransformRegistry::new(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert_eq!(exit_code(&err), 1);
}

#[test]
fn test_missing_entries_map_to_exit_code_two() {
    let fixture = Fixture::new();
    let mut settings = settings(&fixture, OutputFormat::Json, fixture.path("deps.json"));
    settings.entries.clear();

    let err = walk(&settings, TransformRegistry::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(exit_code(&err), 2);
}

#[test]
fn test_config_file_drives_the_walk() {
    let fixture = Fixture::new();
    fixture.write("src/main.js", "require('./lib/helper');\nrequire('absent');\n");
    fixture.write("src/lib/helper.js", "");
    let output = fixture.path("deps.ndjson");

    let config = format!(
        r#"
        basedir = "{}"
        entries = ["./main.js"]
        ignore_missing = true
        output_format = "ndjson"
        show_progress = false
        "#,
        fixture.path("src").display()
    );
    let config_path = fixture.write("mdeps.toml", &config);

    let cli_args = CliArgs {
        config: Some(config_path),
        output_file: Some(output.clone()),
        quiet: true,
        no_colors: true,
        no_progress: true,
        ..CliArgs::default()
    };
    let settings = load_config_with_env_prefix(cli_args, "MDEPS_CLI_TEST").unwrap();

    assert_eq!(settings.basedir, fixture.path("src"));
    assert!(settings.ignore_missing);
    assert_eq!(settings.output_format, OutputFormat::Ndjson);

    walk(&settings, TransformRegistry::new()).unwrap();

    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn test_cli_overrides_config_file() {
    let fixture = Fixture::new();
    fixture.write("main.js", "");
    let config_path = fixture.write(
        "mdeps.toml",
        "output_format = \"json\"\nconcurrency = 3\n",
    );

    let cli_args = CliArgs {
        basedir: Some(fixture.root().to_path_buf()),
        entries: vec!["main.js".to_string()],
        output_format: Some(OutputFormat::Text),
        config: Some(config_path),
        ..CliArgs::default()
    };
    let settings = load_config_with_env_prefix(cli_args, "MDEPS_CLI_OVERRIDE").unwrap();

    assert_eq!(settings.output_format, OutputFormat::Text);
    assert_eq!(settings.concurrency, 3);
    assert_eq!(settings.entries, vec!["main.js".to_string()]);
}

#[test]
fn test_unknown_config_file() {
    let fixture = Fixture::new();
    let cli_args = CliArgs {
        config: Some(fixture.path("nowhere.toml")),
        ..CliArgs::default()
    };

    let err = load_config_with_env_prefix(cli_args, "MDEPS_CLI_MISSING").unwrap_err();
    assert_eq!(exit_code(&err), 2);
}
