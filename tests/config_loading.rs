// tests/config_loading.rs
mod common;
use crate::common::builders::{ConfigFileBuilder, TaskSpecBuilder};

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flue::config::{ConfigFile, load_and_validate};
use flue::errors::FlueError;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(result: Result<ConfigFile, FlueError>, needle: &str) {
    match result {
        Err(FlueError::Config(msg)) => {
            assert!(msg.contains(needle), "'{msg}' should mention '{needle}'");
        }
        Err(e) => panic!("Expected Config error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn full_config_loads() {
    let file = write_config(
        r#"
[config]
jobs = 3
poll_interval_ms = 250
reload_patterns = ["*.coffee"]
restart_patterns = ["Flue.toml"]
use_hash = true

[task."build/app.js"]
compiler = "coffee"
sources = ["src/a.coffee", "src/b.coffee"]

[task."build/app.min.js"]
compiler = "uglify"
sources = ["build/app.js"]
flags = { source_map = "build/app.min.js.map" }

[task."build/stamp"]
compiler = "command"
cmd = "touch build/stamp"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.jobs(), 3);
    assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
    assert_eq!(cfg.tasks().len(), 3);
    assert!(cfg.config().use_hash);

    let root = Path::new("/project");
    let tasks = cfg.build_tasks(root).unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t.artifact()).collect();
    assert_eq!(ids, vec!["build/app.js", "build/app.min.js", "build/stamp"]);
    assert_eq!(tasks[1].sources(), ["build/app.js".to_string()]);

    let opts = cfg.watch_options(root);
    assert_eq!(opts.root, PathBuf::from("/project"));
    assert_eq!(opts.reload_patterns, Some(vec!["*.coffee".to_string()]));
    assert_eq!(opts.restart_patterns, vec!["Flue.toml".to_string()]);
    assert!(opts.use_hash);
}

#[test]
fn defaults_apply_when_config_section_is_missing() {
    let file = write_config(
        r#"
[task."out.js"]
compiler = "coffee"
sources = ["in.coffee"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert!(cfg.jobs() >= 1);
    assert_eq!(cfg.poll_interval(), Duration::from_millis(100));
    assert!(cfg.config().reload_patterns.is_none());
    assert!(cfg.config().restart_patterns.is_empty());
}

#[test]
fn root_dir_follows_config_location_and_directory() {
    let cfg = ConfigFileBuilder::new()
        .with_task("out.js", TaskSpecBuilder::new("coffee").build())
        .build();
    assert_eq!(
        cfg.root_dir(Path::new("/work/site/Flue.toml")),
        PathBuf::from("/work/site")
    );
    assert_eq!(cfg.root_dir(Path::new("Flue.toml")), PathBuf::from("."));

    let cfg = ConfigFileBuilder::new()
        .directory("assets")
        .with_task("out.js", TaskSpecBuilder::new("coffee").build())
        .build();
    assert_eq!(
        cfg.root_dir(Path::new("/work/site/Flue.toml")),
        PathBuf::from("/work/site/assets")
    );
}

#[test]
fn empty_config_is_rejected() {
    let file = write_config("[config]\njobs = 2\n");
    expect_config_error(load_and_validate(file.path()), "at least one");
}

#[test]
fn zero_jobs_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .jobs(0)
        .with_task("out.js", TaskSpecBuilder::new("coffee").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "jobs");
}

#[test]
fn zero_poll_interval_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .poll_interval_ms(0)
        .with_task("out.js", TaskSpecBuilder::new("coffee").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "poll_interval_ms");
}

#[test]
fn invalid_glob_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .restart_pattern("[unclosed")
        .with_task("out.js", TaskSpecBuilder::new("coffee").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "restart_patterns");
}

#[test]
fn unknown_compiler_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task("out.js", TaskSpecBuilder::new("webpack").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "unknown compiler");
}

#[test]
fn command_without_cmd_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task("out.txt", TaskSpecBuilder::new("command").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "cmd");
}

#[test]
fn unknown_flag_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task(
            "out.js",
            TaskSpecBuilder::new("coffee").flag("bare", "true").build(),
        )
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "unknown flag 'bare'");
}

#[test]
fn cycles_are_not_a_config_error() {
    let cfg = ConfigFileBuilder::new()
        .with_task("a.js", TaskSpecBuilder::command("true").source("b.js").build())
        .with_task("b.js", TaskSpecBuilder::command("true").source("a.js").build())
        .build();

    let tasks = cfg.build_tasks(Path::new(".")).unwrap();
    let err = flue::dag::Scheduler::new().load(tasks).run().unwrap_err();
    assert!(matches!(err, FlueError::CyclicDependency { .. }));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[task.\"out.js\"\ncompiler = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(FlueError::Toml(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Flue.toml"),
        Err(FlueError::Io(_))
    ));
}
