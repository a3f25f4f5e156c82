// tests/config_errors.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, VertexConfigBuilder};

use std::io::Write;
use std::time::Duration;

use dagwalk::config::{ConfigFile, load_and_validate};
use dagwalk::dag::DagGraph;
use dagwalk::errors::DagwalkError;
use dagwalk::meta::Gvk;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_is_loaded() {
    let file = write_config(
        r#"
[config]
heartbeat = "250ms"
timeout = "2m"
name = "release"

[vertex.fetch]
cmd = "git fetch"

[vertex.web]
cmd = "kubectl apply -f web.yaml"
after = ["fetch"]
api_version = "apps/v1"
kind = "Deployment"
fail_on_stdout = "^error"
env = { NAMESPACE = "prod" }
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.config.heartbeat(), Duration::from_millis(250));
    assert_eq!(cfg.config.timeout(), Some(Duration::from_secs(120)));
    assert_eq!(cfg.config.name.as_deref(), Some("release"));

    let web = &cfg.vertex["web"];
    assert_eq!(web.after, vec!["fetch"]);
    assert_eq!(web.identity("web"), Gvk::new("apps", "v1", "Deployment"));
    assert_eq!(web.env.get("NAMESPACE").map(String::as_str), Some("prod"));

    let graph = DagGraph::from_config(&cfg);
    assert_eq!(graph.roots(), vec!["fetch"]);
    assert_eq!(graph.dependents_of("fetch"), ["web".to_string()]);
}

#[test]
fn defaults_apply_when_config_section_is_missing() {
    let file = write_config(
        r#"
[vertex.only]
cmd = "true"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.config.heartbeat(), Duration::from_secs(5));
    assert_eq!(cfg.config.timeout(), None);
    assert!(cfg.vertex["only"].identity("only").is_empty());
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[vertex.A]
cmd = "echo A"
after = ["B"]

[vertex.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagwalkError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let file = write_config(
        r#"
[vertex.A]
cmd = "echo A"
after = ["Missing"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagwalkError::ConfigError(msg)) => assert!(msg.contains("unknown dependency")),
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn bad_duration_is_a_toml_error() {
    let file = write_config(
        r#"
[config]
heartbeat = "soon"

[vertex.A]
cmd = "echo A"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagwalkError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Dagwalk.toml");
    assert!(matches!(
        load_and_validate(&path),
        Err(DagwalkError::IoError(_))
    ));
}

fn config_error(raw: dagwalk::config::RawConfigFile) -> String {
    match ConfigFile::try_from(raw) {
        Err(DagwalkError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn semantic_checks_reject_bad_vertices() {
    let empty = ConfigFileBuilder::new().build_raw();
    assert!(config_error(empty).contains("at least one"));

    let zero_heartbeat = ConfigFileBuilder::new()
        .heartbeat("0s")
        .with_vertex("a", VertexConfigBuilder::new("true").build())
        .build_raw();
    assert!(config_error(zero_heartbeat).contains("heartbeat"));

    let blank_cmd = ConfigFileBuilder::new()
        .with_vertex("a", VertexConfigBuilder::new("  ").build())
        .build_raw();
    assert!(config_error(blank_cmd).contains("empty `cmd`"));

    let bad_regex = ConfigFileBuilder::new()
        .with_vertex("a", VertexConfigBuilder::new("true").fail_on_stdout("[").build())
        .build_raw();
    assert!(config_error(bad_regex).contains("fail_on_stdout"));

    let version_without_kind = ConfigFileBuilder::new()
        .with_vertex("a", VertexConfigBuilder::new("true").api_version("v1").build())
        .build_raw();
    assert!(config_error(version_without_kind).contains("without `kind`"));

    let self_dep = ConfigFileBuilder::new()
        .with_vertex("a", VertexConfigBuilder::new("true").after("a").build())
        .build_raw();
    assert!(config_error(self_dep).contains("itself"));

    let repeated = ConfigFileBuilder::new()
        .with_vertex("a", VertexConfigBuilder::new("true").build())
        .with_vertex("b", VertexConfigBuilder::new("true").after("a").after("a").build())
        .build_raw();
    assert!(config_error(repeated).contains("more than once"));
}
