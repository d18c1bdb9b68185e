// tests/config_loading.rs

use std::error::Error;
use std::io::Write;

use tempfile::NamedTempFile;

use stagedag::bootstrap::build_graph;
use stagedag::config::{default_config_path, load_and_validate, parse_str};
use stagedag::dag::Strength;
use stagedag::errors::StagedagError;
use stagedag::types::{DepsMode, FileEncoding};
use stagedag_test_utils::builders::{ConfigFileBuilder, StageConfigBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn write_stage_file(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn loads_a_valid_stage_file() -> TestResult {
    let file = write_stage_file(
        r#"
[config]
enable_init = true

[stage.mounts]
commands = ["true"]
fatal = true

[stage.network]
commands = ["true", "true"]
after = ["mounts"]
deps_mode = "weak"
background = true
"#,
    )?;

    let cfg = load_and_validate(file.path())?;

    assert!(cfg.config.enable_init);
    assert!(!cfg.config.collect_orphans);
    assert!(cfg.stage["mounts"].fatal);
    let network = &cfg.stage["network"];
    assert_eq!(network.commands.len(), 2);
    assert_eq!(network.after, vec!["mounts"]);
    assert_eq!(network.deps_mode, DepsMode::Weak);
    assert!(network.background);
    Ok(())
}

#[test]
fn stage_files_are_parsed_with_their_encoding() -> TestResult {
    let cfg = stagedag::config::ConfigFile::try_from(parse_str(
        r#"
[stage.motd]
commands = ["cat /etc/motd"]

[[stage.motd.files]]
path = "/etc/motd"
content = "SGVsbG8K"
encoding = "b64"
permissions = 0o644

[[stage.motd.files]]
path = "/etc/issue"
content = "plain text"
"#,
    )?)?;

    let files = &cfg.stage["motd"].files;
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].encoding, FileEncoding::Base64);
    assert_eq!(files[0].permissions, Some(0o644));
    assert_eq!(files[1].encoding, FileEncoding::Plain);
    assert_eq!(files[1].permissions, None);
    Ok(())
}

#[test]
fn default_stage_file_is_in_the_working_directory() {
    assert_eq!(default_config_path(), std::path::PathBuf::from("stages.toml"));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_and_validate("/definitely/not/here/stages.toml").expect_err("no such file");
    assert!(matches!(err, StagedagError::IoError(_)));
}

#[test]
fn malformed_toml_is_rejected() -> TestResult {
    let file = write_stage_file("[stage.a\ncommands = [")?;
    let err = load_and_validate(file.path()).expect_err("broken TOML");
    assert!(matches!(err, StagedagError::TomlError(_)));
    Ok(())
}

#[test]
fn unknown_deps_mode_is_rejected() {
    let err = parse_str(
        r#"
[stage.a]
commands = ["true"]
deps_mode = "sometimes"
"#,
    )
    .expect_err("invalid deps_mode");
    assert!(matches!(err, StagedagError::TomlError(_)));
}

#[test]
fn cyclic_stage_file_is_rejected() -> TestResult {
    let file = write_stage_file(
        r#"
[stage.a]
commands = ["true"]
after = ["b"]

[stage.b]
commands = ["true"]
weak_after = ["a"]
"#,
    )?;

    match load_and_validate(file.path()) {
        Err(StagedagError::DagCycle(names)) => assert_eq!(names, vec!["a", "b"]),
        other => panic!("expected DagCycle, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_dependency_is_a_config_error() -> TestResult {
    let file = write_stage_file(
        r#"
[stage.a]
commands = ["true"]
after = ["ghost"]
"#,
    )?;

    let err = load_and_validate(file.path()).expect_err("unknown dependency");
    assert!(matches!(err, StagedagError::ConfigError(_)));
    assert!(err.to_string().contains("unknown dependency 'ghost'"));
    Ok(())
}

#[test]
fn empty_stage_file_is_rejected() -> TestResult {
    let file = write_stage_file("[config]\nenable_init = true\n")?;
    let err = load_and_validate(file.path()).expect_err("no stages");
    assert!(matches!(err, StagedagError::ConfigError(_)));
    Ok(())
}

#[test]
fn build_graph_mirrors_the_stage_file() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .enable_init(true)
        .with_stage("base", StageConfigBuilder::new().command("true").build())
        .with_stage(
            "app",
            StageConfigBuilder::new()
                .command("true")
                .after("base")
                .weak_after("cache")
                .fatal()
                .build(),
        )
        .with_stage("cache", StageConfigBuilder::new().command("true").build())
        .with_stage("logger", StageConfigBuilder::new().command("true").build())
        .build();

    let graph = build_graph(&cfg, cfg.config.graph_options())?;

    assert_eq!(graph.len(), 4);
    assert!(graph.options().enable_init);
    assert_eq!(graph.layers()?.len(), 2);

    let mut deps = graph.dependencies_of("app");
    deps.sort_by_key(|(name, _)| *name);
    assert_eq!(
        deps,
        vec![("base", Strength::Mandatory), ("cache", Strength::Advisory)]
    );
    assert_eq!(graph.dependents_of("base"), vec!["app"]);
    Ok(())
}
