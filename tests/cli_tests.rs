use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const PROJECT: &str = include_str!("fixtures/project.yaml");
const PROJECT_BUMPED: &str = include_str!("fixtures/project_bumped.yaml");
const CHART: &str = include_str!("fixtures/Chart.yaml");

fn run(bin: &str, dir: &Path, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env_remove("BUMP_BRANCH")
        .env_remove("BUMP_STRICT")
        .env("RUST_LOG", "info")
        .output()
        .unwrap()
}

#[test]
fn test_bumpso_default_path() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("olm-catalog/serverless-operator");
    fs::create_dir_all(&catalog).unwrap();
    fs::write(catalog.join("project.yaml"), PROJECT).unwrap();

    let output = run(env!("CARGO_BIN_EXE_bumpso"), dir.path(), &[]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(catalog.join("project.yaml")).unwrap(),
        PROJECT_BUMPED
    );
}

#[test]
fn test_bumpso_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project.yaml");
    fs::write(&project, PROJECT).unwrap();

    let output = run(
        env!("CARGO_BIN_EXE_bumpso"),
        dir.path(),
        &["--project-path", project.to_str().unwrap(), "--dry-run"],
    );
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), PROJECT_BUMPED);
    assert_eq!(fs::read_to_string(&project).unwrap(), PROJECT);
}

#[test]
fn test_bumpso_strict_fails_on_missing_field() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project.yaml");
    let input = "project:\n  version: 1.30.0\n";
    fs::write(&project, input).unwrap();

    let output = run(
        env!("CARGO_BIN_EXE_bumpso"),
        dir.path(),
        &["--project-path", project.to_str().unwrap(), "--strict"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Key not found"));
    assert_eq!(fs::read_to_string(&project).unwrap(), input);
}

#[test]
fn test_bumpistiochart_branch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Chart.yaml"), CHART).unwrap();

    let output = run(
        env!("CARGO_BIN_EXE_bumpistiochart"),
        dir.path(),
        &["--branch", "release-1.32"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("Chart.yaml")).unwrap(),
        CHART.replace("\"1.30.0\"", "\"1.33.0\"")
    );
}

#[test]
fn test_bumpistiochart_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(env!("CARGO_BIN_EXE_bumpistiochart"), dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read file"));
}

#[test]
fn test_bumpistiochart_rejects_invalid_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let chart = dir.path().join("Chart.yaml");
    fs::write(&chart, "version: [1.30.0\n").unwrap();

    let output = run(env!("CARGO_BIN_EXE_bumpistiochart"), dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to decode"));
    assert_eq!(fs::read_to_string(&chart).unwrap(), "version: [1.30.0\n");
}
