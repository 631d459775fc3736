//! End-to-end tests of the command line surface that need no AWS access.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;

fn lambda_deploy() -> Command {
    let mut cmd = Command::cargo_bin("lambda_deploy").unwrap();
    cmd.env_remove("LAMBDA_FUNCTION_NAME")
        .env_remove("S3_BUCKET_NAME")
        .env_remove("AWS_PROFILE");
    cmd
}

#[test]
fn help_lists_commands() {
    lambda_deploy()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy-s3"))
        .stdout(predicate::str::contains("deploy-image"))
        .stdout(predicate::str::contains("cleanup"));
}

#[test]
fn init_scaffolds_project() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("orders");

    lambda_deploy()
        .args(["init", "--name", "orders"])
        .arg(&project)
        .assert()
        .success();

    let config = std::fs::read_to_string(project.join("config.yaml")).unwrap();
    assert!(config.contains("function_name: orders"));
    assert!(project.join("service.py").is_file());
    assert!(project.join("event.json").is_file());
    assert!(project.join("requirements.txt").is_file());
}

#[test]
fn build_without_dependencies_writes_zip() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path();

    lambda_deploy()
        .args(["-q", "init", "--name", "orders"])
        .arg(project)
        .assert()
        .success();
    std::fs::create_dir(project.join("lib")).unwrap();
    std::fs::write(project.join("lib").join("helpers.py"), "X = 1\n").unwrap();

    lambda_deploy()
        .args(["build", "--no-deps"])
        .arg(project)
        .assert()
        .success();

    let zips: Vec<_> = std::fs::read_dir(project.join("dist"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "zip"))
        .collect();
    assert_eq!(zips.len(), 1);
    assert!(
        zips[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-orders.zip")
    );

    let archive = zip::ZipArchive::new(File::open(&zips[0]).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"service.py"));
    assert!(names.contains(&"lib/helpers.py"));
    assert!(!names.contains(&"config.yaml"));
}

#[test]
fn build_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    lambda_deploy()
        .args(["build", "--no-deps"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn cleanup_requires_keep_last() {
    lambda_deploy()
        .args(["cleanup", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--keep-last"));
}
