use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn pkgxml(workspace: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("pkgxml").expect("binary exists");
    cmd.env_remove("PKGXML_API_VERSION")
        .env_remove("PKGXML_DEBUG")
        .env("PKGXML_WORKSPACE", workspace)
        .current_dir(workspace);
    cmd
}

#[test]
fn help_displays_usage() {
    Command::cargo_bin("pkgxml")
        .expect("binary exists")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("combine"));
}

#[test]
fn create_writes_default_manifest() {
    let temp = tempfile::tempdir().unwrap();
    pkgxml(temp.path())
        .args(["create", ".", "--api-version", "57"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let xml = fs::read_to_string(temp.path().join("package.xml")).unwrap();
    assert!(xml.contains("<members>*</members>"));
    assert!(xml.contains("<version>57.0</version>"));
}

#[test]
fn combine_with_output_skips_prompts() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp.path().join("one")).unwrap();
    fs::write(
        temp.path().join("one/package.xml"),
        "<Package><types><members>Foo</members><name>ApexClass</name></types></Package>",
    )
    .unwrap();

    pkgxml(temp.path())
        .args(["combine", "one", "--output", "out/combined.xml", "--yes"])
        .assert()
        .success();

    let xml = fs::read_to_string(temp.path().join("out/combined.xml")).unwrap();
    assert!(xml.contains("<name>ApexClass</name>"));
}

#[test]
fn combine_reports_nothing_to_combine() {
    let temp = tempfile::tempdir().unwrap();
    pkgxml(temp.path())
        .args(["combine", ".", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No available package.xml"));
}

#[test]
fn reload_without_catalog_fails() {
    let temp = tempfile::tempdir().unwrap();
    pkgxml(temp.path())
        .arg("reload")
        .assert()
        .failure()
        .stderr(predicate::str::contains("metadata catalog not found"));
}

#[test]
fn reload_builds_universe_cache() {
    let temp = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp.path().join(".config")).unwrap();
    fs::write(
        temp.path().join(".config/metadata.json"),
        r#"{"metadataObjects":[{"xmlName":"CustomObject","childXmlNames":["CustomField"]}]}"#,
    )
    .unwrap();

    pkgxml(temp.path())
        .arg("reload")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reloaded 2 metadata types"));
    assert!(temp.path().join(".config/package.json").is_file());
}

#[test]
fn retrieve_prints_request_json() {
    let temp = tempfile::tempdir().unwrap();
    let manifest = temp.path().join("package.xml");
    fs::write(
        &manifest,
        "<Package><types><members>Foo</members><name>ApexClass</name></types></Package>",
    )
    .unwrap();
    let extract_to = temp.path().join("retrieved");

    pkgxml(temp.path())
        .arg("retrieve")
        .arg(&manifest)
        .arg("--extract-to")
        .arg(&extract_to)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ApexClass\""))
        .stdout(predicate::str::contains("\"api_version\": 52"));
}

#[test]
fn completions_are_generated() {
    Command::cargo_bin("pkgxml")
        .expect("binary exists")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pkgxml"));
}
