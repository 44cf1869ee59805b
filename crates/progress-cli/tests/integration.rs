#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const BASE_URL: &str = "https://progress.example.com";

fn write_config(dir: &TempDir) -> PathBuf {
    let file = dir.path().join("progress.yaml");
    std::fs::write(
        &file,
        format!(
            "version: 1\n\
             store:\n  path: progress.redb\n\
             publish:\n  type: dir\n  path: site\n  base_url: {BASE_URL}\n"
        ),
    )
    .unwrap();
    file
}

fn progress(dir: &TempDir) -> Command {
    let config = write_config(dir);
    let mut cmd = Command::cargo_bin("progress").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("PROGRESS_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

fn site(dir: &TempDir, key: &str) -> PathBuf {
    dir.path().join("site").join(key)
}

fn read_site(dir: &TempDir, key: &str) -> String {
    std::fs::read_to_string(site(dir, key)).unwrap()
}

// ---------------------------------------------------------------------------
// Menu loop
// ---------------------------------------------------------------------------

#[test]
fn exit_prints_goodbye() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Write Progress"))
        .stdout(predicate::str::contains("6. Exit"))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn invalid_choice_reprompts() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("7\nabc\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid option. Please try again.").count(2));
}

#[test]
fn end_of_input_exits_cleanly() {
    let dir = TempDir::new().unwrap();
    progress(&dir).write_stdin("").assert().success();
}

#[test]
fn missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("progress")
        .unwrap()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("--config")
        .arg(dir.path().join("missing.yaml"))
        .write_stdin("6\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

// ---------------------------------------------------------------------------
// Create / write progress
// ---------------------------------------------------------------------------

#[test]
fn create_item_publishes_item_page_and_homepage() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nalpha\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Item alpha created."));

    let page = read_site(&dir, "alpha/index.html");
    assert!(page.contains("Progress for alpha"));
    assert_eq!(page.matches("<tr><td><time").count(), 1);

    let home = read_site(&dir, "index.html");
    assert!(home.contains(&format!("{BASE_URL}/alpha/index.html")));
    assert!(home.contains("<td>0</td>"));
}

#[test]
fn duplicate_create_is_rejected() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nalpha\n2\nalpha\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("error: item already exists: alpha"));

    let page = read_site(&dir, "alpha/index.html");
    assert_eq!(page.matches("<tr><td><time").count(), 1);
}

#[test]
fn write_progress_records_and_reports_url() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nalpha\n1\n1\n72\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Progress uploaded to: {BASE_URL}/alpha/index.html"
        )));

    let page = read_site(&dir, "alpha/index.html");
    assert_eq!(page.matches("<tr><td><time").count(), 2);
    assert!(page.contains("<td>72</td>"));
    assert!(read_site(&dir, "index.html").contains("<td>72</td>"));
}

#[test]
fn write_progress_without_items() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("1\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No items found. Please create one first.",
        ));
}

#[test]
fn non_integer_progress_is_rejected() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nalpha\n1\n1\nhalf\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Progress must be a whole number, got 'half'.",
        ))
        .stdout(predicate::str::contains("Progress uploaded").not());

    let page = read_site(&dir, "alpha/index.html");
    assert_eq!(page.matches("<tr><td><time").count(), 1);
}

#[test]
fn samples_persist_across_sessions() {
    let dir = TempDir::new().unwrap();
    progress(&dir).write_stdin("2\nalpha\n6\n").assert().success();
    progress(&dir).write_stdin("1\n1\n30\n6\n").assert().success();
    progress(&dir).write_stdin("1\n1\n55\n6\n").assert().success();

    let page = read_site(&dir, "alpha/index.html");
    assert_eq!(page.matches("<tr><td><time").count(), 3);
    assert!(page.contains("Latest: 55%"));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_requires_typing_delete() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nalpha\n3\n1\nyes\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled."));
    assert!(site(&dir, "alpha/index.html").exists());
}

#[test]
fn delete_removes_samples_pages_and_homepage_link() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nalpha\n2\nbeta\n3\n1\nDELETE\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Item 'alpha' deleted"));

    assert!(!site(&dir, "alpha").exists());
    let home = read_site(&dir, "index.html");
    assert!(!home.contains("alpha"));
    assert!(home.contains(&format!("{BASE_URL}/beta/index.html")));

    progress(&dir)
        .write_stdin("4\n\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("beta"))
        .stdout(predicate::str::contains("alpha").not());
}

// ---------------------------------------------------------------------------
// Show URLs / Update all
// ---------------------------------------------------------------------------

#[test]
fn show_urls_lists_every_item_and_homepage() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nbeta\n2\nalpha\n4\n\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "alpha  {BASE_URL}/alpha/index.html"
        )))
        .stdout(predicate::str::contains(format!(
            "beta   {BASE_URL}/beta/index.html"
        )))
        .stdout(predicate::str::contains(format!(
            "Homepage: {BASE_URL}/index.html"
        )));
}

#[test]
fn update_all_restores_removed_pages_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    progress(&dir)
        .write_stdin("2\nalpha\n2\nbeta\n6\n")
        .assert()
        .success();

    std::fs::remove_dir_all(dir.path().join("site")).unwrap();

    progress(&dir)
        .write_stdin("5\n6\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Republished 2 item pages and the homepage.",
        ));
    let first = (
        read_site(&dir, "alpha/index.html"),
        read_site(&dir, "beta/index.html"),
        read_site(&dir, "index.html"),
    );

    progress(&dir).write_stdin("5\n6\n").assert().success();
    let second = (
        read_site(&dir, "alpha/index.html"),
        read_site(&dir, "beta/index.html"),
        read_site(&dir, "index.html"),
    );
    assert_eq!(first, second);
}
