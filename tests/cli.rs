use git2::{Oid, Repository, Signature, Time};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const BASE: i64 = 1_700_000_000;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_changelog-gen")))
}

fn sig(seconds: i64) -> Signature<'static> {
    Signature::new("Test Author", "author@example.com", &Time::new(seconds, 0)).unwrap()
}

fn commit_file(repo: &Repository, name: &str, message: &str, seconds: i64) -> Oid {
    fs::write(repo.workdir().unwrap().join(name), name).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let author = sig(seconds);
    let parent = repo.head().ok().map(|head| head.peel_to_commit().unwrap());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &author, &author, message, &tree, &parents)
        .unwrap()
}

fn tag(repo: &Repository, name: &str, target: Oid) {
    let object = repo.find_object(target, None).unwrap();
    repo.tag_lightweight(name, &object, false).unwrap();
}

fn annotated_tag(repo: &Repository, name: &str, target: Oid, message: &str, seconds: i64) {
    let object = repo.find_object(target, None).unwrap();
    repo.tag(name, &object, &sig(seconds), message, false).unwrap();
}

/// Two releases: v1.0.0 holds the initial import, v2.0.0 collects a
/// merged feature pair, a fix and an uncategorized commit.
fn sample_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let first = commit_file(&repo, "a.txt", "initial import", BASE);
    tag(&repo, "v1.0.0", first);
    commit_file(&repo, "b.txt", "[feat] add login", BASE + 100);
    commit_file(&repo, "c.txt", "[feat] add login", BASE + 200);
    commit_file(&repo, "d.txt", "[fix] null check", BASE + 300);
    let last = commit_file(&repo, "e.txt", "update readme", BASE + 400);
    tag(&repo, "v2.0.0", last);
    dir
}

fn repo_arg(dir: &TempDir) -> [&str; 2] {
    ["--repository", dir.path().to_str().unwrap()]
}

// -- generate --

#[test]
fn generate_prints_markdown_to_stdout() {
    let dir = sample_repo();

    cmd()
        .args(repo_arg(&dir))
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Changelog"))
        .stdout(predicate::str::contains(
            "All notable changes to this project will be documented in this file.",
        ))
        .stdout(predicate::str::contains("## [v2.0.0]"))
        .stdout(predicate::str::contains("### feat"))
        .stdout(predicate::str::contains("### fix"))
        .stdout(predicate::str::contains("- initial import ("));
}

#[test]
fn generate_merges_repeated_messages() {
    let dir = sample_repo();

    cmd()
        .args(repo_arg(&dir))
        .arg("generate")
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(
                r"- add login \(\[[0-9a-f]{7}\]\(\.\./\.\./commit/[0-9a-f]{40}\)\) \(\[[0-9a-f]{7}\]\(\.\./\.\./commit/[0-9a-f]{40}\)\)",
            )
            .unwrap(),
        );
}

#[test]
fn generate_puts_uncategorized_commits_last_without_heading() {
    let dir = sample_repo();

    let assert = cmd().args(repo_arg(&dir)).arg("generate").assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert!(!output.contains("### Other"));
    let fix_at = output.find("### fix").unwrap();
    let readme_at = output.find("- update readme").unwrap();
    assert!(fix_at < readme_at);
}

#[test]
fn generate_writes_output_file() {
    let dir = sample_repo();
    let out = dir.path().join("CHANGELOG.md");

    cmd()
        .args(repo_arg(&dir))
        .arg("generate")
        .args(["--output", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Changelog written to"));

    let content = fs::read_to_string(out).unwrap();
    assert!(content.starts_with("# Changelog\n"));
    assert!(content.contains("## [v1.0.0]"));
}

#[test]
fn empty_repository_renders_the_no_tags_line() {
    let dir = TempDir::new().unwrap();
    Repository::init(dir.path()).unwrap();

    cmd()
        .args(repo_arg(&dir))
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tags found in this repository."));
}

#[test]
fn missing_repository_fails() {
    let dir = TempDir::new().unwrap();

    cmd()
        .args(["--repository", dir.path().join("nope").to_str().unwrap()])
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("repository unavailable"));
}

#[test]
fn failed_run_leaves_no_output_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("CHANGELOG.md");

    cmd()
        .args(["--repository", dir.path().join("nope").to_str().unwrap()])
        .args(["generate", "--output", out.to_str().unwrap()])
        .assert()
        .failure();

    assert!(!out.exists());
}

// -- flags --

#[test]
fn unreleased_flag_adds_a_section() {
    let dir = sample_repo();
    let repo = Repository::open(dir.path()).unwrap();
    commit_file(&repo, "f.txt", "pending work", BASE + 500);

    cmd()
        .args(repo_arg(&dir))
        .args(["generate", "--unreleased"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## [Unreleased]"))
        .stdout(predicate::str::contains("- pending work ("));
}

#[test]
fn tag_annotations_flag_prints_release_notes() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let first = commit_file(&repo, "a.txt", "initial import", BASE);
    annotated_tag(&repo, "v1.0.0", first, "Big release.", BASE);

    cmd()
        .args(repo_arg(&dir))
        .args(["generate", "--tag-annotations"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Release Notes:** Big release."));

    cmd()
        .args(repo_arg(&dir))
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Release Notes").not());
}

#[test]
fn keyword_grouping_buckets_without_rewriting() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    commit_file(&repo, "a.txt", "feat: add login", BASE);
    commit_file(&repo, "b.txt", "fix crash on startup", BASE + 100);
    let last = commit_file(&repo, "c.txt", "docs: expand readme", BASE + 200);
    tag(&repo, "v1.0.0", last);

    cmd()
        .args(repo_arg(&dir))
        .args(["generate", "--grouping", "keyword"])
        .assert()
        .success()
        .stdout(predicate::str::contains("### Bug Fixes"))
        .stdout(predicate::str::contains("### Documentation"))
        .stdout(predicate::str::contains("### Features"))
        .stdout(predicate::str::contains("- feat: add login ("));
}

// -- output formats --

#[test]
fn json_format_exposes_the_document() {
    let dir = sample_repo();

    let assert = cmd()
        .args(repo_arg(&dir))
        .args(["generate", "-f", "json"])
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["releases"][0]["release"]["name"], "v2.0.0");
    assert_eq!(value["releases"][1]["release"]["name"], "v1.0.0");
    assert_eq!(
        value["releases"][0]["body"]["changes"][0]["entries"][0]["commit_count"],
        2
    );
}

#[test]
fn html_format_wraps_the_markdown() {
    let dir = sample_repo();

    cmd()
        .args(repo_arg(&dir))
        .args(["generate", "-f", "html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("<h1>Changelog</h1>"));
}

#[test]
fn unknown_format_is_rejected() {
    let dir = sample_repo();

    cmd()
        .args(repo_arg(&dir))
        .args(["generate", "-f", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown output format"));
}

#[test]
fn custom_template_drives_the_output() {
    let dir = sample_repo();
    let template = dir.path().join("names.hbs");
    fs::write(&template, "{{#each releases}}{{release.name}}\n{{/each}}").unwrap();

    cmd()
        .args(repo_arg(&dir))
        .args(["generate", "--template", template.to_str().unwrap()])
        .assert()
        .success()
        .stdout("v2.0.0\nv1.0.0\n");
}

// -- configuration --

#[test]
fn config_file_sets_format_and_tag_pattern() {
    let dir = sample_repo();
    let repo = Repository::open(dir.path()).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap().id();
    tag(&repo, "junk", head);

    let config = dir.path().join("changelog.toml");
    fs::write(
        &config,
        "[output]\nformat = \"json\"\n\n[git]\ntag_pattern = \"^v\"\n",
    )
    .unwrap();

    let assert = cmd()
        .args(repo_arg(&dir))
        .args(["--config", config.to_str().unwrap()])
        .arg("generate")
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let names: Vec<&str> = value["releases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|section| section["release"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["v2.0.0", "v1.0.0"]);
}

#[test]
fn command_line_flags_override_the_config_file() {
    let dir = sample_repo();
    let config = dir.path().join("changelog.toml");
    fs::write(&config, "[output]\nformat = \"json\"\n").unwrap();

    cmd()
        .args(repo_arg(&dir))
        .args(["--config", config.to_str().unwrap()])
        .args(["generate", "-f", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Changelog"));
}

#[test]
fn invalid_tag_pattern_in_config_fails() {
    let dir = sample_repo();
    let config = dir.path().join("changelog.toml");
    fs::write(&config, "[git]\ntag_pattern = \"[\"\n").unwrap();

    cmd()
        .args(repo_arg(&dir))
        .args(["--config", config.to_str().unwrap()])
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid tag pattern"));
}

// -- tags --

#[test]
fn tags_lists_releases_newest_first() {
    let dir = sample_repo();

    let assert = cmd().args(repo_arg(&dir)).arg("tags").assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let newer = output.find("- v2.0.0:").unwrap();
    let older = output.find("- v1.0.0:").unwrap();
    assert!(newer < older);
}

#[test]
fn tags_respects_the_limit() {
    let dir = sample_repo();

    cmd()
        .args(repo_arg(&dir))
        .args(["tags", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v2.0.0"))
        .stdout(predicate::str::contains("v1.0.0").not());
}

#[test]
fn tags_reports_an_empty_repository() {
    let dir = TempDir::new().unwrap();
    Repository::init(dir.path()).unwrap();

    cmd()
        .args(repo_arg(&dir))
        .arg("tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tags found"));
}
