//! Integration tests for the command-line interface
//!
//! Runs the built binary against synthetic pages in temporary directories.

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_superbook-border"))
}

/// Write a page with a 40px dark band on top and 30px on the left
fn write_page(path: &Path) {
    let page = GrayImage::from_fn(300, 400, |x, y| {
        if y < 40 || x < 30 {
            Luma([20])
        } else {
            Luma([240])
        }
    });
    page.save(path).unwrap();
}

// ============ GENERAL ============

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_info_prints_defaults() {
    let dir = TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("superbook-border v"))
        .stdout(predicate::str::contains("strategy = \"edge-in-wdw\""));
}

// ============ CLEAN COMMAND ============

#[test]
fn test_clean_single_page() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("page.png");
    let output = dir.path().join("out");
    write_page(&input);

    cli()
        .current_dir(dir.path())
        .arg("clean")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed: 1/1 pages"));

    let cleaned = image::open(output.join("page.png")).unwrap().to_luma8();
    assert_eq!(cleaned.dimensions(), (300, 400));
    assert_eq!(cleaned.get_pixel(150, 10).0[0], 255);
    assert_eq!(cleaned.get_pixel(10, 200).0[0], 255);
    assert_eq!(cleaned.get_pixel(150, 200).0[0], 240);
}

#[test]
fn test_clean_directory_with_report() {
    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("pages");
    std::fs::create_dir(&pages).unwrap();
    write_page(&pages.join("001.png"));
    write_page(&pages.join("002.png"));
    std::fs::write(pages.join("notes.txt"), "not an image").unwrap();

    let output = dir.path().join("out");
    let report = dir.path().join("report.json");

    cli()
        .current_dir(dir.path())
        .arg("-q")
        .arg("clean")
        .arg(&pages)
        .arg("-o")
        .arg(&output)
        .arg("--strategy")
        .arg("page-edge")
        .arg("--report")
        .arg(&report)
        .assert()
        .success();

    assert!(output.join("001.png").exists());
    assert!(output.join("002.png").exists());
    assert!(!output.join("notes.txt").exists());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["page_index"], 1);
    assert_eq!(entries[0]["report"]["strategy"], "page-edge");
    assert!(entries[1]["input"].as_str().unwrap().ends_with("002.png"));
}

#[test]
fn test_clean_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("page.png");
    let output = dir.path().join("out");
    write_page(&input);

    cli()
        .current_dir(dir.path())
        .arg("clean")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry Run"))
        .stdout(predicate::str::contains("Pages to process: 1"));

    assert!(!output.exists());
}

#[test]
fn test_clean_missing_input() {
    let dir = TempDir::new().unwrap();
    cli()
        .current_dir(dir.path())
        .arg("clean")
        .arg(dir.path().join("missing.png"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_clean_unknown_strategy() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("page.png");
    write_page(&input);

    cli()
        .current_dir(dir.path())
        .arg("clean")
        .arg(&input)
        .arg("--strategy")
        .arg("bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown strategy"));
}

#[test]
fn test_clean_out_of_range_config_value() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("page.png");
    let config = dir.path().join("wide.toml");
    write_page(&input);
    std::fs::write(&config, "[border]\nedge_process_pct = 0.9\n").unwrap();

    cli()
        .current_dir(dir.path())
        .arg("clean")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--dry-run")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("edge_process_pct"));
}

#[test]
fn test_clean_bad_config_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("page.png");
    let config = dir.path().join("bad.toml");
    write_page(&input);
    std::fs::write(&config, "[border]\nstrategy = 12\n").unwrap();

    cli()
        .current_dir(dir.path())
        .arg("clean")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(3);
}

#[test]
fn test_clean_invalid_local_config_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("page.png");
    write_page(&input);
    std::fs::write(
        dir.path().join("superbook-border.toml"),
        "[border]\nedge_process_pct = 0.9\n",
    )
    .unwrap();

    cli()
        .current_dir(dir.path())
        .arg("clean")
        .arg(&input)
        .arg("--dry-run")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("edge_process_pct"));
}
