//! Binary integration tests

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn pgx(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pgx-artifacts").unwrap();
    cmd.env_remove("PGX_CONFIG")
        .env_remove("PGX_DB")
        .arg("--db")
        .arg(db);
    cmd
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("pgx-artifacts").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_import_help_mentions_atomic() {
    let mut cmd = Command::cargo_bin("pgx-artifacts").unwrap();
    cmd.args(["import", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--atomic"));
}

// ═══════════════════════════════════════════════════════════════════════════
// COMMANDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_init_creates_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pgx.db");

    pgx(&db)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database ready"));
    assert!(db.exists());
}

#[test]
fn test_starter_then_import_then_export() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pgx.db");
    let starter = dir.path().join("starter");
    let defs = dir.path().join("defs");
    let out = dir.path().join("out");
    for d in [&starter, &defs, &out] {
        fs::create_dir(d).unwrap();
    }

    pgx(&db)
        .args(["starter", "-g", "ABCG2", "-d"])
        .arg(&starter)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 file(s) created"));

    let file = "ABCG2-Allele_Definition_Table.xlsx";
    assert!(starter.join("ABCG2-Allele_Functionality_Reference.xlsx").exists());
    fs::rename(starter.join(file), defs.join(file)).unwrap();

    pgx(&db)
        .args(["import", "allele-definition", "-d"])
        .arg(&defs)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 file(s) imported"));

    pgx(&db)
        .args(["export", "allele-definition", "-d"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(file));
    assert!(out.join(file).exists());
}

#[test]
fn test_import_failure_names_the_file() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pgx.db");
    let input = dir.path().join("in");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("C_broken.xlsx"), b"not a workbook").unwrap();

    pgx(&db)
        .args(["import", "allele-definition", "-d"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("C_broken.xlsx"));
}

#[test]
fn test_import_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pgx.db");

    pgx(&db)
        .args(["import", "function-reference", "-d"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_export_frequency_on_empty_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pgx.db");

    pgx(&db)
        .args(["export", "frequency", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to export"));
}

#[test]
fn test_publish_without_config_fails() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pgx.db");

    pgx(&db)
        .args(["export", "function-reference", "--publish", "-d"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("publish"));
}

#[test]
fn test_archive_uses_config_prefix() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("pgx.db");
    let config = dir.path().join("pgx.yaml");
    fs::write(&config, "archive_prefix: nightly\n").unwrap();

    pgx(&db)
        .arg("--config")
        .arg(&config)
        .args(["archive", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nightly_"));
}
