//! Binary-level tests for the `santa` command

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn santa(dir: &TempDir, backend: &str) -> Command {
    santa_in(dir.path(), &dir.path().join("data"), backend)
}

fn santa_in(cwd: &Path, data: &Path, backend: &str) -> Command {
    let mut cmd = Command::cargo_bin("santa").unwrap();
    cmd.current_dir(cwd)
        .env_remove("SANTA_ADMINS")
        .env_remove("SANTA_BACKEND")
        .env_remove("SANTA_DATA_DIR")
        .env_remove("SANTA_OPEN_ON_INIT")
        .env("SANTA_SEED", "5")
        .args(["--backend", backend, "--data-dir"])
        .arg(data);
    cmd
}

#[test]
fn send_register_prints_reply() {
    let dir = TempDir::new().unwrap();

    santa(&dir, "json")
        .args(["send", "--from", "alice", "/register"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Congratulations"));

    assert!(dir.path().join("data/participants/alice.json").exists());
}

#[test]
fn registration_persists_between_runs() {
    let dir = TempDir::new().unwrap();

    for backend in ["json", "sqlite"] {
        let data = TempDir::new_in(dir.path()).unwrap();
        let run = |args: &[&str]| {
            let mut cmd = santa_in(dir.path(), data.path(), backend);
            let output = cmd.arg("send").args(args).assert().success();
            String::from_utf8_lossy(&output.get_output().stdout).into_owned()
        };

        assert!(run(&["--from", "@bob", "/register"]).contains("Congratulations"));
        assert!(run(&["--from", "bob", "/register"]).contains("already registered"));
        assert!(run(&["--from", "amy", "/user_list"]).contains("- @bob"));
    }
}

#[test]
fn chat_runs_full_exchange() {
    let dir = TempDir::new().unwrap();
    let script = "\
@amy /register
@amy /add_address
@amy 1 Snow Lane
@ben /register
@ben /add_address@SantaBot
@ben 2 Ice Road
@elf /assign
@elf i am sure i want to run the assignment
@amy /assign_me
";

    santa(&dir, "memory")
        .env("SANTA_ADMINS", "elf")
        .arg("chat")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("2/2 participants have provided their address"))
        .stdout(predicate::str::contains("assignment has just been drawn"))
        .stdout(predicate::str::contains("🏠: 2 Ice Road"));
}

#[test]
fn non_admin_assign_is_silent() {
    let dir = TempDir::new().unwrap();

    santa(&dir, "memory")
        .args(["send", "--from", "amy", "/assign"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn malformed_store_fails_startup() {
    let dir = TempDir::new().unwrap();
    let participants = dir.path().join("data/participants");
    std::fs::create_dir_all(&participants).unwrap();
    std::fs::write(participants.join("amy.json"), "{ not json").unwrap();

    santa(&dir, "json")
        .args(["send", "--from", "amy", "/my_info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn invalid_sender_is_rejected() {
    let dir = TempDir::new().unwrap();

    santa(&dir, "memory")
        .args(["send", "--from", "no/slash", "/register"])
        .assert()
        .failure();
}
