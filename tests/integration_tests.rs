//! Integration tests for the tackboard binary
//!
//! These drive the CLI end to end: database bootstrap, config files, and
//! argument validation for the client commands.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a tackboard Command with env overrides cleared
fn tackboard() -> Command {
    let mut cmd = cargo_bin_cmd!("tackboard");
    for key in [
        "PORT",
        "DATA_PATH",
        "TACKBOARD_HOST",
        "TACKBOARD_STATIC_DIR",
        "TACKBOARD_URL",
        "TACKBOARD_STRICT_REORDER",
        "TACKBOARD_LOG",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_tackboard_help() {
        tackboard()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("move-card"));
    }

    #[test]
    fn test_tackboard_version() {
        tackboard()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("tackboard"));
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        tackboard().arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Database Bootstrap Tests
// =============================================================================

mod init_command {
    use super::*;

    #[test]
    fn test_init_creates_database_with_default_columns() {
        let dir = create_temp_dir();
        let db_path = dir.path().join("nested/board.db");

        tackboard()
            .current_dir(dir.path())
            .args(["init", "--db-path"])
            .arg(&db_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("Board database initialized"))
            .stdout(predicate::str::contains("My Kanban Board"))
            .stdout(predicate::str::contains(
                "Backlog, Today, In Progress, Done",
            ));

        assert!(db_path.exists());
    }

    #[test]
    fn test_init_twice_keeps_existing_board() {
        let dir = create_temp_dir();
        let db_path = dir.path().join("board.db");

        for _ in 0..2 {
            tackboard()
                .current_dir(dir.path())
                .args(["init", "--db-path"])
                .arg(&db_path)
                .assert()
                .success()
                .stdout(predicate::str::contains("with 4 columns"));
        }
    }

    #[test]
    fn test_init_respects_data_path_env() {
        let dir = create_temp_dir();
        let db_path = dir.path().join("from-env.db");

        tackboard()
            .current_dir(dir.path())
            .env("DATA_PATH", &db_path)
            .arg("init")
            .assert()
            .success();

        assert!(db_path.exists());
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod config_command {
    use super::*;

    #[test]
    fn test_config_init_then_validate() {
        let dir = create_temp_dir();

        tackboard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote default configuration"));

        let content = fs::read_to_string(dir.path().join("tackboard.toml")).unwrap();
        assert!(content.contains("[server]"));
        assert!(content.contains("[database]"));

        // frontend/dist does not exist in the temp dir, so validate warns
        tackboard()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Static directory"));
    }

    #[test]
    fn test_config_init_refuses_to_overwrite() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("tackboard.toml"), "[server]\nport = 4000\n").unwrap();

        tackboard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        tackboard()
            .current_dir(dir.path())
            .args(["config", "init", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn test_config_show_reflects_file_and_env() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("tackboard.toml"), "[server]\nport = 4000\n").unwrap();

        tackboard()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 4000"));

        tackboard()
            .current_dir(dir.path())
            .env("PORT", "5050")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 5050"));
    }

    #[test]
    fn test_malformed_config_file_fails() {
        let dir = create_temp_dir();
        fs::write(dir.path().join("tackboard.toml"), "[server\nport = ").unwrap();

        tackboard()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .failure();
    }
}

// =============================================================================
// Client Command Tests
// =============================================================================

mod client_commands {
    use super::*;

    #[test]
    fn test_move_card_requires_a_target() {
        tackboard().args(["move-card", "1"]).assert().failure();
    }

    #[test]
    fn test_move_card_rejects_both_targets() {
        tackboard()
            .args(["move-card", "1", "--to-column", "2", "--before-card", "3"])
            .assert()
            .failure();
    }

    #[test]
    fn test_show_fails_when_server_unreachable() {
        let dir = create_temp_dir();

        // Port 9 (discard) is not expected to run an HTTP server
        tackboard()
            .current_dir(dir.path())
            .args(["show", "--url", "http://127.0.0.1:9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to fetch board"));
    }
}
