use assert_fs::TempDir;
use serial_test::serial;

mod common;
use common::{run_repofetch, run_repofetch_with_config_home};

/// Integration tests for the repofetch CLI
/// These tests run the actual binary and verify its surface behavior.
/// Nothing here talks to the real GitHub API.

#[test]
fn test_cli_help() {
    let output = run_repofetch(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Verify help contains the documented flags
    assert!(stdout.contains("--update"));
    assert!(stdout.contains("--skip-forks"));
    assert!(stdout.contains("--verbose"));
    assert!(stdout.contains("--save-token"));
    assert!(stdout.contains("ACCOUNT"));
}

#[test]
fn test_cli_version() {
    let output = run_repofetch(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("repofetch"));
}

#[test]
fn test_missing_account_is_a_usage_error() {
    let output = run_repofetch(&[]);

    // No account and no --save-token: usage error, exit code 1, help shown
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("ACCOUNT"));
}

#[test]
#[serial]
fn test_save_token_persists_config_and_exits_cleanly() {
    let config_home = TempDir::new().unwrap();

    let output =
        run_repofetch_with_config_home(&["--save-token", "ghp_integration"], config_home.path());

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = config_home.path().join("repofetch").join("config.yml");
    assert!(config_path.exists());

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("ghp_integration"));
}
