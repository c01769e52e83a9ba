/// Common test utilities for repofetch integration tests
use std::path::Path;
use std::process::{Command, Output};

/// Run the repofetch binary through cargo with the given arguments.
pub fn run_repofetch(args: &[&str]) -> Output {
    let mut cmd_args = vec!["run", "--quiet", "--"];
    cmd_args.extend_from_slice(args);

    Command::new("cargo")
        .args(&cmd_args)
        .output()
        .expect("Failed to execute repofetch")
}

/// Run repofetch with XDG_CONFIG_HOME pointed at a test directory, so
/// config reads and writes never touch the real user configuration.
pub fn run_repofetch_with_config_home(args: &[&str], config_home: &Path) -> Output {
    let mut cmd_args = vec!["run", "--quiet", "--"];
    cmd_args.extend_from_slice(args);

    Command::new("cargo")
        .args(&cmd_args)
        .env("XDG_CONFIG_HOME", config_home)
        .output()
        .expect("Failed to execute repofetch")
}
