use std::path::Path;
use std::process::{Command, Output};

/// Environment variables that would leak the developer's setup into tests.
const NEXUS_ENV: [&str; 8] = [
    "NEXUS_HOST",
    "NEXUS_REPOSITORY",
    "NEXUS_USER",
    "NEXUS_PASS",
    "NEXUS_TIMEOUT",
    "NEXUS_VERIFY_SSL",
    "NEXUS_CACHE_DIR",
    "NEXUS_CACHE_KEEP",
];

/// Build a CLI invocation with an isolated cache and working directory.
pub fn command(args: &[&str], home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nexus"));
    cmd.args(args);
    for var in NEXUS_ENV {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home);
    cmd.env("XDG_CACHE_HOME", home.join("cache"));
    cmd.env("NEXUS_CACHE_DIR", home.join("searches"));
    cmd.env("NO_COLOR", "1");
    cmd.current_dir(home);
    cmd
}

/// Run the CLI against a server.
pub fn run_cli(args: &[&str], home: &Path, host: &str) -> Output {
    let mut cmd = command(args, home);
    cmd.env("NEXUS_HOST", host);
    cmd.env("NEXUS_REPOSITORY", "raw-hosted");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], home: &Path, host: &str) -> String {
    let output = run_cli(args, home, host);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}
