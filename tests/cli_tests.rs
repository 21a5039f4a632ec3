//! CLI integration tests against the built binary.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run `trendscout` in `dir` with a clean credential environment.
fn run_trendscout(args: &[&str], dir: &TempDir, env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_trendscout"));
    cmd.args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("OPENAI_API_KEY")
        .env_remove("XAI_API_KEY")
        .env_remove("YOUTUBE_API_KEY");
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute trendscout")
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let output = run_trendscout(&["--help"], &dir, &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    for command in ["research", "serve", "config"] {
        assert!(stdout.contains(command), "missing {}", command);
    }
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = run_trendscout(&["--version"], &dir, &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_config_validate_accepts_missing_file() {
    let dir = TempDir::new().unwrap();
    let output = run_trendscout(&["config", "--validate", "--no-color"], &dir, &[]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("is valid"));
}

#[test]
fn test_config_validate_rejects_zero_batch_size() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("trendscout.toml"),
        "[research]\nenrichment_batch_size = 0\n",
    )
    .unwrap();

    let output = run_trendscout(&["config", "--validate", "--no-color"], &dir, &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("enrichment_batch_size"));
}

#[test]
fn test_config_shows_credential_presence_not_values() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("custom.toml"),
        "[server]\nport = 8088\n\n[synthesis]\napi_key_env = \"TRENDSCOUT_TEST_KEY\"\n",
    )
    .unwrap();

    let output = run_trendscout(
        &["config", "--config", "custom.toml", "--no-color"],
        &dir,
        &[("TRENDSCOUT_TEST_KEY", "sk-very-secret")],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("127.0.0.1:8088"));
    assert!(stdout.contains("[set] Synthesis (TRENDSCOUT_TEST_KEY)"));
    assert!(stdout.contains("[not set] YouTube (YOUTUBE_API_KEY)"));
    assert!(!stdout.contains("sk-very-secret"));
}

#[test]
fn test_research_requires_topic() {
    let dir = TempDir::new().unwrap();
    let output = run_trendscout(&["research"], &dir, &[]);

    assert!(!output.status.success());
}
