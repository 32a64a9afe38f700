//! CLI tests for the `trainer` binary.
//!
//! Spawns the binary and verifies output and exit codes for commands that
//! never reach the network.

use std::fs;
use std::process::Command;

use trainer::core::motions::DEFAULT_MOTIONS;
use trainer::exit_codes;

const UNSET_KEY_ENV: &str = "TRAINER_TEST_KEY_THAT_IS_NEVER_SET";

fn trainer(dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_trainer"));
    command
        .current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove(UNSET_KEY_ENV)
        .env_remove("RUST_LOG");
    command
}

#[test]
fn motions_lists_builtin_motions_without_credential() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = trainer(temp.path())
        .arg("motions")
        .output()
        .expect("trainer motions");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, DEFAULT_MOTIONS.to_vec());
}

#[test]
fn random_motion_as_json_is_one_builtin_motion() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = trainer(temp.path())
        .args(["--json", "motions", "--random"])
        .output()
        .expect("trainer motions --random");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let motions: Vec<String> = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(motions.len(), 1);
    assert!(DEFAULT_MOTIONS.contains(&motions[0].as_str()));
}

#[test]
fn missing_credential_exits_with_config_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = trainer(temp.path())
        .args(["argue", "--motion", "This House Would ban TikTok"])
        .output()
        .expect("trainer argue");

    assert_eq!(output.status.code(), Some(exit_codes::CONFIG));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("OPENAI_API_KEY"));
}

#[test]
fn configured_credential_variable_is_used() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("custom.toml"),
        format!("api_key_env = \"{UNSET_KEY_ENV}\"\n"),
    )
    .expect("write config");

    let output = trainer(temp.path())
        .args([
            "--config",
            "custom.toml",
            "score",
            "--motion",
            "m",
            "--argument",
            "a",
            "--rebuttal",
            "r",
        ])
        .output()
        .expect("trainer score");

    assert_eq!(output.status.code(), Some(exit_codes::CONFIG));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains(UNSET_KEY_ENV));
}

#[test]
fn invalid_config_exits_with_config_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("trainer.toml"), "max_attempts = 0\n").expect("write config");

    let status = trainer(temp.path())
        .env("OPENAI_API_KEY", "sk-test")
        .args(["oppose", "--motion", "m"])
        .status()
        .expect("trainer oppose");

    assert_eq!(status.code(), Some(exit_codes::CONFIG));
}

#[test]
fn blank_rebut_and_score_inputs_exit_before_any_request() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = trainer(temp.path())
        .args(["rebut", "--motion", "m", "--argument", "   "])
        .output()
        .expect("trainer rebut");
    assert_eq!(output.status.code(), Some(exit_codes::CONFIG));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("--argument must not be blank"));

    let output = trainer(temp.path())
        .args(["score", "--motion", "m", "--argument", "a", "--rebuttal", ""])
        .output()
        .expect("trainer score");
    assert_eq!(output.status.code(), Some(exit_codes::CONFIG));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("--rebuttal must not be blank"));
}
