//! CLI integration tests.
//!
//! These tests verify the CLI argument parsing and configuration loading.

use std::ffi::OsString;
use std::io::Write;
use tempfile::NamedTempFile;

use execopts::cli::{parse_args_from, Args};
use execopts::{ExecConfig, ExecOptions, ShellMode};

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("execopts")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_defaults() {
    let result = parse_args_from(args(&[])).unwrap();

    assert!(result.config.is_none());
    assert!(result.log_level.is_none());
    assert!(result.ps.is_none());
    assert!(result.ps_compressed.is_none());
    assert!(!result.help);
    assert!(!result.version);
}

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "-c",
        "/etc/execopts.json",
        "-s",
        "hunter2",
        "-r",
        r"token=\S+",
        "-l",
        "debug",
        "--decode",
    ]))
    .unwrap();

    assert_eq!(
        result.config.unwrap().to_str().unwrap(),
        "/etc/execopts.json"
    );
    assert_eq!(result.redact_strings, vec!["hunter2"]);
    assert_eq!(result.redact_patterns, vec![r"token=\S+"]);
    assert_eq!(result.log_level, Some("debug".to_string()));
    assert!(result.decode);
}

#[test]
fn test_cli_invalid_pattern() {
    let result = parse_args_from(args(&["--redact", "[a-"]));
    assert!(result.is_err());
}

#[test]
fn test_cli_unknown_flag() {
    let result = parse_args_from(args(&["--bogus"]));
    assert!(result.is_err());
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
fn test_config_file_with_cli_overrides() {
    let json = r#"{
        "logging": { "output": false },
        "redact": { "strings": ["from-file"] },
        "shell": { "mode": "powershell" }
    }"#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let cli_args = Args {
        config: Some(file.path().to_path_buf()),
        redact_strings: vec!["from-cli".to_string()],
        log_level: Some("trace".to_string()),
        ..Args::default()
    };

    let config = ExecConfig::load(&cli_args).unwrap();
    assert_eq!(config.redact.strings, vec!["from-file", "from-cli"]);
    assert_eq!(config.shell.mode, ShellMode::Powershell);
    assert_eq!(config.log_filter(), "trace");

    let opts = ExecOptions::build(config.to_options().unwrap());
    assert!(!opts.logs_output());
    assert_eq!(
        opts.redact("from-file and from-cli"),
        "[REDACTED] and [REDACTED]"
    );
    assert!(opts.command("Get-Date").starts_with("powershell.exe"));
}

#[test]
fn test_config_missing_file() {
    let cli_args = Args {
        config: Some("/nonexistent/execopts.json".into()),
        ..Args::default()
    };

    assert!(ExecConfig::load(&cli_args).is_err());
}
