//! Process-wide redaction switch.
//!
//! Kept in its own test binary: the switch is global and would leak into
//! tests running in parallel.

use std::io::Write;

use execopts::{ExecOption, ExecOptions, MemoryLogger, RedactRule, Redactor};
use tracing::Level;

#[test]
fn test_disabled_redaction_passes_text_through() {
    let mut redactor = Redactor::new();
    redactor.push(RedactRule::strings(["hunter2"]));
    redactor.push(RedactRule::pattern(r"\d+").unwrap());

    assert_eq!(redactor.redact("hunter2 42"), "[REDACTED] [REDACTED]");

    execopts::set_redaction_disabled(true);
    assert!(execopts::redaction_disabled());
    assert_eq!(redactor.redact("hunter2 42"), "hunter2 42");

    let logger = MemoryLogger::new();
    let mut opts = ExecOptions::build([
        ExecOption::logger(logger.clone()),
        ExecOption::redact_string(["hunter2"]),
    ]);
    opts.log_cmd("login hunter2");
    opts.stdout().write_all(b"pw hunter2").unwrap();

    assert_eq!(
        logger.messages(Level::DEBUG),
        vec!["executing `login hunter2`", "pw hunter2"]
    );

    execopts::set_redaction_disabled(false);
    assert_eq!(redactor.redact("hunter2 42"), "[REDACTED] [REDACTED]");
}
