//! # execopts
//!
//! Output shaping, redaction and command decoration for command execution.
//!
//! The execution layer (SSH, local process, container...) builds one
//! [`ExecOptions`] per command and asks it for everything that touches the
//! command's text and streams:
//!
//! - **Redaction**: sensitive strings and patterns are masked in every log
//!   record, while the caller's own sinks get the original bytes
//! - **Decoration**: the command text goes through an ordered chain of
//!   transforms, such as wrapping it for powershell
//! - **Stream adapters**: stdin/stdout/stderr endpoints that tee into the
//!   log at the right level and detect writes to stderr
//!
//! ## Quick Start
//!
//! ```
//! use std::io::Write;
//! use execopts::{ExecOption, ExecOptions};
//!
//! let mut opts = ExecOptions::build([
//!     ExecOption::redact_string(["hunter2"]),
//!     ExecOption::hide_output(),
//! ]);
//!
//! let cmd = opts.command("login --password hunter2");
//! opts.log_cmd(&cmd);
//!
//! let mut stderr = opts.stderr();
//! stderr.write_all(b"warning: deprecated flag\n").unwrap();
//! assert!(opts.wrote_err());
//!
//! assert_eq!(opts.format_output("  done\n"), "done");
//! ```

pub mod cli;
pub mod config;
pub mod decorate;
pub mod error;
pub mod logging;
pub mod options;
pub mod powershell;
pub mod redact;
pub mod stream;

// Re-export commonly used types
pub use config::{ConfigError, ExecConfig, ShellMode};
pub use decorate::{expand_encoded, DecorateChain, Decorator};
pub use error::{ExecOptionsError, Result};
pub use logging::{Logger, MemoryLogger, TracingLogger};
pub use options::{ExecOption, ExecOptions};
pub use redact::{
    redaction_disabled, set_redaction_disabled, RedactRule, Redactor, DEFAULT_REDACT_MASK,
};
pub use stream::{InputSource, MultiWriter, ReaderSize, WriteFlag};
