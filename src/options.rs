//! Per-command execution options.
//!
//! [`ExecOptions`] is built once per command from an ordered list of
//! [`ExecOption`]s. Scalar flags are last-write-wins, redaction rules and
//! decorators are appended. The execution layer then asks it for the
//! stdin/stdout/stderr endpoints, the decorated command and the final
//! output formatting.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use execopts::{ExecOption, ExecOptions};
//!
//! let mut out = Vec::new();
//! {
//!     let mut opts = ExecOptions::build([
//!         ExecOption::stdout(&mut out),
//!         ExecOption::redact_string(["s3cr3t"]),
//!     ]);
//!     opts.log_cmd(&opts.command("deploy --token s3cr3t"));
//!
//!     let mut stdout = opts.stdout();
//!     stdout.write_all(b"token is s3cr3t\n").unwrap();
//! }
//! // The caller's sink always receives the original bytes.
//! assert_eq!(out, b"token is s3cr3t\n");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::sync::Arc;

use regex::Regex;
use tracing::Level;

use crate::decorate::{expand_encoded, DecorateChain, Decorator};
use crate::error::Result;
use crate::logging::{Logger, TracingLogger};
use crate::powershell;
use crate::redact::{RedactRule, Redactor};
use crate::stream::{
    FlaggingWriter, InputSource, LogWriter, MultiWriter, ReaderSize, RedactingWriter, TeeReader,
    WriteFlag,
};

type Sink<'a> = Box<dyn Write + Send + 'a>;

/// A single configuration step applied to [`ExecOptions`].
pub struct ExecOption<'a>(Box<dyn FnOnce(&mut ExecOptions<'a>) + 'a>);

impl<'a> ExecOption<'a> {
    /// Option from an arbitrary mutation of the aggregate.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut ExecOptions<'a>) + 'a,
    {
        Self(Box::new(f))
    }

    /// Send data from `reader` to the command's stdin.
    pub fn stdin<R: Read + Send + 'a>(reader: R) -> Self {
        Self::input(InputSource::reader(reader))
    }

    /// Send a string to the command's stdin.
    pub fn stdin_string(s: impl Into<String>) -> Self {
        Self::input(InputSource::bytes(s.into()))
    }

    /// Send raw bytes to the command's stdin.
    pub fn stdin_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::input(InputSource::bytes(data))
    }

    /// Send the contents of a file to the command's stdin.
    pub fn stdin_file(file: File) -> Self {
        Self::input(InputSource::File(file))
    }

    /// Use an already built input source.
    pub fn input(source: InputSource<'a>) -> Self {
        Self::new(move |o| o.input = Some(source))
    }

    /// Copy the command's stdout to `writer`.
    pub fn stdout<W: Write + Send + 'a>(writer: W) -> Self {
        Self::new(move |o| {
            o.out = Some(Box::new(writer));
            o.out_claimed = false;
        })
    }

    /// Copy the command's stderr to `writer`.
    pub fn stderr<W: Write + Send + 'a>(writer: W) -> Self {
        Self::new(move |o| {
            o.err_out = Some(Box::new(writer));
            o.err_out_claimed = false;
        })
    }

    /// Stream stdout to the info log and stderr to the error log.
    pub fn stream_output() -> Self {
        Self::new(|o| o.stream_output = true)
    }

    /// Enable or disable live stderr logging.
    pub fn log_error(enabled: bool) -> Self {
        Self::new(move |o| o.log_error = enabled)
    }

    /// Keep the command text out of the logs.
    pub fn hide_command() -> Self {
        Self::new(|o| o.log_command = false)
    }

    /// Keep stdout out of the logs. Also turns stderr debug logging off.
    pub fn hide_output() -> Self {
        Self::new(|o| {
            o.log_output = false;
            o.log_error = false;
        })
    }

    /// Disable all logging for the command.
    pub fn sensitive() -> Self {
        Self::new(|o| {
            o.log_debug = false;
            o.log_error = false;
            o.log_command = false;
            o.log_output = false;
            o.log_input = false;
            o.stream_output = false;
        })
    }

    /// Mask every match of a regular expression in log output.
    ///
    /// Fails if the pattern does not compile.
    pub fn redact(pattern: &str) -> Result<Self> {
        Ok(Self::redact_rule(RedactRule::pattern(pattern)?))
    }

    /// Mask every match of a compiled regular expression in log output.
    pub fn redact_regex(re: Regex) -> Self {
        Self::redact_rule(RedactRule::regex(re))
    }

    /// Mask one or more literal strings in log output. Empty strings are ignored.
    pub fn redact_string<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::redact_rule(RedactRule::strings(literals))
    }

    /// Append a redaction rule.
    pub fn redact_rule(rule: RedactRule) -> Self {
        Self::new(move |o| o.redactor.push(rule))
    }

    /// Enable or disable logging of data sent to stdin.
    pub fn log_input(enabled: bool) -> Self {
        Self::new(move |o| o.log_input = enabled)
    }

    /// Control whether the final output is trimmed of surrounding whitespace.
    pub fn trim_output(enabled: bool) -> Self {
        Self::new(move |o| o.trim_output = enabled)
    }

    /// Let the command write to stderr without being treated as failed.
    pub fn allow_win_stderr() -> Self {
        Self::new(|o| o.allow_win_stderr = true)
    }

    /// Run the command through `powershell.exe -EncodedCommand`.
    pub fn ps() -> Self {
        Self::decorate(powershell::cmd)
    }

    /// Like [`ExecOption::ps`] for long scripts: the script is gzipped and
    /// base64 encoded behind a small decompression bootstrap.
    pub fn ps_compressed() -> Self {
        Self::decorate(powershell::compressed_cmd)
    }

    /// Append a custom command decorator.
    pub fn decorate<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::decorator(Decorator::new(f))
    }

    /// Append an already built decorator.
    pub fn decorator(decorator: Decorator) -> Self {
        Self::new(move |o| o.decorators.push(decorator))
    }

    /// Send log records to `logger` instead of `tracing`.
    pub fn logger<L: Logger + 'static>(logger: L) -> Self {
        Self::new(move |o| o.logger = Arc::new(logger))
    }

    fn apply(self, options: &mut ExecOptions<'a>) {
        (self.0)(options)
    }
}

impl fmt::Debug for ExecOption<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExecOption(..)")
    }
}

/// Options for a single command execution.
pub struct ExecOptions<'a> {
    logger: Arc<dyn Logger>,

    input: Option<InputSource<'a>>,
    out: Option<Sink<'a>>,
    err_out: Option<Sink<'a>>,
    out_claimed: bool,
    err_out_claimed: bool,

    allow_win_stderr: bool,

    log_debug: bool,
    log_error: bool,
    log_command: bool,
    log_output: bool,
    log_input: bool,

    stream_output: bool,
    trim_output: bool,

    wrote_err: WriteFlag,

    redactor: Redactor,
    decorators: DecorateChain,
}

impl<'a> ExecOptions<'a> {
    /// Build options from defaults and the given options, applied in order.
    pub fn build<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = ExecOption<'a>>,
    {
        let mut options = Self {
            logger: Arc::new(TracingLogger),
            input: None,
            out: None,
            err_out: None,
            out_claimed: false,
            err_out_claimed: false,
            allow_win_stderr: false,
            log_debug: true,
            log_error: true,
            log_command: true,
            log_output: true,
            log_input: false,
            stream_output: false,
            trim_output: true,
            wrote_err: WriteFlag::new(),
            redactor: Redactor::new(),
            decorators: DecorateChain::new(),
        };
        options.apply(opts);
        options
    }

    /// Apply more options on top of the current state.
    pub fn apply<I>(&mut self, opts: I)
    where
        I: IntoIterator<Item = ExecOption<'a>>,
    {
        for opt in opts {
            opt.apply(self);
        }
    }

    /// The command with all decorators applied.
    pub fn command(&self, cmd: &str) -> String {
        self.decorators.decorate(cmd)
    }

    /// Log the command about to be executed.
    ///
    /// Pass the decorated command; encoded shell payloads are expanded and
    /// the result redacted. With command logging off only a generic notice
    /// is logged.
    pub fn log_cmd(&self, cmd: &str) {
        if !self.log_debug {
            return;
        }
        if self.log_command {
            let shown = self.redact(&expand_encoded(cmd));
            self.logger.debug(&format!("executing `{}`", shown));
        } else {
            self.logger.debug("executing command");
        }
    }

    /// Mask sensitive text using the registered redaction rules.
    pub fn redact(&self, s: &str) -> String {
        self.redactor.redact(s)
    }

    /// Trim whitespace from the final output if trimming is enabled.
    pub fn format_output(&self, s: &str) -> String {
        if self.trim_output {
            s.trim().to_string()
        } else {
            s.to_string()
        }
    }

    /// Reader to attach to the command's stdin.
    ///
    /// `None` means no stdin should be attached. The configured source is
    /// moved out, so only the first call returns it.
    pub fn stdin(&mut self) -> Option<Box<dyn Read + Send + 'a>> {
        let source = self.input.take()?;

        if self.log_debug {
            match source.size() {
                Ok(ReaderSize::Known(size)) if size > 0 => self.logger.debug(&format!(
                    "using {} bytes of data from reader as command input",
                    size
                )),
                Ok(_) => self.logger.debug("using data from reader as command input"),
                Err(e) => {
                    self.logger
                        .debug(&format!("could not determine input size: {}", e));
                    self.logger.debug("using data from reader as command input");
                }
            }
        }

        if self.log_input {
            let tap = RedactingWriter::new(
                LogWriter::new(Arc::clone(&self.logger), Level::DEBUG),
                self.redactor.clone(),
            );
            return Some(Box::new(TeeReader::new(source, tap)));
        }

        Some(Box::new(source))
    }

    /// Writer for the command's stdout.
    ///
    /// Logs redacted output (info when streaming, debug when output logging
    /// is on) and copies the original bytes to the configured sink, which is
    /// moved into the first writer built. Later writers log a notice that
    /// the sink is gone.
    pub fn stdout(&mut self) -> MultiWriter<'a> {
        let mut writers = MultiWriter::new();
        if self.stream_output {
            writers.push(self.log_tap(Level::INFO));
        } else if self.log_output {
            writers.push(self.log_tap(Level::DEBUG));
        }
        if let Some(out) = claim_sink(
            &mut self.out,
            &mut self.out_claimed,
            &*self.logger,
            "stdout",
        ) {
            writers.push(out);
        }
        writers
    }

    /// Writer for the command's stderr.
    ///
    /// Logs redacted output (error when streaming, debug when error logging
    /// is on), always records whether anything was written, and copies the
    /// original bytes to the configured sink, moved into the first writer
    /// built like with [`ExecOptions::stdout`].
    pub fn stderr(&mut self) -> MultiWriter<'a> {
        let mut writers = MultiWriter::new();
        if self.stream_output {
            writers.push(self.log_tap(Level::ERROR));
        } else if self.log_error {
            writers.push(self.log_tap(Level::DEBUG));
        }
        writers.push(FlaggingWriter::new(self.wrote_err.clone()));
        if let Some(err_out) = claim_sink(
            &mut self.err_out,
            &mut self.err_out_claimed,
            &*self.logger,
            "stderr",
        ) {
            writers.push(err_out);
        }
        writers
    }

    /// Whether the command wrote anything to stderr.
    pub fn wrote_err(&self) -> bool {
        self.wrote_err.is_set()
    }

    /// Whether stderr output is allowed without failing the command.
    pub fn allow_win_stderr(&self) -> bool {
        self.allow_win_stderr
    }

    /// Whether stdout/stderr are streamed to the info/error logs.
    pub fn streams_output(&self) -> bool {
        self.stream_output
    }

    /// Whether the command text is logged.
    pub fn logs_command(&self) -> bool {
        self.log_command
    }

    /// Whether stdout is logged at debug level.
    pub fn logs_output(&self) -> bool {
        self.log_output
    }

    /// Whether stderr is logged at debug level.
    pub fn logs_error(&self) -> bool {
        self.log_error
    }

    /// Whether stdin data is logged.
    pub fn logs_input(&self) -> bool {
        self.log_input
    }

    /// Whether debug records are emitted at all.
    pub fn logs_debug(&self) -> bool {
        self.log_debug
    }

    /// Whether the final output is trimmed.
    pub fn trims_output(&self) -> bool {
        self.trim_output
    }

    /// The redaction chain.
    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    /// The decorator chain.
    pub fn decorators(&self) -> &DecorateChain {
        &self.decorators
    }

    fn log_tap(&self, level: Level) -> RedactingWriter<LogWriter> {
        RedactingWriter::new(
            LogWriter::new(Arc::clone(&self.logger), level),
            self.redactor.clone(),
        )
    }
}

/// Move a caller sink out of its slot, noting when an earlier writer already has it.
fn claim_sink<'a>(
    slot: &mut Option<Sink<'a>>,
    claimed: &mut bool,
    logger: &dyn Logger,
    name: &str,
) -> Option<Sink<'a>> {
    match slot.take() {
        Some(sink) => {
            *claimed = true;
            Some(sink)
        }
        None => {
            if *claimed {
                logger.debug(&format!(
                    "{} sink is attached to an earlier writer, this writer will not copy to it",
                    name
                ));
            }
            None
        }
    }
}

impl Default for ExecOptions<'_> {
    fn default() -> Self {
        Self::build([])
    }
}

impl fmt::Debug for ExecOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecOptions")
            .field("input", &self.input)
            .field("has_stdout", &self.out.is_some())
            .field("has_stderr", &self.err_out.is_some())
            .field("allow_win_stderr", &self.allow_win_stderr)
            .field("log_debug", &self.log_debug)
            .field("log_error", &self.log_error)
            .field("log_command", &self.log_command)
            .field("log_output", &self.log_output)
            .field("log_input", &self.log_input)
            .field("stream_output", &self.stream_output)
            .field("trim_output", &self.trim_output)
            .field("wrote_err", &self.wrote_err.is_set())
            .field("redact_rules", &self.redactor.len())
            .field("decorators", &self.decorators.len())
            .finish()
    }
}
