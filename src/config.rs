//! Configuration management for execopts.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::error::ExecOptionsError;
use crate::options::ExecOption;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// What gets logged during execution.
    pub logging: LoggingSection,
    /// Final output handling.
    pub output: OutputSection,
    /// Redaction rules.
    pub redact: RedactSection,
    /// Alternate shell wrapping.
    pub shell: ShellSection,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log the command text.
    pub command: bool,
    /// Log stdout at debug level.
    pub output: bool,
    /// Log stdin data at debug level.
    pub input: bool,
    /// Log stderr at debug level.
    pub errors: bool,
    /// Stream stdout/stderr to the info/error logs.
    pub stream: bool,
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            command: true,
            output: true,
            input: false,
            errors: true,
            stream: false,
            level: "info".to_string(),
        }
    }
}

/// Output configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Trim surrounding whitespace from the final output.
    pub trim: bool,
    /// Allow stderr output without failing the command.
    pub allow_stderr: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            trim: true,
            allow_stderr: false,
        }
    }
}

/// Redaction configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactSection {
    /// Regular expressions to mask.
    pub patterns: Vec<String>,
    /// Literal strings to mask.
    pub strings: Vec<String>,
    /// Disable redaction process-wide.
    pub disabled: bool,
}

/// Shell wrapping configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// How commands are wrapped before execution.
    pub mode: ShellMode,
}

/// Alternate shell decoration mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellMode {
    /// Run commands as given.
    #[default]
    None,
    /// Wrap in `powershell.exe -EncodedCommand`.
    Powershell,
    /// Wrap in a gzip+base64 bootstrap for long powershell scripts.
    PowershellCompressed,
}

impl ExecConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("EXECOPTS_DISABLE_REDACT") {
            self.redact.disabled = is_truthy(&value);
        }

        if let Ok(level) = std::env::var("EXECOPTS_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        for s in &args.redact_strings {
            if !self.redact.strings.contains(s) {
                self.redact.strings.push(s.clone());
            }
        }
        for p in &args.redact_patterns {
            if !self.redact.patterns.contains(p) {
                self.redact.patterns.push(p.clone());
            }
        }

        if args.no_redact {
            self.redact.disabled = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = ExecConfig::default();

        if let Some(ref path) = args.config {
            config = ExecConfig::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to an ordered list of options for [`crate::ExecOptions::build`].
    ///
    /// Fails if a redaction pattern does not compile.
    pub fn to_options<'a>(&self) -> Result<Vec<ExecOption<'a>>, ConfigError> {
        let mut opts = Vec::new();

        opts.push(ExecOption::log_error(self.logging.errors));
        if !self.logging.output {
            opts.push(ExecOption::hide_output());
        }
        opts.push(ExecOption::log_input(self.logging.input));
        if self.logging.stream {
            opts.push(ExecOption::stream_output());
        }
        if !self.logging.command {
            opts.push(ExecOption::hide_command());
        }

        opts.push(ExecOption::trim_output(self.output.trim));
        if self.output.allow_stderr {
            opts.push(ExecOption::allow_win_stderr());
        }

        if !self.redact.strings.is_empty() {
            opts.push(ExecOption::redact_string(self.redact.strings.clone()));
        }
        for pattern in &self.redact.patterns {
            opts.push(ExecOption::redact(pattern).map_err(ConfigError::Pattern)?);
        }

        match self.shell.mode {
            ShellMode::None => {}
            ShellMode::Powershell => opts.push(ExecOption::ps()),
            ShellMode::PowershellCompressed => opts.push(ExecOption::ps_compressed()),
        }

        Ok(opts)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// A redaction pattern did not compile.
    Pattern(ExecOptionsError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::Pattern(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
