//! Command-line interface for the execopts filter.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Literal strings to redact (added to the config file's list).
    pub redact_strings: Vec<String>,
    /// Regular expressions to redact (added to the config file's list).
    pub redact_patterns: Vec<String>,
    /// Disable redaction globally.
    pub no_redact: bool,
    /// Expand encoded shell commands before redacting.
    pub decode: bool,
    /// Print this command wrapped for powershell and exit.
    pub ps: Option<String>,
    /// Print this command wrapped for powershell, compressed, and exit.
    pub ps_compressed: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("redact-string") => {
                let value: String = parser.value()?.parse()?;
                if value.is_empty() {
                    return Err(ArgsError::InvalidValue("redact-string", value));
                }
                result.redact_strings.push(value);
            }
            Short('r') | Long("redact") => {
                let value: String = parser.value()?.parse()?;
                if regex::Regex::new(&value).is_err() {
                    return Err(ArgsError::InvalidValue("redact", value));
                }
                result.redact_patterns.push(value);
            }
            Long("no-redact") => {
                result.no_redact = true;
            }
            Short('d') | Long("decode") => {
                result.decode = true;
            }
            Long("ps") => {
                result.ps = Some(parser.value()?.parse()?);
            }
            Long("ps-compressed") => {
                result.ps_compressed = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"execopts {version}
Preview how command output and command lines look once redacted for logs

USAGE:
    execopts [OPTIONS] < INPUT

OPTIONS:
    -c, --config <FILE>          Path to configuration file (JSON)
    -s, --redact-string <TEXT>   Literal text to redact (repeatable)
    -r, --redact <REGEX>         Pattern to redact (repeatable)
        --no-redact              Disable redaction globally
    -d, --decode                 Expand encoded powershell commands
        --ps <COMMAND>           Print COMMAND wrapped for powershell
        --ps-compressed <CMD>    Print CMD wrapped for powershell, gzipped
    -l, --log-level <LVL>        Log level (error, warn, info, debug, trace)
    -h, --help                   Print help
    -V, --version                Print version

ENVIRONMENT VARIABLES:
    EXECOPTS_DISABLE_REDACT      Disable redaction (1/true)
    EXECOPTS_LOG_LEVEL           Log level (overrides config)
    RUST_LOG                     Alternative log level setting

EXAMPLES:
    # Mask a token in a captured log
    execopts -s "$API_TOKEN" < deploy.log

    # Mask anything that looks like a password assignment
    execopts -r 'password=\S+' < output.txt

    # See what a powershell invocation actually runs
    execopts --ps 'Get-Service' | execopts -d
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("execopts {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
