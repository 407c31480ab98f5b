//! execopts binary entry point.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use execopts::cli::{self, Args};
use execopts::{expand_encoded, logging, powershell, ExecConfig, ExecOptions};
use tracing::{debug, error};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match ExecConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_filter(Some(config.log_filter()));
    execopts::set_redaction_disabled(config.redact.disabled);

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &ExecConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();

    if let Some(ref script) = args.ps {
        writeln!(stdout, "{}", powershell::cmd(script))?;
        return Ok(());
    }
    if let Some(ref script) = args.ps_compressed {
        writeln!(stdout, "{}", powershell::compressed_cmd(script))?;
        return Ok(());
    }

    let options = ExecOptions::build(config.to_options()?);
    debug!(
        "filtering stdin with {} redaction rule(s)",
        options.redactor().len()
    );

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = if args.decode {
            expand_encoded(&line)
        } else {
            line
        };
        writeln!(stdout, "{}", options.redact(&line))?;
    }
    stdout.flush()?;

    Ok(())
}
