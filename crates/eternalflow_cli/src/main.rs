//! EternalFlow terminal front end.
//!
//! # Responsibility
//! - Parse flags, set up optional file logging, run one subcommand.
//! - Map failures to a message on stderr and a non-zero exit status.

mod commands;
mod config;
mod display;

use clap::Parser;
use config::Cli;
use eternalflow_core::init_logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(log_config) = cli.log_config(&cwd) {
            if let Err(err) = init_logging(&log_config) {
                eprintln!("warning: logging disabled: {err}");
            }
        }
    }

    match commands::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
