//! Isolate helper CLI
//!
//! Reads a manifest or literal expression from stdin and prints the result
//! as a single JSON document on stdout.

mod cli;
mod commands;
mod error;
mod logging;

use std::io::{Read, Write};

use clap::Parser;
use colored::Colorize;
use isolate_format::LoaderOptions;
use isolate_literal::{ErrorKind, EvalOptions};

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to initialise logging: {}", "warning".yellow().bold(), e);
    }

    if let Err(e) = run(cli).and_then(|json| emit(&json)) {
        report(&e);
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<String> {
    let eval = EvalOptions::default().with_max_depth(cli.max_depth);
    let options = LoaderOptions {
        eval,
        ..LoaderOptions::default()
    };
    tracing::debug!(command = ?cli.command, max_depth = cli.max_depth, "Starting");

    match cli.command {
        Commands::EvalContent => commands::run_eval_content(&read_stdin()?, eval),
        Commands::LoadIsolateAsConfig { isolate_dir } => {
            commands::run_load_isolate_as_config(&isolate_dir, &read_stdin()?, options)
        }
        Commands::LoadIsolateForConfig {
            isolate_dir,
            config_variables,
        } => commands::run_load_isolate_for_config(
            &isolate_dir,
            &read_stdin()?,
            &config_variables,
            options,
        ),
    }
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

/// Write the JSON document to stdout as is, without a trailing newline.
fn emit(json: &str) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(json.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Write the invocation and the failure to stderr.
fn report(e: &CliError) {
    let args: Vec<String> = std::env::args().collect();
    eprintln!("args: {:?}", args);
    eprintln!("{} {}: {}", "raised".red().bold(), e.kind(), e);
}

fn exit_code(e: &CliError) -> i32 {
    match e.kind() {
        ErrorKind::Usage => 2,
        ErrorKind::Parse | ErrorKind::Integrity => 1,
    }
}
