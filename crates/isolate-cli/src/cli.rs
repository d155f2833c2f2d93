//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use isolate_literal::evaluator::DEFAULT_MAX_DEPTH;

/// Evaluate isolate manifests read from stdin and print them as JSON
#[derive(Parser, Debug)]
#[command(name = "isolate-helper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Maximum nesting depth accepted by the literal evaluator
    #[arg(long, global = true, env = "ISOLATE_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Evaluate a literal expression from stdin and print it as JSON
    #[command(name = "eval_content")]
    EvalContent,

    /// Resolve a manifest from stdin into its per-configuration table
    #[command(name = "load_isolate_as_config")]
    LoadIsolateAsConfig {
        /// Directory the manifest lives in; must be absolute
        isolate_dir: PathBuf,
    },

    /// Resolve a manifest from stdin for one fully bound configuration
    ///
    /// Example:
    ///   isolate-helper load_isolate_for_config /src --config-variable OS=linux
    #[command(name = "load_isolate_for_config")]
    LoadIsolateForConfig {
        /// Directory the manifest lives in; must be absolute
        isolate_dir: PathBuf,

        /// Value of one configuration variable, as NAME=VALUE
        #[arg(long = "config-variable", value_parser = parse_config_variable)]
        config_variables: Vec<(String, String)>,
    },
}

/// Parse a `NAME=VALUE` pair. The value may be empty or contain `=`.
fn parse_config_variable(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
