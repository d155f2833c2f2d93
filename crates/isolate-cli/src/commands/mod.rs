//! Command implementations for isolate-cli
//!
//! Each command takes the stdin text and returns the JSON document to print.

pub mod eval;
pub mod isolate;

pub use eval::run_eval_content;
pub use isolate::{run_load_isolate_as_config, run_load_isolate_for_config};
