//! `eval_content`: evaluate a literal expression.

use isolate_literal::{EvalOptions, Evaluator};

use crate::error::Result;

/// Evaluate `content` and encode the value as JSON.
pub fn run_eval_content(content: &str, options: EvalOptions) -> Result<String> {
    let value = Evaluator::new(options).eval(content)?;
    tracing::debug!(kind = value.type_name(), "Evaluated content");
    Ok(serde_json::to_string(&value)?)
}
