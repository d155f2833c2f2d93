//! `load_isolate_as_config` and `load_isolate_for_config`.

use std::collections::BTreeMap;
use std::path::Path;

use isolate_format::{ConfigTable, IsolateLoader, LoaderOptions, SettingsRecord};

use crate::error::Result;

/// Resolve the manifest `content` located in `isolate_dir` into the wire
/// table.
pub fn run_load_isolate_as_config(
    isolate_dir: &Path,
    content: &str,
    options: LoaderOptions,
) -> Result<String> {
    let loader = IsolateLoader::new(isolate_format::FsIncludeSource, options);
    let configs = loader.load_content_as_config(isolate_dir, content)?;
    let table = ConfigTable::from_configs(&configs)?;
    tracing::debug!(
        variables = table.config_variables.len(),
        entries = table.by_config.len(),
        "Resolved isolate"
    );
    Ok(serde_json::to_string(&table)?)
}

/// Resolve the manifest `content` for the binding given by
/// `config_variables` and encode the merged settings.
pub fn run_load_isolate_for_config(
    isolate_dir: &Path,
    content: &str,
    config_variables: &[(String, String)],
    options: LoaderOptions,
) -> Result<String> {
    let loader = IsolateLoader::new(isolate_format::FsIncludeSource, options);
    let value = loader.evaluator().eval(content)?;
    let vars: BTreeMap<String, String> = config_variables.iter().cloned().collect();
    let settings = loader.load_isolate_for_config(isolate_dir, &value, &vars)?;
    Ok(serde_json::to_string(&SettingsRecord::from(&settings))?)
}
