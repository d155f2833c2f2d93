//! Loading manifests into a [`Configs`] table.
//!
//! The loader owns everything needed to resolve a manifest: the literal
//! evaluator for included files and an [`IncludeSource`] to read them.
//! Both are handed in at construction so callers decide where includes
//! come from.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use isolate_literal::{EvalOptions, Evaluator, Value};

use crate::condition::Condition;
use crate::config::{ConfigName, ConfigSettings, ConfigValue, Configs};
use crate::error::{Error, Result};
use crate::manifest::IsolateManifest;
use crate::path::NormalizedPath;

/// Reads the text of an included manifest.
pub trait IncludeSource {
    fn read_include(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads includes from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsIncludeSource;

impl IncludeSource for FsIncludeSource {
    fn read_include(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Default maximum include nesting.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Default maximum number of variable combinations tried per condition.
pub const DEFAULT_MAX_COMBINATIONS: usize = 1 << 16;

/// Limits applied while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Limits for evaluating included manifests.
    pub eval: EvalOptions,
    /// Maximum include nesting.
    pub max_include_depth: usize,
    /// Maximum number of variable combinations tried per condition.
    pub max_combinations: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            eval: EvalOptions::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
        }
    }
}

/// Resolves evaluated manifests into [`Configs`] tables.
pub struct IsolateLoader<S = FsIncludeSource> {
    source: S,
    evaluator: Evaluator,
    options: LoaderOptions,
}

impl IsolateLoader<FsIncludeSource> {
    /// A loader reading includes from disk with default limits.
    pub fn from_filesystem() -> Self {
        Self::new(FsIncludeSource, LoaderOptions::default())
    }
}

impl<S: IncludeSource> IsolateLoader<S> {
    pub fn new(source: S, options: LoaderOptions) -> Self {
        Self {
            source,
            evaluator: Evaluator::new(options.eval),
            options,
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// The evaluator used for manifest text.
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate `content` and load it as a manifest located in `isolate_dir`.
    pub fn load_content_as_config(&self, isolate_dir: &Path, content: &str) -> Result<Configs> {
        absolute_dir(isolate_dir)?;
        let value = self.evaluator.eval(content)?;
        self.load_isolate_as_config(isolate_dir, &value)
    }

    /// Load an evaluated manifest located in `isolate_dir`.
    ///
    /// `isolate_dir` must be absolute; it is the base for relative includes
    /// and for every file entry. The returned table always holds the global
    /// binding (every variable unbound) built from the root `variables`, one
    /// entry per binding matched by a condition, and the union of all
    /// included manifests. The manifest's own settings take precedence over
    /// its includes, and a later include over an earlier one.
    pub fn load_isolate_as_config(&self, isolate_dir: &Path, value: &Value) -> Result<Configs> {
        let dir = absolute_dir(isolate_dir)?;
        let mut stack = Vec::new();
        self.load(&dir, value, &mut stack)
    }

    /// Load a manifest and merge everything that applies to one fully
    /// specified configuration.
    ///
    /// Every configuration variable of the manifest must have a value in
    /// `config_variables`; extra entries are ignored.
    pub fn load_isolate_for_config(
        &self,
        isolate_dir: &Path,
        value: &Value,
        config_variables: &BTreeMap<String, String>,
    ) -> Result<ConfigSettings> {
        let configs = self.load_isolate_as_config(isolate_dir, value)?;

        let mut missing = Vec::new();
        let mut values = Vec::with_capacity(configs.config_variables().len());
        for variable in configs.config_variables() {
            match config_variables.get(variable) {
                Some(value) => values.push(ConfigValue::bound(value.clone())),
                None => missing.push(variable.clone()),
            }
        }
        if !missing.is_empty() {
            missing.sort();
            return Err(Error::MissingConfigVariables { missing });
        }

        configs.get_config(&ConfigName::new(values))
    }

    fn load(
        &self,
        dir: &NormalizedPath,
        value: &Value,
        stack: &mut Vec<NormalizedPath>,
    ) -> Result<Configs> {
        let manifest = IsolateManifest::from_value(value)?;
        let domains = manifest.variable_domains();
        let mut isolate = Configs::new(manifest.config_variables());
        tracing::debug!(
            isolate_dir = %dir,
            variables = ?isolate.config_variables(),
            conditions = manifest.conditions.len(),
            includes = manifest.includes.len(),
            "Loading isolate manifest"
        );

        isolate.set_config(
            ConfigName::unbound(isolate.config_variables().len()),
            ConfigSettings::new(&manifest.variables, dir)?,
        )?;

        for block in &manifest.conditions {
            let names = match_configs(
                &block.condition,
                isolate.config_variables(),
                &domains,
                self.options.max_combinations,
            )?;
            if names.is_empty() {
                tracing::warn!(condition = %block.condition, "Condition matches no configuration");
            } else {
                tracing::debug!(condition = %block.condition, matched = names.len(), "Matched condition");
            }
            for name in names {
                isolate.set_config(name, ConfigSettings::new(&block.variables, dir)?)?;
            }
        }

        // Merged last to first so later includes take precedence.
        for include in manifest.includes.iter().rev() {
            if NormalizedPath::new(include).is_absolute() {
                return Err(Error::invalid_manifest(format!(
                    "absolute include path '{}' is not allowed",
                    include
                )));
            }
            let path = dir.join(include);
            if stack.contains(&path) {
                return Err(Error::invalid_manifest(format!(
                    "include cycle detected at {}",
                    path
                )));
            }
            if stack.len() >= self.options.max_include_depth {
                return Err(Error::invalid_manifest(format!(
                    "includes nest deeper than {} levels",
                    self.options.max_include_depth
                )));
            }
            let include_dir = path.parent().ok_or_else(|| {
                Error::invalid_manifest(format!("include {} has no parent directory", path))
            })?;

            tracing::debug!(include = %path, "Loading include");
            let content = self
                .source
                .read_include(&path.to_native())
                .map_err(|source| Error::Include {
                    path: path.to_native(),
                    source,
                })?;
            let included_value = self.evaluator.eval(&content)?;

            stack.push(path);
            let included = self.load(&include_dir, &included_value, stack)?;
            stack.pop();

            isolate = isolate.union(&included)?;
        }

        Ok(isolate)
    }
}

fn absolute_dir(isolate_dir: &Path) -> Result<NormalizedPath> {
    let dir = NormalizedPath::new(isolate_dir);
    if !dir.is_absolute() {
        return Err(Error::RelativeIsolateDir {
            path: isolate_dir.to_path_buf(),
        });
    }
    Ok(dir)
}

/// Every binding over `config_variables` for which `condition` holds.
///
/// The variables the condition references are bound to each combination
/// of their known values; all other variables stay unbound.
fn match_configs(
    condition: &Condition,
    config_variables: &[String],
    domains: &BTreeMap<String, BTreeSet<String>>,
    max_combinations: usize,
) -> Result<Vec<ConfigName>> {
    let referenced: Vec<&str> = condition.variables().into_iter().collect();

    let mut positions = Vec::with_capacity(referenced.len());
    let mut choices: Vec<Vec<&str>> = Vec::with_capacity(referenced.len());
    for variable in &referenced {
        let position = config_variables
            .iter()
            .position(|v| v == variable)
            .ok_or_else(|| {
                Error::integrity(format!(
                    "condition {:?} references undeclared variable '{}'",
                    condition.as_str(),
                    variable
                ))
            })?;
        positions.push(position);
        choices.push(
            domains
                .get(*variable)
                .map(|values| values.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        );
    }

    let total = choices
        .iter()
        .try_fold(1usize, |acc, values| acc.checked_mul(values.len()))
        .filter(|total| *total <= max_combinations)
        .ok_or_else(|| {
            Error::invalid_manifest(format!(
                "condition {:?} expands to more than {} combinations",
                condition.as_str(),
                max_combinations
            ))
        })?;

    let mut out = Vec::new();
    let mut indices = vec![0usize; choices.len()];
    for _ in 0..total {
        let bindings: BTreeMap<&str, &str> = referenced
            .iter()
            .zip(&indices)
            .enumerate()
            .map(|(i, (variable, idx))| (*variable, choices[i][*idx]))
            .collect();

        if condition.evaluate(&bindings) == Some(true) {
            let mut values = vec![ConfigValue::Unbound; config_variables.len()];
            for (i, position) in positions.iter().enumerate() {
                values[*position] = ConfigValue::bound(choices[i][indices[i]]);
            }
            out.push(ConfigName::new(values));
        }

        for (i, idx) in indices.iter_mut().enumerate().rev() {
            *idx += 1;
            if *idx < choices[i].len() {
                break;
            }
            *idx = 0;
        }
    }
    Ok(out)
}
