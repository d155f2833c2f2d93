//! Typed view of an evaluated `.isolate` manifest.
//!
//! The accepted layout is strict; anything diverging from it is rejected:
//!
//! ```text
//! {
//!   'includes': ['../common.isolate'],
//!   'conditions': [
//!     ['OS=="linux" and CPU=="x64"', {
//!       'variables': {
//!         'command': ['./run_tests'],
//!         'files': ['run_tests', 'data/'],
//!         'read_only': 1,
//!       },
//!     }],
//!   ],
//!   'variables': {
//!     'files': ['common.txt'],
//!   },
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use isolate_literal::Value;

use crate::condition::Condition;
use crate::config::ReadOnly;
use crate::error::{Error, Result};

const ROOT_KEYS: &[&str] = &["conditions", "includes", "variables"];
const VARIABLE_KEYS: &[&str] = &["command", "files", "read_only"];

/// The `variables` block of a manifest or of one condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    pub command: Vec<String>,
    pub files: Vec<String>,
    pub read_only: Option<ReadOnly>,
}

impl Variables {
    /// Validate and convert a `variables` mapping.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_mapping().ok_or_else(|| {
            Error::invalid_manifest(format!(
                "'variables' must be a mapping, found {}",
                value.type_name()
            ))
        })?;

        for key in map.keys() {
            if !VARIABLE_KEYS.contains(&key.as_str()) {
                return Err(Error::invalid_manifest(format!(
                    "unknown variable '{}', expected one of {:?}",
                    key, VARIABLE_KEYS
                )));
            }
        }

        let read_only = match map.get("read_only") {
            None | Some(Value::Null) => None,
            Some(Value::Integer(level)) => Some(ReadOnly::try_from(*level)?),
            Some(other) => {
                return Err(Error::invalid_manifest(format!(
                    "'read_only' must be an integer, found {}",
                    other.type_name()
                )));
            }
        };

        Ok(Self {
            command: string_list(map, "command")?,
            files: string_list(map, "files")?,
            read_only,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.files.is_empty() && self.read_only.is_none()
    }
}

/// One `[condition, {'variables': ...}]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionBlock {
    pub condition: Condition,
    pub variables: Variables,
}

impl ConditionBlock {
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value.as_sequence().ok_or_else(|| {
            Error::invalid_manifest(format!(
                "each condition must be a sequence, found {}",
                value.type_name()
            ))
        })?;
        let [expr, then] = items else {
            return Err(Error::invalid_manifest(format!(
                "each condition must have exactly 2 items, found {}",
                items.len()
            )));
        };

        let expr = expr.as_str().ok_or_else(|| {
            Error::invalid_manifest(format!(
                "condition expression must be a string, found {}",
                expr.type_name()
            ))
        })?;
        let condition = Condition::parse(expr)?;

        let then = then.as_mapping().ok_or_else(|| {
            Error::invalid_manifest(format!(
                "condition {:?} must map to a mapping, found {}",
                expr,
                then.type_name()
            ))
        })?;
        if let Some(key) = then.keys().find(|k| k.as_str() != "variables") {
            return Err(Error::invalid_manifest(format!(
                "condition {:?} has unexpected key '{}', only 'variables' is allowed",
                expr, key
            )));
        }
        let variables = match then.get("variables") {
            Some(v) => Variables::from_value(v)?,
            None => Variables::default(),
        };

        Ok(Self {
            condition,
            variables,
        })
    }
}

/// A validated manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsolateManifest {
    pub includes: Vec<String>,
    pub conditions: Vec<ConditionBlock>,
    pub variables: Variables,
}

impl IsolateManifest {
    /// Validate an evaluated manifest value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_mapping().ok_or_else(|| {
            Error::invalid_manifest(format!(
                "manifest root must be a mapping, found {}",
                value.type_name()
            ))
        })?;

        for key in map.keys() {
            if !ROOT_KEYS.contains(&key.as_str()) {
                return Err(Error::invalid_manifest(format!(
                    "unknown key '{}', expected one of {:?}",
                    key, ROOT_KEYS
                )));
            }
        }

        let conditions = match map.get("conditions") {
            None => Vec::new(),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(ConditionBlock::from_value)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::invalid_manifest(format!(
                    "'conditions' must be a sequence, found {}",
                    other.type_name()
                )));
            }
        };

        let variables = match map.get("variables") {
            Some(v) => Variables::from_value(v)?,
            None => Variables::default(),
        };

        Ok(Self {
            includes: string_list(map, "includes")?,
            conditions,
            variables,
        })
    }

    /// Sorted names of every variable referenced by a condition.
    pub fn config_variables(&self) -> Vec<String> {
        self.conditions
            .iter()
            .flat_map(|block| block.condition.variables())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// For every config variable, the sorted set of values the conditions
    /// compare it against.
    pub fn variable_domains(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut domains: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for block in &self.conditions {
            for (variable, value) in block.condition.comparisons() {
                domains
                    .entry(variable.to_string())
                    .or_default()
                    .insert(value.to_string());
            }
        }
        domains
    }
}

fn string_list(map: &BTreeMap<String, Value>, key: &str) -> Result<Vec<String>> {
    let Some(value) = map.get(key) else {
        return Ok(Vec::new());
    };
    let items = value.as_sequence().ok_or_else(|| {
        Error::invalid_manifest(format!(
            "'{}' must be a sequence of strings, found {}",
            key,
            value.type_name()
        ))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                Error::invalid_manifest(format!(
                    "'{}' must contain only strings, found {}",
                    key,
                    item.type_name()
                ))
            })
        })
        .collect()
}
