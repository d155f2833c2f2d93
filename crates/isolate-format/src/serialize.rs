//! Wire form of a [`Configs`] table.
//!
//! ```text
//! { "ConfigVariables": ["OS"],
//!   "ByConfig": [ { "key": [ {"Value": "linux", "IsBound": true} ],
//!                   "value": { "ReadOnly": -1, "Files": [...],
//!                              "Command": [...], "IsolateDir": "/src" } } ] }
//! ```
//!
//! Unbound variables are tagged rather than encoded as an empty string, and
//! a missing read-only level is written as `-1`.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigName, ConfigSettings, ConfigValue, Configs};
use crate::error::{Error, Result};

/// Sentinel written for an unspecified read-only level.
pub const READ_ONLY_UNSPECIFIED: i64 = -1;

/// One variable of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub value: String,
    pub is_bound: bool,
}

impl From<&ConfigValue> for KeyValue {
    fn from(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Bound(value) => Self {
                value: value.clone(),
                is_bound: true,
            },
            ConfigValue::Unbound => Self {
                value: String::new(),
                is_bound: false,
            },
        }
    }
}

/// Settings of one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingsRecord {
    pub read_only: i64,
    pub files: Vec<String>,
    pub command: Vec<String>,
    pub isolate_dir: String,
}

impl From<&ConfigSettings> for SettingsRecord {
    fn from(settings: &ConfigSettings) -> Self {
        Self {
            read_only: settings
                .read_only
                .map_or(READ_ONLY_UNSPECIFIED, |r| i64::from(r.level())),
            files: settings.files.clone(),
            command: settings.command.clone(),
            isolate_dir: settings.isolate_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: Vec<KeyValue>,
    pub value: SettingsRecord,
}

/// Serializable form of a [`Configs`] table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigTable {
    pub config_variables: Vec<String>,
    pub by_config: Vec<ConfigEntry>,
}

impl ConfigTable {
    /// Build the table from variable names and `(binding, settings)` pairs,
    /// kept in the given order.
    ///
    /// Every binding must have exactly one value per variable.
    pub fn from_parts<'a, I>(config_variables: &[String], entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a ConfigName, &'a ConfigSettings)>,
    {
        let by_config = entries
            .into_iter()
            .map(|(name, settings)| {
                if name.len() != config_variables.len() {
                    return Err(Error::integrity(format!(
                        "binding has {} values but {} variables are declared",
                        name.len(),
                        config_variables.len()
                    )));
                }
                Ok(ConfigEntry {
                    key: name.values().iter().map(KeyValue::from).collect(),
                    value: SettingsRecord::from(settings),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config_variables: config_variables.to_vec(),
            by_config,
        })
    }

    /// Build the table from a resolved [`Configs`], in binding order.
    pub fn from_configs(configs: &Configs) -> Result<Self> {
        Self::from_parts(configs.config_variables(), configs.iter())
    }
}
