//! Per-configuration settings table
//!
//! A [`Configs`] maps every [`ConfigName`] (one value, or "unbound", per
//! configuration variable) to the [`ConfigSettings`] that apply to it. The
//! table is kept in [`ConfigName`] order, which places bound values before
//! unbound ones.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::manifest::Variables;
use crate::path::{NormalizedPath, rebase_file};

/// How staged files are mapped: 0 writable, 1 read-only, 2 read-only copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadOnly(u8);

impl ReadOnly {
    pub const MAX: u8 = 2;

    pub fn new(level: u8) -> Option<Self> {
        (level <= Self::MAX).then_some(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for ReadOnly {
    type Error = Error;

    fn try_from(level: i64) -> Result<Self> {
        u8::try_from(level)
            .ok()
            .and_then(ReadOnly::new)
            .ok_or_else(|| {
                Error::invalid_manifest(format!(
                    "'read_only' must be between 0 and {}, found {}",
                    ReadOnly::MAX,
                    level
                ))
            })
    }
}

/// Value of one configuration variable within a binding.
///
/// Derived ordering puts every bound value before [`ConfigValue::Unbound`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigValue {
    Bound(String),
    Unbound,
}

impl ConfigValue {
    pub fn bound(value: impl Into<String>) -> Self {
        Self::Bound(value.into())
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, ConfigValue::Bound(_))
    }

    pub fn as_bound(&self) -> Option<&str> {
        match self {
            ConfigValue::Bound(value) => Some(value),
            ConfigValue::Unbound => None,
        }
    }
}

/// A binding: one [`ConfigValue`] per configuration variable, in the order
/// of [`Configs::config_variables`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConfigName(Vec<ConfigValue>);

impl ConfigName {
    pub fn new(values: Vec<ConfigValue>) -> Self {
        Self(values)
    }

    /// The binding with every one of `len` variables unbound.
    pub fn unbound(len: usize) -> Self {
        Self(vec![ConfigValue::Unbound; len])
    }

    pub fn values(&self) -> &[ConfigValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this binding applies to `query`: every variable bound here
    /// must have the same value in `query`.
    pub fn applies_to(&self, query: &ConfigName) -> bool {
        self.0.len() == query.0.len()
            && self
                .0
                .iter()
                .zip(&query.0)
                .all(|(own, asked)| !own.is_bound() || own == asked)
    }
}

impl From<Vec<ConfigValue>> for ConfigName {
    fn from(values: Vec<ConfigValue>) -> Self {
        Self(values)
    }
}

/// Dependencies and command for a single build configuration.
///
/// An empty `isolate_dir` marks the empty settings, which carry nothing and
/// act as the identity for [`ConfigSettings::union`]. Otherwise
/// `isolate_dir` is the absolute directory the command starts from and
/// every entry of `files` is relative to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSettings {
    pub files: Vec<String>,
    pub command: Vec<String>,
    pub read_only: Option<ReadOnly>,
    pub isolate_dir: String,
}

impl ConfigSettings {
    /// Settings for `variables` declared in a manifest located in
    /// `isolate_dir`.
    pub fn new(variables: &Variables, isolate_dir: &NormalizedPath) -> Result<Self> {
        if !isolate_dir.is_absolute() {
            return Err(Error::integrity(format!(
                "settings require an absolute isolate directory, got {}",
                isolate_dir
            )));
        }
        let mut files = variables.files.clone();
        files.sort();
        Ok(Self {
            files,
            command: variables.command.clone(),
            read_only: variables.read_only,
            isolate_dir: isolate_dir.as_str().to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.isolate_dir.is_empty()
    }

    /// Merge two settings.
    ///
    /// `self` has priority for `command` and `read_only`. The result uses the
    /// `isolate_dir` of the side owning the command (or, with no command,
    /// of the side with files), and the other side's files are rebased onto
    /// it unless they start with a path variable (`<(`). Files listed by both
    /// sides appear twice.
    pub fn union(&self, rhs: &ConfigSettings) -> Result<ConfigSettings> {
        if self.is_empty() {
            return Ok(rhs.clone());
        }
        if rhs.is_empty() {
            return Ok(self.clone());
        }

        let (use_rhs, command) = if !self.command.is_empty() {
            (false, self.command.clone())
        } else if !rhs.command.is_empty() {
            (true, rhs.command.clone())
        } else {
            (self.files.is_empty(), Vec::new())
        };
        let read_only = self.read_only.or(rhs.read_only);

        let (primary, secondary) = if use_rhs { (rhs, self) } else { (self, rhs) };
        let primary_dir = NormalizedPath::new(&primary.isolate_dir);
        let secondary_dir = NormalizedPath::new(&secondary.isolate_dir);
        let rebase = secondary_dir.relative_to(&primary_dir).ok_or_else(|| {
            Error::invalid_manifest(format!(
                "cannot express {} relative to {}",
                secondary_dir, primary_dir
            ))
        })?;

        let mut files = primary.files.clone();
        files.extend(secondary.files.iter().map(|f| rebase_file(&rebase, f)));
        files.sort();

        Ok(ConfigSettings {
            files,
            command,
            read_only,
            isolate_dir: primary.isolate_dir.clone(),
        })
    }
}

/// A processed manifest, split by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configs {
    config_variables: Vec<String>,
    by_config: BTreeMap<ConfigName, ConfigSettings>,
}

impl Configs {
    /// An empty table over `config_variables`, which are sorted and
    /// deduplicated.
    pub fn new(mut config_variables: Vec<String>) -> Self {
        config_variables.sort();
        config_variables.dedup();
        Self {
            config_variables,
            by_config: BTreeMap::new(),
        }
    }

    pub fn config_variables(&self) -> &[String] {
        &self.config_variables
    }

    pub fn len(&self) -> usize {
        self.by_config.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_config.is_empty()
    }

    /// Entries in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigName, &ConfigSettings)> {
        self.by_config.iter()
    }

    /// Set the settings for `key`. If `key` is already present the existing
    /// settings are merged with `value`, existing ones taking priority.
    pub fn set_config(&mut self, key: ConfigName, value: ConfigSettings) -> Result<()> {
        if key.len() != self.config_variables.len() {
            return Err(Error::integrity(format!(
                "binding has {} values but the table declares {} variables",
                key.len(),
                self.config_variables.len()
            )));
        }
        match self.by_config.get_mut(&key) {
            Some(existing) => {
                *existing = existing.union(&value)?;
            }
            None => {
                self.by_config.insert(key, value);
            }
        }
        Ok(())
    }

    /// The settings stored for exactly `key`.
    pub fn get_exact_config(&self, key: &ConfigName) -> Option<&ConfigSettings> {
        self.by_config.get(key)
    }

    /// Merge every entry that applies to `key` into a single settings value.
    ///
    /// Entries are merged in binding order, so more specific bindings take
    /// priority. Returns empty settings if none apply.
    pub fn get_config(&self, key: &ConfigName) -> Result<ConfigSettings> {
        let mut out = ConfigSettings::default();
        for (name, settings) in &self.by_config {
            if name.applies_to(key) {
                out = out.union(settings)?;
            }
        }
        Ok(out)
    }

    /// The union of two tables over the union of their variables.
    ///
    /// Variables missing from one side become unbound in its bindings.
    /// Settings under the same binding are merged with `self` taking
    /// priority.
    pub fn union(&self, rhs: &Configs) -> Result<Configs> {
        let mut variables = self.config_variables.clone();
        variables.extend(rhs.config_variables.iter().cloned());
        let mut out = Configs::new(variables);

        for (key, value) in self.expand(&out.config_variables) {
            out.set_config(key, value)?;
        }
        for (key, value) in rhs.expand(&out.config_variables) {
            out.set_config(key, value)?;
        }
        Ok(out)
    }

    /// Realign every binding onto `variables`, a sorted superset of this
    /// table's variables.
    fn expand(&self, variables: &[String]) -> Vec<(ConfigName, ConfigSettings)> {
        let mapping: Vec<Option<usize>> = variables
            .iter()
            .map(|name| self.config_variables.iter().position(|own| own == name))
            .collect();

        self.by_config
            .iter()
            .map(|(key, value)| {
                let values = mapping
                    .iter()
                    .map(|idx| match idx {
                        Some(i) => key.0[*i].clone(),
                        None => ConfigValue::Unbound,
                    })
                    .collect();
                (ConfigName(values), value.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(dir: &str, command: &[&str], files: &[&str], read_only: Option<u8>) -> ConfigSettings {
        let variables = Variables {
            command: command.iter().map(|s| s.to_string()).collect(),
            files: files.iter().map(|s| s.to_string()).collect(),
            read_only: read_only.and_then(ReadOnly::new),
        };
        ConfigSettings::new(&variables, &NormalizedPath::new(dir)).unwrap()
    }

    fn name(values: &[Option<&str>]) -> ConfigName {
        ConfigName::new(
            values
                .iter()
                .map(|v| match v {
                    Some(v) => ConfigValue::bound(*v),
                    None => ConfigValue::Unbound,
                })
                .collect(),
        )
    }

    #[test]
    fn test_read_only_range() {
        assert_eq!(ReadOnly::new(0).map(ReadOnly::level), Some(0));
        assert_eq!(ReadOnly::new(2).map(ReadOnly::level), Some(2));
        assert!(ReadOnly::new(3).is_none());
        assert!(ReadOnly::try_from(-1).is_err());
        assert!(ReadOnly::try_from(256).is_err());
    }

    #[test]
    fn test_bound_sorts_before_unbound() {
        let mut names = vec![
            name(&[None]),
            name(&[Some("mac")]),
            name(&[Some("linux")]),
        ];
        names.sort();
        assert_eq!(
            names,
            vec![name(&[Some("linux")]), name(&[Some("mac")]), name(&[None])]
        );
    }

    #[test]
    fn test_applies_to() {
        let query = name(&[Some("x64"), Some("linux")]);
        assert!(name(&[None, None]).applies_to(&query));
        assert!(name(&[None, Some("linux")]).applies_to(&query));
        assert!(!name(&[None, Some("mac")]).applies_to(&query));
        assert!(!name(&[None]).applies_to(&query));
    }

    #[test]
    fn test_settings_sort_files() {
        let s = settings("/src", &[], &["b", "a"], None);
        assert_eq!(s.files, vec!["a", "b"]);
        assert_eq!(s.isolate_dir, "/src");
    }

    #[test]
    fn test_settings_require_absolute_dir() {
        let err = ConfigSettings::new(&Variables::default(), &NormalizedPath::new("rel")).unwrap_err();
        assert!(matches!(err, Error::Integrity { .. }));
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let s = settings("/src", &["run"], &["a"], Some(1));
        assert_eq!(ConfigSettings::default().union(&s).unwrap(), s);
        assert_eq!(s.union(&ConfigSettings::default()).unwrap(), s);
    }

    #[test]
    fn test_union_lhs_command_wins_and_rebases_rhs() {
        let lhs = settings("/src/tests", &["run"], &["a"], None);
        let rhs = settings("/src", &["other"], &["common/", "<(DIR)/x"], Some(2));
        let merged = lhs.union(&rhs).unwrap();
        assert_eq!(merged.command, vec!["run"]);
        assert_eq!(merged.isolate_dir, "/src/tests");
        assert_eq!(merged.read_only, ReadOnly::new(2));
        assert_eq!(merged.files, vec!["../common/", "<(DIR)/x", "a"]);
    }

    #[test]
    fn test_union_rhs_command_moves_isolate_dir() {
        let lhs = settings("/src", &[], &["base.txt"], Some(0));
        let rhs = settings("/src/tests", &["run"], &["t.py"], Some(1));
        let merged = lhs.union(&rhs).unwrap();
        assert_eq!(merged.command, vec!["run"]);
        assert_eq!(merged.isolate_dir, "/src/tests");
        assert_eq!(merged.read_only, ReadOnly::new(0));
        assert_eq!(merged.files, vec!["../base.txt", "t.py"]);
    }

    #[test]
    fn test_union_keeps_files_listed_on_both_sides() {
        let lhs = settings("/src", &["run"], &["a", "shared"], None);
        let rhs = settings("/src", &[], &["shared"], None);
        let merged = lhs.union(&rhs).unwrap();
        assert_eq!(merged.files, vec!["a", "shared", "shared"]);
    }

    #[test]
    fn test_union_without_command_prefers_side_with_files() {
        let lhs = settings("/a", &[], &[], None);
        let rhs = settings("/b", &[], &["x"], None);
        let merged = lhs.union(&rhs).unwrap();
        assert_eq!(merged.isolate_dir, "/b");
        assert_eq!(merged.files, vec!["x"]);
    }

    #[test]
    fn test_set_config_checks_arity() {
        let mut configs = Configs::new(vec!["OS".into()]);
        let err = configs
            .set_config(ConfigName::unbound(2), settings("/src", &[], &[], None))
            .unwrap_err();
        assert!(matches!(err, Error::Integrity { .. }));
    }

    #[test]
    fn test_set_config_merges_duplicates() {
        let mut configs = Configs::new(vec!["OS".into()]);
        let key = name(&[Some("linux")]);
        configs
            .set_config(key.clone(), settings("/src", &["run"], &["a"], None))
            .unwrap();
        configs
            .set_config(key.clone(), settings("/src", &["ignored"], &["b"], None))
            .unwrap();
        assert_eq!(configs.len(), 1);
        let merged = configs.get_exact_config(&key).unwrap();
        assert_eq!(merged.command, vec!["run"]);
        assert_eq!(merged.files, vec!["a", "b"]);
    }

    #[test]
    fn test_get_config_merges_applicable_entries() {
        let mut configs = Configs::new(vec!["OS".into()]);
        configs
            .set_config(name(&[None]), settings("/src", &[], &["common"], None))
            .unwrap();
        configs
            .set_config(name(&[Some("linux")]), settings("/src", &["run"], &["linux.so"], Some(1)))
            .unwrap();
        configs
            .set_config(name(&[Some("mac")]), settings("/src", &["run_mac"], &["mac.dylib"], None))
            .unwrap();

        let linux = configs.get_config(&name(&[Some("linux")])).unwrap();
        assert_eq!(linux.command, vec!["run"]);
        assert_eq!(linux.files, vec!["common", "linux.so"]);
        assert_eq!(linux.read_only, ReadOnly::new(1));

        let win = configs.get_config(&name(&[Some("win")])).unwrap();
        assert!(win.command.is_empty());
        assert_eq!(win.files, vec!["common"]);
    }

    #[test]
    fn test_union_realigns_variables() {
        let mut lhs = Configs::new(vec!["OS".into()]);
        lhs.set_config(name(&[Some("linux")]), settings("/src", &["run"], &[], None))
            .unwrap();
        let mut rhs = Configs::new(vec!["CPU".into()]);
        rhs.set_config(name(&[Some("arm")]), settings("/src", &[], &["arm.bin"], None))
            .unwrap();

        let merged = lhs.union(&rhs).unwrap();
        assert_eq!(merged.config_variables().to_vec(), vec!["CPU", "OS"]);
        let keys: Vec<&ConfigName> = merged.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![&name(&[Some("arm"), None]), &name(&[None, Some("linux")])]
        );
    }

    #[test]
    fn test_union_merges_equal_keys_with_lhs_priority() {
        let mut lhs = Configs::new(vec![]);
        lhs.set_config(ConfigName::unbound(0), settings("/src", &["lhs"], &["a"], None))
            .unwrap();
        let mut rhs = Configs::new(vec![]);
        rhs.set_config(ConfigName::unbound(0), settings("/src", &["rhs"], &["b"], None))
            .unwrap();
        let merged = lhs.union(&rhs).unwrap();
        assert_eq!(merged.len(), 1);
        let (_, only) = merged.iter().next().unwrap();
        assert_eq!(only.command, vec!["lhs"]);
        assert_eq!(only.files, vec!["a", "b"]);
    }
}
