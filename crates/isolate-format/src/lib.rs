//! Isolate manifest resolution and wire serialization.
//!
//! An `.isolate` manifest lists the files a target needs and the command to
//! run, optionally varying both by configuration variables such as `OS`.
//! This crate turns an evaluated manifest into a [`Configs`] table keyed by
//! variable bindings and serializes that table into the JSON record consumed
//! by the isolate client.
//!
//! ```
//! use isolate_format::{ConfigTable, IsolateLoader};
//! use std::path::Path;
//!
//! let loader = IsolateLoader::from_filesystem();
//! let content = r#"{
//!   'conditions': [
//!     ['OS=="linux"', {'variables': {'command': ['./run'], 'files': ['run']}}],
//!   ],
//! }"#;
//! let configs = loader.load_content_as_config(Path::new("/src"), content).unwrap();
//! let table = ConfigTable::from_configs(&configs).unwrap();
//!
//! assert_eq!(table.config_variables, vec!["OS"]);
//! assert_eq!(table.by_config.len(), 2);
//! ```

pub mod condition;
pub mod config;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod path;
pub mod serialize;

pub use condition::Condition;
pub use config::{ConfigName, ConfigSettings, ConfigValue, Configs, ReadOnly};
pub use error::{Error, Result};
pub use isolate_literal::ErrorKind;
pub use loader::{FsIncludeSource, IncludeSource, IsolateLoader, LoaderOptions};
pub use manifest::{ConditionBlock, IsolateManifest, Variables};
pub use serialize::{ConfigEntry, ConfigTable, KeyValue, SettingsRecord};
