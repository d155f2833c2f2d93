//! Restricted literal evaluator for isolate manifests.
//!
//! Isolate manifests are written as a single literal expression: nested
//! mappings, sequences, strings, integers, booleans and `None`. This crate
//! turns such text into a [`Value`] graph without ever resolving a name,
//! calling a function or touching the environment.
//!
//! ```
//! use isolate_literal::{Value, eval_content};
//!
//! let value = eval_content("{'variables': {'files': ['a.txt'], 'read_only': 1}}").unwrap();
//! let variables = value.get("variables").unwrap();
//! assert_eq!(variables.get("read_only"), Some(&Value::Integer(1)));
//! ```
//!
//! Anything outside the literal grammar is rejected:
//!
//! ```
//! use isolate_literal::{ErrorKind, eval_content};
//!
//! let err = eval_content("__import__('os').system('true')").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Parse);
//! ```

pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod value;

pub use error::{Error, ErrorKind, Result};
pub use evaluator::{EvalOptions, Evaluator, eval_content};
pub use lexer::{Lexer, Token, TokenKind};
pub use value::Value;
