//! Shared test utilities for the isolate workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`manifests`]: canned `.isolate` manifest texts
//! - [`tree`]: [`TestIsolateTree`](tree::TestIsolateTree) builder for
//!   temporary directories holding manifests and their includes

pub mod manifests;
pub mod tree;

pub use tree::TestIsolateTree;
