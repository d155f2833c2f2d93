//! [`TestIsolateTree`] builder for manifest loading scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary source tree holding `.isolate` manifests, with helpers for
/// test setup and assertion.
///
/// # Example
///
/// ```rust
/// use isolate_test_utils::TestIsolateTree;
///
/// let tree = TestIsolateTree::new();
/// tree.write_isolate("common/base.isolate", "{'variables': {'files': ['a']}}");
/// tree.assert_file_exists("common/base.isolate");
/// ```
pub struct TestIsolateTree {
    temp_dir: TempDir,
}

impl Default for TestIsolateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestIsolateTree {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the tree.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Create the directory `rel` (and its parents) and return its path.
    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let dir = self.path(rel);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Write `content` to `rel`, creating parent directories as needed.
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a manifest at `rel` and return its path.
    pub fn write_isolate(&self, rel: &str, manifest: &str) -> PathBuf {
        self.write_file(rel, manifest)
    }

    /// Read back the manifest at `rel`.
    pub fn read(&self, rel: &str) -> String {
        let path = self.path(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Root path as a forward-slash string, the way isolate directories
    /// appear in resolved output.
    pub fn root_str(&self) -> String {
        self.root().to_string_lossy().replace('\\', "/")
    }

    /// Assert that `rel` exists in the tree.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }
}
