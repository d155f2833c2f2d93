//! Normalized path handling for isolate directories and file entries
//!
//! Manifest file entries always use `/` as separator while isolate
//! directories arrive in the platform's native form. Both are handled here
//! as forward-slash strings and converted back to native only when a file
//! is actually read.

use std::path::{Path, PathBuf};

/// A lexically cleaned path using forward slashes internally.
///
/// Cleaning resolves `.` and `..` components and collapses repeated
/// separators, like `posixpath.normpath`. A trailing `/` is kept because
/// manifests use it to mark directory entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            inner: clean(&raw),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Whether the path is absolute, either `/...` or a drive path `C:/...`.
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with('/') || drive_prefix(&self.inner).is_some()
    }

    /// Join a relative segment onto this path. An absolute segment replaces
    /// the path entirely.
    pub fn join(&self, segment: &str) -> Self {
        let segment = NormalizedPath::new(segment);
        if segment.is_absolute() {
            return segment;
        }
        if segment.inner == "." {
            return self.clone();
        }
        if self.inner == "." {
            return segment;
        }
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment.inner)),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            None if trimmed.is_empty() || trimmed == "." => None,
            None => Some(Self {
                inner: ".".to_string(),
            }),
        }
    }

    /// Express this path relative to `base`, like `os.path.relpath`.
    ///
    /// Both paths must be absolute. Returns `None` when no relative path
    /// exists, e.g. for paths on different drives.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<String> {
        if !self.is_absolute() || !base.is_absolute() {
            return None;
        }
        if drive_prefix(&self.inner).map(str::to_ascii_lowercase)
            != drive_prefix(&base.inner).map(str::to_ascii_lowercase)
        {
            return None;
        }

        let target: Vec<&str> = components(&self.inner).collect();
        let from: Vec<&str> = components(&base.inner).collect();
        let common = target
            .iter()
            .zip(from.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = vec![".."; from.len() - common];
        parts.extend(&target[common..]);
        if parts.is_empty() {
            Some(".".to_string())
        } else {
            Some(parts.join("/"))
        }
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

/// Join a manifest file entry onto a relative rebase path.
///
/// Entries starting with a path variable (`<(`) are left untouched, as are
/// all entries when the rebase path is `.`.
pub fn rebase_file(rebase: &str, file: &str) -> String {
    if rebase == "." || file.starts_with("<(") {
        return file.to_string();
    }
    NormalizedPath::new(rebase).join(file).inner
}

fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(&path[..2])
    } else {
        None
    }
}

/// Components after the root or drive prefix.
fn components(path: &str) -> impl Iterator<Item = &str> {
    let rest = match drive_prefix(path) {
        Some(prefix) => &path[prefix.len()..],
        None => path,
    };
    rest.split('/').filter(|c| !c.is_empty())
}

fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let (prefix, rest) = match drive_prefix(path) {
        Some(prefix) => (prefix, &path[prefix.len()..]),
        None => ("", path),
    };
    let rooted = rest.starts_with('/');
    let trailing = rest.len() > 1 && rest.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for component in rest.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let mut out = String::from(prefix);
    if rooted {
        out.push('/');
    }
    out.push_str(&parts.join("/"));
    if out.is_empty() {
        return ".".to_string();
    }
    if trailing && !parts.is_empty() {
        out.push('/');
    }
    out
}
