//! Route path value types.

use std::fmt;
use std::path::{Path, PathBuf};

/// Route fragment exactly as the routing layer captured it.
///
/// Wildcard routes deliver either one string (`"templates/1"`) or an ordered
/// list of segments (`["templates", "1"]`). Both join into the same raw path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSegments {
    Single(String),
    Many(Vec<String>),
}

impl RawSegments {
    /// Join the captured segments with `/`, without inspecting them.
    pub fn join(&self) -> String {
        match self {
            RawSegments::Single(path) => path.clone(),
            RawSegments::Many(segments) => segments.join("/"),
        }
    }
}

impl From<&str> for RawSegments {
    fn from(path: &str) -> Self {
        RawSegments::Single(path.to_string())
    }
}

impl From<String> for RawSegments {
    fn from(path: String) -> Self {
        RawSegments::Single(path)
    }
}

impl From<Vec<String>> for RawSegments {
    fn from(segments: Vec<String>) -> Self {
        RawSegments::Many(segments)
    }
}

/// A validated, traversal-free relative route such as `templates/1`.
///
/// Only the validator builds these. Every segment matches `[A-Za-z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedPath(String);

impl SanitizedPath {
    pub(crate) fn new(path: String) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Location of this route under `base_dir` with the given file extension.
    pub fn with_extension_under(&self, base_dir: &Path, extension: &str) -> PathBuf {
        let mut location = base_dir.to_path_buf();
        for segment in self.segments() {
            location.push(segment);
        }
        location.set_extension(extension);
        location
    }
}

impl fmt::Display for SanitizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
