//! Project-relative asset paths

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A `/`-separated path relative to the project root (e.g. `Mods/M1/Materials/metal.mat`).
///
/// Separators are normalized on construction. Equality is exact, but every
/// containment and identity check the resolver makes goes through the
/// case-insensitive helpers (`is_under`, `same_as`, `key`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AssetPath(String);

impl AssetPath {
    /// Build a path, normalizing separators, dropping empty or `.` segments
    /// and collapsing `..` against the segment before it.
    ///
    /// A `..` with nothing left to collapse is kept, see [`AssetPath::escapes_root`].
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path.as_ref().replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();
        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                ".." => match segments.last() {
                    Some(&last) if last != ".." => {
                        segments.pop();
                    }
                    _ => segments.push(".."),
                },
                s => segments.push(s),
            }
        }
        Self(segments.join("/"))
    }

    /// Convert a filesystem path under `root` into an asset path
    pub fn from_fs_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(Self(segments.join("/")))
    }

    /// Resolve this asset path against a project root on disk
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.segments() {
            out.push(segment);
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the path climbs above the project root
    pub fn escapes_root(&self) -> bool {
        self.0 == ".." || self.0.starts_with("../")
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Append one or more `/`-separated segments
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        if self.0.is_empty() {
            Self::new(segment)
        } else {
            Self::new(format!("{}/{}", self.0, segment.as_ref()))
        }
    }

    /// The containing folder, or `None` for a top-level entry
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Final segment, including any extension
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Final segment without its extension
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Extension including the leading dot (".png"), or "" if there is none
    pub fn extension(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => "",
            Some(idx) => &name[idx..],
        }
    }

    /// Sibling path with a different final segment
    pub fn with_file_name(&self, name: &str) -> Self {
        match self.parent() {
            Some(parent) => parent.join(name),
            None => Self::new(name),
        }
    }

    /// Case-insensitive identity key used for grouping and lookups
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive equality
    pub fn same_as(&self, other: &AssetPath) -> bool {
        self.key() == other.key()
    }

    /// True if this path lies strictly inside `dir` (case-insensitive)
    pub fn is_under(&self, dir: &AssetPath) -> bool {
        if self.escapes_root() {
            return false;
        }
        if dir.is_empty() {
            return !self.is_empty();
        }
        let prefix = format!("{}/", dir.key());
        self.key().starts_with(&prefix)
    }
}

impl fmt::Debug for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetPath({:?})", self.0)
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AssetPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AssetPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<AssetPath> for String {
    fn from(p: AssetPath) -> Self {
        p.0
    }
}
