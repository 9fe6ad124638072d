//! Addressable asset storage
//!
//! The resolver never touches the filesystem directly for assets; it goes
//! through [`AssetStore`]. [`FsAssetStore`] is the on-disk implementation,
//! rooted at a project directory and keeping a sorted listing index that
//! is rebuilt after mutations, or once per batch while editing.

use globset::{GlobBuilder, GlobMatcher};
use modroot_core::{AssetPath, ContentHash, ModrootError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Storage of binary assets addressed by project-relative path
pub trait AssetStore {
    /// Enumerate assets under `root` whose file name matches `pattern`, sorted
    fn list(&self, root: &AssetPath, pattern: &str) -> Result<Vec<AssetPath>>;

    /// Hash an asset's bytes
    fn content_hash(&self, path: &AssetPath) -> Result<ContentHash>;

    /// Byte equality of two assets; unreadable assets compare unequal
    fn content_equals(&self, a: &AssetPath, b: &AssetPath) -> bool {
        match (self.content_hash(a), self.content_hash(b)) {
            (Ok(ha), Ok(hb)) => ha == hb,
            _ => false,
        }
    }

    /// Create `dst` as a byte-identical copy of `src`, creating parent folders
    fn copy(&mut self, src: &AssetPath, dst: &AssetPath) -> Result<()>;

    /// True if an asset file exists at `path`
    fn exists(&self, path: &AssetPath) -> bool;

    /// True if `path` names a folder
    fn is_folder(&self, path: &AssetPath) -> bool;

    /// Immediate subfolders of `path`
    fn subfolders(&self, path: &AssetPath) -> Result<Vec<AssetPath>>;

    /// Create a folder and any missing parents
    fn create_folder(&mut self, path: &AssetPath) -> Result<()>;

    /// Enter a batch: index maintenance is deferred until the matching stop
    fn start_editing(&mut self);

    /// Leave a batch, performing any deferred index maintenance
    fn stop_editing(&mut self) -> Result<()>;

    /// True while at least one batch is open
    fn is_editing(&self) -> bool;

    /// Pick up changes made behind the store's back
    fn refresh(&mut self) -> Result<()>;
}

/// RAII batch-edit scope over an asset store.
///
/// Opens the batch on creation and closes it on [`EditScope::close`] or on
/// drop, so an early return cannot leave the store mid-batch.
pub struct EditScope<'a, S: AssetStore + ?Sized> {
    store: &'a mut S,
    closed: bool,
}

impl<'a, S: AssetStore + ?Sized> EditScope<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        store.start_editing();
        Self {
            store,
            closed: false,
        }
    }

    /// Close the batch and report any failure from deferred maintenance
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.store.stop_editing()
    }
}

impl<S: AssetStore + ?Sized> Deref for EditScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: AssetStore + ?Sized> DerefMut for EditScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: AssetStore + ?Sized> Drop for EditScope<'_, S> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.store.stop_editing() {
                tracing::warn!("Closing asset batch failed: {}", e);
            }
        }
    }
}

/// Asset store backed by a project directory
#[derive(Debug)]
pub struct FsAssetStore {
    root: PathBuf,
    index: BTreeSet<AssetPath>,
    editing: usize,
    index_stale: bool,
    index_builds: usize,
}

impl FsAssetStore {
    /// Open a project directory and build the listing index
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ModrootError::Configuration(format!(
                "Project directory does not exist: {}",
                root.display()
            )));
        }

        let mut store = Self {
            root,
            index: BTreeSet::new(),
            editing: 0,
            index_stale: false,
            index_builds: 0,
        };
        store.refresh()?;
        Ok(store)
    }

    /// The project directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem path for an asset
    pub fn abs_path(&self, path: &AssetPath) -> PathBuf {
        path.to_fs_path(&self.root)
    }

    /// Like [`FsAssetStore::abs_path`], refusing paths that climb out of the project
    fn checked_path(&self, path: &AssetPath) -> Result<PathBuf> {
        if path.escapes_root() {
            return Err(ModrootError::Asset(format!(
                "Path leaves the project: {}",
                path
            )));
        }
        Ok(self.abs_path(path))
    }

    /// Number of times the listing index has been rebuilt
    pub fn index_builds(&self) -> usize {
        self.index_builds
    }

    fn scan_directory(root: &Path, dir: &Path, index: &mut BTreeSet<AssetPath>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');

            if path.is_dir() {
                if !hidden {
                    Self::scan_directory(root, &path, index)?;
                }
            } else if let Some(asset) = AssetPath::from_fs_path(root, &path) {
                index.insert(asset);
            }
        }
        Ok(())
    }

    fn matcher(pattern: &str) -> Result<GlobMatcher> {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| ModrootError::Parse(format!("Invalid pattern '{}': {}", pattern, e)))?;
        Ok(glob.compile_matcher())
    }
}

impl AssetStore for FsAssetStore {
    fn list(&self, root: &AssetPath, pattern: &str) -> Result<Vec<AssetPath>> {
        let matcher = Self::matcher(pattern)?;
        Ok(self
            .index
            .iter()
            .filter(|p| p.is_under(root) && matcher.is_match(p.file_name()))
            .cloned()
            .collect())
    }

    fn content_hash(&self, path: &AssetPath) -> Result<ContentHash> {
        Ok(ContentHash::from_file(self.checked_path(path)?)?)
    }

    fn copy(&mut self, src: &AssetPath, dst: &AssetPath) -> Result<()> {
        let from = self.checked_path(src)?;
        let to = self.checked_path(dst)?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, &to)?;

        if self.editing > 0 {
            self.index_stale = true;
        } else {
            self.refresh()?;
        }
        Ok(())
    }

    fn exists(&self, path: &AssetPath) -> bool {
        !path.is_empty() && !path.escapes_root() && self.abs_path(path).is_file()
    }

    fn is_folder(&self, path: &AssetPath) -> bool {
        !path.escapes_root() && self.abs_path(path).is_dir()
    }

    fn subfolders(&self, path: &AssetPath) -> Result<Vec<AssetPath>> {
        let dir = self.abs_path(path);
        let mut out = Vec::new();
        if !dir.is_dir() {
            return Ok(out);
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with('.') {
                    out.push(path.join(name));
                }
            }
        }
        out.sort_by_key(|p| p.key());
        Ok(out)
    }

    fn create_folder(&mut self, path: &AssetPath) -> Result<()> {
        fs::create_dir_all(self.checked_path(path)?)?;
        Ok(())
    }

    fn start_editing(&mut self) {
        self.editing += 1;
    }

    fn stop_editing(&mut self) -> Result<()> {
        if self.editing == 0 {
            return Ok(());
        }
        self.editing -= 1;
        if self.editing == 0 && self.index_stale {
            self.refresh()?;
        }
        Ok(())
    }

    fn is_editing(&self) -> bool {
        self.editing > 0
    }

    /// Rebuild the listing index from disk
    fn refresh(&mut self) -> Result<()> {
        let mut index = BTreeSet::new();
        Self::scan_directory(&self.root, &self.root, &mut index)?;
        self.index = index;
        self.index_stale = false;
        self.index_builds += 1;
        Ok(())
    }
}
