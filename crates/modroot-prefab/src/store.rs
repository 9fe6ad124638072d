//! Container storage
//!
//! Prefabs and materials are opened for read freely, but only one document
//! may be open for write at a time: structural edits are committed by
//! rewriting the file, so two concurrent writers on the same document
//! would race.

use crate::container::Container;
use crate::material::MaterialDocument;
use modroot_core::{AssetPath, ModrootError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage of structured documents (prefab containers and materials)
pub trait ContainerStore {
    fn open_prefab(&self, path: &AssetPath) -> Result<Container>;

    fn open_material(&self, path: &AssetPath) -> Result<MaterialDocument>;

    /// Open a prefab for write, taking the store's single write slot
    fn edit_prefab(&mut self, path: &AssetPath) -> Result<Container>;

    /// Open a material for write, taking the store's single write slot
    fn edit_material(&mut self, path: &AssetPath) -> Result<MaterialDocument>;

    /// Persist a prefab opened with `edit_prefab` and release the write slot
    fn commit_prefab(&mut self, container: &Container) -> Result<()>;

    /// Persist a material opened with `edit_material` and release the write slot
    fn commit_material(&mut self, material: &MaterialDocument) -> Result<()>;

    /// Release the write slot without persisting
    fn discard(&mut self, path: &AssetPath);

    /// The document currently open for write, if any
    fn open_for_write(&self) -> Option<&AssetPath>;
}

/// Container store backed by a project directory
#[derive(Debug)]
pub struct FsContainerStore {
    root: PathBuf,
    writer: Option<AssetPath>,
    commits: usize,
}

impl FsContainerStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            writer: None,
            commits: 0,
        }
    }

    /// Number of documents committed through this store
    pub fn commits(&self) -> usize {
        self.commits
    }

    fn read(&self, path: &AssetPath) -> Result<String> {
        Ok(fs::read_to_string(path.to_fs_path(&self.root))?)
    }

    fn acquire(&mut self, path: &AssetPath) -> Result<()> {
        if let Some(held) = &self.writer {
            return Err(ModrootError::ContainerBusy {
                requested: path.to_string(),
                held: held.to_string(),
            });
        }
        self.writer = Some(path.clone());
        Ok(())
    }

    fn release(&mut self, path: &AssetPath) -> Result<()> {
        match &self.writer {
            Some(held) if held.same_as(path) => {
                self.writer = None;
                Ok(())
            }
            Some(held) => Err(ModrootError::InvalidState(format!(
                "Cannot commit '{}' while '{}' holds the write slot",
                path, held
            ))),
            None => Err(ModrootError::InvalidState(format!(
                "'{}' was not opened for write",
                path
            ))),
        }
    }

    fn write(&mut self, path: &AssetPath, content: &str) -> Result<()> {
        self.release(path)?;
        fs::write(path.to_fs_path(&self.root), content)?;
        self.commits += 1;
        Ok(())
    }
}

impl ContainerStore for FsContainerStore {
    fn open_prefab(&self, path: &AssetPath) -> Result<Container> {
        Container::parse(path.clone(), &self.read(path)?)
    }

    fn open_material(&self, path: &AssetPath) -> Result<MaterialDocument> {
        MaterialDocument::parse(path.clone(), &self.read(path)?)
    }

    fn edit_prefab(&mut self, path: &AssetPath) -> Result<Container> {
        self.acquire(path)?;
        self.open_prefab(path).inspect_err(|_| self.writer = None)
    }

    fn edit_material(&mut self, path: &AssetPath) -> Result<MaterialDocument> {
        self.acquire(path)?;
        self.open_material(path).inspect_err(|_| self.writer = None)
    }

    fn commit_prefab(&mut self, container: &Container) -> Result<()> {
        let content = container.to_toml_string()?;
        self.write(container.path(), &content)
    }

    fn commit_material(&mut self, material: &MaterialDocument) -> Result<()> {
        self.write(material.path(), &material.to_toml_string())
    }

    fn discard(&mut self, path: &AssetPath) {
        if self.writer.as_ref().is_some_and(|held| held.same_as(path)) {
            self.writer = None;
        }
    }

    fn open_for_write(&self) -> Option<&AssetPath> {
        self.writer.as_ref()
    }
}
