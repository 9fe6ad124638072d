//! Mod discovery under a mods root

use crate::store::AssetStore;
use crate::types::{AssetKind, KNOWN_FOLDERS};
use modroot_core::{AssetPath, ModrootError, Result};
use serde::Serialize;

/// A mod: a named root folder with conventionally-named subfolders
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModInfo {
    pub name: String,
    pub root: AssetPath,
}

impl ModInfo {
    pub fn new(name: impl Into<String>, root: AssetPath) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Path of a named subfolder of this mod
    pub fn folder(&self, name: &str) -> AssetPath {
        self.root.join(name)
    }

    /// The folder where assets of `kind` are canonical for this mod
    pub fn canonical_folder(&self, kind: AssetKind) -> AssetPath {
        self.folder(kind.folder())
    }

    pub fn prefabs_path(&self) -> AssetPath {
        self.canonical_folder(AssetKind::Prefab)
    }

    pub fn materials_path(&self) -> AssetPath {
        self.canonical_folder(AssetKind::Material)
    }

    pub fn textures_path(&self) -> AssetPath {
        self.canonical_folder(AssetKind::Texture)
    }

    pub fn has_folder<S: AssetStore + ?Sized>(&self, store: &S, name: &str) -> bool {
        store.is_folder(&self.folder(name))
    }

    pub fn has_prefabs<S: AssetStore + ?Sized>(&self, store: &S) -> bool {
        store.is_folder(&self.prefabs_path())
    }
}

/// Presence of a mod subfolder relative to the known folder set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderState {
    Exists,
    Missing,
    Unknown,
}

/// One row of a mod's folder overview
#[derive(Debug, Clone, Serialize)]
pub struct FolderStatus {
    pub name: String,
    pub path: AssetPath,
    pub state: FolderState,
}

/// All mods found directly under a mods root
#[derive(Debug, Default)]
pub struct ModCatalog {
    mods_root: AssetPath,
    mods: Vec<ModInfo>,
}

impl ModCatalog {
    /// Discover every immediate subfolder of `mods_root` as a mod
    pub fn discover<S: AssetStore + ?Sized>(store: &S, mods_root: &AssetPath) -> Result<Self> {
        if mods_root.is_empty() {
            return Err(ModrootError::Configuration(
                "No mods root configured".to_string(),
            ));
        }
        if !store.is_folder(mods_root) {
            return Err(ModrootError::Configuration(format!(
                "Mods root does not exist: {}",
                mods_root
            )));
        }

        let mods = store
            .subfolders(mods_root)?
            .into_iter()
            .filter_map(|root| {
                let name = root.file_name().trim().to_string();
                if name.is_empty() {
                    None
                } else {
                    Some(ModInfo::new(name, root))
                }
            })
            .collect();

        Ok(Self {
            mods_root: mods_root.clone(),
            mods,
        })
    }

    pub fn mods_root(&self) -> &AssetPath {
        &self.mods_root
    }

    /// Look up a mod by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&ModInfo> {
        let wanted = name.to_lowercase();
        self.mods.iter().find(|m| m.name.to_lowercase() == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModInfo> {
        self.mods.iter()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Known folders as Exists/Missing, then any other subfolder as Unknown
    pub fn folder_overview<S: AssetStore + ?Sized>(
        store: &S,
        info: &ModInfo,
    ) -> Result<Vec<FolderStatus>> {
        let mut present: Vec<AssetPath> = store.subfolders(&info.root)?;
        let mut rows = Vec::new();

        for known in KNOWN_FOLDERS {
            let position = present
                .iter()
                .position(|p| p.file_name().eq_ignore_ascii_case(known));
            let state = match position {
                Some(idx) => {
                    present.remove(idx);
                    FolderState::Exists
                }
                None => FolderState::Missing,
            };
            rows.push(FolderStatus {
                name: known.to_string(),
                path: info.folder(known),
                state,
            });
        }

        for other in present {
            rows.push(FolderStatus {
                name: other.file_name().to_string(),
                path: other,
                state: FolderState::Unknown,
            });
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsAssetStore;
    use std::fs;
    use std::path::PathBuf;

    fn temp_project() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("modroot_catalog_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_discover_mods() {
        let root = temp_project();
        fs::create_dir_all(root.join("Mods/feel-batterybanks/Prefabs")).unwrap();
        fs::create_dir_all(root.join("Mods/Armory")).unwrap();
        let store = FsAssetStore::open(&root).unwrap();

        let catalog = ModCatalog::discover(&store, &AssetPath::new("Mods")).unwrap();
        assert_eq!(catalog.len(), 2);
        let names: Vec<_> = catalog.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Armory", "feel-batterybanks"]);

        let m = catalog.get("FEEL-BATTERYBANKS").unwrap();
        assert_eq!(m.materials_path().as_str(), "Mods/feel-batterybanks/Materials");
        assert!(m.has_prefabs(&store));
        assert!(!catalog.get("armory").unwrap().has_prefabs(&store));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_discover_missing_root_is_configuration_error() {
        let root = temp_project();
        let store = FsAssetStore::open(&root).unwrap();

        let err = ModCatalog::discover(&store, &AssetPath::new("Mods")).unwrap_err();
        assert!(matches!(err, ModrootError::Configuration(_)));
        let err = ModCatalog::discover(&store, &AssetPath::new("")).unwrap_err();
        assert!(matches!(err, ModrootError::Configuration(_)));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_folder_overview() {
        let root = temp_project();
        fs::create_dir_all(root.join("Mods/M1/prefabs")).unwrap();
        fs::create_dir_all(root.join("Mods/M1/Materials")).unwrap();
        fs::create_dir_all(root.join("Mods/M1/Sounds")).unwrap();
        let store = FsAssetStore::open(&root).unwrap();
        let info = ModInfo::new("M1", AssetPath::new("Mods/M1"));

        let rows = ModCatalog::folder_overview(&store, &info).unwrap();
        assert_eq!(rows.len(), KNOWN_FOLDERS.len() + 1);

        let state_of = |name: &str| rows.iter().find(|r| r.name == name).unwrap().state;
        assert_eq!(state_of("Prefabs"), FolderState::Exists);
        assert_eq!(state_of("Materials"), FolderState::Exists);
        assert_eq!(state_of("Textures"), FolderState::Missing);
        assert_eq!(state_of("Sounds"), FolderState::Unknown);

        fs::remove_dir_all(&root).ok();
    }
}
