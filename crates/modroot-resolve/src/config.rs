//! Layered configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `MODROOT_MODS_ROOT`, `MODROOT_MATERIAL_NAMING`,
//!    `MODROOT_TEXTURE_NAMING`
//! 2. Project-local: `<project>/.modroot/config.toml`
//! 3. Global: `~/.modroot/config.toml`
//!
//! Command-line flags are applied on top by the caller.

use crate::types::{NamingMode, Pass};
use modroot_asset::AssetStore;
use modroot_core::{AssetPath, ModrootError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_MODS_ROOT: &str = "MODROOT_MODS_ROOT";
const ENV_MATERIAL_NAMING: &str = "MODROOT_MATERIAL_NAMING";
const ENV_TEXTURE_NAMING: &str = "MODROOT_TEXTURE_NAMING";

/// `[resolver]` as written in a config file; unset keys fall through
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverSection {
    #[serde(default)]
    pub mods_root: Option<String>,
    #[serde(default)]
    pub material_naming: Option<NamingMode>,
    #[serde(default)]
    pub texture_naming: Option<NamingMode>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModrootConfigFile {
    #[serde(default)]
    pub resolver: ResolverSection,
}

/// Resolved resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverConfig {
    pub mods_root: AssetPath,
    pub material_naming: NamingMode,
    pub texture_naming: NamingMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mods_root: AssetPath::new("Mods"),
            material_naming: NamingMode::KeepOriginal,
            texture_naming: NamingMode::KeepOriginal,
        }
    }
}

impl ResolverConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load(project: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?.resolver);
            }
        }

        let local_path = project.join(".modroot").join("config.toml");
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?.resolver);
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from a specific file path only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge(Self::load_file(path)?.resolver);
        Ok(config)
    }

    pub fn naming(&self, pass: Pass) -> NamingMode {
        match pass {
            Pass::Materials => self.material_naming,
            Pass::Textures => self.texture_naming,
        }
    }

    pub fn set_naming(&mut self, pass: Pass, mode: NamingMode) {
        match pass {
            Pass::Materials => self.material_naming = mode,
            Pass::Textures => self.texture_naming = mode,
        }
    }

    /// Fail before any scan if the mods root is unusable
    pub fn validate<S: AssetStore + ?Sized>(&self, store: &S) -> Result<()> {
        if self.mods_root.is_empty() {
            return Err(ModrootError::Configuration(
                "No mods root configured".to_string(),
            ));
        }
        if !store.is_folder(&self.mods_root) {
            return Err(ModrootError::Configuration(format!(
                "Mods root does not exist: {}",
                self.mods_root
            )));
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".modroot").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ModrootConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ModrootError::Configuration(format!(
                "Failed to parse config {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn merge(&mut self, overlay: ResolverSection) {
        if let Some(root) = overlay.mods_root {
            self.mods_root = AssetPath::new(root);
        }
        if let Some(mode) = overlay.material_naming {
            self.material_naming = mode;
        }
        if let Some(mode) = overlay.texture_naming {
            self.texture_naming = mode;
        }
    }

    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) -> Result<()> {
        if let Some(root) = lookup(ENV_MODS_ROOT) {
            self.mods_root = AssetPath::new(root);
        }
        if let Some(mode) = lookup(ENV_MATERIAL_NAMING) {
            self.material_naming = mode.parse()?;
        }
        if let Some(mode) = lookup(ENV_TEXTURE_NAMING) {
            self.texture_naming = mode.parse()?;
        }
        Ok(())
    }
}
