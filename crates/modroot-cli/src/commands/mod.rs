//! CLI command implementations

pub mod fix;
pub mod folders;
pub mod mods;
pub mod output;
pub mod scan;

use anyhow::{bail, Context, Result};
use modroot_asset::{FsAssetStore, ModCatalog};
use modroot_core::AssetPath;
use modroot_prefab::FsContainerStore;
use modroot_resolve::{NamingMode, Pass, ResolverConfig, Session};
use std::path::Path;

/// Flags shared by every command
pub struct ProjectArgs {
    pub project: String,
    pub mods_root: Option<String>,
}

impl ProjectArgs {
    /// Layered config with the command-line mods root on top
    pub fn config(&self) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::load(Path::new(&self.project))
            .with_context(|| format!("Failed to load config for {}", self.project))?;
        if let Some(root) = &self.mods_root {
            config.mods_root = AssetPath::new(root);
        }
        tracing::debug!(
            "Mods root {}, material naming {}, texture naming {}",
            config.mods_root,
            config.material_naming,
            config.texture_naming
        );
        Ok(config)
    }

    pub fn asset_store(&self) -> Result<FsAssetStore> {
        FsAssetStore::open(&self.project)
            .with_context(|| format!("Failed to open project {}", self.project))
    }

    /// Validated config plus the catalog of mods it points at
    pub fn catalog(&self) -> Result<(FsAssetStore, ModCatalog)> {
        let config = self.config()?;
        let store = self.asset_store()?;
        config.validate(&store)?;
        let catalog = ModCatalog::discover(&store, &config.mods_root)?;
        Ok((store, catalog))
    }

    pub fn session(
        &self,
        material_naming: Option<NamingMode>,
        texture_naming: Option<NamingMode>,
    ) -> Result<Session<FsAssetStore, FsContainerStore>> {
        let mut config = self.config()?;
        if let Some(mode) = material_naming {
            config.set_naming(Pass::Materials, mode);
        }
        if let Some(mode) = texture_naming {
            config.set_naming(Pass::Textures, mode);
        }

        let assets = self.asset_store()?;
        let containers = FsContainerStore::new(&self.project);
        Session::new(assets, containers, config).context("Failed to start session")
    }
}

/// Names of the mods a command should process
pub fn target_mods(catalog: &ModCatalog, name: Option<&str>, all: bool) -> Result<Vec<String>> {
    if all {
        return Ok(catalog.iter().map(|m| m.name.clone()).collect());
    }
    let Some(name) = name else {
        bail!("Specify a mod name or --all");
    };
    match catalog.get(name) {
        Some(info) => Ok(vec![info.name.clone()]),
        None => bail!("Mod not found under {}: {}", catalog.mods_root(), name),
    }
}
