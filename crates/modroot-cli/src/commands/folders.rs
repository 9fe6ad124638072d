//! Folder overview command

use super::ProjectArgs;
use anyhow::{Context, Result};
use modroot_asset::{AssetStore, FolderState, ModCatalog};

pub struct FoldersArgs {
    pub name: String,
    pub create: Vec<String>,
    pub create_missing: bool,
}

pub fn run(project: &ProjectArgs, args: FoldersArgs) -> Result<()> {
    let (mut store, catalog) = project.catalog()?;
    let info = catalog
        .get(&args.name)
        .with_context(|| format!("Mod not found under {}: {}", catalog.mods_root(), args.name))?
        .clone();

    let mut targets: Vec<_> = args.create.iter().map(|name| info.folder(name)).collect();
    if args.create_missing {
        targets.extend(
            ModCatalog::folder_overview(&store, &info)?
                .into_iter()
                .filter(|row| row.state == FolderState::Missing)
                .map(|row| row.path),
        );
    }

    for path in &targets {
        if store.is_folder(path) {
            continue;
        }
        store
            .create_folder(path)
            .with_context(|| format!("Failed to create {}", path))?;
        println!("Created {}", path);
    }

    println!("{} ({}):", info.name, info.root);
    for row in ModCatalog::folder_overview(&store, &info)? {
        let state = match row.state {
            FolderState::Exists => "exists ",
            FolderState::Missing => "missing",
            FolderState::Unknown => "unknown",
        };
        println!("  [{}] {}", state, row.name);
    }
    Ok(())
}
