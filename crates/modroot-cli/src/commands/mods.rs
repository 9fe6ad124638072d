//! Mod listing command

use super::ProjectArgs;
use anyhow::Result;
use modroot_asset::AssetStore;
use serde::Serialize;

#[derive(Serialize)]
struct ModRow {
    name: String,
    root: String,
    prefabs: bool,
    materials: bool,
    textures: bool,
}

pub fn run(project: &ProjectArgs, format: &str) -> Result<()> {
    let (store, catalog) = project.catalog()?;

    let rows: Vec<ModRow> = catalog
        .iter()
        .map(|info| ModRow {
            name: info.name.clone(),
            root: info.root.to_string(),
            prefabs: info.has_prefabs(&store),
            materials: store.is_folder(&info.materials_path()),
            textures: store.is_folder(&info.textures_path()),
        })
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No mods found in {}", catalog.mods_root());
        return Ok(());
    }

    println!("Mods in {} ({}):", catalog.mods_root(), rows.len());
    for row in &rows {
        println!(
            "  {:<24} {} {} {}",
            row.name,
            marker("Prefabs", row.prefabs),
            marker("Materials", row.materials),
            marker("Textures", row.textures),
        );
    }
    Ok(())
}

fn marker(folder: &str, present: bool) -> String {
    if present {
        format!("[{}]", folder)
    } else {
        format!(" {} ", "-".repeat(folder.len()))
    }
}
