//! Throwaway project fixtures for tests

use modroot_asset::{FsAssetStore, ModInfo};
use modroot_core::AssetPath;
use modroot_prefab::{FsContainerStore, NodeDef, PrefabFile};
use std::fs;
use std::path::{Path, PathBuf};

/// A project directory under the system temp dir, removed on drop
pub struct Fixture {
    root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("modroot_resolve_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("Mods")).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mod_info(&self, name: &str) -> ModInfo {
        ModInfo::new(name, AssetPath::new(format!("Mods/{}", name)))
    }

    pub fn stores(&self) -> (FsAssetStore, FsContainerStore) {
        (
            FsAssetStore::open(&self.root).unwrap(),
            FsContainerStore::new(&self.root),
        )
    }

    pub fn write(&self, path: &str, content: &str) {
        let full = self.root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.root.join(path)).unwrap()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    /// Write `Mods/<mod>/Prefabs/<name>.prefab`.
    ///
    /// Each entry is a `/`-joined node path and the materials of one
    /// renderer on that node; intermediate nodes are created as needed.
    pub fn prefab(&self, mod_name: &str, name: &str, renderers: &[(&str, &[&str])]) {
        self.prefab_at(&format!("Mods/{}/Prefabs/{}.prefab", mod_name, name), name, renderers);
    }

    pub fn prefab_at(&self, path: &str, name: &str, renderers: &[(&str, &[&str])]) {
        let mut root = NodeDef::new(name);
        for (node_path, materials) in renderers {
            let segments: Vec<&str> = node_path.split('/').filter(|s| !s.is_empty()).collect();
            let mut node = &mut root;
            for segment in segments.iter().skip(1) {
                let position = node.children.iter().position(|c| c.name == *segment);
                let index = match position {
                    Some(i) => i,
                    None => {
                        node.children.push(NodeDef::new(*segment));
                        node.children.len() - 1
                    }
                };
                node = &mut node.children[index];
            }
            *node = std::mem::replace(node, NodeDef::new("")).with_renderer(materials);
        }

        let file = PrefabFile::new(name).with_root(root);
        self.write(path, &toml::to_string_pretty(&file).unwrap());
    }

    /// Write a material with the given texture properties (`""` is empty)
    pub fn material(&self, path: &str, textures: &[(&str, &str)]) {
        let stem = AssetPath::new(path).file_stem().to_string();
        let mut content = format!(
            "[material]\nname = \"{}\"\nshader = \"standard\"\n\n[textures]\n",
            stem
        );
        for (property, texture) in textures {
            content.push_str(&format!("{} = \"{}\"\n", property, texture));
        }
        self.write(path, &content);
    }

    /// Material slots of a prefab, flattened in hierarchy order
    pub fn prefab_slots(&self, path: &str) -> Vec<String> {
        let (_, store) = self.stores();
        let container = modroot_prefab::ContainerStore::open_prefab(&store, &AssetPath::new(path)).unwrap();
        container
            .renderers()
            .flat_map(|(_, _, r)| {
                r.slots
                    .iter()
                    .map(|s| s.as_ref().map(|p| p.to_string()).unwrap_or_default())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn material_texture(&self, path: &str, property: &str) -> Option<String> {
        let (_, store) = self.stores();
        modroot_prefab::ContainerStore::open_material(&store, &AssetPath::new(path))
            .unwrap()
            .texture(property)
            .map(|p| p.to_string())
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}
