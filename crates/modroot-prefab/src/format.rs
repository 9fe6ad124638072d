//! Prefab file format definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root structure of a `.prefab` TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabFile {
    pub prefab: PrefabMetadata,
    pub root: NodeDef,
    /// Other top-level tables, preserved on save
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

/// Prefab metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

/// A node in the prefab hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renderers: Vec<RendererDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDef>,
    /// Any other keys are opaque component data, preserved on save
    #[serde(flatten)]
    pub components: BTreeMap<String, toml::Value>,
}

/// A renderer with ordered material slots; `""` is an empty slot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RendererDef {
    #[serde(default = "default_renderer_kind")]
    pub kind: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, toml::Value>,
}

fn default_renderer_kind() -> String {
    "mesh".to_string()
}

impl NodeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            renderers: Vec::new(),
            children: Vec::new(),
            components: BTreeMap::new(),
        }
    }

    pub fn with_renderer(mut self, materials: &[&str]) -> Self {
        self.renderers.push(RendererDef {
            kind: default_renderer_kind(),
            materials: materials.iter().map(|m| m.to_string()).collect(),
            properties: BTreeMap::new(),
        });
        self
    }

    pub fn with_child(mut self, child: NodeDef) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_component(mut self, name: impl Into<String>, data: toml::Value) -> Self {
        self.components.insert(name.into(), data);
        self
    }
}

impl PrefabFile {
    /// Create a prefab whose root node shares the prefab's name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            prefab: PrefabMetadata {
                name: name.clone(),
                description: None,
                extra: BTreeMap::new(),
            },
            root: NodeDef::new(name),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_root(mut self, root: NodeDef) -> Self {
        self.root = root;
        self
    }
}
