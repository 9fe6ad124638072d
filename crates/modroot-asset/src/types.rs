//! Asset kind definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conventional subfolders of a mod root
pub const KNOWN_FOLDERS: &[&str] = &[
    "XML",
    "Prefabs",
    "Materials",
    "Textures",
    "Models",
    "Meshes",
    "Scenes",
    "Animations",
    "Particles",
    "Scripts",
];

/// Kinds of assets the resolver walks or relocates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Prefab,
    Material,
    Texture,
}

impl AssetKind {
    /// The mod subfolder where assets of this kind are canonical
    pub fn folder(self) -> &'static str {
        match self {
            AssetKind::Prefab => "Prefabs",
            AssetKind::Material => "Materials",
            AssetKind::Texture => "Textures",
        }
    }

    /// File-name glob for listing assets of this kind
    pub fn pattern(self) -> &'static str {
        match self {
            AssetKind::Prefab => "*.prefab",
            AssetKind::Material => "*.mat",
            AssetKind::Texture => "*",
        }
    }

    /// Word appended to owner-derived file names
    pub fn suffix_word(self) -> &'static str {
        match self {
            AssetKind::Prefab => "Prefab",
            AssetKind::Material => "Material",
            AssetKind::Texture => "Texture",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetKind::Prefab => "prefab",
            AssetKind::Material => "material",
            AssetKind::Texture => "texture",
        };
        f.write_str(s)
    }
}
