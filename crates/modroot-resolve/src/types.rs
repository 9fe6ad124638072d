//! Resolver type definitions

use modroot_asset::{AssetKind, ModInfo};
use modroot_core::{AssetPath, ModrootError};
use modroot_prefab::HierarchyPath;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which reference kind a pass relocates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    /// Materials referenced from prefab renderers
    Materials,
    /// Textures referenced from material properties
    Textures,
}

impl Pass {
    /// The asset kind being relocated in this pass
    pub fn kind(self) -> AssetKind {
        match self {
            Pass::Materials => AssetKind::Material,
            Pass::Textures => AssetKind::Texture,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Materials => f.write_str("materials"),
            Pass::Textures => f.write_str("textures"),
        }
    }
}

/// How destination file names are chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingMode {
    /// Keep the source file name
    #[default]
    KeepOriginal,
    /// `<owner> Material.mat` / `<owner> Texture<ext>`
    OwnerDerived,
}

impl FromStr for NamingMode {
    type Err = ModrootError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "keeporiginal" | "original" => Ok(NamingMode::KeepOriginal),
            "ownerderived" | "owner" | "prefabplustype" => Ok(NamingMode::OwnerDerived),
            _ => Err(ModrootError::Configuration(format!(
                "Unknown naming mode '{}' (expected keep_original or owner_derived)",
                s
            ))),
        }
    }
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingMode::KeepOriginal => f.write_str("keep_original"),
            NamingMode::OwnerDerived => f.write_str("owner_derived"),
        }
    }
}

/// Why a reference breaks the location rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Violation {
    /// The target lies outside the owning mod's root
    OutsideMod,
    /// The target is inside the mod but not in the canonical folder
    WrongFolder,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::OutsideMod => f.write_str("OutsideMod"),
            Violation::WrongFolder => f.write_str("WrongFolder"),
        }
    }
}

/// A slot that holds a reference to another asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReferenceSite {
    /// A renderer material slot inside a prefab
    MaterialSlot {
        container: AssetPath,
        node: HierarchyPath,
        renderer: usize,
        slot: usize,
        target: AssetPath,
    },
    /// A texture property inside a material
    TextureProperty {
        material: AssetPath,
        property: String,
        target: AssetPath,
    },
}

impl ReferenceSite {
    /// The referenced asset
    pub fn target(&self) -> &AssetPath {
        match self {
            ReferenceSite::MaterialSlot { target, .. } => target,
            ReferenceSite::TextureProperty { target, .. } => target,
        }
    }

    /// The document holding the slot
    pub fn document(&self) -> &AssetPath {
        match self {
            ReferenceSite::MaterialSlot { container, .. } => container,
            ReferenceSite::TextureProperty { material, .. } => material,
        }
    }

    pub fn pass(&self) -> Pass {
        match self {
            ReferenceSite::MaterialSlot { .. } => Pass::Materials,
            ReferenceSite::TextureProperty { .. } => Pass::Textures,
        }
    }

    /// Base name of the holding document (prefab or material name)
    pub fn document_name(&self) -> &str {
        self.document().file_stem()
    }
}

impl fmt::Display for ReferenceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceSite::MaterialSlot {
                container,
                node,
                renderer,
                slot,
                ..
            } => write!(
                f,
                "{} [{}] renderer {} slot {}",
                container.file_stem(),
                node,
                renderer,
                slot
            ),
            ReferenceSite::TextureProperty {
                material, property, ..
            } => write!(f, "{} [{}]", material.file_stem(), property),
        }
    }
}

/// A reference that violates the location rule for its mod
#[derive(Debug, Clone, Serialize)]
pub struct ConflictRecord {
    #[serde(rename = "mod")]
    pub mod_info: ModInfo,
    pub site: ReferenceSite,
    pub source: AssetPath,
    pub reason: Violation,
}

impl ConflictRecord {
    pub fn key(&self) -> GroupKey {
        GroupKey::new(&self.mod_info, &self.source)
    }
}

/// Identity of a dedup group: owning mod + source asset, case-insensitive
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub mod_root: String,
    pub source: String,
}

impl GroupKey {
    pub fn new(mod_info: &ModInfo, source: &AssetPath) -> Self {
        Self {
            mod_root: mod_info.root.key(),
            source: source.key(),
        }
    }
}

/// What executing a plan is expected to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannedAction {
    /// Copy to a free destination
    Copy,
    /// Destination already holds identical content
    Reuse,
    /// Desired destination held different content; copy to a suffixed path
    Rename,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Copy => f.write_str("copy"),
            PlannedAction::Reuse => f.write_str("reuse"),
            PlannedAction::Rename => f.write_str("rename"),
        }
    }
}

/// One dedup group and its canonical destination
#[derive(Debug, Clone, Serialize)]
pub struct CopyPlan {
    pub key: GroupKey,
    #[serde(rename = "mod")]
    pub mod_info: ModInfo,
    pub source: AssetPath,
    /// Destination chosen by the naming mode, before any collision suffix
    pub desired: AssetPath,
    pub dest: AssetPath,
    pub action: PlannedAction,
    pub members: Vec<ConflictRecord>,
    pub included: bool,
}

impl CopyPlan {
    /// Violation reason of the group (every member shares the source, so the first is representative)
    pub fn reason(&self) -> Violation {
        self.members
            .first()
            .map(|m| m.reason)
            .unwrap_or(Violation::OutsideMod)
    }

    /// One member site to show the operator
    pub fn example_site(&self) -> Option<&ReferenceSite> {
        self.members.first().map(|m| &m.site)
    }
}
