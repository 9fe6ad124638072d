//! Structure-preserving material documents
//!
//! Materials are patched with `toml_edit` so that retargeting a texture
//! property changes exactly one value and leaves comments, ordering and
//! every unrelated key untouched.

use modroot_core::{AssetPath, ModrootError, Result};

const TEXTURES: &str = "textures";

/// A parsed `.mat` document whose texture properties can be patched in place
#[derive(Debug, Clone)]
pub struct MaterialDocument {
    path: AssetPath,
    doc: toml_edit::DocumentMut,
}

impl MaterialDocument {
    /// Parse material TOML into an editable document
    pub fn parse(path: AssetPath, content: &str) -> Result<Self> {
        let doc: toml_edit::DocumentMut = content.parse().map_err(|e| {
            ModrootError::Container(format!("Failed to parse material '{}': {}", path, e))
        })?;
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    /// `material.name`, falling back to the file stem
    pub fn name(&self) -> &str {
        self.doc
            .get("material")
            .and_then(|m| m.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or_else(|| self.path.file_stem())
    }

    /// Every texture property in document order; empty slots are `None`
    pub fn texture_properties(&self) -> Vec<(String, Option<AssetPath>)> {
        let Some(table) = self.doc.get(TEXTURES).and_then(|t| t.as_table_like()) else {
            return Vec::new();
        };
        table
            .iter()
            .filter_map(|(key, item)| {
                let value = item.as_str()?;
                let path = AssetPath::new(value);
                Some((key.to_string(), (!path.is_empty()).then_some(path)))
            })
            .collect()
    }

    /// Non-empty texture references as (property, texture)
    pub fn texture_slots(&self) -> Vec<(String, AssetPath)> {
        self.texture_properties()
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }

    /// Current texture of a property
    pub fn texture(&self, property: &str) -> Option<AssetPath> {
        let value = self.doc.get(TEXTURES)?.get(property)?.as_str()?;
        let path = AssetPath::new(value);
        (!path.is_empty()).then_some(path)
    }

    /// Point a texture property at an asset, keeping the line's formatting
    pub fn set_texture(&mut self, property: &str, texture: &AssetPath) -> Result<()> {
        if self.doc.get(TEXTURES).is_none() {
            self.doc
                .insert(TEXTURES, toml_edit::Item::Table(toml_edit::Table::new()));
        }

        let table = self
            .doc
            .get_mut(TEXTURES)
            .and_then(|t| t.as_table_like_mut())
            .ok_or_else(|| {
                ModrootError::Container(format!("[{}] in '{}' is not a table", TEXTURES, self.path))
            })?;

        match table.get_mut(property).and_then(|item| item.as_value_mut()) {
            Some(existing) => {
                let decor = existing.decor().clone();
                *existing = toml_edit::Value::from(texture.as_str());
                *existing.decor_mut() = decor;
            }
            None => {
                table.insert(property, toml_edit::value(texture.as_str()));
            }
        }
        Ok(())
    }

    /// Serialize the document back to a string (preserving formatting)
    pub fn to_toml_string(&self) -> String {
        self.doc.to_string()
    }
}
