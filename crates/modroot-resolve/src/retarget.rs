//! Reference retargeting
//!
//! Sites recorded during the walk are hints. Each document is re-opened for
//! write and every site is resolved again against its current contents:
//!
//! 1. the exact node, renderer and slot, if it still holds the old asset
//! 2. any renderer holding the old asset at the same slot index
//! 3. any renderer holding the old asset in any slot
//!
//! Every slot of the resolved renderer that holds the old asset is
//! rewritten. Documents are edited one at a time and committed once.

use crate::types::{Pass, ReferenceSite};
use modroot_core::{AssetPath, Result};
use modroot_prefab::{Container, ContainerStore, HierarchyPath, MaterialDocument, NodeId, SlotRef};
use std::collections::BTreeMap;

/// One reference to repoint from `old` to `new`
#[derive(Debug, Clone)]
pub struct RetargetEdit {
    pub site: ReferenceSite,
    pub old: AssetPath,
    pub new: AssetPath,
}

/// Outcome for one edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteResult {
    /// Number of slots rewritten
    Rewritten(usize),
    /// The slot already points at the new asset
    AlreadyDone,
    /// No slot holds the old asset any more
    Missing,
    /// The document could not be opened or written
    Failed(String),
}

impl SiteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SiteResult::Rewritten(_) | SiteResult::AlreadyDone)
    }
}

pub struct Retargeter<'a, C: ContainerStore + ?Sized> {
    store: &'a mut C,
}

impl<'a, C: ContainerStore + ?Sized> Retargeter<'a, C> {
    pub fn new(store: &'a mut C) -> Self {
        Self { store }
    }

    /// Repoint a single site
    pub fn retarget(&mut self, site: &ReferenceSite, old: &AssetPath, new: &AssetPath) -> bool {
        let edit = RetargetEdit {
            site: site.clone(),
            old: old.clone(),
            new: new.clone(),
        };
        self.retarget_all(vec![edit])
            .pop()
            .is_some_and(|(_, result)| result.is_success())
    }

    /// Repoint every edit, one document at a time, in document path order
    pub fn retarget_all(&mut self, edits: Vec<RetargetEdit>) -> Vec<(RetargetEdit, SiteResult)> {
        let mut by_document: BTreeMap<(bool, String), Vec<RetargetEdit>> = BTreeMap::new();
        for edit in edits {
            let key = (
                edit.site.pass() == Pass::Textures,
                edit.site.document().key(),
            );
            by_document.entry(key).or_default().push(edit);
        }

        let mut results = Vec::new();
        for (_, edits) in by_document {
            let outcomes = self.retarget_document(&edits);
            results.extend(edits.into_iter().zip(outcomes));
        }
        results
    }

    fn retarget_document(&mut self, edits: &[RetargetEdit]) -> Vec<SiteResult> {
        let path = edits[0].site.document().clone();
        let outcome = match edits[0].site.pass() {
            Pass::Materials => self.retarget_prefab(&path, edits),
            Pass::Textures => self.retarget_material(&path, edits),
        };
        outcome.unwrap_or_else(|e| {
            tracing::warn!("Retargeting '{}' failed: {}", path, e);
            vec![SiteResult::Failed(e.to_string()); edits.len()]
        })
    }

    fn retarget_prefab(&mut self, path: &AssetPath, edits: &[RetargetEdit]) -> Result<Vec<SiteResult>> {
        let mut container = self.store.edit_prefab(path)?;
        let results: Vec<SiteResult> = edits
            .iter()
            .map(|edit| rewrite_prefab_site(&mut container, edit))
            .collect();

        if results.iter().any(|r| matches!(r, SiteResult::Rewritten(_))) {
            self.store.commit_prefab(&container)?;
        } else {
            self.store.discard(path);
        }
        Ok(results)
    }

    fn retarget_material(&mut self, path: &AssetPath, edits: &[RetargetEdit]) -> Result<Vec<SiteResult>> {
        let mut material = self.store.edit_material(path)?;
        let results: Vec<SiteResult> = edits
            .iter()
            .map(|edit| rewrite_material_site(&mut material, edit))
            .collect();

        if results.iter().any(|r| matches!(r, SiteResult::Rewritten(_))) {
            self.store.commit_material(&material)?;
        } else {
            self.store.discard(path);
        }
        Ok(results)
    }
}

fn holds(value: Option<&AssetPath>, asset: &AssetPath) -> bool {
    value.is_some_and(|v| v.same_as(asset))
}

/// Three-tier renderer resolution
fn resolve_renderer(
    container: &Container,
    node: &HierarchyPath,
    renderer: usize,
    slot: usize,
    old: &AssetPath,
) -> Option<(NodeId, usize)> {
    if let Some(id) = container.find(node) {
        let exact = SlotRef {
            node: id,
            renderer,
            slot,
        };
        if holds(container.slot(exact), old) {
            return Some((id, renderer));
        }
    }

    if let Some((id, ordinal, _)) = container
        .renderers()
        .find(|(_, _, r)| holds(r.slots.get(slot).and_then(Option::as_ref), old))
    {
        tracing::debug!("{}: slot {} found on another renderer", container.path(), slot);
        return Some((id, ordinal));
    }

    container
        .renderers()
        .find(|(_, _, r)| r.slots.iter().any(|s| holds(s.as_ref(), old)))
        .map(|(id, ordinal, _)| {
            tracing::debug!("{}: '{}' found at another slot index", container.path(), old);
            (id, ordinal)
        })
}

fn rewrite_prefab_site(container: &mut Container, edit: &RetargetEdit) -> SiteResult {
    let ReferenceSite::MaterialSlot {
        node,
        renderer,
        slot,
        ..
    } = &edit.site
    else {
        return SiteResult::Missing;
    };

    let Some((id, ordinal)) = resolve_renderer(container, node, *renderer, *slot, &edit.old) else {
        let exact = container.find(node).map(|id| SlotRef {
            node: id,
            renderer: *renderer,
            slot: *slot,
        });
        if holds(exact.and_then(|at| container.slot(at)), &edit.new) {
            return SiteResult::AlreadyDone;
        }
        tracing::warn!("Missing reference: {} no longer holds '{}'", edit.site, edit.old);
        return SiteResult::Missing;
    };

    let stale: Vec<usize> = container
        .renderer(id, ordinal)
        .map(|r| {
            r.slots
                .iter()
                .enumerate()
                .filter(|(_, s)| holds(s.as_ref(), &edit.old))
                .map(|(i, _)| i)
                .collect()
        })
        .unwrap_or_default();

    for index in &stale {
        let at = SlotRef {
            node: id,
            renderer: ordinal,
            slot: *index,
        };
        if let Err(e) = container.set_slot(at, edit.new.clone()) {
            return SiteResult::Failed(e.to_string());
        }
        tracing::debug!("{}: slot {} -> '{}'", container.path(), index, edit.new);
    }
    SiteResult::Rewritten(stale.len())
}

fn rewrite_material_site(material: &mut MaterialDocument, edit: &RetargetEdit) -> SiteResult {
    let ReferenceSite::TextureProperty { property, .. } = &edit.site else {
        return SiteResult::Missing;
    };

    // A material is resolved as a whole: every property still holding the old texture
    let stale: Vec<String> = material
        .texture_properties()
        .into_iter()
        .filter(|(_, value)| holds(value.as_ref(), &edit.old))
        .map(|(name, _)| name)
        .collect();

    if stale.is_empty() {
        if holds(material.texture(property).as_ref(), &edit.new) {
            return SiteResult::AlreadyDone;
        }
        tracing::warn!("Missing reference: {} no longer holds '{}'", edit.site, edit.old);
        return SiteResult::Missing;
    }

    for name in &stale {
        if let Err(e) = material.set_texture(name, &edit.new) {
            return SiteResult::Failed(e.to_string());
        }
        tracing::debug!("{}: {} -> '{}'", material.path(), name, edit.new);
    }
    SiteResult::Rewritten(stale.len())
}
