//! Reference graph walking
//!
//! The walker enumerates documents under a mod, opens them one at a time
//! through the [`ContainerStore`] and yields every non-empty reference slot
//! as a [`ReferenceSite`]. Documents are only opened as the iterator is
//! advanced, and the cancel flag is polled before each one.

use crate::cancel::CancelFlag;
use crate::types::ReferenceSite;
use modroot_asset::{AssetKind, AssetStore, ModInfo};
use modroot_core::{AssetPath, Result};
use modroot_prefab::ContainerStore;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Asset -> sites referencing it, built as a side effect of walking
#[derive(Debug, Default)]
pub struct ReverseIndex {
    entries: BTreeMap<String, Vec<ReferenceSite>>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, site: &ReferenceSite) {
        self.entries
            .entry(site.target().key())
            .or_default()
            .push(site.clone());
    }

    /// Every site recorded as referencing `asset`
    pub fn sites_for(&self, asset: &AssetPath) -> &[ReferenceSite] {
        self.entries
            .get(&asset.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Documents referencing `asset`, deduplicated, sorted case-insensitively
    pub fn referrers(&self, asset: &AssetPath) -> Vec<&AssetPath> {
        let mut docs: Vec<&AssetPath> = Vec::new();
        for site in self.sites_for(asset) {
            if !docs.iter().any(|d| d.same_as(site.document())) {
                docs.push(site.document());
            }
        }
        docs.sort_by_key(|d| d.key());
        docs
    }

    /// The alphabetically smallest base name of a prefab using `asset`
    pub fn preferred_owner(&self, asset: &AssetPath) -> Option<&str> {
        self.sites_for(asset)
            .iter()
            .filter(|s| matches!(s, ReferenceSite::MaterialSlot { .. }))
            .map(|s| s.document_name())
            .filter(|name| !name.is_empty())
            .min_by(|a, b| crate::planner::owner_order(a, b))
    }

    /// Number of distinct referenced assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A document the walk could not read
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    pub path: AssetPath,
    pub error: String,
}

/// What a finished (or stopped) walk covered
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkStats {
    pub documents: usize,
    pub sites: usize,
    pub skipped: Vec<SkippedDocument>,
    pub cancelled: bool,
}

/// Entry point for walking a mod's reference graph
pub struct ReferenceWalker<'a, A: AssetStore + ?Sized, C: ContainerStore + ?Sized> {
    assets: &'a A,
    containers: &'a C,
    cancel: &'a CancelFlag,
}

impl<'a, A: AssetStore + ?Sized, C: ContainerStore + ?Sized> ReferenceWalker<'a, A, C> {
    pub fn new(assets: &'a A, containers: &'a C, cancel: &'a CancelFlag) -> Self {
        Self {
            assets,
            containers,
            cancel,
        }
    }

    /// Material slots of every prefab under `<mod>/Prefabs`
    pub fn material_sites<'i>(
        &self,
        mod_info: &ModInfo,
        index: &'i mut ReverseIndex,
    ) -> Result<SiteWalk<'a, 'i, C>> {
        let documents = self
            .assets
            .list(&mod_info.prefabs_path(), AssetKind::Prefab.pattern())?;
        Ok(SiteWalk::new(
            AssetKind::Prefab,
            documents,
            self.containers,
            index,
            self.cancel,
        ))
    }

    /// Texture properties of every material anywhere under the mod root
    pub fn texture_sites<'i>(
        &self,
        mod_info: &ModInfo,
        index: &'i mut ReverseIndex,
    ) -> Result<SiteWalk<'a, 'i, C>> {
        let documents = self
            .assets
            .list(&mod_info.root, AssetKind::Material.pattern())?;
        Ok(SiteWalk::new(
            AssetKind::Material,
            documents,
            self.containers,
            index,
            self.cancel,
        ))
    }
}

/// Lazy sequence of reference sites over a list of documents
pub struct SiteWalk<'a, 'i, C: ContainerStore + ?Sized> {
    kind: AssetKind,
    documents: VecDeque<AssetPath>,
    pending: VecDeque<ReferenceSite>,
    containers: &'a C,
    index: &'i mut ReverseIndex,
    cancel: &'a CancelFlag,
    stats: WalkStats,
}

impl<'a, 'i, C: ContainerStore + ?Sized> SiteWalk<'a, 'i, C> {
    fn new(
        kind: AssetKind,
        documents: Vec<AssetPath>,
        containers: &'a C,
        index: &'i mut ReverseIndex,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            kind,
            documents: documents.into(),
            pending: VecDeque::new(),
            containers,
            index,
            cancel,
            stats: WalkStats::default(),
        }
    }

    /// Drain the walk for its index side effect only
    pub fn index_only(mut self) -> WalkStats {
        while self.next().is_some() {}
        self.finish()
    }

    /// Stop walking and report what was covered
    pub fn finish(self) -> WalkStats {
        self.stats
    }

    fn load(&self, path: &AssetPath) -> Result<Vec<ReferenceSite>> {
        match self.kind {
            AssetKind::Prefab => {
                let container = self.containers.open_prefab(path)?;
                Ok(container
                    .material_slots()
                    .map(|(at, target)| ReferenceSite::MaterialSlot {
                        container: path.clone(),
                        node: container.hierarchy_path(at.node),
                        renderer: at.renderer,
                        slot: at.slot,
                        target: target.clone(),
                    })
                    .collect())
            }
            _ => {
                let material = self.containers.open_material(path)?;
                Ok(material
                    .texture_slots()
                    .into_iter()
                    .map(|(property, target)| ReferenceSite::TextureProperty {
                        material: path.clone(),
                        property,
                        target,
                    })
                    .collect())
            }
        }
    }
}

impl<C: ContainerStore + ?Sized> Iterator for SiteWalk<'_, '_, C> {
    type Item = ReferenceSite;

    fn next(&mut self) -> Option<ReferenceSite> {
        loop {
            if let Some(site) = self.pending.pop_front() {
                self.stats.sites += 1;
                return Some(site);
            }
            if self.stats.cancelled {
                return None;
            }
            if self.cancel.is_requested() {
                tracing::info!("Walk cancelled with {} document(s) left", self.documents.len());
                self.stats.cancelled = true;
                return None;
            }

            let path = self.documents.pop_front()?;
            match self.load(&path) {
                Ok(sites) => {
                    self.stats.documents += 1;
                    for site in &sites {
                        self.index.record(site);
                    }
                    self.pending.extend(sites);
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable {} '{}': {}", self.kind, path, e);
                    self.stats.skipped.push(SkippedDocument {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;
    use modroot_prefab::FsContainerStore;

    #[test]
    fn test_material_sites_and_index() {
        let fx = Fixture::new();
        fx.prefab("M1", "Box", &[("Box", &["Shared/metal.mat", ""])]);
        fx.prefab(
            "M1",
            "Crate",
            &[("Crate", &["Shared/metal.mat"]), ("Crate/Lid", &["Mods/M1/Materials/wood.mat"])],
        );
        let (assets, containers) = fx.stores();
        let cancel = CancelFlag::new();
        let walker = ReferenceWalker::new(&assets, &containers, &cancel);
        let mut index = ReverseIndex::new();

        let mut walk = walker.material_sites(&fx.mod_info("M1"), &mut index).unwrap();
        let sites: Vec<_> = walk.by_ref().collect();
        let stats = walk.finish();

        assert_eq!(sites.len(), 3);
        assert_eq!(stats.documents, 2);
        assert!(!stats.cancelled);

        let metal = AssetPath::new("shared/METAL.mat");
        assert_eq!(index.sites_for(&metal).len(), 2);
        assert_eq!(index.referrers(&metal).len(), 2);
        assert_eq!(index.preferred_owner(&metal), Some("Box"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_texture_sites_cover_whole_mod() {
        let fx = Fixture::new();
        fx.material("Mods/M1/Materials/a.mat", &[("_BaseMap", "Shared/a.png")]);
        fx.material("Mods/M1/Misc/b.mat", &[("_BaseMap", "Shared/b.png"), ("_BumpMap", "")]);
        fx.material("Shared/c.mat", &[("_BaseMap", "Shared/c.png")]);
        let (assets, containers) = fx.stores();
        let cancel = CancelFlag::new();
        let walker = ReferenceWalker::new(&assets, &containers, &cancel);
        let mut index = ReverseIndex::new();

        let sites: Vec<_> = walker
            .texture_sites(&fx.mod_info("M1"), &mut index)
            .unwrap()
            .collect();
        let targets: Vec<_> = sites.iter().map(|s| s.target().to_string()).collect();
        assert_eq!(targets, vec!["Shared/a.png", "Shared/b.png"]);
        // Texture sites never name a preferred prefab owner
        assert_eq!(index.preferred_owner(&AssetPath::new("Shared/a.png")), None);
    }

    #[test]
    fn test_unreadable_document_is_skipped() {
        let fx = Fixture::new();
        fx.prefab("M1", "Box", &[("Box", &["Shared/metal.mat"])]);
        fx.write("Mods/M1/Prefabs/Broken.prefab", "this is [not toml");
        let (assets, containers) = fx.stores();
        let cancel = CancelFlag::new();
        let walker = ReferenceWalker::new(&assets, &containers, &cancel);
        let mut index = ReverseIndex::new();

        let mut walk = walker.material_sites(&fx.mod_info("M1"), &mut index).unwrap();
        assert_eq!(walk.by_ref().count(), 1);
        let stats = walk.finish();
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].path.file_name(), "Broken.prefab");
    }

    #[test]
    fn test_cancel_stops_between_documents() {
        let fx = Fixture::new();
        fx.prefab("M1", "A", &[("A", &["Shared/a.mat", "Shared/b.mat"])]);
        fx.prefab("M1", "B", &[("B", &["Shared/c.mat"])]);
        let (assets, containers): (_, FsContainerStore) = fx.stores();
        let cancel = CancelFlag::new();
        let walker = ReferenceWalker::new(&assets, &containers, &cancel);
        let mut index = ReverseIndex::new();

        let mut walk = walker.material_sites(&fx.mod_info("M1"), &mut index).unwrap();
        assert!(walk.next().is_some());
        cancel.request();
        // The document already opened is drained, the next one is not
        assert!(walk.next().is_some());
        assert!(walk.next().is_none());
        let stats = walk.finish();
        assert!(stats.cancelled);
        assert_eq!(stats.documents, 1);
    }
}
