//! Dedup planning
//!
//! Conflicts are grouped by (mod, source) and every group is assigned one
//! destination in the mod's canonical folder. Destinations that are already
//! occupied are compared by content: identical bytes are reused, anything
//! else is moved aside to a suffixed name. Groups whose sources have the
//! same bytes share a destination, so a mod never receives two canonical
//! copies of identical data.

use crate::types::{ConflictRecord, CopyPlan, GroupKey, NamingMode, PlannedAction, ReferenceSite};
use crate::walker::ReverseIndex;
use modroot_asset::{AssetKind, AssetStore, HashCache, ModInfo};
use modroot_core::{AssetPath, ContentHash};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Owner name used when no referencing document has a usable name
const FALLBACK_OWNER: &str = "Shared";

/// Keep `[A-Za-z0-9_]`; anything that sanitizes to nothing becomes `Mod`
pub fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if kept.is_empty() {
        "Mod".to_string()
    } else {
        kept
    }
}

/// Case-insensitive ordering with a case-sensitive tie break
pub(crate) fn owner_order(a: &&str, b: &&str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// `<stem>__<mod>_<n><ext>` next to `dest`
pub fn suffixed_path(dest: &AssetPath, mod_name: &str, n: usize) -> AssetPath {
    let name = format!(
        "{}__{}_{}{}",
        dest.file_stem(),
        sanitize(mod_name),
        n,
        dest.extension()
    );
    dest.with_file_name(&name)
}

#[derive(Default)]
struct Claims {
    by_path: HashMap<String, Option<ContentHash>>,
    by_content: HashMap<(String, ContentHash), AssetPath>,
}

/// Groups conflicts and chooses destinations
pub struct Planner<'a, S: AssetStore + ?Sized> {
    store: &'a S,
    cache: &'a mut HashCache,
    index: &'a ReverseIndex,
    naming: NamingMode,
}

impl<'a, S: AssetStore + ?Sized> Planner<'a, S> {
    pub fn new(
        store: &'a S,
        cache: &'a mut HashCache,
        index: &'a ReverseIndex,
        naming: NamingMode,
    ) -> Self {
        Self {
            store,
            cache,
            index,
            naming,
        }
    }

    /// One plan per (mod, source) group, ordered by mod then source path
    pub fn plan(&mut self, conflicts: &[ConflictRecord]) -> Vec<CopyPlan> {
        let mut groups: BTreeMap<GroupKey, Vec<ConflictRecord>> = BTreeMap::new();
        for conflict in conflicts {
            groups.entry(conflict.key()).or_default().push(conflict.clone());
        }

        let mut claims = Claims::default();
        let mut plans = Vec::with_capacity(groups.len());
        for (key, members) in groups {
            let mod_info = members[0].mod_info.clone();
            let source = members[0].source.clone();
            let desired = self.destination(&mod_info, &source, &members);
            let (dest, action) = self.resolve(&mod_info, &source, &desired, &mut claims);

            plans.push(CopyPlan {
                key,
                mod_info,
                source,
                desired,
                dest,
                action,
                members,
                included: true,
            });
        }
        plans
    }

    /// Destination before collision handling
    fn destination(&self, mod_info: &ModInfo, source: &AssetPath, members: &[ConflictRecord]) -> AssetPath {
        let kind = members[0].site.pass().kind();
        let folder = mod_info.canonical_folder(kind);
        match self.naming {
            NamingMode::KeepOriginal => folder.join(source.file_name()),
            NamingMode::OwnerDerived => {
                let owner = self
                    .owner_name(members)
                    .unwrap_or_else(|| FALLBACK_OWNER.to_string());
                let name = match kind {
                    AssetKind::Material => format!("{} Material.mat", sanitize(&owner)),
                    _ => format!("{} Texture{}", sanitize(&owner), source.extension()),
                };
                folder.join(name)
            }
        }
    }

    /// Smallest preferred owner across the group.
    ///
    /// Materials prefer the referencing prefab. Textures prefer a prefab
    /// known to use the referencing material, then the material itself.
    fn owner_name(&self, members: &[ConflictRecord]) -> Option<String> {
        let preferred = members
            .iter()
            .filter_map(|m| match &m.site {
                ReferenceSite::MaterialSlot { .. } => Some(m.site.document_name()),
                ReferenceSite::TextureProperty { material, .. } => {
                    self.index.preferred_owner(material)
                }
            })
            .filter(|name| !name.is_empty())
            .min_by(owner_order);

        preferred
            .or_else(|| {
                members
                    .iter()
                    .map(|m| m.site.document_name())
                    .filter(|name| !name.is_empty())
                    .min_by(owner_order)
            })
            .map(str::to_string)
    }

    fn resolve(
        &mut self,
        mod_info: &ModInfo,
        source: &AssetPath,
        desired: &AssetPath,
        claims: &mut Claims,
    ) -> (AssetPath, PlannedAction) {
        let mod_key = mod_info.root.key();
        let hash = self.cache.hash(self.store, source).ok();

        if let Some(h) = hash {
            if let Some(shared) = claims.by_content.get(&(mod_key.clone(), h)) {
                tracing::debug!("'{}' has the same content as '{}', sharing it", source, shared);
                return (shared.clone(), PlannedAction::Reuse);
            }
        }

        let mut candidate = desired.clone();
        let mut n = 0;
        let action = loop {
            // A path claimed earlier in this plan holds different content
            if !claims.by_path.contains_key(&candidate.key()) {
                if !self.store.exists(&candidate) {
                    break if n == 0 {
                        PlannedAction::Copy
                    } else {
                        PlannedAction::Rename
                    };
                }
                if self.cache.content_equals(self.store, source, &candidate) {
                    break PlannedAction::Reuse;
                }
            }
            n += 1;
            candidate = suffixed_path(desired, &mod_info.name, n);
        };

        if n > 0 {
            tracing::debug!(
                "'{}' is taken by different content, using '{}'",
                desired,
                candidate
            );
        }

        claims.by_path.insert(candidate.key(), hash);
        if let Some(h) = hash {
            claims.by_content.insert((mod_key, h), candidate.clone());
        }
        (candidate, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::classify;
    use crate::testutil::Fixture;
    use modroot_prefab::HierarchyPath;

    fn slot_conflict(m: &ModInfo, container: &str, target: &str) -> ConflictRecord {
        let site = ReferenceSite::MaterialSlot {
            container: AssetPath::new(container),
            node: HierarchyPath::parse("Root"),
            renderer: 0,
            slot: 0,
            target: AssetPath::new(target),
        };
        classify(&site, m).unwrap()
    }

    fn texture_conflict(m: &ModInfo, material: &str, target: &str) -> ConflictRecord {
        let site = ReferenceSite::TextureProperty {
            material: AssetPath::new(material),
            property: "_BaseMap".to_string(),
            target: AssetPath::new(target),
        };
        classify(&site, m).unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("feel-batterybanks"), "feelbatterybanks");
        assert_eq!(sanitize("Box_01 (old)"), "Box_01old");
        assert_eq!(sanitize(""), "Mod");
        assert_eq!(sanitize("---"), "Mod");
    }

    #[test]
    fn test_suffixed_path() {
        let dest = AssetPath::new("Mods/M1/Materials/metal.mat");
        assert_eq!(
            suffixed_path(&dest, "my-mod", 2).as_str(),
            "Mods/M1/Materials/metal__mymod_2.mat"
        );
    }

    #[test]
    fn test_groups_by_source_case_insensitively() {
        let fx = Fixture::new();
        fx.write("Shared/metal.mat", "a");
        let m = fx.mod_info("M1");
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let index = ReverseIndex::new();

        let conflicts = vec![
            slot_conflict(&m, "Mods/M1/Prefabs/Box.prefab", "Shared/metal.mat"),
            slot_conflict(&m, "Mods/M1/Prefabs/Crate.prefab", "shared/METAL.mat"),
        ];
        let plans = Planner::new(&assets, &mut cache, &index, NamingMode::KeepOriginal).plan(&conflicts);

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].members.len(), 2);
        assert_eq!(plans[0].dest.as_str(), "Mods/M1/Materials/metal.mat");
        assert_eq!(plans[0].action, PlannedAction::Copy);
        assert!(plans[0].included);
    }

    #[test]
    fn test_owner_derived_material_is_deterministic() {
        let fx = Fixture::new();
        fx.write("Shared/metal.mat", "a");
        let m = fx.mod_info("M1");
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let index = ReverseIndex::new();

        let conflicts = vec![
            slot_conflict(&m, "Mods/M1/Prefabs/Zeta.prefab", "Shared/metal.mat"),
            slot_conflict(&m, "Mods/M1/Prefabs/alpha-crate.prefab", "Shared/metal.mat"),
            slot_conflict(&m, "Mods/M1/Prefabs/Beta.prefab", "Shared/metal.mat"),
        ];
        let mut planner = Planner::new(&assets, &mut cache, &index, NamingMode::OwnerDerived);
        let first = planner.plan(&conflicts);
        let mut reversed = conflicts.clone();
        reversed.reverse();
        let second = planner.plan(&reversed);

        assert_eq!(first[0].dest.as_str(), "Mods/M1/Materials/alphacrate Material.mat");
        assert_eq!(first[0].dest, second[0].dest);
    }

    #[test]
    fn test_owner_derived_texture_prefers_prefab_of_material() {
        let fx = Fixture::new();
        fx.write("Shared/metal_albedo.png", "px");
        fx.write("Shared/wood.tga", "px2");
        let m = fx.mod_info("M1");
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();

        let mut index = ReverseIndex::new();
        index.record(&ReferenceSite::MaterialSlot {
            container: AssetPath::new("Mods/M1/Prefabs/Box.prefab"),
            node: HierarchyPath::parse("Box"),
            renderer: 0,
            slot: 0,
            target: AssetPath::new("Mods/M1/Materials/metal.mat"),
        });

        let conflicts = vec![
            texture_conflict(&m, "Mods/M1/Materials/metal.mat", "Shared/metal_albedo.png"),
            texture_conflict(&m, "Mods/M1/Materials/wood.mat", "Shared/wood.tga"),
        ];
        let plans = Planner::new(&assets, &mut cache, &index, NamingMode::OwnerDerived).plan(&conflicts);

        assert_eq!(plans[0].dest.as_str(), "Mods/M1/Textures/Box Texture.png");
        // No prefab known for wood.mat: the material's own name is used
        assert_eq!(plans[1].dest.as_str(), "Mods/M1/Textures/wood Texture.tga");
    }

    #[test]
    fn test_collision_with_different_content_is_suffixed() {
        let fx = Fixture::new();
        fx.write("Shared/metal.mat", "shared");
        fx.write("Mods/M1/Materials/metal.mat", "local");
        fx.write("Mods/M1/Materials/metal__M1_1.mat", "older");
        let m = fx.mod_info("M1");
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let index = ReverseIndex::new();

        let conflicts = vec![slot_conflict(&m, "Mods/M1/Prefabs/Box.prefab", "Shared/metal.mat")];
        let plans = Planner::new(&assets, &mut cache, &index, NamingMode::KeepOriginal).plan(&conflicts);

        assert_eq!(plans[0].dest.as_str(), "Mods/M1/Materials/metal__M1_2.mat");
        assert_eq!(plans[0].action, PlannedAction::Rename);
    }

    #[test]
    fn test_existing_identical_destination_is_reused() {
        let fx = Fixture::new();
        fx.write("Shared/metal.mat", "same");
        fx.write("Mods/M1/Materials/metal.mat", "same");
        let m = fx.mod_info("M1");
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let index = ReverseIndex::new();

        let conflicts = vec![slot_conflict(&m, "Mods/M1/Prefabs/Box.prefab", "Shared/metal.mat")];
        let plans = Planner::new(&assets, &mut cache, &index, NamingMode::KeepOriginal).plan(&conflicts);

        assert_eq!(plans[0].dest.as_str(), "Mods/M1/Materials/metal.mat");
        assert_eq!(plans[0].action, PlannedAction::Reuse);
    }

    #[test]
    fn test_identical_sources_share_one_destination() {
        let fx = Fixture::new();
        fx.write("Shared/a.mat", "identical");
        fx.write("Other/b.mat", "identical");
        let m = fx.mod_info("M1");
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let index = ReverseIndex::new();

        let conflicts = vec![
            slot_conflict(&m, "Mods/M1/Prefabs/Box.prefab", "Shared/a.mat"),
            slot_conflict(&m, "Mods/M1/Prefabs/Crate.prefab", "Other/b.mat"),
        ];
        let plans = Planner::new(&assets, &mut cache, &index, NamingMode::KeepOriginal).plan(&conflicts);

        // Other/b.mat sorts first and claims the destination
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].dest.as_str(), "Mods/M1/Materials/b.mat");
        assert_eq!(plans[0].dest, plans[1].dest);
        assert_eq!(plans[0].action, PlannedAction::Copy);
        assert_eq!(plans[1].action, PlannedAction::Reuse);
    }

    #[test]
    fn test_same_name_different_content_get_distinct_paths() {
        let fx = Fixture::new();
        fx.write("Shared/x/metal.mat", "one");
        fx.write("Shared/y/metal.mat", "two");
        let m = fx.mod_info("M1");
        let (assets, _) = fx.stores();
        let mut cache = HashCache::new();
        let index = ReverseIndex::new();

        let conflicts = vec![
            slot_conflict(&m, "Mods/M1/Prefabs/Box.prefab", "Shared/x/metal.mat"),
            slot_conflict(&m, "Mods/M1/Prefabs/Box.prefab", "Shared/y/metal.mat"),
        ];
        let plans = Planner::new(&assets, &mut cache, &index, NamingMode::KeepOriginal).plan(&conflicts);

        assert_eq!(plans[0].dest.as_str(), "Mods/M1/Materials/metal.mat");
        assert_eq!(plans[1].dest.as_str(), "Mods/M1/Materials/metal__M1_1.mat");
        assert_eq!(plans[1].action, PlannedAction::Rename);
    }
}
