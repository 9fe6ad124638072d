//! Location rule

use crate::types::{ConflictRecord, ReferenceSite, Violation};
use modroot_asset::ModInfo;

/// Test a reference against its mod's location rule.
///
/// A target is canonical only if it lies under the mod root and under the
/// folder matching its kind. Already-canonical targets are not conflicts.
pub fn classify(site: &ReferenceSite, mod_info: &ModInfo) -> Option<ConflictRecord> {
    let target = site.target();
    let reason = if !target.is_under(&mod_info.root) {
        Violation::OutsideMod
    } else if !target.is_under(&mod_info.canonical_folder(site.pass().kind())) {
        Violation::WrongFolder
    } else {
        return None;
    };

    Some(ConflictRecord {
        mod_info: mod_info.clone(),
        site: site.clone(),
        source: target.clone(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modroot_core::AssetPath;
    use modroot_prefab::HierarchyPath;

    fn m1() -> ModInfo {
        ModInfo::new("M1", AssetPath::new("Mods/M1"))
    }

    fn slot(target: &str) -> ReferenceSite {
        ReferenceSite::MaterialSlot {
            container: AssetPath::new("Mods/M1/Prefabs/Box.prefab"),
            node: HierarchyPath::parse("Box"),
            renderer: 0,
            slot: 0,
            target: AssetPath::new(target),
        }
    }

    fn texture(target: &str) -> ReferenceSite {
        ReferenceSite::TextureProperty {
            material: AssetPath::new("Mods/M1/Materials/metal.mat"),
            property: "_BaseMap".to_string(),
            target: AssetPath::new(target),
        }
    }

    #[test]
    fn test_parent_segments_cannot_fake_containment() {
        let m = m1();
        let c = classify(&slot("Mods/M1/Materials/../../../Shared/metal.mat"), &m).unwrap();
        assert_eq!(c.reason, Violation::OutsideMod);
        assert_eq!(c.source.as_str(), "Shared/metal.mat");

        let c = classify(&texture("Mods/M1/Textures/../Misc/a.png"), &m).unwrap();
        assert_eq!(c.reason, Violation::WrongFolder);
    }

    #[test]
    fn test_classify_materials() {
        let m = m1();
        let c = classify(&slot("Shared/metal.mat"), &m).unwrap();
        assert_eq!(c.reason, Violation::OutsideMod);
        assert_eq!(c.source.as_str(), "Shared/metal.mat");

        assert_eq!(
            classify(&slot("Mods/M1/Misc/metal.mat"), &m).unwrap().reason,
            Violation::WrongFolder
        );
        // A material under Textures is still in the wrong folder
        assert_eq!(
            classify(&slot("Mods/M1/Textures/metal.mat"), &m).unwrap().reason,
            Violation::WrongFolder
        );
        assert!(classify(&slot("Mods/M1/Materials/metal.mat"), &m).is_none());
        assert!(classify(&slot("mods/m1/materials/sub/metal.mat"), &m).is_none());
    }

    #[test]
    fn test_classify_textures() {
        let m = m1();
        assert_eq!(
            classify(&texture("Shared/a.png"), &m).unwrap().reason,
            Violation::OutsideMod
        );
        assert_eq!(
            classify(&texture("Mods/M1/Materials/a.png"), &m).unwrap().reason,
            Violation::WrongFolder
        );
        assert!(classify(&texture("Mods/M1/Textures/a.png"), &m).is_none());
    }

    #[test]
    fn test_sibling_mod_prefix_is_outside() {
        let m = m1();
        assert_eq!(
            classify(&slot("Mods/M10/Materials/metal.mat"), &m).unwrap().reason,
            Violation::OutsideMod
        );
    }
}
