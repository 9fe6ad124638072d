//! In-memory prefab containers
//!
//! A prefab is loaded into an arena of nodes addressed by [`NodeId`], so the
//! resolver can walk and edit material slots without holding references into
//! a tree. Nodes are also addressable by [`HierarchyPath`], which survives a
//! save/reload cycle where arena indices may not.

use crate::format::{NodeDef, PrefabFile, PrefabMetadata, RendererDef};
use modroot_core::{AssetPath, ModrootError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a node inside a container's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node names from the container root down to a node, root included
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HierarchyPath(Vec<String>);

impl HierarchyPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a `/`-joined path such as `Box/Lid/Handle`
    pub fn parse(s: &str) -> Self {
        Self(
            s.split('/')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// A renderer's ordered material slots; `None` is an empty slot
#[derive(Debug, Clone)]
pub struct Renderer {
    pub kind: String,
    pub slots: Vec<Option<AssetPath>>,
    properties: BTreeMap<String, toml::Value>,
}

/// One node of the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub renderers: Vec<Renderer>,
    components: BTreeMap<String, toml::Value>,
}

/// Address of one material slot: node, renderer ordinal on that node, slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub node: NodeId,
    pub renderer: usize,
    pub slot: usize,
}

/// A loaded prefab
#[derive(Debug, Clone)]
pub struct Container {
    path: AssetPath,
    metadata: PrefabMetadata,
    extra: BTreeMap<String, toml::Value>,
    nodes: Vec<Node>,
}

impl Container {
    /// Build the arena from a parsed prefab file (pre-order, root at index 0)
    pub fn from_file(path: AssetPath, file: PrefabFile) -> Self {
        let mut nodes = Vec::new();
        Self::push_node(&mut nodes, file.root, None);
        Self {
            path,
            metadata: file.prefab,
            extra: file.extra,
            nodes,
        }
    }

    /// Parse prefab TOML
    pub fn parse(path: AssetPath, content: &str) -> Result<Self> {
        let file: PrefabFile = toml::from_str(content).map_err(|e| {
            ModrootError::Container(format!("Failed to parse prefab '{}': {}", path, e))
        })?;
        Ok(Self::from_file(path, file))
    }

    fn push_node(nodes: &mut Vec<Node>, def: NodeDef, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(nodes.len());
        nodes.push(Node {
            name: def.name,
            parent,
            children: Vec::new(),
            renderers: def
                .renderers
                .into_iter()
                .map(|r| Renderer {
                    kind: r.kind,
                    slots: r
                        .materials
                        .iter()
                        .map(|m| {
                            let p = AssetPath::new(m);
                            (!p.is_empty()).then_some(p)
                        })
                        .collect(),
                    properties: r.properties,
                })
                .collect(),
            components: def.components,
        });

        for child in def.children {
            let child_id = Self::push_node(nodes, child, Some(id));
            nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Rebuild the serializable tree
    pub fn to_file(&self) -> PrefabFile {
        PrefabFile {
            prefab: self.metadata.clone(),
            root: self.node_def(self.root()),
            extra: self.extra.clone(),
        }
    }

    fn node_def(&self, id: NodeId) -> NodeDef {
        let node = &self.nodes[id.0];
        NodeDef {
            name: node.name.clone(),
            renderers: node
                .renderers
                .iter()
                .map(|r| RendererDef {
                    kind: r.kind.clone(),
                    materials: r
                        .slots
                        .iter()
                        .map(|s| s.as_ref().map(|p| p.to_string()).unwrap_or_default())
                        .collect(),
                    properties: r.properties.clone(),
                })
                .collect(),
            children: node.children.iter().map(|c| self.node_def(*c)).collect(),
            components: node.components.clone(),
        }
    }

    /// Serialize the whole document
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.to_file())?)
    }

    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in pre-order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn hierarchy_path(&self, id: NodeId) -> HierarchyPath {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.nodes.get(cur.0) {
                Some(node) => {
                    names.push(node.name.clone());
                    current = node.parent;
                }
                None => break,
            }
        }
        names.reverse();
        HierarchyPath(names)
    }

    /// Resolve a hierarchy path; a leading segment naming the root is optional.
    /// Among same-named siblings the first one wins.
    pub fn find(&self, path: &HierarchyPath) -> Option<NodeId> {
        let root = self.root();
        let mut segments = path.segments();
        if let Some(first) = segments.first() {
            if *first == self.nodes[root.0].name {
                segments = &segments[1..];
            }
        }

        let mut current = root;
        for segment in segments {
            current = *self.nodes[current.0]
                .children
                .iter()
                .find(|c| self.nodes[c.0].name == *segment)?;
        }
        Some(current)
    }

    /// Every renderer as (node, ordinal on node, renderer)
    pub fn renderers(&self) -> impl Iterator<Item = (NodeId, usize, &Renderer)> {
        self.nodes().flat_map(|(id, node)| {
            node.renderers
                .iter()
                .enumerate()
                .map(move |(ordinal, r)| (id, ordinal, r))
        })
    }

    /// Every non-empty material slot, in hierarchy order
    pub fn material_slots(&self) -> impl Iterator<Item = (SlotRef, &AssetPath)> {
        self.renderers().flat_map(|(node, renderer, r)| {
            r.slots.iter().enumerate().filter_map(move |(slot, value)| {
                value.as_ref().map(|v| {
                    (
                        SlotRef {
                            node,
                            renderer,
                            slot,
                        },
                        v,
                    )
                })
            })
        })
    }

    pub fn renderer(&self, node: NodeId, ordinal: usize) -> Option<&Renderer> {
        self.nodes.get(node.0)?.renderers.get(ordinal)
    }

    /// Current value of a slot; `None` if empty or out of range
    pub fn slot(&self, at: SlotRef) -> Option<&AssetPath> {
        self.renderer(at.node, at.renderer)?.slots.get(at.slot)?.as_ref()
    }

    /// Point a slot at an asset
    pub fn set_slot(&mut self, at: SlotRef, value: AssetPath) -> Result<()> {
        let path = self.path.clone();
        let slot = self
            .nodes
            .get_mut(at.node.0)
            .and_then(|n| n.renderers.get_mut(at.renderer))
            .and_then(|r| r.slots.get_mut(at.slot))
            .ok_or_else(|| {
                ModrootError::Container(format!(
                    "Slot {}:{}:{} does not exist in '{}'",
                    at.node.0, at.renderer, at.slot, path
                ))
            })?;
        *slot = (!value.is_empty()).then_some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: &str = r#"
[prefab]
name = "Box"

[root]
name = "Box"

[[root.renderers]]
materials = ["Shared/metal.mat", ""]

[[root.children]]
name = "Lid"

[[root.children.renderers]]
materials = ["Shared/wood.mat", "Shared/metal.mat"]

[[root.children.children]]
name = "Handle"

[root.children.children.light]
range = 4.0
"#;

    fn load() -> Container {
        Container::parse(AssetPath::new("Mods/M1/Prefabs/Box.prefab"), BOX).unwrap()
    }

    #[test]
    fn test_arena_is_preorder() {
        let c = load();
        let names: Vec<_> = c.nodes().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec!["Box", "Lid", "Handle"]);
        assert_eq!(c.node(NodeId(2)).unwrap().parent, Some(NodeId(1)));
    }

    #[test]
    fn test_hierarchy_path_roundtrip() {
        let c = load();
        let handle = NodeId(2);
        let path = c.hierarchy_path(handle);
        assert_eq!(path.to_string(), "Box/Lid/Handle");
        assert_eq!(c.find(&path), Some(handle));
        assert_eq!(c.find(&HierarchyPath::parse("Lid/Handle")), Some(handle));
        assert_eq!(c.find(&HierarchyPath::parse("Box/Missing")), None);
    }

    #[test]
    fn test_material_slots_skip_empty() {
        let c = load();
        let slots: Vec<_> = c
            .material_slots()
            .map(|(at, v)| (at.node.index(), at.renderer, at.slot, v.to_string()))
            .collect();
        assert_eq!(
            slots,
            vec![
                (0, 0, 0, "Shared/metal.mat".to_string()),
                (1, 0, 0, "Shared/wood.mat".to_string()),
                (1, 0, 1, "Shared/metal.mat".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_slot_and_serialize() {
        let mut c = load();
        let at = SlotRef {
            node: NodeId(1),
            renderer: 0,
            slot: 1,
        };
        c.set_slot(at, AssetPath::new("Mods/M1/Materials/metal.mat")).unwrap();

        let saved = c.to_toml_string().unwrap();
        let reloaded = Container::parse(c.path().clone(), &saved).unwrap();
        assert_eq!(
            reloaded.slot(at).map(|p| p.as_str()),
            Some("Mods/M1/Materials/metal.mat")
        );
        // Empty slot and opaque components survive the rewrite
        assert_eq!(reloaded.renderer(NodeId(0), 0).unwrap().slots.len(), 2);
        assert!(saved.contains("range = 4.0"));
    }

    #[test]
    fn test_unknown_prefab_keys_survive_rewrite() {
        let content = r#"
[prefab]
name = "Crate"
author = "feel"

[root]
name = "Crate"

[[root.renderers]]
materials = ["Shared/metal.mat"]

[extra]
lod = 2
"#;
        let mut c = Container::parse(AssetPath::new("Mods/M1/Prefabs/Crate.prefab"), content).unwrap();
        let at = SlotRef {
            node: NodeId(0),
            renderer: 0,
            slot: 0,
        };
        c.set_slot(at, AssetPath::new("Mods/M1/Materials/metal.mat")).unwrap();

        let saved = c.to_toml_string().unwrap();
        let back: PrefabFile = toml::from_str(&saved).unwrap();
        assert_eq!(
            back.prefab.extra.get("author").and_then(|v| v.as_str()),
            Some("feel")
        );
        assert_eq!(
            back.extra
                .get("extra")
                .and_then(|t| t.get("lod"))
                .and_then(|v| v.as_integer()),
            Some(2)
        );
        assert_eq!(back.root.renderers[0].materials, vec!["Mods/M1/Materials/metal.mat"]);
    }

    #[test]
    fn test_set_slot_out_of_range() {
        let mut c = load();
        let at = SlotRef {
            node: NodeId(0),
            renderer: 3,
            slot: 0,
        };
        assert!(c.set_slot(at, AssetPath::new("x.mat")).is_err());
    }
}
