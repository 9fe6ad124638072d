//! Modroot Prefab - Structured asset containers
//!
//! This crate loads prefab containers into an editable arena, patches
//! material documents in place, and provides the container store the
//! resolver reads and commits through.

mod container;
mod format;
mod material;
mod store;

pub use container::{Container, HierarchyPath, Node, NodeId, Renderer, SlotRef};
pub use format::{NodeDef, PrefabFile, PrefabMetadata, RendererDef};
pub use material::MaterialDocument;
pub use store::{ContainerStore, FsContainerStore};
