//! Modroot Asset - Addressable asset storage
//!
//! This crate provides the asset store the resolver copies through,
//! mod discovery under a mods root, and the content-hash cache used for
//! deduplication.

mod cache;
mod catalog;
mod store;
mod types;

pub use cache::HashCache;
pub use catalog::{FolderState, FolderStatus, ModCatalog, ModInfo};
pub use store::{AssetStore, EditScope, FsAssetStore};
pub use types::{AssetKind, KNOWN_FOLDERS};
