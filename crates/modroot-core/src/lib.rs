//! Modroot Core - Foundational types for the modroot resolver
//!
//! This crate provides the core types that all other modroot crates depend on:
//! - `AssetPath` - Project-relative, case-insensitive asset paths
//! - `ContentHash` - SHA-256 based content hashing
//! - Error types and Result alias

mod error;
mod hash;
mod path;

pub use error::{ModrootError, Result};
pub use hash::ContentHash;
pub use path::AssetPath;
