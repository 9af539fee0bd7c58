//! Kiln engine asset documents
//!
//! Every asset the importer produces is one self-describing document written
//! through [`AssetDocument`]. Documents cross-reference each other by file path
//! (a mesh names its material and skeleton files, a scene names mesh files).
//!
//! Asset suffixes are defined in [`crate::asset_format`].

pub mod animation;
pub mod material;
pub mod mesh;
pub mod scene;
mod serialization;
pub mod skeleton;

pub use animation::*;
pub use material::*;
pub use mesh::*;
pub use scene::*;
pub use serialization::{AssetDocument, DOCUMENT_VERSION};
pub use skeleton::*;
