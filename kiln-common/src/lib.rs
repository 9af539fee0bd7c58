//! Shared asset types for the Kiln engine
//!
//! This crate provides the engine-side asset documents shared between:
//! - the runtime (loads the documents)
//! - `kiln-import` (asset pipeline, writes the documents)
//!
//! # Modules
//!
//! - [`formats`] - Mesh, skeleton, animation, material and scene documents
//! - [`asset_format`] - Per-asset-kind file suffixes
//! - [`math`] - Serializable transform and bounding volume types

pub mod asset_format;
pub mod formats;
pub mod math;

pub use asset_format::{AssetFormat, KILN_ASSET_FORMAT};

pub use math::{Aabb, Transform};

// Re-export commonly used format items
pub use formats::{
    AnimationAsset, AnimationKey, AssetDocument, BONE_SLOTS, BoneInfluences, BoneRecord,
    DOCUMENT_VERSION, EntityId, EntityRecord, IDENTITY_MATRIX, MaterialAsset, MeshAsset, SceneAsset,
    SkeletonAsset, Vertex,
};
