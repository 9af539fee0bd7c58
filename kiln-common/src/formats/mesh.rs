//! Mesh document (.mesh / .skinMesh)
//!
//! Engine vertex format with optional skinning.
//!
//! # Vertex layout
//! ```text
//! position  [f32; 3]
//! normal    [f32; 3]
//! uv        [f32; 2]
//! bitangent [f32; 3]
//! skin      { bones: [u32; 4], weights: [f32; 4] }   (skinned meshes only)
//! ```
//!
//! A vertex of a skinned mesh always carries exactly [`BONE_SLOTS`] influence
//! slots; unused slots are `(0, 0.0)`. Vertices of static meshes carry none.

use serde::{Deserialize, Serialize};

use super::AssetDocument;
use crate::math::Aabb;

/// Number of (bone, weight) influence slots per skinned vertex
pub const BONE_SLOTS: usize = 4;

/// Bone influences of one skinned vertex
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneInfluences {
    pub bones: [u32; BONE_SLOTS],
    pub weights: [f32; BONE_SLOTS],
}

impl BoneInfluences {
    /// Fill slots in order from `influences`; slots past the end stay `(0, 0.0)`
    /// and influences past [`BONE_SLOTS`] are dropped.
    pub fn from_ordered(influences: &[(u32, f32)]) -> Self {
        let mut slots = Self::default();
        for (slot, &(bone, weight)) in influences.iter().take(BONE_SLOTS).enumerate() {
            slots.bones[slot] = bone;
            slots.weights[slot] = weight;
        }
        slots
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub bitangent: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<BoneInfluences>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshAsset {
    pub name: String,
    pub skinned: bool,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub aabb: Aabb,
    /// Material file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Skeleton file path (skinned meshes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_meshes: Vec<MeshAsset>,
}

impl MeshAsset {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// True if this mesh or any sub-mesh is skinned
    pub fn is_skinned(&self) -> bool {
        self.skinned || self.sub_meshes.iter().any(MeshAsset::is_skinned)
    }
}

impl AssetDocument for MeshAsset {
    const KIND: &'static str = "mesh";
}
