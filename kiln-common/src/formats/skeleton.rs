//! Skeleton document (.skeleton)
//!
//! Ordered bone list forming a tree. Each bone stores its local transform and
//! its inverse bind-pose matrix.
//!
//! # Ordering
//! Bones are stored in index order and indices are assigned in one pre-order
//! walk, so a bone's parent always precedes it in the list:
//! ```text
//! bones[i].index == i
//! bones[i].parent < i
//! ```
//!
//! Inverse bind matrices are stored as 16 floats, column-major.

use serde::{Deserialize, Serialize};

use super::AssetDocument;
use crate::math::Transform;

/// Column-major 4×4 identity
pub const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    pub name: String,
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    pub transform: Transform,
    pub inverse_bind: [f32; 16],
}

impl BoneRecord {
    pub fn new(name: impl Into<String>, index: u32, parent: Option<u32>) -> Self {
        Self {
            name: name.into(),
            index,
            parent,
            transform: Transform::IDENTITY,
            inverse_bind: IDENTITY_MATRIX,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonAsset {
    pub name: String,
    pub bones: Vec<BoneRecord>,
}

impl SkeletonAsset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bones: Vec::new(),
        }
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Find a bone by name
    pub fn bone(&self, name: &str) -> Option<&BoneRecord> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Direct children of bone `index`, in index order
    pub fn children(&self, index: u32) -> impl Iterator<Item = &BoneRecord> {
        self.bones.iter().filter(move |b| b.parent == Some(index))
    }

    /// Walk from bone `index` up to its root, inclusive of both ends
    pub fn ancestry(&self, index: u32) -> Vec<u32> {
        let mut chain = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            chain.push(i);
            cursor = self.bones.get(i as usize).and_then(|b| b.parent);
        }
        chain
    }

    /// Check that `bones[i].index == i` and every parent precedes its child
    pub fn is_topologically_ordered(&self) -> bool {
        self.bones.iter().enumerate().all(|(i, bone)| {
            bone.index as usize == i && bone.parent.is_none_or(|p| (p as usize) < i)
        })
    }
}

impl AssetDocument for SkeletonAsset {
    const KIND: &'static str = "skeleton";
}
