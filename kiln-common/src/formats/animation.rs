//! Animation document (.anim)
//!
//! Fixed-rate sampled animation clip.
//!
//! # Layout
//! ```text
//! name      clip name
//! duration  seconds
//! fps       sampling rate of every key sequence
//! keys      bone name -> [AnimationKey] (increasing frame index)
//! ```
//!
//! Frame `f` of a sequence is the pose at `f / fps` seconds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AssetDocument;

/// One sampled pose of one bone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationKey {
    pub frame: u32,
    pub position: [f32; 3],
    /// Unit quaternion [x, y, z, w]
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationAsset {
    pub name: String,
    pub duration: f32,
    pub fps: f32,
    pub keys: BTreeMap<String, Vec<AnimationKey>>,
}

impl AnimationAsset {
    pub fn new(name: impl Into<String>, fps: f32) -> Self {
        Self {
            name: name.into(),
            duration: 0.0,
            fps,
            keys: BTreeMap::new(),
        }
    }

    /// Key sequence of one bone
    pub fn track(&self, bone: &str) -> Option<&[AnimationKey]> {
        self.keys.get(bone).map(Vec::as_slice)
    }

    /// Longest key sequence across all bones
    pub fn max_key_count(&self) -> usize {
        self.keys.values().map(Vec::len).max().unwrap_or(0)
    }
}

impl AssetDocument for AnimationAsset {
    const KIND: &'static str = "animation";
}
