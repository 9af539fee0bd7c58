//! Fatal import errors
//!
//! Any of these aborts the whole batch. Degraded conditions (missing texture
//! files, excess bone influences, missing format hints) are logged and never
//! reach this type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Mesh '{mesh}' face {face} has {corners} corners, expected a triangle")]
    NonTriangularFace {
        mesh: String,
        face: usize,
        corners: usize,
    },

    #[error("Mesh '{mesh}' is influenced by bone '{bone}' which has no node in the scene")]
    MissingBoneNode { mesh: String, bone: String },

    #[error(
        "Animation '{animation}': {track} track of '{node}' has no key at or after tick {time}"
    )]
    KeyframeOutOfRange {
        animation: String,
        node: String,
        track: &'static str,
        time: f32,
    },

    #[error("Mesh '{mesh}' has no vertices")]
    EmptyMesh { mesh: String },

    #[error("Unsupported source format: {} (use .gltf, .glb or .obj)", .path.display())]
    UnsupportedSource { path: PathBuf },

    #[error("Source scene {} contains no nodes", .path.display())]
    EmptyScene { path: PathBuf },
}
