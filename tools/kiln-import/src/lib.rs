//! kiln-import library
//!
//! Converts third-party scenes (glTF, GLB, OBJ) into Kiln asset documents:
//! meshes, skinned meshes, materials, textures, skeletons, animation clips
//! and one scene per source. The `kiln-import` binary is a thin CLI over
//! [`pipeline::run`].

pub mod animation;
pub mod config;
pub mod error;
pub mod foreign;
pub mod material;
pub mod mesh;
pub mod naming;
pub mod pipeline;
pub mod scene;
pub mod session;
pub mod skeleton;
pub mod texture;

pub use error::ImportError;

// Re-export the foreign scene model for callers that decode scenes themselves
pub use foreign::{DecodeOptions, ForeignScene, ForeignSceneBuilder, load_scene};

// Re-export the batch driver
pub use pipeline::{ImportOptions, import_batch, import_file, import_foreign_scene};
pub use session::{ImportSession, Ledger};

// Re-export component entry points
pub use animation::{FrameGrid, TARGET_FRAME_RATE, resample_animation, resample_channel};
pub use mesh::{SkinBinding, convert_mesh};
pub use skeleton::{ImportedSkeleton, assign_indices, build_skeleton, collect_bone_nodes};
