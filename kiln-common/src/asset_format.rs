//! Asset file naming for the Kiln engine.
//!
//! `AssetFormat` is the single source of truth for the suffix every asset kind
//! is written with. The importer derives every output filename from a source
//! name plus one of these suffixes.
//!
//! # Example
//!
//! ```
//! use kiln_common::KILN_ASSET_FORMAT;
//!
//! assert_eq!(KILN_ASSET_FORMAT.mesh_ext, "mesh");
//! assert_eq!(KILN_ASSET_FORMAT.file_name("Hero", KILN_ASSET_FORMAT.scene_ext), "Hero.scene");
//! ```

/// Per-asset-kind file suffixes (without the leading dot).
#[derive(Debug, Clone, Copy)]
pub struct AssetFormat {
    /// Static mesh (e.g., "mesh")
    pub mesh_ext: &'static str,

    /// Skinned mesh (e.g., "skinMesh")
    pub skin_mesh_ext: &'static str,

    /// Material (e.g., "material")
    pub material_ext: &'static str,

    /// Skeleton (e.g., "skeleton")
    pub skeleton_ext: &'static str,

    /// Animation clip (e.g., "anim")
    pub animation_ext: &'static str,

    /// Scene (e.g., "scene")
    pub scene_ext: &'static str,
}

impl AssetFormat {
    /// Create a new asset format table.
    pub const fn new(
        mesh_ext: &'static str,
        skin_mesh_ext: &'static str,
        material_ext: &'static str,
        skeleton_ext: &'static str,
        animation_ext: &'static str,
        scene_ext: &'static str,
    ) -> Self {
        Self {
            mesh_ext,
            skin_mesh_ext,
            material_ext,
            skeleton_ext,
            animation_ext,
            scene_ext,
        }
    }

    /// Join a stem and a suffix: `("Hero", "scene")` -> `"Hero.scene"`.
    pub fn file_name(&self, stem: &str, ext: &str) -> String {
        format!("{stem}.{ext}")
    }

    /// Suffix for a mesh document, depending on whether it is skinned.
    pub fn mesh_ext_for(&self, skinned: bool) -> &'static str {
        if skinned {
            self.skin_mesh_ext
        } else {
            self.mesh_ext
        }
    }
}

/// Kiln asset format.
///
/// - Meshes: `.mesh` / `.skinMesh`
/// - Materials: `.material`
/// - Skeletons: `.skeleton`
/// - Animations: `.anim`
/// - Scenes: `.scene`
pub const KILN_ASSET_FORMAT: AssetFormat =
    AssetFormat::new("mesh", "skinMesh", "material", "skeleton", "anim", "scene");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_extensions() {
        assert_eq!(KILN_ASSET_FORMAT.mesh_ext, "mesh");
        assert_eq!(KILN_ASSET_FORMAT.skin_mesh_ext, "skinMesh");
        assert_eq!(KILN_ASSET_FORMAT.material_ext, "material");
        assert_eq!(KILN_ASSET_FORMAT.skeleton_ext, "skeleton");
        assert_eq!(KILN_ASSET_FORMAT.animation_ext, "anim");
        assert_eq!(KILN_ASSET_FORMAT.scene_ext, "scene");
    }

    #[test]
    fn test_mesh_ext_for_skinned() {
        assert_eq!(KILN_ASSET_FORMAT.mesh_ext_for(false), "mesh");
        assert_eq!(KILN_ASSET_FORMAT.mesh_ext_for(true), "skinMesh");
    }
}
