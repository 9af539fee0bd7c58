//! Material import and texture resolution
//!
//! Every foreign material becomes one `.material` file. Its diffuse texture
//! is resolved to a file under the destination directory:
//!
//! - embedded textures use the name [`extract_embedded_textures`] wrote
//!   them under;
//! - file references keep their base name; if no such file exists in the
//!   destination yet it is copied from the source file's directory.
//!
//! A failed copy leaves a dangling reference and is only logged.
//!
//! [`extract_embedded_textures`]: crate::texture::extract_embedded_textures

use anyhow::Result;
use std::fs;
use std::path::Path;

use kiln_common::{AssetDocument, KILN_ASSET_FORMAT, MaterialAsset};

use crate::foreign::{ForeignMaterial, ForeignScene, TextureRef};
use crate::naming::{
    base_file_name, clear_forbidden, embedded_texture_names, material_names, material_path,
    normalize_path,
};
use crate::session::ImportSession;

/// Copy `reference` (relative to the source directory) to `target`.
fn copy_from_source(source_dir: &Path, reference: &str, target: &Path) -> std::io::Result<()> {
    let mut candidate = normalize_path(&source_dir.join(reference));
    if !candidate.is_file() {
        // Absolute or foreign-machine paths: try next to the source
        candidate = source_dir.join(base_file_name(reference));
    }
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::copy(&candidate, target).map(|_| ())
}

/// Resolve a texture reference to a file name under the destination
/// directory. Returns `None` for references that cannot be resolved.
pub fn resolve_texture(
    scene: &ForeignScene,
    reference: &TextureRef,
    session: &mut ImportSession,
) -> Option<String> {
    match reference {
        TextureRef::Embedded(index) => {
            let name = embedded_texture_names(scene.textures()).into_iter().nth(*index);
            if name.is_none() {
                tracing::warn!(
                    "Material references embedded texture {} but the scene has {}",
                    index,
                    scene.textures().len()
                );
            }
            name
        }
        TextureRef::File(reference) => {
            let name = clear_forbidden(base_file_name(reference));
            let target = normalize_path(&session.dest().join(&name));

            if !session.is_used(&target) && !target.exists() {
                match copy_from_source(session.source_dir(), reference, &target) {
                    Ok(()) => tracing::info!("Copied texture: {}", target.display()),
                    Err(e) => tracing::warn!(
                        "Texture '{}' not found next to {:?} ({}), reference left dangling",
                        reference,
                        session.source(),
                        e
                    ),
                }
            }

            session.record_used(&target);
            Some(name)
        }
    }
}

/// Build the material asset for one foreign material slot, named `name`
pub fn convert_material(
    scene: &ForeignScene,
    material: &ForeignMaterial,
    name: String,
    session: &mut ImportSession,
) -> MaterialAsset {
    let mut asset = MaterialAsset::new(name);
    asset.diffuse_texture = material
        .diffuse
        .as_ref()
        .and_then(|reference| resolve_texture(scene, reference, session));
    asset
}

/// Write one `.material` file per foreign material and record the slot table
pub fn import_materials(scene: &ForeignScene, session: &mut ImportSession) -> Result<()> {
    let names = material_names(scene.materials());
    let mut slots = Vec::with_capacity(names.len());

    for (material, name) in scene.materials().iter().zip(names) {
        let asset = convert_material(scene, material, name, session);
        let path = material_path(session.dest(), &asset.name);
        session.record_used(&path);
        asset.save(&path)?;

        tracing::info!(
            "Exported material '{}' (diffuse: {})",
            asset.name,
            asset.diffuse_texture.as_deref().unwrap_or("none")
        );
        slots.push(KILN_ASSET_FORMAT.file_name(
            &clear_forbidden(&asset.name),
            KILN_ASSET_FORMAT.material_ext,
        ));
    }

    session.set_materials(slots);
    Ok(())
}
