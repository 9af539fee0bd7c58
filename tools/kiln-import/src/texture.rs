//! Embedded texture extraction
//!
//! Compressed payloads are written byte-for-byte. Raw RGBA8 payloads are
//! encoded to PNG first.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::foreign::{EmbeddedTexture, ForeignScene, TexturePayload};
use crate::naming::embedded_texture_names;
use crate::session::ImportSession;

/// Write one embedded texture to `path`. Returns `false` if the payload was
/// unusable and nothing was written.
fn write_texture(texture: &EmbeddedTexture, path: &Path) -> Result<bool> {
    match &texture.payload {
        TexturePayload::Compressed(bytes) => {
            fs::write(path, bytes)
                .with_context(|| format!("Failed to write texture: {}", path.display()))?;
        }
        TexturePayload::Rgba8 {
            width,
            height,
            pixels,
        } => {
            let expected = *width as usize * *height as usize * 4;
            if pixels.len() != expected {
                tracing::warn!(
                    "Embedded texture '{}' has {} bytes, expected {} for {}x{} RGBA8; skipping",
                    texture.filename,
                    pixels.len(),
                    expected,
                    width,
                    height
                );
                return Ok(false);
            }
            image::save_buffer(path, pixels, *width, *height, image::ColorType::Rgba8)
                .with_context(|| format!("Failed to encode texture: {}", path.display()))?;
        }
    }
    Ok(true)
}

/// Write every embedded texture of the scene into the destination directory
pub fn extract_embedded_textures(scene: &ForeignScene, session: &mut ImportSession) -> Result<()> {
    let names = embedded_texture_names(scene.textures());
    for (texture, name) in scene.textures().iter().zip(names) {
        if texture.format_hint.is_none() && matches!(texture.payload, TexturePayload::Compressed(_))
        {
            tracing::warn!(
                "Embedded texture '{}' has no format hint, writing without extension",
                texture.filename
            );
        }

        let path = session.dest().join(&name);
        if session.is_used(&path) {
            tracing::debug!("Texture {} already written", path.display());
            continue;
        }

        if write_texture(texture, &path)? {
            session.record_used(&path);
            tracing::info!("Extracted embedded texture: {}", path.display());
        }
    }
    Ok(())
}
