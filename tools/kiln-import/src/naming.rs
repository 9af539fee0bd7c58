//! Output file naming
//!
//! Every asset file name is derived from a source name (node, material,
//! animation, source file) plus a per-kind suffix from [`KILN_ASSET_FORMAT`].

use hashbrown::HashSet;
use std::path::{Component, Path, PathBuf};

use kiln_common::KILN_ASSET_FORMAT;

use crate::foreign::{EmbeddedTexture, ForeignMaterial, TexturePayload};

/// Characters not allowed in file names on at least one supported platform
const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '?', '"', '<', '>', '|'];

/// Replace forbidden file-name characters with spaces
pub fn clear_forbidden(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { ' ' } else { c })
        .collect()
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. The filesystem is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let folded = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if folded {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Last component of a reference written in a source file. Both separators
/// are accepted since sources authored on Windows use backslashes.
pub fn base_file_name(reference: &str) -> &str {
    reference
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(reference)
}

/// Source file name without directory or extension
pub fn source_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Clip file stem: `.` and `|` become `_`; an empty name becomes `anim<index>`
pub fn animation_stem(name: &str, index: usize) -> String {
    if name.is_empty() {
        return format!("anim{}", index);
    }
    clear_forbidden(&name.replace(['.', '|'], "_"))
}

/// Material name: the declared one, or `emb<index>` when empty
pub fn material_name(declared: &str, index: usize) -> String {
    if declared.is_empty() {
        format!("emb{}", index)
    } else {
        declared.to_string()
    }
}

/// File name an embedded texture is extracted to
///
/// Raw pixel payloads are encoded to PNG and always get `.png`. Compressed
/// payloads use the declared format hint; without one the name is left bare.
pub fn embedded_texture_name(texture: &EmbeddedTexture) -> String {
    let normalized = normalize_path(Path::new(&texture.filename));
    let base = clear_forbidden(base_file_name(&normalized.to_string_lossy()));

    let ext = match &texture.payload {
        TexturePayload::Rgba8 { .. } => Some("png"),
        TexturePayload::Compressed(_) => texture.format_hint.as_deref(),
    };
    match ext {
        Some(ext) if has_extension(&base, ext) => base,
        Some(ext) => format!("{}.{}", base, ext),
        None => base,
    }
}

/// Material names for every slot of a scene, unique within it. Repeats get
/// `_1`, `_2`, ... appended.
pub fn material_names(materials: &[ForeignMaterial]) -> Vec<String> {
    let declared = materials
        .iter()
        .enumerate()
        .map(|(index, material)| material_name(&material.name, index));
    unique_names(declared, false)
}

/// Extraction file names for every embedded texture of a scene, unique
/// within it. Repeats get `_1`, `_2`, ... inserted before the extension.
pub fn embedded_texture_names(textures: &[EmbeddedTexture]) -> Vec<String> {
    unique_names(textures.iter().map(embedded_texture_name), true)
}

/// Suffix repeated names until each maps to its own file. Names compare
/// after forbidden characters are cleared and ASCII case is folded, which is
/// what collides on disk.
fn unique_names(names: impl Iterator<Item = String>, keep_extension: bool) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .map(|name| {
            let (stem, ext) = match name.rfind('.') {
                Some(dot) if keep_extension && dot > 0 => name.split_at(dot),
                _ => (name.as_str(), ""),
            };
            let mut candidate = name.clone();
            let mut suffix = 0;
            while !taken.insert(clear_forbidden(&candidate).to_ascii_lowercase()) {
                suffix += 1;
                candidate = format!("{}_{}{}", stem, suffix, ext);
            }
            candidate
        })
        .collect()
}

fn has_extension(name: &str, ext: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

pub fn animation_path(dest: &Path, stem: &str) -> PathBuf {
    dest.join(KILN_ASSET_FORMAT.file_name(stem, KILN_ASSET_FORMAT.animation_ext))
}

pub fn material_path(dest: &Path, name: &str) -> PathBuf {
    dest.join(KILN_ASSET_FORMAT.file_name(&clear_forbidden(name), KILN_ASSET_FORMAT.material_ext))
}

pub fn skeleton_path(dest: &Path, source: &Path) -> PathBuf {
    dest.join(KILN_ASSET_FORMAT.file_name(&source_stem(source), KILN_ASSET_FORMAT.skeleton_ext))
}

pub fn scene_path(dest: &Path, source: &Path) -> PathBuf {
    dest.join(KILN_ASSET_FORMAT.file_name(&source_stem(source), KILN_ASSET_FORMAT.scene_ext))
}

pub fn mesh_path(dest: &Path, node_name: &str, skinned: bool) -> PathBuf {
    dest.join(KILN_ASSET_FORMAT.file_name(
        &clear_forbidden(node_name),
        KILN_ASSET_FORMAT.mesh_ext_for(skinned),
    ))
}
