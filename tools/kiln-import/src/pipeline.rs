//! Batch driver
//!
//! Imports one source file or every file listed in a `.txt` batch list, in
//! order. Each file runs the full stage sequence:
//!
//! ```text
//! animations -> embedded textures -> materials -> skeleton -> meshes & scene
//! ```
//!
//! The first fatal error aborts the batch. Files already written stay on
//! disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::animation::import_animations;
use crate::config::Settings;
use crate::foreign::{DecodeOptions, ForeignScene, load_scene};
use crate::material::import_materials;
use crate::scene::import_scene_and_meshes;
use crate::session::{ImportSession, Ledger};
use crate::skeleton::import_skeleton;
use crate::texture::extract_embedded_textures;

/// Batch-wide import settings
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub destination: PathBuf,
    pub scale: f32,
}

impl From<&Settings> for ImportOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            destination: settings.destination.clone(),
            scale: settings.scale,
        }
    }
}

fn is_batch_list(input: &Path) -> bool {
    input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

/// Source files named by `input`: the file itself, or the entries of a
/// `.txt` list (one path per line, blank lines ignored)
pub fn collect_sources(input: &Path) -> Result<Vec<PathBuf>> {
    if !is_batch_list(input) {
        return Ok(vec![input.to_path_buf()]);
    }

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read batch list: {}", input.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Run every stage over an already decoded scene. The session must have
/// been started for the scene's source with [`ImportSession::begin_file`].
pub fn import_foreign_scene(scene: &ForeignScene, session: &mut ImportSession) -> Result<()> {
    import_animations(scene, session)?;
    extract_embedded_textures(scene, session)?;
    import_materials(scene, session)?;
    import_skeleton(scene, session)?;
    import_scene_and_meshes(scene, session)?;
    Ok(())
}

/// Decode and import one source file
pub fn import_file(
    source: &Path,
    session: &mut ImportSession,
    decode: &DecodeOptions,
) -> Result<()> {
    session.begin_file(source);
    tracing::info!("Importing {}", source.display());

    let scene = load_scene(source, decode)?;
    import_foreign_scene(&scene, session)?;

    tracing::info!(
        "Imported {}: {} files",
        source.display(),
        session.used_files().len()
    );
    Ok(())
}

/// Import every source named by `input`; returns the batch ledger
pub fn import_batch(input: &Path, options: &ImportOptions) -> Result<Ledger> {
    fs::create_dir_all(&options.destination).with_context(|| {
        format!(
            "Failed to create destination: {}",
            options.destination.display()
        )
    })?;

    let sources = collect_sources(input)?;
    let decode = DecodeOptions {
        scale: options.scale,
    };

    let mut session = ImportSession::new(&options.destination);
    let mut ledger = Ledger::new();
    for source in &sources {
        import_file(source, &mut session, &decode)
            .with_context(|| format!("Failed to import {}", source.display()))?;
        ledger.extend(session.used_files());
    }

    tracing::info!("Imported {} source files", sources.len());
    Ok(ledger)
}

/// Import a batch and write its ledger
pub fn run(input: &Path, settings: &Settings) -> Result<Ledger> {
    let ledger = import_batch(input, &ImportOptions::from(settings))?;
    ledger.write(&settings.ledger)?;
    tracing::info!(
        "Wrote {} entries to {}",
        ledger.len(),
        settings.ledger.display()
    );
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_source() {
        let sources = collect_sources(Path::new("models/hero.glb")).unwrap();
        assert_eq!(sources, vec![PathBuf::from("models/hero.glb")]);
    }

    #[test]
    fn test_batch_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("batch.txt");
        fs::write(&list, "a.gltf\n\n  b.obj  \r\nc.glb").unwrap();

        let sources = collect_sources(&list).unwrap();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("a.gltf"),
                PathBuf::from("b.obj"),
                PathBuf::from("c.glb")
            ]
        );
    }

    #[test]
    fn test_missing_source_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let options = ImportOptions {
            destination: dir.path().join("out"),
            scale: 1.0,
        };
        let err = import_batch(&dir.path().join("nope.gltf"), &options).unwrap_err();
        assert!(format!("{:#}", err).contains("nope.gltf"));
        assert!(dir.path().join("out").is_dir());
    }
}
