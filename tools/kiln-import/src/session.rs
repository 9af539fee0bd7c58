//! Import session and file ledger
//!
//! [`ImportSession`] carries the per-file state every stage reads and
//! writes: destination, current source, used files, the imported skeleton,
//! the material slot table and the entity id counter. [`begin_file`] resets
//! all of it so nothing leaks from one source into the next.
//!
//! The [`Ledger`] lives for the whole batch and collects every file each
//! session produced or referenced.
//!
//! [`begin_file`]: ImportSession::begin_file

use anyhow::{Context, Result};
use hashbrown::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_common::EntityId;

use crate::naming::normalize_path;
use crate::skeleton::ImportedSkeleton;

#[derive(Debug)]
pub struct ImportSession {
    dest: PathBuf,
    source: PathBuf,
    used: HashSet<PathBuf>,
    used_order: Vec<PathBuf>,
    skeleton: Option<Arc<ImportedSkeleton>>,
    /// Foreign material slot -> material file name
    materials: Vec<String>,
    next_entity_id: EntityId,
}

impl ImportSession {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            source: PathBuf::new(),
            used: HashSet::new(),
            used_order: Vec::new(),
            skeleton: None,
            materials: Vec::new(),
            next_entity_id: 1,
        }
    }

    /// Start importing `source`, dropping everything recorded for the
    /// previous file
    pub fn begin_file(&mut self, source: impl Into<PathBuf>) {
        self.source = source.into();
        self.used.clear();
        self.used_order.clear();
        self.skeleton = None;
        self.materials.clear();
        self.next_entity_id = 1;
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Directory the current source lives in
    pub fn source_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Record a produced or referenced file. Returns `false` if it was
    /// already recorded for this file.
    pub fn record_used(&mut self, path: &Path) -> bool {
        let path = normalize_path(path);
        if self.used.contains(&path) {
            return false;
        }
        self.used.insert(path.clone());
        self.used_order.push(path);
        true
    }

    pub fn is_used(&self, path: &Path) -> bool {
        self.used.contains(&normalize_path(path))
    }

    /// Used files in the order they were first recorded
    pub fn used_files(&self) -> &[PathBuf] {
        &self.used_order
    }

    pub fn skeleton(&self) -> Option<&Arc<ImportedSkeleton>> {
        self.skeleton.as_ref()
    }

    pub fn set_skeleton(&mut self, skeleton: ImportedSkeleton) -> Arc<ImportedSkeleton> {
        let shared = Arc::new(skeleton);
        self.skeleton = Some(Arc::clone(&shared));
        shared
    }

    pub fn set_materials(&mut self, materials: Vec<String>) {
        self.materials = materials;
    }

    /// Material file name for a foreign material slot
    pub fn material(&self, slot: usize) -> Option<&str> {
        self.materials.get(slot).map(String::as_str)
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }
}

/// Ordered, de-duplicated list of every file a batch produced or used
#[derive(Debug, Default)]
pub struct Ledger {
    seen: HashSet<PathBuf>,
    entries: Vec<PathBuf>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<'a>(&mut self, paths: impl IntoIterator<Item = &'a PathBuf>) {
        for path in paths {
            if self.seen.insert(path.clone()) {
                self.entries.push(path.clone());
            }
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write one path per line
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create ledger: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for entry in &self.entries {
            writeln!(writer, "{}", entry.display())?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write ledger: {}", path.display()))
    }
}
