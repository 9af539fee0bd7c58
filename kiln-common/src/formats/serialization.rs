//! Document serialization trait for asset files.
//!
//! All Kiln asset documents implement `AssetDocument`. A document is written as
//! pretty-printed JSON inside an envelope that names its kind and version:
//!
//! ```text
//! { "kind": "mesh", "version": 1, "asset": { ... } }
//! ```
//!
//! Readers reject envelopes of another kind or a newer version.
//!
//! # Example
//!
//! ```
//! use kiln_common::{AssetDocument, MaterialAsset};
//!
//! let material = MaterialAsset::new("Skin");
//! let mut bytes = Vec::new();
//! material.write_to(&mut bytes).unwrap();
//! let parsed = MaterialAsset::read_from(bytes.as_slice()).unwrap();
//! assert_eq!(parsed, material);
//! ```

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Current document version written by this crate.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    kind: &'a str,
    version: u32,
    asset: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    kind: String,
    version: u32,
    asset: T,
}

/// Trait for asset documents persisted by the importer.
pub trait AssetDocument: Serialize + DeserializeOwned {
    /// Kind tag stored in the envelope.
    const KIND: &'static str;

    /// Serialize the document (with envelope) to a writer.
    fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let envelope = EnvelopeRef {
            kind: Self::KIND,
            version: DOCUMENT_VERSION,
            asset: self,
        };
        serde_json::to_writer_pretty(writer, &envelope)
            .with_context(|| format!("Failed to serialize {} document", Self::KIND))
    }

    /// Deserialize a document from a reader, validating kind and version.
    fn read_from<R: Read>(reader: R) -> Result<Self> {
        let envelope: Envelope<Self> = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse {} document", Self::KIND))?;
        if envelope.kind != Self::KIND {
            bail!(
                "Document kind mismatch: expected '{}', found '{}'",
                Self::KIND,
                envelope.kind
            );
        }
        if envelope.version > DOCUMENT_VERSION {
            bail!(
                "Unsupported {} document version {} (max {})",
                Self::KIND,
                envelope.version,
                DOCUMENT_VERSION
            );
        }
        Ok(envelope.asset)
    }

    /// Create (or truncate) `path` and write the document to it.
    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer
            .flush()
            .with_context(|| format!("Failed to write output: {}", path.display()))
    }

    /// Load a document from `path`.
    fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        Self::read_from(BufReader::new(file))
            .with_context(|| format!("Failed to load: {}", path.display()))
    }
}
