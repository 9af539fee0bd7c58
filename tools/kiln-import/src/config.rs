//! kiln-import.toml configuration
//!
//! ```toml
//! [import]
//! destination = "assets"   # created if absent
//! scale = 1.0              # uniform scale applied while decoding
//! ledger = "out.txt"       # relative paths resolve against the cwd
//! ```
//!
//! Every field is optional. Command-line flags override the file, which
//! overrides the defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default ledger file name
pub const DEFAULT_LEDGER: &str = "out.txt";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "kiln-import.toml";

#[derive(Debug, Default, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub import: ImportSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportSection {
    pub destination: Option<PathBuf>,
    pub scale: Option<f32>,
    pub ledger: Option<PathBuf>,
}

impl ImportConfig {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Parse config from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse kiln-import.toml")
    }

    /// Load an explicit config, or the default file if it exists
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(scale) = self.import.scale {
            if !scale.is_finite() || scale <= 0.0 {
                anyhow::bail!("Invalid scale {} in config (must be positive)", scale);
            }
        }
        Ok(())
    }
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub destination: Option<PathBuf>,
    pub scale: Option<f32>,
    pub ledger: Option<PathBuf>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub destination: PathBuf,
    pub scale: f32,
    pub ledger: PathBuf,
}

impl Settings {
    /// CLI > config > defaults
    pub fn resolve(config: &ImportConfig, overrides: Overrides) -> Self {
        let section = &config.import;
        Self {
            destination: overrides
                .destination
                .or_else(|| section.destination.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            scale: overrides.scale.or(section.scale).unwrap_or(1.0),
            ledger: overrides
                .ledger
                .or_else(|| section.ledger.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER)),
        }
    }
}
