//! kiln-import - Kiln scene import tool
//!
//! Converts glTF/GLB/OBJ scenes into Kiln asset documents (.mesh, .skinMesh,
//! .material, .skeleton, .anim, .scene) and writes a ledger of every file
//! produced or referenced.
//!
//! ```bash
//! # Single file
//! kiln-import models/hero.glb -t assets
//!
//! # Batch list, one source per line
//! kiln-import sources.txt -t assets -s 0.01
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use kiln_import::config::{ImportConfig, Overrides, Settings};
use kiln_import::pipeline;

/// Exit status of a failed batch
const EXIT_FAILURE: i32 = -1;

#[derive(Parser)]
#[command(name = "kiln-import")]
#[command(about = "Kiln scene import tool")]
#[command(version)]
struct Cli {
    /// Source scene (.gltf, .glb, .obj) or a .txt list of sources
    input: PathBuf,

    /// Destination directory (created if absent)
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Uniform scale applied while decoding
    #[arg(short, long)]
    scale: Option<f32>,

    /// Config file (default: kiln-import.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ledger output path (default: out.txt)
    #[arg(long)]
    ledger: Option<PathBuf>,
}

fn execute(cli: Cli) -> Result<()> {
    let config = ImportConfig::discover(cli.config.as_deref())?;
    config.validate()?;

    let settings = Settings::resolve(
        &config,
        Overrides {
            destination: cli.target,
            scale: cli.scale,
            ledger: cli.ledger,
        },
    );
    if !settings.scale.is_finite() || settings.scale <= 0.0 {
        anyhow::bail!("Invalid scale {} (must be positive)", settings.scale);
    }

    tracing::info!(
        "Importing {:?} -> {:?} (scale {})",
        cli.input,
        settings.destination,
        settings.scale
    );
    pipeline::run(&cli.input, &settings)?;
    tracing::info!("Import success");
    Ok(())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli) {
        tracing::error!("Import failed: {:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}
