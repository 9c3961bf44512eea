//! Example: Create a synthetic master flat from a directory of raw flats
//!
//! Reads the camera catalog, identifies and validates every raw file in
//! `FLATGEN_INPUT_DIR`, and writes the master flat plus its YAML sidecar.
//!
//! # Environment
//!
//! ```text
//! FLATGEN_CATALOG     camera catalog YAML (required)
//! FLATGEN_INPUT_DIR   directory with the raw flats (required)
//! FLATGEN_PARAMS      processing parameters, YAML or JSON (optional)
//! FLATGEN_OUTPUT      output TIFF (default test_output/master_flat.tif)
//! ```
//!
//! # Usage
//!
//! ```bash
//! FLATGEN_CATALOG=cameras.yaml FLATGEN_INPUT_DIR=/path/to/flats \
//!     cargo run --release --example create_master_flat
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use flatgen::{write_master_flat, CameraCatalog, Exiftool, FlatGenerator, ProcessParams, Rawloader};

fn env_path(name: &str) -> Result<PathBuf> {
    env::var(name)
        .map(PathBuf::from)
        .with_context(|| format!("{name} environment variable must be set"))
}

fn main() -> Result<()> {
    common::setup_logging("info");

    let catalog_path = env_path("FLATGEN_CATALOG")?;
    let input_dir = env_path("FLATGEN_INPUT_DIR")?;
    let output = env::var("FLATGEN_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("test_output/master_flat.tif"));

    let params = match env::var("FLATGEN_PARAMS") {
        Ok(path) => ProcessParams::from_file(&PathBuf::from(path))?,
        Err(_) => ProcessParams::default(),
    };

    let catalog = CameraCatalog::from_yaml_file(&catalog_path)?;

    let exiftool = Exiftool::new();
    if !exiftool.is_available() {
        anyhow::bail!("exiftool was not found on PATH");
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let start = Instant::now();
    let generator = FlatGenerator::new(&catalog, &exiftool, &Rawloader, &params);
    let flat = generator.run_dir(&input_dir)?;
    let sidecar = write_master_flat(&flat, &output)?;

    log::info!(
        "Master flat for {} from {} frames written to {} ({}) in {:.1}s",
        flat.camera,
        flat.frame_count,
        output.display(),
        sidecar.display(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
