//! Example: Report which metadata fields vary across a set of raw files
//!
//! Useful when writing the `master_flat_metadata` list of a camera catalog
//! entry: fields that stay fixed across a flat session are candidates, fields
//! that vary (exposure, timestamps) are not.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example analyze_metadata -- /path/to/flats [report.json]
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use flatgen::metadata::analysis;
use flatgen::{input_files, Exiftool, MetadataProvider, ProcessParams};

fn main() -> Result<()> {
    common::setup_logging("info");

    let args: Vec<String> = env::args().collect();
    let input_dir = args
        .get(1)
        .map(PathBuf::from)
        .context("Usage: analyze_metadata <input_dir> [report.json]")?;

    let params = ProcessParams::default();
    let files = input_files(&input_dir, &params.input_extensions)?;

    let exiftool = Exiftool::new();
    let mappings = files
        .iter()
        .map(|path| exiftool.extract(path))
        .collect::<Result<Vec<_>>>()?;

    let report = analysis::analyze(&mappings);
    for row in report.summarize() {
        println!("{:<48} {:>4}  {}", row.field, row.distinct_values_count, row.display);
    }

    if let Some(json_path) = args.get(2) {
        std::fs::write(json_path, report.to_json()?)
            .with_context(|| format!("Failed to write {json_path}"))?;
        log::info!("Report written to {json_path}");
    }

    Ok(())
}
