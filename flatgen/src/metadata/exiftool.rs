//! Metadata extraction through the `exiftool` command.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use super::{MetadataMapping, MetadataProvider, MetadataValue};

/// Runs `exiftool -G -s -a -u -json <file>` and flattens the first record.
///
/// `-G` prefixes every tag with its group, which yields the `group:key`
/// shape the camera catalog is written against.
#[derive(Debug, Clone)]
pub struct Exiftool {
    executable: PathBuf,
}

impl Default for Exiftool {
    fn default() -> Self {
        Self::new()
    }
}

impl Exiftool {
    const ARGS: [&'static str; 5] = ["-G", "-s", "-a", "-u", "-json"];

    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("exiftool"),
        }
    }

    /// Use a specific exiftool binary instead of the one on `PATH`.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = path.into();
        self
    }

    /// Check if the configured exiftool can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("-ver")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Parses exiftool's JSON output: an array with one object per file.
    pub fn parse_output(json: &str) -> Result<MetadataMapping> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(json).context("exiftool output is not a JSON array of objects")?;

        let Some(record) = records.into_iter().next() else {
            bail!("exiftool returned no metadata records");
        };

        Ok(record
            .into_iter()
            .map(|(key, value)| (key, MetadataValue::from_json(value)))
            .collect())
    }
}

impl MetadataProvider for Exiftool {
    fn extract(&self, path: &Path) -> Result<MetadataMapping> {
        let output = Command::new(&self.executable)
            .args(Self::ARGS)
            .arg(path)
            .output()
            .with_context(|| format!("Failed to run '{}'", self.executable.display()))?;

        if !output.status.success() {
            bail!(
                "exiftool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mapping = Self::parse_output(&stdout)?;
        log::debug!(
            "exiftool: {} fields from '{}'",
            mapping.len(),
            path.display()
        );
        Ok(mapping)
    }
}
