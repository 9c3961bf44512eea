//! Star removal delegated to an external program.
//!
//! The plane is written as a 32-bit float TIFF into a scratch directory, the
//! program is run with `{input}` and `{output}` replaced by the two file
//! paths, and the output file is read back.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use super::ChannelFilter;
use crate::output::{read_tiff, write_tiff};
use crate::plane::Plane;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTool {
    executable: PathBuf,
    args: Vec<String>,
}

impl ExternalTool {
    /// Empty `args` means `{input} {output}`.
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        let args = if args.is_empty() {
            vec![INPUT_PLACEHOLDER.to_string(), OUTPUT_PLACEHOLDER.to_string()]
        } else {
            args
        };
        Self {
            executable: executable.into(),
            args,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

impl ChannelFilter for ExternalTool {
    fn apply(&self, plane: Plane<f32>) -> Result<Plane<f32>> {
        let scratch = tempfile::Builder::new()
            .prefix("flatgen-")
            .tempdir()
            .context("Failed to create scratch directory")?;
        let input = scratch.path().join("channel.tif");
        let output = scratch.path().join("channel_out.tif");

        write_tiff(&plane, &input)?;

        let args = self.command_args(&input, &output);
        log::debug!("Running {} {}", self.executable.display(), args.join(" "));

        let result = Command::new(&self.executable)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run '{}'", self.executable.display()))?;

        if !result.status.success() {
            bail!(
                "'{}' exited with {}: {}",
                self.executable.display(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        if !stderr.trim().is_empty() {
            log::warn!("{}: {}", self.executable.display(), stderr.trim());
        }

        let processed = read_tiff(&output).with_context(|| {
            format!(
                "'{}' did not produce a readable output",
                self.executable.display()
            )
        })?;

        if processed.dimensions() != plane.dimensions() {
            bail!(
                "'{}' changed the plane size from {:?} to {:?}",
                self.executable.display(),
                plane.dimensions(),
                processed.dimensions()
            );
        }

        Ok(processed)
    }
}
