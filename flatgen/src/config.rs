//! Processing parameters.
//!
//! ```yaml
//! input_extensions: [nef, NEF]
//! max_concurrent: 8
//! star_removal:
//!   method: median
//!   threshold: 3.0
//!   size: 5
//! smoothing_sigma: 2.0
//! combine: median
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::processing::{CombineMethod, StarRemoval};

/// Largest accepted `smoothing_sigma`, in plane pixels.
pub const MAX_SMOOTHING_SIGMA: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessParams {
    /// Compared case-insensitively, without the leading dot.
    pub input_extensions: Vec<String>,
    /// Upper bound on concurrent metadata extractions.
    pub max_concurrent: usize,
    pub star_removal: StarRemoval,
    /// Gaussian sigma applied to each combined channel.
    pub smoothing_sigma: Option<f32>,
    pub combine: CombineMethod,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            input_extensions: vec!["nef".to_string()],
            max_concurrent: 8,
            star_removal: StarRemoval::default(),
            smoothing_sigma: None,
            combine: CombineMethod::default(),
        }
    }
}

impl ProcessParams {
    /// Loads YAML or JSON parameters, chosen by the file extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let params: Self = common::read_file(path)?;
        params.validate()?;
        log::debug!("Loaded processing parameters from {}", path.display());
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_extensions.is_empty() {
            return Err(Error::InvalidParams(
                "input_extensions must not be empty".to_string(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(Error::InvalidParams(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if let Some(sigma) = self.smoothing_sigma {
            if !(sigma > 0.0 && sigma <= MAX_SMOOTHING_SIGMA) {
                return Err(Error::InvalidParams(format!(
                    "smoothing_sigma must be in (0, {MAX_SMOOTHING_SIGMA}], got {sigma}"
                )));
            }
        }
        self.star_removal.validate().map_err(Error::InvalidParams)
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        has_extension(path, &self.input_extensions)
    }
}

/// Case-insensitive extension test. A leading dot in `extensions` is ignored.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
}
