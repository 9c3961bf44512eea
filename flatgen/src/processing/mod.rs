//! Per-channel processing applied between extraction and recombination.
//!
//! Star removal is chosen by configuration ([`StarRemoval`]) and turned into a
//! [`ChannelFilter`] once per run. Every filter takes ownership of a plane and
//! returns the processed plane with the same dimensions.

pub mod external;
pub mod filters;
pub mod stack;
pub mod star_removal;


use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use external::ExternalTool;
pub use filters::{gaussian_blur, median_filter};
pub use stack::{stack, CombineMethod};
pub use star_removal::{MedianRemoval, NoRemoval};

use crate::plane::Plane;

/// A transformation of one color plane.
pub trait ChannelFilter: Send + Sync {
    fn apply(&self, plane: Plane<f32>) -> anyhow::Result<Plane<f32>>;
}

fn default_threshold() -> f32 {
    3.0
}

fn default_size() -> usize {
    5
}

/// Largest accepted median window side.
pub const MAX_MEDIAN_SIZE: usize = 255;

/// Star removal method, as written in the processing parameters.
///
/// ```yaml
/// star_removal:
///   method: median
///   threshold: 3.0
///   size: 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase", deny_unknown_fields)]
pub enum StarRemoval {
    #[default]
    None,
    Median {
        #[serde(default = "default_threshold")]
        threshold: f32,
        #[serde(default = "default_size", alias = "median_filter_size")]
        size: usize,
    },
    External {
        #[serde(alias = "starnet_executable_path")]
        executable: PathBuf,
        /// `{input}` and `{output}` are replaced by the scratch file paths.
        #[serde(default)]
        args: Vec<String>,
    },
}

impl StarRemoval {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StarRemoval::None => Ok(()),
            StarRemoval::Median { threshold, size } => {
                if !(threshold.is_finite() && *threshold > 0.0) {
                    return Err(format!("median threshold must be positive, got {threshold}"));
                }
                if size % 2 == 0 {
                    return Err(format!("median filter size must be odd, got {size}"));
                }
                if *size > MAX_MEDIAN_SIZE {
                    return Err(format!(
                        "median filter size must be at most {MAX_MEDIAN_SIZE}, got {size}"
                    ));
                }
                Ok(())
            }
            StarRemoval::External { executable, .. } => {
                if executable.as_os_str().is_empty() {
                    return Err("external star removal needs an executable".to_string());
                }
                Ok(())
            }
        }
    }

    pub fn filter(&self) -> Box<dyn ChannelFilter> {
        match self {
            StarRemoval::None => Box::new(NoRemoval),
            StarRemoval::Median { threshold, size } => Box::new(MedianRemoval {
                threshold: *threshold,
                size: *size,
            }),
            StarRemoval::External { executable, args } => {
                Box::new(ExternalTool::new(executable.clone(), args.clone()))
            }
        }
    }
}
