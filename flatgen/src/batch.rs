//! Batch consistency validation.
//!
//! The first file of a batch sets the baseline: its camera, its normalized
//! Bayer pattern and its master flat metadata. Every later file must agree
//! with that baseline exactly. A disagreement is terminal for the batch, so
//! [`BatchValidator::add`] consumes the validator and only hands it back on
//! success.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::bayer::BayerPattern;
use crate::catalog::{extract_fields, CameraCatalog};
use crate::error::{Error, Result};
use crate::metadata::{MetadataMapping, MetadataValue};

/// One master flat field whose value differs from the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMismatch {
    pub field: String,
    pub expected: MetadataValue,
    /// `None` when the field is absent from the offending file.
    pub found: Option<MetadataValue>,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(found) => write!(
                f,
                "{}: expected '{}', found '{}'",
                self.field, self.expected, found
            ),
            None => write!(f, "{}: expected '{}', found nothing", self.field, self.expected),
        }
    }
}

/// A file that disagrees with the batch baseline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("'{file}' was taken with '{found}', but baseline '{baseline_file}' with '{expected}'")]
    Camera {
        file: PathBuf,
        baseline_file: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Bayer pattern of '{file}' is {found}, but baseline '{baseline_file}' has {expected}")]
    Pattern {
        file: PathBuf,
        baseline_file: PathBuf,
        expected: BayerPattern,
        found: BayerPattern,
    },

    #[error(
        "Master flat metadata of '{file}' differs from baseline '{baseline_file}': {}",
        format_mismatches(.mismatches)
    )]
    Metadata {
        file: PathBuf,
        baseline_file: PathBuf,
        mismatches: Vec<FieldMismatch>,
    },
}

fn format_mismatches(mismatches: &[FieldMismatch]) -> String {
    mismatches
        .iter()
        .map(FieldMismatch::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every field of `expected` whose value in `found` differs or is absent.
///
/// Fields present only in `found` are ignored.
pub fn diff_fields(expected: &MetadataMapping, found: &MetadataMapping) -> Vec<FieldMismatch> {
    expected
        .iter()
        .filter_map(|(field, expected_value)| {
            let found_value = found.get(field);
            (found_value != Some(expected_value)).then(|| FieldMismatch {
                field: field.clone(),
                expected: expected_value.clone(),
                found: found_value.cloned(),
            })
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum BatchState {
    Empty,
    Established,
}

/// Reference values every file of the batch is checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub file: PathBuf,
    /// Position of the camera in the catalog.
    pub camera_index: usize,
    pub camera: String,
    pub pattern: BayerPattern,
    pub metadata: MetadataMapping,
}

/// Outcome of a fully validated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    pub baseline: Baseline,
    /// Accepted files in the order they were added.
    pub files: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct BatchValidator<'c> {
    catalog: &'c CameraCatalog,
    baseline: Option<Baseline>,
    files: Vec<PathBuf>,
}

impl<'c> BatchValidator<'c> {
    pub fn new(catalog: &'c CameraCatalog) -> Self {
        Self {
            catalog,
            baseline: None,
            files: Vec::new(),
        }
    }

    pub fn state(&self) -> BatchState {
        match self.baseline {
            None => BatchState::Empty,
            Some(_) => BatchState::Established,
        }
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Folds one file into the batch.
    ///
    /// The file's camera must resolve, its pattern field must be present and
    /// parse, and every declared master flat field must be present. The first
    /// accepted file becomes the baseline; later files are checked against it
    /// for camera, master flat metadata and pattern, in that order. All
    /// differing metadata fields are reported together.
    pub fn add(mut self, file: &Path, metadata: &MetadataMapping) -> Result<Self> {
        let catalog = self.catalog;
        let camera_index = catalog
            .resolve_index(metadata)
            .ok_or_else(|| Error::NotFound {
                path: file.to_path_buf(),
            })?;
        let camera = &catalog.cameras()[camera_index];

        let raw_pattern =
            metadata
                .get_field(&camera.pattern_field)
                .ok_or_else(|| Error::MissingPattern {
                    path: file.to_path_buf(),
                    camera: camera.label(),
                    field: camera.pattern_field.clone(),
                })?;
        let pattern =
            BayerPattern::parse(&raw_pattern.to_string()).map_err(|source| Error::Pattern {
                path: file.to_path_buf(),
                source,
            })?;

        let fields = extract_fields(camera, metadata, true).map_err(|source| {
            Error::MissingField {
                path: file.to_path_buf(),
                source,
            }
        })?;

        match &self.baseline {
            None => {
                log::info!(
                    "Batch baseline '{}': {}, pattern {}, {} master flat fields",
                    file.display(),
                    camera,
                    pattern,
                    fields.len()
                );
                self.baseline = Some(Baseline {
                    file: file.to_path_buf(),
                    camera_index,
                    camera: camera.label(),
                    pattern,
                    metadata: fields,
                });
            }
            Some(baseline) => {
                check_against(baseline, file, camera_index, &camera.label(), pattern, &fields)?;
                log::debug!("'{}' is consistent with the batch", file.display());
            }
        }

        self.files.push(file.to_path_buf());
        Ok(self)
    }

    /// `None` when no file was added.
    pub fn finish(self) -> Option<ValidatedBatch> {
        let baseline = self.baseline?;
        Some(ValidatedBatch {
            baseline,
            files: self.files,
        })
    }
}

fn check_against(
    baseline: &Baseline,
    file: &Path,
    camera_index: usize,
    camera: &str,
    pattern: BayerPattern,
    fields: &MetadataMapping,
) -> std::result::Result<(), ConsistencyError> {
    if camera_index != baseline.camera_index {
        return Err(ConsistencyError::Camera {
            file: file.to_path_buf(),
            baseline_file: baseline.file.clone(),
            expected: baseline.camera.clone(),
            found: camera.to_string(),
        });
    }

    let mismatches = diff_fields(&baseline.metadata, fields);
    if !mismatches.is_empty() {
        return Err(ConsistencyError::Metadata {
            file: file.to_path_buf(),
            baseline_file: baseline.file.clone(),
            mismatches,
        });
    }

    if pattern != baseline.pattern {
        return Err(ConsistencyError::Pattern {
            file: file.to_path_buf(),
            baseline_file: baseline.file.clone(),
            expected: baseline.pattern,
            found: pattern,
        });
    }

    Ok(())
}
