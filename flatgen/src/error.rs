//! Crate-level error type for a flat generation run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::batch::ConsistencyError;
use crate::bayer::PatternError;
use crate::catalog::{CatalogError, MissingFieldError};
use crate::metadata::FieldLocator;
use crate::mosaic::{ChannelKind, MosaicError};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a flat generation run. None of them are retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No input files with extensions {extensions:?} in '{dir}'")]
    NoInputFiles {
        dir: PathBuf,
        extensions: Vec<String>,
    },

    #[error("No input files to process")]
    EmptyBatch,

    #[error("No camera in the catalog matches '{path}'")]
    NotFound { path: PathBuf },

    #[error("Bayer pattern field {field} of camera '{camera}' is missing from '{path}'")]
    MissingPattern {
        path: PathBuf,
        camera: String,
        field: FieldLocator,
    },

    #[error("Invalid Bayer pattern in '{path}': {source}")]
    Pattern {
        path: PathBuf,
        #[source]
        source: PatternError,
    },

    #[error("'{path}': {source}")]
    MissingField {
        path: PathBuf,
        #[source]
        source: MissingFieldError,
    },

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("Failed to read metadata of '{path}': {reason}")]
    Metadata { path: PathBuf, reason: String },

    #[error("Failed to load raw file '{path}': {reason}")]
    Raw { path: PathBuf, reason: String },

    #[error("Dimension mismatch for '{path}': expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        path: PathBuf,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Failed to split '{path}' into channels: {source}")]
    Mosaic {
        path: PathBuf,
        #[source]
        source: MosaicError,
    },

    #[error("Processing {channel} channel of '{path}' failed: {reason}")]
    Processing {
        path: PathBuf,
        channel: ChannelKind,
        reason: String,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] common::FileFormatError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TIFF error on '{path}': {source}")]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Unsupported TIFF '{path}': {format}")]
    UnsupportedTiff { path: PathBuf, format: String },

    #[error("Invalid processing parameters: {0}")]
    InvalidParams(String),
}
