//! Synthetic master flats from batches of Bayer raw captures.
//!
//! Frames are identified against a [`CameraCatalog`], checked for consistent
//! camera, Bayer pattern and master flat metadata, split into their four color
//! planes, cleaned, stacked and interleaved back into one float mosaic.

pub mod batch;
pub mod bayer;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod mosaic;
pub mod output;
pub mod pipeline;
pub mod plane;
pub mod processing;
pub mod raw;

pub use batch::{BatchValidator, ConsistencyError, FieldMismatch, ValidatedBatch};
pub use bayer::{BayerPattern, Channel, PatternError};
pub use catalog::{CameraCatalog, CameraDescriptor, CatalogError, MissingFieldError};
pub use config::ProcessParams;
pub use error::{Error, Result};
pub use metadata::{Exiftool, FieldLocator, MetadataMapping, MetadataProvider, MetadataValue};
pub use mosaic::{ChannelKind, ChannelSet, MosaicError};
pub use output::write_master_flat;
pub use pipeline::{input_files, FlatGenerator, MasterFlat};
pub use plane::Plane;
pub use processing::{ChannelFilter, CombineMethod, StarRemoval};
pub use raw::{MosaicSource, Rawloader};
