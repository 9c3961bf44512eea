//! End-to-end master flat generation.
//!
//! A run lists the input files, reads their metadata in parallel, validates
//! the batch, splits every mosaic into its four color planes, removes stars,
//! stacks each channel over all frames and interleaves the result again.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::batch::BatchValidator;
use crate::bayer::BayerPattern;
use crate::catalog::CameraCatalog;
use crate::config::{has_extension, ProcessParams};
use crate::error::{Error, Result};
use crate::metadata::{MetadataMapping, MetadataProvider};
use crate::mosaic::{self, ChannelKind, ChannelSet, MosaicError};
use crate::plane::Plane;
use crate::processing::{gaussian_blur, stack};
use crate::raw::MosaicSource;

/// Result of a run, ready to be written with [`crate::output::write_master_flat`].
#[derive(Debug, Clone, PartialEq)]
pub struct MasterFlat {
    pub mosaic: Plane<f32>,
    pub pattern: BayerPattern,
    /// Label of the camera the batch was taken with.
    pub camera: String,
    /// Master flat metadata shared by every frame.
    pub metadata: MetadataMapping,
    pub frame_count: usize,
}

/// Files in `dir` whose extension is in `extensions`, sorted by path.
pub fn input_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(Error::NoInputFiles {
            dir: dir.to_path_buf(),
            extensions: extensions.to_vec(),
        });
    }

    files.sort();
    Ok(files)
}

pub struct FlatGenerator<'a> {
    catalog: &'a CameraCatalog,
    metadata: &'a dyn MetadataProvider,
    source: &'a dyn MosaicSource,
    params: &'a ProcessParams,
}

impl<'a> FlatGenerator<'a> {
    pub fn new(
        catalog: &'a CameraCatalog,
        metadata: &'a dyn MetadataProvider,
        source: &'a dyn MosaicSource,
        params: &'a ProcessParams,
    ) -> Self {
        Self {
            catalog,
            metadata,
            source,
            params,
        }
    }

    /// Runs on every matching file of `dir`.
    pub fn run_dir(&self, dir: &Path) -> Result<MasterFlat> {
        let files = input_files(dir, &self.params.input_extensions)?;
        self.run(&files)
    }

    /// Builds a master flat from `files`.
    ///
    /// Files are processed in path order so that the baseline frame does not
    /// depend on the order they were passed in.
    pub fn run(&self, files: &[PathBuf]) -> Result<MasterFlat> {
        self.params.validate()?;
        if files.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let mut files = files.to_vec();
        files.sort();

        log::info!("Reading metadata of {} files", files.len());
        let metadata = self.extract_metadata(&files)?;

        let mut validator = BatchValidator::new(self.catalog);
        for (path, frame_metadata) in files.iter().zip(&metadata) {
            validator = validator.add(path, frame_metadata)?;
        }
        let batch = validator.finish().ok_or(Error::EmptyBatch)?;
        let baseline = batch.baseline;
        log::info!(
            "Validated {} frames of {} ({})",
            batch.files.len(),
            baseline.camera,
            baseline.pattern
        );

        let filter = self.params.star_removal.filter();
        let mut frames: [Vec<Plane<f32>>; 4] = Default::default();
        let mut dimensions = None;

        for path in &batch.files {
            let mosaic = self.source.load(path).map_err(|err| Error::Raw {
                path: path.clone(),
                reason: format!("{err:#}"),
            })?;

            match dimensions {
                None => dimensions = Some(mosaic.dimensions()),
                Some(expected) if expected != mosaic.dimensions() => {
                    return Err(Error::DimensionMismatch {
                        path: path.clone(),
                        expected,
                        actual: mosaic.dimensions(),
                    });
                }
                Some(_) => {}
            }

            let channels =
                mosaic::extract(&mosaic, baseline.pattern).map_err(|source| Error::Mosaic {
                    path: path.clone(),
                    source,
                })?;
            drop(mosaic);

            let cleaned = channels
                .try_map(|channel, plane| {
                    filter.apply(plane).map_err(|err| FrameError::Filter {
                        channel,
                        reason: format!("{err:#}"),
                    })
                })
                .map_err(|err| err.at(path))?;

            for (channel_frames, plane) in frames.iter_mut().zip(cleaned.into_planes()) {
                channel_frames.push(plane);
            }
            log::debug!("Processed '{}'", path.display());
        }

        log::info!(
            "Combining {} frames per channel ({})",
            batch.files.len(),
            self.params.combine
        );
        let combine = self.params.combine;
        let smoothing = self.params.smoothing_sigma;
        let planes = frames.map(|channel_frames| {
            let stacked = stack(&channel_frames, combine);
            match smoothing {
                Some(sigma) => gaussian_blur(&stacked, sigma),
                None => stacked,
            }
        });

        let channels = ChannelSet::new(baseline.pattern, planes).map_err(|source| Error::Mosaic {
            path: baseline.file.clone(),
            source,
        })?;

        Ok(MasterFlat {
            mosaic: mosaic::combine(&channels),
            pattern: baseline.pattern,
            camera: baseline.camera,
            metadata: baseline.metadata,
            frame_count: batch.files.len(),
        })
    }

    /// At most `max_concurrent` extractions run at once. Results keep file
    /// order, and the first failing file in that order is reported.
    fn extract_metadata(&self, files: &[PathBuf]) -> Result<Vec<MetadataMapping>> {
        let mut metadata = Vec::with_capacity(files.len());

        for chunk in files.chunks(self.params.max_concurrent.max(1)) {
            let extracted: Vec<_> = chunk
                .par_iter()
                .map(|path| {
                    self.metadata.extract(path).map_err(|err| Error::Metadata {
                        path: path.clone(),
                        reason: format!("{err:#}"),
                    })
                })
                .collect();

            for result in extracted {
                metadata.push(result?);
            }
        }

        Ok(metadata)
    }
}

/// Failure while filtering one frame, before the frame path is attached.
enum FrameError {
    Filter { channel: ChannelKind, reason: String },
    Shape(MosaicError),
}

impl From<MosaicError> for FrameError {
    fn from(err: MosaicError) -> Self {
        FrameError::Shape(err)
    }
}

impl FrameError {
    fn at(self, path: &Path) -> Error {
        let path = path.to_path_buf();
        match self {
            FrameError::Filter { channel, reason } => Error::Processing {
                path,
                channel,
                reason,
            },
            FrameError::Shape(source) => Error::Mosaic { path, source },
        }
    }
}
