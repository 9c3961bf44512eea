//! Raw mosaic loading.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::plane::Plane;

/// Supplies the undemosaiced sensor mosaic of a capture.
pub trait MosaicSource: Sync {
    fn load(&self, path: &Path) -> Result<Plane<f32>>;
}

/// Decodes camera raw files with `rawloader`.
///
/// Sample values are kept as recorded: no black level subtraction, white level
/// scaling or demosaicing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rawloader;

impl MosaicSource for Rawloader {
    fn load(&self, path: &Path) -> Result<Plane<f32>> {
        let raw_image = rawloader::decode_file(path)
            .with_context(|| format!("rawloader: Failed to decode: {}", path.display()))?;

        if raw_image.cpp != 1 {
            bail!(
                "{} has {} components per pixel, expected an undemosaiced mosaic",
                path.display(),
                raw_image.cpp
            );
        }

        let width = raw_image.width;
        let height = raw_image.height;
        if width % 2 != 0 || height % 2 != 0 {
            bail!(
                "{} has odd mosaic dimensions {width}x{height}",
                path.display()
            );
        }

        let pixels: Vec<f32> = match raw_image.data {
            rawloader::RawImageData::Integer(data) => data.into_iter().map(f32::from).collect(),
            rawloader::RawImageData::Float(data) => data,
        };

        if pixels.len() != width * height {
            bail!(
                "{} holds {} samples, expected {}",
                path.display(),
                pixels.len(),
                width * height
            );
        }

        log::debug!(
            "Loaded {}x{} mosaic from {} ({} {})",
            width,
            height,
            path.display(),
            raw_image.clean_make,
            raw_image.clean_model
        );

        Ok(Plane::new(width, height, pixels))
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::path::PathBuf;

    use super::*;

    fn raw_dir() -> Option<PathBuf> {
        match env::var("FLATGEN_RAW_DIR") {
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => {
                eprintln!("FLATGEN_RAW_DIR not set, skipping test");
                None
            }
        }
    }

    #[test]
    fn missing_file_fails_with_path() {
        let err = Rawloader
            .load(Path::new("/nonexistent/frame_0001.nef"))
            .unwrap_err();
        assert!(err.to_string().contains("frame_0001.nef"));
    }

    #[test]
    fn non_raw_file_fails() {
        let file = tempfile::Builder::new().suffix(".nef").tempfile().unwrap();
        std::fs::write(file.path(), b"not a raw file").unwrap();
        assert!(Rawloader.load(file.path()).is_err());
    }

    #[test]
    #[cfg_attr(not(feature = "real-data"), ignore)]
    fn loads_real_raw_files() {
        let Some(dir) = raw_dir() else {
            return;
        };

        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if !path.is_file() {
                continue;
            }
            let mosaic = Rawloader.load(&path).unwrap();
            assert_eq!(mosaic.width() % 2, 0);
            assert_eq!(mosaic.height() % 2, 0);
            assert!(mosaic.iter().any(|&v| v > 0.0));
        }
    }
}
