//! Writing the master flat and reading float planes back.
//!
//! The mosaic is stored as a single-channel 32-bit float TIFF. Next to it a
//! YAML sidecar (`<file>.yaml`) records the camera, the Bayer pattern and the
//! master flat metadata the batch was validated against.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;

use crate::bayer::BayerPattern;
use crate::error::{Error, Result};
use crate::metadata::MetadataMapping;
use crate::pipeline::MasterFlat;
use crate::plane::Plane;

/// Contents of the YAML file written next to a master flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatSidecar {
    pub camera: String,
    pub pattern: BayerPattern,
    pub width: usize,
    pub height: usize,
    pub frame_count: usize,
    pub master_flat_metadata: MetadataMapping,
}

impl FlatSidecar {
    pub fn from_flat(flat: &MasterFlat) -> Self {
        Self {
            camera: flat.camera.clone(),
            pattern: flat.pattern,
            width: flat.mosaic.width(),
            height: flat.mosaic.height(),
            frame_count: flat.frame_count,
            master_flat_metadata: flat.metadata.clone(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        Ok(common::read_file(path)?)
    }
}

/// `flat.tif` -> `flat.tif.yaml`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".yaml");
    PathBuf::from(name)
}

/// Writes the mosaic to `path` and its sidecar next to it. Returns the sidecar path.
pub fn write_master_flat(flat: &MasterFlat, path: &Path) -> Result<PathBuf> {
    write_tiff(&flat.mosaic, path)?;

    let sidecar = sidecar_path(path);
    let yaml = common::serialize(&FlatSidecar::from_flat(flat), common::FileFormat::Yaml)?;
    std::fs::write(&sidecar, yaml).map_err(|source| Error::Io {
        path: sidecar.clone(),
        source,
    })?;

    log::info!(
        "Wrote master flat '{}' ({}x{}, {} frames)",
        path.display(),
        flat.mosaic.width(),
        flat.mosaic.height(),
        flat.frame_count
    );
    Ok(sidecar)
}

/// Writes `plane` as a single-channel 32-bit float TIFF.
pub fn write_tiff(plane: &Plane<f32>, path: &Path) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let tiff_err = |source| Error::Tiff {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    {
        let mut encoder = TiffEncoder::new(&mut writer).map_err(tiff_err)?;
        encoder
            .write_image::<colortype::Gray32Float>(
                plane.width() as u32,
                plane.height() as u32,
                plane.pixels(),
            )
            .map_err(tiff_err)?;
    }
    writer.flush().map_err(io_err)
}

/// Reads a single-channel TIFF as `f32`. 16-bit integer samples are widened.
pub fn read_tiff(path: &Path) -> Result<Plane<f32>> {
    let tiff_err = |source| Error::Tiff {
        path: path.to_path_buf(),
        source,
    };
    let unsupported = |format: String| Error::UnsupportedTiff {
        path: path.to_path_buf(),
        format,
    };

    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(tiff_err)?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;
    let (width, height) = (width as usize, height as usize);
    let color = decoder.colortype().map_err(tiff_err)?;

    let pixels: Vec<f32> = match (color, decoder.read_image().map_err(tiff_err)?) {
        (ColorType::Gray(32), DecodingResult::F32(buf)) => buf,
        (ColorType::Gray(16), DecodingResult::U16(buf)) => buf.into_iter().map(f32::from).collect(),
        (color, _) => return Err(unsupported(format!("{color:?}"))),
    };

    if pixels.len() != width * height {
        return Err(unsupported(format!(
            "{} samples for {width}x{height}",
            pixels.len()
        )));
    }

    Ok(Plane::new(width, height, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> MasterFlat {
        let mut metadata = MetadataMapping::new();
        metadata.insert("MakerNotes:WhiteBalance", "Auto");
        metadata.insert("EXIF:ISO", 200_i64);

        MasterFlat {
            mosaic: Plane::from_fn(6, 4, |x, y| 0.5 + x as f32 * 0.01 + y as f32 * 0.1),
            pattern: BayerPattern::RGGB,
            camera: "NIKON CORPORATION NIKON D5600".to_string(),
            metadata,
            frame_count: 3,
        }
    }

    #[test]
    fn sidecar_path_appends_extension() {
        assert_eq!(
            sidecar_path(Path::new("/out/flat.tif")),
            PathBuf::from("/out/flat.tif.yaml")
        );
    }

    #[test]
    fn tiff_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.tif");
        let plane = Plane::from_fn(5, 3, |x, y| x as f32 - y as f32 * 0.25);

        write_tiff(&plane, &path).unwrap();
        assert_eq!(read_tiff(&path).unwrap(), plane);
    }

    #[test]
    fn reads_16_bit_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("u16.tif");
        {
            let mut file = File::create(&path).unwrap();
            let mut encoder = TiffEncoder::new(&mut file).unwrap();
            encoder
                .write_image::<colortype::Gray16>(2, 2, &[0u16, 1, 1000, 65535])
                .unwrap();
        }

        let plane = read_tiff(&path).unwrap();
        assert_eq!(plane.pixels(), &[0.0, 1.0, 1000.0, 65535.0]);
    }

    #[test]
    fn rejects_color_tiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.tif");
        {
            let mut file = File::create(&path).unwrap();
            let mut encoder = TiffEncoder::new(&mut file).unwrap();
            encoder
                .write_image::<colortype::RGB8>(1, 1, &[1u8, 2, 3])
                .unwrap();
        }

        let err = read_tiff(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTiff { .. }), "{err}");
    }

    #[test]
    fn missing_tiff_is_io_error() {
        let err = read_tiff(Path::new("/nonexistent/flat.tif")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn writes_flat_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master_flat.tif");
        let flat = flat();

        let sidecar = write_master_flat(&flat, &path).unwrap();

        assert_eq!(read_tiff(&path).unwrap(), flat.mosaic);
        let written = FlatSidecar::read(&sidecar).unwrap();
        assert_eq!(written, FlatSidecar::from_flat(&flat));
        assert_eq!(written.width, 6);
        assert_eq!(written.height, 4);
        assert_eq!(written.pattern, BayerPattern::RGGB);

        let text = std::fs::read_to_string(&sidecar).unwrap();
        assert!(text.contains("pattern: RGGB"), "{text}");
        assert!(text.contains("WhiteBalance"), "{text}");
    }
}
