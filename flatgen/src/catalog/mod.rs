//! Camera catalog and descriptor resolution.
//!
//! The catalog is an ordered list of camera descriptors loaded from YAML.
//! A descriptor says how to recognize a camera from its metadata, where that
//! camera stores its Bayer pattern, and which fields must agree across every
//! frame of a master flat.
//!
//! ```yaml
//! - camera:
//!     exiftool_properties:
//!       - group: EXIF
//!         Make: NIKON CORPORATION
//!       - group: EXIF
//!         Model: NIKON D5600
//!     bayer_pattern:
//!       - group: EXIF
//!         name: CFAPattern
//!     master_flat_metadata:
//!       - group: EXIF
//!         name: CFAPattern
//!       - group: MakerNotes
//!         name: WhiteBalance
//! ```
//!
//! The catalog is a plain value: build one per run and pass it to whoever
//! resolves metadata.

mod schema;
#[cfg(test)]
mod tests;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metadata::{FieldLocator, MetadataMapping, MetadataValue};

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read camera catalog '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse camera catalog: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Invalid camera catalog entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Strict extraction found declared fields absent from the metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing master flat metadata fields: {}", format_locators(.missing))]
pub struct MissingFieldError {
    /// Every declared locator that was absent, in declaration order.
    pub missing: Vec<FieldLocator>,
}

fn format_locators(locators: &[FieldLocator]) -> String {
    locators
        .iter()
        .map(FieldLocator::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One `group:key == value` identity condition.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityPredicate {
    pub locator: FieldLocator,
    pub expected: MetadataValue,
}

impl IdentityPredicate {
    #[inline]
    pub fn matches(&self, metadata: &MetadataMapping) -> bool {
        metadata.get_field(&self.locator) == Some(&self.expected)
    }
}

/// Immutable catalog entry for one camera model.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraDescriptor {
    pub identity: Vec<IdentityPredicate>,
    pub pattern_field: FieldLocator,
    pub master_flat_fields: Vec<FieldLocator>,
}

impl CameraDescriptor {
    /// A descriptor matches when every identity predicate holds exactly.
    pub fn matches(&self, metadata: &MetadataMapping) -> bool {
        self.identity.iter().all(|p| p.matches(metadata))
    }

    /// Human-readable name built from the identity values, e.g.
    /// `NIKON CORPORATION NIKON D5600`.
    pub fn label(&self) -> String {
        self.identity
            .iter()
            .map(|p| p.expected.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CameraDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordered list of camera descriptors; earlier entries win ties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraCatalog {
    cameras: Vec<CameraDescriptor>,
}

impl CameraCatalog {
    pub fn new(cameras: Vec<CameraDescriptor>) -> Self {
        Self { cameras }
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_yaml(&yaml)?;
        log::info!(
            "Loaded camera catalog '{}' with {} cameras",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let entries: Vec<schema::CatalogEntry> = serde_yml::from_str(yaml)?;
        let cameras = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.camera.into_descriptor(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { cameras })
    }

    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.cameras
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// First descriptor, in declaration order, whose identity predicates all hold.
    ///
    /// `None` is an ordinary outcome here; callers decide whether it is fatal.
    pub fn resolve(&self, metadata: &MetadataMapping) -> Option<&CameraDescriptor> {
        self.resolve_index(metadata).map(|idx| &self.cameras[idx])
    }

    /// Like [`resolve`](Self::resolve), returning the descriptor's position.
    pub fn resolve_index(&self, metadata: &MetadataMapping) -> Option<usize> {
        self.cameras.iter().position(|c| c.matches(metadata))
    }

    /// Raw pattern value of the resolved camera, not yet normalized.
    ///
    /// `None` when no camera matches or when the matched camera's pattern
    /// field is absent from `metadata`.
    pub fn bayer_pattern<'m>(&self, metadata: &'m MetadataMapping) -> Option<&'m MetadataValue> {
        let camera = self.resolve(metadata)?;
        metadata.get_field(&camera.pattern_field)
    }

    /// Values of the resolved camera's declared master flat fields.
    ///
    /// With `strict`, every declared field must be present; otherwise the
    /// present subset is returned. An unmatched camera yields an empty mapping.
    pub fn master_flat_fields(
        &self,
        metadata: &MetadataMapping,
        strict: bool,
    ) -> Result<MetadataMapping, MissingFieldError> {
        let Some(camera) = self.resolve(metadata) else {
            return Ok(MetadataMapping::new());
        };
        extract_fields(camera, metadata, strict)
    }
}

/// Collects `camera`'s master flat fields from `metadata`.
pub(crate) fn extract_fields(
    camera: &CameraDescriptor,
    metadata: &MetadataMapping,
    strict: bool,
) -> Result<MetadataMapping, MissingFieldError> {
    let mut fields = MetadataMapping::new();
    let mut missing = Vec::new();

    for locator in &camera.master_flat_fields {
        match metadata.get_field(locator) {
            Some(value) => fields.insert(locator.key(), value.clone()),
            None => missing.push(locator.clone()),
        }
    }

    if !missing.is_empty() {
        if strict {
            return Err(MissingFieldError { missing });
        }
        log::debug!(
            "{}: absent master flat fields {}",
            camera,
            format_locators(&missing)
        );
    }

    Ok(fields)
}
