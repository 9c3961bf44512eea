//! On-disk shape of catalog entries.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{CameraDescriptor, CatalogError, IdentityPredicate};
use crate::metadata::{FieldLocator, MetadataValue};

#[derive(Debug, Deserialize)]
pub(super) struct CatalogEntry {
    pub camera: CameraEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct CameraEntry {
    exiftool_properties: Vec<PropertyGroup>,
    bayer_pattern: Vec<FieldLocator>,
    #[serde(default)]
    master_flat_metadata: Vec<FieldLocator>,
}

/// `group` plus one or more `key: expected value` pairs.
#[derive(Debug, Deserialize)]
struct PropertyGroup {
    group: String,
    #[serde(flatten)]
    properties: BTreeMap<String, MetadataValue>,
}

impl CameraEntry {
    pub fn into_descriptor(self, index: usize) -> Result<CameraDescriptor, CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidEntry {
            index,
            reason: reason.to_string(),
        };

        if self.exiftool_properties.is_empty() {
            return Err(invalid("exiftool_properties is empty"));
        }

        let mut identity = Vec::new();
        for group in self.exiftool_properties {
            if group.properties.is_empty() {
                return Err(CatalogError::InvalidEntry {
                    index,
                    reason: format!("property group '{}' has no keys", group.group),
                });
            }
            for (name, expected) in group.properties {
                identity.push(IdentityPredicate {
                    locator: FieldLocator::new(group.group.clone(), name),
                    expected,
                });
            }
        }

        let mut pattern_fields = self.bayer_pattern.into_iter();
        let pattern_field = match (pattern_fields.next(), pattern_fields.next()) {
            (Some(field), None) => field,
            (None, _) => return Err(invalid("bayer_pattern needs one locator")),
            (Some(_), Some(_)) => return Err(invalid("bayer_pattern has more than one locator")),
        };

        Ok(CameraDescriptor {
            identity,
            pattern_field,
            master_flat_fields: self.master_flat_metadata,
        })
    }
}
