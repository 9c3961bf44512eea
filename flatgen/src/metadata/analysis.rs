//! Metadata variability across a set of files.
//!
//! Used to decide which fields are stable enough to be declared as
//! master flat metadata for a camera.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{MetadataMapping, MetadataValue};

/// Distinct values observed for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldVariability {
    pub distinct_values_count: usize,
    /// Number of files carrying the field.
    pub occurrences: usize,
    /// Distinct values in first-seen order.
    pub values: Vec<MetadataValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataReport {
    pub file_count: usize,
    pub fields: BTreeMap<String, FieldVariability>,
}

/// One line of the human-readable summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub field: String,
    pub distinct_values_count: usize,
    pub display: String,
}

pub fn analyze(mappings: &[MetadataMapping]) -> MetadataReport {
    let mut fields: BTreeMap<String, FieldVariability> = BTreeMap::new();

    for mapping in mappings {
        for (key, value) in mapping {
            let entry = fields.entry(key.clone()).or_insert_with(|| FieldVariability {
                distinct_values_count: 0,
                occurrences: 0,
                values: Vec::new(),
            });
            entry.occurrences += 1;
            if !entry.values.contains(value) {
                entry.values.push(value.clone());
                entry.distinct_values_count += 1;
            }
        }
    }

    MetadataReport {
        file_count: mappings.len(),
        fields,
    }
}

impl MetadataReport {
    pub fn field(&self, key: &str) -> Option<&FieldVariability> {
        self.fields.get(key)
    }

    /// Fields present in every file with a single value.
    pub fn stable_fields(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.fields
            .iter()
            .filter(|(_, v)| v.distinct_values_count == 1 && v.occurrences == self.file_count)
            .map(|(k, v)| (k.as_str(), &v.values[0]))
    }

    /// Fields with more than one value, or missing from some files.
    pub fn variable_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, v)| v.distinct_values_count > 1 || v.occurrences < self.file_count)
            .map(|(k, _)| k.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Sorted rows; fields with several values display as `multiple`.
    pub fn summarize(&self) -> Vec<SummaryRow> {
        self.fields
            .iter()
            .map(|(field, v)| SummaryRow {
                field: field.clone(),
                distinct_values_count: v.distinct_values_count,
                display: if v.distinct_values_count > 1 {
                    "multiple".to_string()
                } else {
                    v.values[0].to_string()
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> Vec<MetadataMapping> {
        vec![
            [
                ("EXIF:Model", MetadataValue::from("NIKON D5600")),
                ("EXIF:ISO", MetadataValue::from(200_i64)),
                ("EXIF:ExposureTime", MetadataValue::from("1/50")),
            ]
            .into_iter()
            .collect(),
            [
                ("EXIF:Model", MetadataValue::from("NIKON D5600")),
                ("EXIF:ISO", MetadataValue::from(200_i64)),
                ("EXIF:ExposureTime", MetadataValue::from("1/60")),
                ("MakerNotes:ShutterCount", MetadataValue::from(1041_i64)),
            ]
            .into_iter()
            .collect(),
            [
                ("EXIF:Model", MetadataValue::from("NIKON D5600")),
                ("EXIF:ISO", MetadataValue::from(200_i64)),
                ("EXIF:ExposureTime", MetadataValue::from("1/50")),
            ]
            .into_iter()
            .collect(),
        ]
    }

    #[test]
    fn counts_distinct_values_per_field() {
        let report = analyze(&frames());

        assert_eq!(report.file_count, 3);
        let exposure = report.field("EXIF:ExposureTime").unwrap();
        assert_eq!(exposure.distinct_values_count, 2);
        assert_eq!(exposure.occurrences, 3);
        assert_eq!(
            exposure.values,
            vec![MetadataValue::from("1/50"), MetadataValue::from("1/60")]
        );
        assert_eq!(report.field("EXIF:ISO").unwrap().distinct_values_count, 1);
    }

    #[test]
    fn stable_and_variable_fields() {
        let report = analyze(&frames());

        let stable: Vec<_> = report.stable_fields().map(|(k, _)| k).collect();
        assert_eq!(stable, vec!["EXIF:ISO", "EXIF:Model"]);

        let variable: Vec<_> = report.variable_fields().collect();
        assert_eq!(variable, vec!["EXIF:ExposureTime", "MakerNotes:ShutterCount"]);
    }

    #[test]
    fn summary_rows_are_sorted_and_collapse_multiple_values() {
        let rows = analyze(&frames()).summarize();

        let fields: Vec<_> = rows.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "EXIF:ExposureTime",
                "EXIF:ISO",
                "EXIF:Model",
                "MakerNotes:ShutterCount"
            ]
        );
        assert_eq!(rows[0].display, "multiple");
        assert_eq!(rows[1].display, "200");
        assert_eq!(rows[2].display, "NIKON D5600");
    }

    #[test]
    fn report_serializes_to_json() {
        let json = analyze(&frames()).to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["file_count"], 3);
        assert_eq!(parsed["fields"]["EXIF:ISO"]["values"][0], 200);
    }

    #[test]
    fn empty_input_gives_empty_report() {
        let report = analyze(&[]);
        assert_eq!(report.file_count, 0);
        assert!(report.fields.is_empty());
        assert!(report.summarize().is_empty());
    }
}
