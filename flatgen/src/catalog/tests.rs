use std::io::Write;
use std::path::Path;

use super::*;

const NIKON_AND_CANON: &str = "
- camera:
    exiftool_properties:
      - group: EXIF
        Make: NIKON CORPORATION
      - group: EXIF
        Model: NIKON D5600
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
    master_flat_metadata:
      - group: EXIF
        name: CFAPattern
      - group: MakerNotes
        name: WhiteBalance
- camera:
    exiftool_properties:
      - group: EXIF
        Make: CANON
      - group: EXIF
        Model: EOS 80D
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
    master_flat_metadata:
      - group: EXIF
        name: CFAPattern
      - group: MakerNotes
        name: WhiteBalance
";

fn catalog() -> CameraCatalog {
    CameraCatalog::from_yaml(NIKON_AND_CANON).unwrap()
}

fn mapping(pairs: &[(&str, &str)]) -> MetadataMapping {
    pairs.iter().map(|&(k, v)| (k, v)).collect()
}

fn nikon_frame() -> MetadataMapping {
    mapping(&[
        ("EXIF:Make", "NIKON CORPORATION"),
        ("EXIF:Model", "NIKON D5600"),
        ("EXIF:CFAPattern", "RGGB"),
        ("MakerNotes:WhiteBalance", "Auto"),
        ("OTHER_GROUP_0:UNRELATED_0", "OTHER_VALUE_0"),
        ("OTHER_GROUP_1:UNRELATED_1", "OTHER_VALUE_1"),
    ])
}

fn canon_frame() -> MetadataMapping {
    mapping(&[
        ("EXIF:Make", "CANON"),
        ("EXIF:Model", "EOS 80D"),
        ("EXIF:CFAPattern", "BGGR"),
        ("MakerNotes:WhiteBalance", "Manual"),
        ("OTHER_GROUP_0:UNRELATED_0", "OTHER_VALUE_0"),
    ])
}

// ===== Loading =====

#[test]
fn loads_entries_in_order() {
    let catalog = catalog();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.cameras()[0].label(), "NIKON CORPORATION NIKON D5600");
    assert_eq!(catalog.cameras()[1].label(), "CANON EOS 80D");
    assert_eq!(
        catalog.cameras()[0].pattern_field,
        FieldLocator::new("EXIF", "CFAPattern")
    );
    assert_eq!(
        catalog.cameras()[1].master_flat_fields,
        vec![
            FieldLocator::new("EXIF", "CFAPattern"),
            FieldLocator::new("MakerNotes", "WhiteBalance"),
        ]
    );
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(NIKON_AND_CANON.as_bytes()).unwrap();

    let catalog = CameraCatalog::from_yaml_file(file.path()).unwrap();
    assert_eq!(catalog, self::catalog());
}

#[test]
fn missing_file_is_io_error() {
    let err = CameraCatalog::from_yaml_file(Path::new("nonexistent.yaml")).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
    assert!(err.to_string().contains("nonexistent.yaml"));
}

#[test]
fn master_flat_metadata_defaults_to_empty() {
    let catalog = CameraCatalog::from_yaml(
        "
- camera:
    exiftool_properties:
      - group: EXIF
        Make: SONY
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
",
    )
    .unwrap();
    assert!(catalog.cameras()[0].master_flat_fields.is_empty());
}

#[test]
fn numeric_identity_values_keep_their_type() {
    let catalog = CameraCatalog::from_yaml(
        "
- camera:
    exiftool_properties:
      - group: EXIF
        ImageWidth: 6000
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
",
    )
    .unwrap();

    let mut frame = MetadataMapping::new();
    frame.insert("EXIF:ImageWidth", 6000_i64);
    assert!(catalog.resolve(&frame).is_some());

    frame.insert("EXIF:ImageWidth", "6000");
    assert!(catalog.resolve(&frame).is_none());
}

#[test]
fn rejects_entries_without_single_pattern_locator() {
    let none = "
- camera:
    exiftool_properties:
      - group: EXIF
        Make: SONY
    bayer_pattern: []
";
    let two = "
- camera:
    exiftool_properties:
      - group: EXIF
        Make: SONY
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
      - group: MakerNotes
        name: CFAPattern
";
    for yaml in [none, two] {
        let err = CameraCatalog::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidEntry { index: 0, .. }), "{err}");
    }
}

#[test]
fn rejects_empty_identity() {
    let yaml = "
- camera:
    exiftool_properties: []
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
";
    let err = CameraCatalog::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidEntry { .. }));

    let yaml = "
- camera:
    exiftool_properties:
      - group: EXIF
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
";
    let err = CameraCatalog::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("'EXIF' has no keys"));
}

#[test]
fn rejects_malformed_yaml() {
    let err = CameraCatalog::from_yaml("- camera: [").unwrap_err();
    assert!(matches!(err, CatalogError::Yaml(_)));

    let err = CameraCatalog::from_yaml("- camera:\n    bayer_pattern: []\n").unwrap_err();
    assert!(matches!(err, CatalogError::Yaml(_)));
}

// ===== Resolution =====

#[test]
fn resolves_each_camera() {
    let catalog = catalog();

    assert_eq!(catalog.resolve_index(&nikon_frame()), Some(0));
    assert_eq!(catalog.resolve_index(&canon_frame()), Some(1));
    assert_eq!(
        catalog.resolve(&canon_frame()).unwrap().label(),
        "CANON EOS 80D"
    );
}

#[test]
fn resolve_returns_none_on_mismatch() {
    let catalog = catalog();
    let cases = [
        mapping(&[
            ("EXIF:Make", "CANON"),
            ("EXIF:Model", "NOT DEFINED MODEL"),
            ("EXIF:CFAPattern", "RGGB"),
            ("MakerNotes:WhiteBalance", "Auto"),
        ]),
        mapping(&[
            ("EXIF:Make", "SONY"),
            ("EXIF:Model", "NOT DEFINED MODEL"),
            ("EXIF:CFAPattern", "BGGR"),
        ]),
        mapping(&[
            ("EXIF:Make", "NIKON CORPORATION"),
            ("EXIF:Model", "NOT DEFINED MODEL"),
        ]),
        mapping(&[
            ("EXIF:Make", "NOT DEFINED MAKE"),
            ("EXIF:Model", "NIKON D5600"),
        ]),
        mapping(&[
            ("NOT_DEFINED_GROUP:Make", "NIKON CORPORATION"),
            ("EXIF:Model", "NIKON D5600"),
        ]),
        mapping(&[
            ("EXIF:Make", "NIKON CORPORATION"),
            ("EXIF:NOT_DEFINED_KEY", "NIKON D5600"),
        ]),
        MetadataMapping::new(),
    ];

    for frame in &cases {
        assert!(catalog.resolve(frame).is_none(), "{frame:?}");
    }
}

#[test]
fn first_match_wins() {
    let yaml = "
- camera:
    exiftool_properties:
      - group: EXIF
        Make: NIKON CORPORATION
    bayer_pattern:
      - group: EXIF
        name: CFAPattern
- camera:
    exiftool_properties:
      - group: EXIF
        Make: NIKON CORPORATION
      - group: EXIF
        Model: NIKON D5600
    bayer_pattern:
      - group: MakerNotes
        name: CFAPattern
";
    let catalog = CameraCatalog::from_yaml(yaml).unwrap();
    assert_eq!(catalog.resolve_index(&nikon_frame()), Some(0));
}

#[test]
fn identity_values_are_case_sensitive() {
    let frame = mapping(&[("EXIF:Make", "nikon corporation"), ("EXIF:Model", "NIKON D5600")]);
    assert!(catalog().resolve(&frame).is_none());
}

// ===== Pattern and master flat fields =====

#[test]
fn bayer_pattern_of_resolved_camera() {
    let catalog = catalog();

    assert_eq!(
        catalog.bayer_pattern(&nikon_frame()),
        Some(&MetadataValue::from("RGGB"))
    );
    assert_eq!(
        catalog.bayer_pattern(&canon_frame()),
        Some(&MetadataValue::from("BGGR"))
    );
}

#[test]
fn bayer_pattern_absent_or_unmatched() {
    let catalog = catalog();

    let frame = mapping(&[("EXIF:Make", "CANON"), ("EXIF:Model", "EOS 80D")]);
    assert_eq!(catalog.bayer_pattern(&frame), None);

    let frame = mapping(&[("EXIF:Make", "SONY"), ("EXIF:CFAPattern", "RGGB")]);
    assert_eq!(catalog.bayer_pattern(&frame), None);
}

#[test]
fn master_flat_fields_of_each_camera() {
    let catalog = catalog();

    let nikon = catalog.master_flat_fields(&nikon_frame(), true).unwrap();
    assert_eq!(
        nikon,
        mapping(&[("EXIF:CFAPattern", "RGGB"), ("MakerNotes:WhiteBalance", "Auto")])
    );

    let canon = catalog.master_flat_fields(&canon_frame(), true).unwrap();
    assert_eq!(
        canon,
        mapping(&[("EXIF:CFAPattern", "BGGR"), ("MakerNotes:WhiteBalance", "Manual")])
    );
}

#[test]
fn strict_extraction_lists_every_missing_field() {
    let frame = mapping(&[("EXIF:Make", "CANON"), ("EXIF:Model", "EOS 80D")]);

    let err = catalog().master_flat_fields(&frame, true).unwrap_err();
    assert_eq!(
        err.missing,
        vec![
            FieldLocator::new("EXIF", "CFAPattern"),
            FieldLocator::new("MakerNotes", "WhiteBalance"),
        ]
    );
    assert_eq!(
        err.to_string(),
        "Missing master flat metadata fields: EXIF:CFAPattern, MakerNotes:WhiteBalance"
    );
}

#[test]
fn lenient_extraction_returns_present_subset() {
    let frame = mapping(&[
        ("EXIF:Make", "CANON"),
        ("EXIF:Model", "EOS 80D"),
        ("MakerNotes:WhiteBalance", "Manual"),
    ]);

    let fields = catalog().master_flat_fields(&frame, false).unwrap();
    assert_eq!(fields, mapping(&[("MakerNotes:WhiteBalance", "Manual")]));
}

#[test]
fn unmatched_camera_has_no_master_flat_fields() {
    let frame = mapping(&[("EXIF:Make", "SONY")]);
    assert!(catalog().master_flat_fields(&frame, true).unwrap().is_empty());
}
