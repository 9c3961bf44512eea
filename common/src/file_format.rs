//! Config file format detection and loading.
//!
//! Parameter files may be written as YAML or JSON; the extension decides
//! which parser is used.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum FileFormatError {
    #[error("Failed to get file extension of '{}'", .0.display())]
    MissingFileExtension(PathBuf),
    #[error("Unsupported file extension for file: '{}'", .0.display())]
    UnsupportedFileExtension(PathBuf),
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parsing failed")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON parsing failed")]
    Json(#[from] serde_json::Error),
}

pub type FileFormatResult<T> = Result<T, FileFormatError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> FileFormatResult<Self> {
        let ext = path
            .extension()
            .and_then(|os_str| os_str.to_str())
            .ok_or_else(|| FileFormatError::MissingFileExtension(path.to_path_buf()))?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(FileFormatError::UnsupportedFileExtension(
                path.to_path_buf(),
            ))
        }
    }
}

pub fn deserialize<T: DeserializeOwned>(text: &str, format: FileFormat) -> FileFormatResult<T> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::from_str(text)?),
        FileFormat::Json => Ok(serde_json::from_str(text)?),
    }
}

pub fn serialize<T: Serialize>(value: &T, format: FileFormat) -> FileFormatResult<String> {
    let mut text = match format {
        FileFormat::Yaml => serde_yml::to_string(value)?,
        FileFormat::Json => serde_json::to_string_pretty(value)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Reads and parses a file, picking the format from its extension.
pub fn read_file<T: DeserializeOwned>(path: &Path) -> FileFormatResult<T> {
    let format = FileFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| FileFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    deserialize(&text, format)
}
