//! On-disk form of a [`Manifest`] as written by the command line tool.
//!
//! The reconciler itself never reads or writes this file.

use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the manifest file the command line tool keeps in the scanned
/// directory unless told otherwise.
pub const MANIFEST_FILENAME: &str = ".treediff";

#[derive(Debug, thiserror::Error)]
pub enum ManifestFileError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Unsupported manifest file version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Metadata {
    version: u32,
}

/// Only the metadata table; everything else is ignored so the version can be
/// checked before the body is parsed.
#[derive(Debug, Deserialize)]
struct MetadataOnly {
    metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestFile {
    metadata: Metadata,
    pub root: Manifest,
}

fn map_io_error(path: &Path, e: std::io::Error) -> ManifestFileError {
    if e.kind() == ErrorKind::PermissionDenied {
        ManifestFileError::PermissionDenied(path.to_path_buf())
    } else {
        ManifestFileError::Io(e)
    }
}

impl ManifestFile {
    const SUPPORTED_VERSION: u32 = 1;

    pub fn new(root: Manifest) -> Self {
        ManifestFile {
            metadata: Metadata {
                version: Self::SUPPORTED_VERSION,
            },
            root,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ManifestFileError> {
        // A newer version may well fail to parse as the current layout, so
        // look at the version alone first to give a useful error.
        let metadata_only: MetadataOnly = toml::from_str(content)?;

        if metadata_only.metadata.version != Self::SUPPORTED_VERSION {
            return Err(ManifestFileError::UnsupportedVersion(
                metadata_only.metadata.version,
            ));
        }

        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ManifestFileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| map_io_error(path, e))?;

        Self::from_toml(&content)
    }

    /// Like [`ManifestFile::load`], but a missing file is `Ok(None)`.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>, ManifestFileError> {
        match Self::load(path) {
            Ok(file) => Ok(Some(file)),
            Err(ManifestFileError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes to a temporary file next to `path`, fsyncs it, then renames it
    /// into place.
    pub fn save(&self, path: &Path) -> Result<(), ManifestFileError> {
        use std::io::Write;

        let content = self.to_toml()?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| map_io_error(parent, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| map_io_error(path, e))?;

        temp_file
            .as_file()
            .sync_all()
            .map_err(ManifestFileError::Io)?;

        temp_file
            .persist(path)
            .map_err(|e| map_io_error(path, e.error))?;

        Ok(())
    }
}
