use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("File modified during checksumming: {0}")]
    ConcurrentModification(PathBuf),
}

/// CRC-32 of a file's content.
///
/// Displayed and serialized as lowercase hex without zero padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(pub u32);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid fingerprint {0:?}: expected up to 8 hex digits")]
pub struct ParseFingerprintError(String);

impl TryFrom<String> for Fingerprint {
    type Error = ParseFingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || value.len() > 8 {
            return Err(ParseFingerprintError(value));
        }
        u32::from_str_radix(&value, 16)
            .map(Fingerprint)
            .map_err(|_| ParseFingerprintError(value))
    }
}

fn map_open_error(path: &Path, e: std::io::Error) -> ChecksumError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ChecksumError::PermissionDenied(path.to_path_buf())
    } else {
        ChecksumError::Io(e)
    }
}

/// Computes the CRC-32 fingerprint of a file.
///
/// # Behavior
/// - Records the file's modification time before reading
/// - Reads the file in chunks through the hasher
/// - Verifies the modification time hasn't changed after reading
///
/// # Errors
/// - `ChecksumError::Io`: File doesn't exist (for example it vanished after
///   the directory was listed) or other I/O errors
/// - `ChecksumError::PermissionDenied`: Insufficient permissions to read the file
/// - `ChecksumError::ConcurrentModification`: File was detected as being modified
///   while checksumming. The absence of this error is *not* a guarantee that the
///   file was not modified.
pub fn checksum_file(path: &Path) -> Result<Fingerprint, ChecksumError> {
    checksum_with(path, |p| File::open(p))
}

/// [`checksum_file`] with the content read through whatever `open` returns.
fn checksum_with<R, F>(path: &Path, open: F) -> Result<Fingerprint, ChecksumError>
where
    R: Read,
    F: FnOnce(&Path) -> std::io::Result<R>,
{
    info!("Checksumming {}", path.display());

    let metadata_before = std::fs::metadata(path).map_err(|e| map_open_error(path, e))?;
    let mtime_before = metadata_before.modified().map_err(ChecksumError::Io)?;

    let mut reader = open(path).map_err(|e| map_open_error(path, e))?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(ChecksumError::Io)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    drop(reader);

    let metadata_after = std::fs::metadata(path).map_err(ChecksumError::Io)?;
    let mtime_after = metadata_after.modified().map_err(ChecksumError::Io)?;

    if mtime_before != mtime_after {
        return Err(ChecksumError::ConcurrentModification(path.to_path_buf()));
    }

    let fingerprint = Fingerprint(hasher.finalize());

    debug!("Checksum of {} is {}", path.display(), fingerprint);

    Ok(fingerprint)
}
