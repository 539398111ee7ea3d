use crate::error::IngestError;
use std::path::{Path, PathBuf};

/// Returns the path unchanged if it exists on disk.
///
/// The path is not canonicalized, so `source` metadata keeps the spelling the
/// caller used.
pub fn validate_path(path: impl AsRef<Path>) -> Result<PathBuf, IngestError> {
    let path = path.as_ref();
    match path.try_exists() {
        Ok(true) => Ok(path.to_path_buf()),
        Ok(false) => Err(IngestError::NotFound(path.to_path_buf())),
        Err(error) => Err(IngestError::Io(error)),
    }
}

/// Lowercase text after the last `.` of the final path segment, or `""`.
pub fn classify_extension(path: &Path) -> String {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return String::new(),
    };

    name.rsplit_once('.')
        .map(|(_, extension)| extension.to_lowercase())
        .unwrap_or_default()
}
