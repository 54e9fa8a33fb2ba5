// File utilities for the transcribe gateway
//
// This module contains the filesystem helpers used around the engine: unique
// scratch directories for engine output, folder cleanup, and the scoped
// temporary file that holds an upload while it is transcribed.

use log::{debug, error};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Prefix of staged upload files
pub const UPLOAD_PREFIX: &str = "upload_";

/// Create a fresh directory named by a UUID under `base_dir`
///
/// # Errors
///
/// Returns an IO error if directory creation fails
pub fn create_unique_dir(base_dir: &Path) -> io::Result<PathBuf> {
    let folder = base_dir.join(Uuid::new_v4().to_string());
    fs::create_dir_all(&folder)?;
    Ok(folder)
}

/// Clean up a folder and its contents
///
/// This function logs errors but doesn't return them to the caller
pub fn cleanup_folder(folder_path: &Path) {
    if let Err(e) = fs::remove_dir_all(folder_path) {
        error!("Failed to clean up folder {}: {}", folder_path.display(), e);
    } else {
        debug!("Cleaned up folder: {}", folder_path.display());
    }
}

/// Uploaded audio staged on disk for the duration of one request
///
/// The file is removed when this value is dropped, whatever the exit path.
/// `remove` does the same explicitly and logs a failed deletion.
#[derive(Debug)]
pub struct UploadedAudio {
    file: NamedTempFile,
    size: usize,
}

impl UploadedAudio {
    /// Create an empty staging file in `dir` ending with `suffix`
    pub fn create(dir: &Path, suffix: &str) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(UPLOAD_PREFIX)
            .suffix(suffix)
            .tempfile_in(dir)?;
        Ok(Self { file, size: 0 })
    }

    /// Append bytes to the staged file
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.as_file_mut().write_all(data)?;
        self.size += data.len();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Bytes written so far
    pub fn size(&self) -> usize {
        self.size
    }

    /// Delete the staged file now
    pub fn remove(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            error!("Failed to remove staged upload {}: {}", path.display(), e);
        } else {
            debug!("Removed staged upload: {}", path.display());
        }
    }
}
