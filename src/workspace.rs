//! Per-request scratch directories.
//!
//! Every analysis request gets its own directory, named with a fresh UUID,
//! and writes all of its temporary files (the download and the encoded
//! frames) inside it. Concurrent requests therefore never share a file name.
//! The directory is a [`TempDir`]: dropping the workspace removes it and its
//! contents, including on early returns and panics, and [`close`] does the
//! same eagerly while logging instead of failing.
//!
//! [`close`]: RequestWorkspace::close

use std::path::Path;

use tempfile::TempDir;
use uuid::Uuid;

use crate::error::ClipsightError;

/// Scratch directory owned by a single request.
#[derive(Debug)]
pub struct RequestWorkspace {
    id: Uuid,
    directory: TempDir,
}

impl RequestWorkspace {
    /// Create a workspace under `root`, or under the system temporary
    /// directory when `root` is `None`.
    pub fn create(root: Option<&Path>) -> Result<Self, ClipsightError> {
        let id = Uuid::new_v4();
        let prefix = format!("clipsight-{id}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let directory = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        log::debug!("Created workspace {}", directory.path().display());
        Ok(Self { id, directory })
    }

    /// Identifier of the request this workspace belongs to.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path of the workspace directory.
    pub fn path(&self) -> &Path {
        self.directory.path()
    }

    /// Remove the workspace and everything in it.
    ///
    /// Failures (for example a file already gone) are logged and swallowed.
    pub fn close(self) {
        let path = self.directory.path().to_path_buf();
        match self.directory.close() {
            Ok(()) => log::debug!("Removed workspace {}", path.display()),
            Err(error) => log::warn!("Failed to remove workspace {}: {error}", path.display()),
        }
    }
}
