//! Bounded streaming download.
//!
//! [`Fetcher`] issues a single GET, refuses responses whose declared
//! `Content-Length` is over the cap before touching the body, and then
//! streams the body to disk chunk by chunk while counting bytes, so a server
//! that omits or understates the length is cut off as soon as it passes the
//! cap. Nothing is retried.
//!
//! Network reads are sized by the HTTP client. `FetchOptions::chunk_size`
//! only sets how much is buffered before each write to the file.
//!
//! The fetcher never deletes what it wrote: the file lives in a directory
//! owned by the caller (see [`RequestWorkspace`](crate::RequestWorkspace)),
//! which removes it on every exit path.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::{configuration::FetchOptions, error::ClipsightError};

/// Suffix given to downloaded files.
pub const VIDEO_SUFFIX: &str = ".mp4";

/// A downloaded file owned by the request that fetched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMediaHandle {
    /// Location of the downloaded file.
    pub path: PathBuf,
    /// Number of bytes written. Never exceeds the configured cap.
    pub byte_size: u64,
}

/// Streams remote videos to local storage under a size cap.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    options: FetchOptions,
}

impl Fetcher {
    /// Create a fetcher with a default HTTP client.
    pub fn new(options: FetchOptions) -> Self {
        Self::with_client(Client::new(), options)
    }

    /// Create a fetcher that reuses an existing HTTP client.
    pub fn with_client(client: Client, options: FetchOptions) -> Self {
        Self { client, options }
    }

    /// The limits this fetcher enforces.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Download `url` into a new uniquely named file inside `directory`.
    ///
    /// # Errors
    ///
    /// - [`ClipsightError::Transport`] if the request fails or the server
    ///   answers with a non-success status.
    /// - [`ClipsightError::SizeLimitExceeded`] if the declared length, or the
    ///   number of bytes actually received, is over the cap. A declared
    ///   length over the cap is rejected before the body is read.
    /// - [`ClipsightError::IoError`] if the file cannot be created or written.
    pub async fn download(
        &self,
        url: &str,
        directory: &Path,
    ) -> Result<LocalMediaHandle, ClipsightError> {
        let limit = self.options.max_bytes;
        log::debug!("Starting download of {url} (limit={limit} bytes)");

        let mut response = self.client.get(url).send().await?.error_for_status()?;
        check_declared_size(response.content_length(), limit)?;

        let (file, path) = tempfile::Builder::new()
            .prefix("video-")
            .suffix(VIDEO_SUFFIX)
            .tempfile_in(directory)?
            .keep()
            .map_err(|persist| persist.error)?;
        let mut file =
            BufWriter::with_capacity(self.options.chunk_size, tokio::fs::File::from_std(file));

        let mut byte_size: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            if chunk.is_empty() {
                continue;
            }

            byte_size += chunk.len() as u64;
            if byte_size > limit {
                log::warn!("Aborting download of {url}: more than {limit} bytes received");
                return Err(ClipsightError::SizeLimitExceeded {
                    limit,
                    observed: byte_size,
                });
            }

            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        log::info!("Downloaded {byte_size} bytes to {}", path.display());
        Ok(LocalMediaHandle { path, byte_size })
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchOptions::default())
    }
}

/// Reject a declared content length over `limit`. An absent length passes;
/// the streaming byte count covers that case.
pub fn check_declared_size(declared: Option<u64>, limit: u64) -> Result<(), ClipsightError> {
    match declared {
        Some(length) if length > limit => Err(ClipsightError::SizeLimitExceeded {
            limit,
            observed: length,
        }),
        _ => Ok(()),
    }
}
