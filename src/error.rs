//! Error types for the `clipsight` crate.
//!
//! This module defines [`ClipsightError`], the unified error type returned by
//! every stage of the pipeline. Stages propagate errors unchanged with `?`;
//! only the HTTP layer decides how an error is presented to a client, using
//! [`ClipsightError::is_client_error`].

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `clipsight` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClipsightError {
    /// The request is missing required input. This is the only variant
    /// attributed to the client.
    #[error("{0}")]
    Validation(String),

    /// The download could not be performed or the server answered with a
    /// non-success status.
    #[error("Failed to download video: {0}")]
    Transport(#[from] reqwest::Error),

    /// The declared or transferred size of the video exceeds the cap.
    #[error(
        "Video size exceeds maximum allowed size of {}MB ({observed} bytes)",
        .limit / (1024 * 1024)
    )]
    SizeLimitExceeded {
        /// Configured maximum in bytes.
        limit: u64,
        /// Size that tripped the limit: the declared content length, or the
        /// running byte count when the server did not declare one.
        observed: u64,
    },

    /// The media file could not be opened for sampling.
    #[error("Failed to open video file at {path}: {reason}")]
    MediaOpen {
        /// Path of the downloaded file.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded or converted.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A blocking worker task panicked or was aborted.
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ClipsightError {
    /// Returns `true` when the failure was caused by the request itself
    /// rather than by downloading or processing the video.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClipsightError::Validation(_))
    }
}

impl From<FfmpegError> for ClipsightError {
    fn from(error: FfmpegError) -> Self {
        ClipsightError::FfmpegError(error.to_string())
    }
}
