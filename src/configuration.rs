//! Pipeline configuration.
//!
//! [`ServiceOptions`] bundles the settings for both stages of the pipeline:
//! [`FetchOptions`] bounds the download, [`SampleOptions`] shapes the frames
//! the sampler produces. All three are builders with sensible defaults, so a
//! default-constructed value reproduces the stock service behaviour.
//!
//! # Example
//!
//! ```
//! use clipsight::{FetchOptions, SampleOptions, ServiceOptions};
//!
//! let options = ServiceOptions::new()
//!     .with_fetch(FetchOptions::new().with_max_bytes(50 * 1024 * 1024))
//!     .with_sample(SampleOptions::new().with_max_frames(8));
//!
//! assert_eq!(options.sample.max_frames, 8);
//! ```

use std::path::PathBuf;

/// Default download cap: 100 MiB.
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

/// Default size of each chunk written to disk: 8 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Default number of frames sampled per video.
pub const DEFAULT_MAX_FRAMES: usize = 5;

/// Default output frame width in pixels.
pub const DEFAULT_FRAME_WIDTH: u32 = 640;

/// Default output frame height in pixels.
pub const DEFAULT_FRAME_HEIGHT: u32 = 360;

/// Default JPEG quality for encoded frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Settings for the bounded streaming download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of bytes accepted, checked against the declared
    /// content length and against the bytes actually received.
    pub max_bytes: u64,
    /// Write granularity: bytes buffered before each write to the
    /// destination file. Does not change how the body is read from the
    /// network.
    pub chunk_size: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchOptions {
    /// Create fetch options with the default 100 MiB cap and 8 KiB chunks.
    pub fn new() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_VIDEO_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the download cap in bytes.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the write buffer size. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Settings for frame sampling and encoding.
///
/// Frames are scaled to exactly `width × height`; the source aspect ratio
/// is not preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOptions {
    /// Upper bound on the number of frames selected.
    pub max_frames: usize,
    /// Output frame width.
    pub width: u32,
    /// Output frame height.
    pub height: u32,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleOptions {
    /// Create sample options: 5 frames at 640×360, JPEG quality 85.
    pub fn new() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the maximum number of frames to select.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Set the output resolution. Each dimension is clamped to at least 1.
    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Set the JPEG quality. Clamped to `1..=100`.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

/// Configuration for a whole analysis request.
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    /// Download settings.
    pub fetch: FetchOptions,
    /// Sampling settings.
    pub sample: SampleOptions,
    /// Directory under which per-request workspaces are created. `None`
    /// uses the system temporary directory.
    pub scratch_directory: Option<PathBuf>,
}

impl ServiceOptions {
    /// Create service options with default fetch and sample settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the download settings.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    /// Replace the sampling settings.
    #[must_use]
    pub fn with_sample(mut self, sample: SampleOptions) -> Self {
        self.sample = sample;
        self
    }

    /// Create per-request workspaces under `directory`.
    #[must_use]
    pub fn with_scratch_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.scratch_directory = Some(directory.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_constants() {
        let options = ServiceOptions::new();
        assert_eq!(options.fetch.max_bytes, 100 * 1024 * 1024);
        assert_eq!(options.fetch.chunk_size, 8192);
        assert_eq!(options.sample.max_frames, 5);
        assert_eq!((options.sample.width, options.sample.height), (640, 360));
        assert_eq!(options.sample.jpeg_quality, 85);
        assert!(options.scratch_directory.is_none());
    }

    #[test]
    fn builders_clamp_out_of_range_values() {
        let fetch = FetchOptions::new().with_chunk_size(0);
        assert_eq!(fetch.chunk_size, 1);

        let sample = SampleOptions::new()
            .with_resolution(0, 0)
            .with_jpeg_quality(0);
        assert_eq!((sample.width, sample.height), (1, 1));
        assert_eq!(sample.jpeg_quality, 1);

        let sample = SampleOptions::new().with_jpeg_quality(255);
        assert_eq!(sample.jpeg_quality, 100);
    }
}
