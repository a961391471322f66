//! Media metadata types.
//!
//! Metadata is read once when a [`MediaFile`](crate::MediaFile) is opened and
//! cached for its lifetime. The sampler relies on the frame count and frame
//! rate here to plan its stride before decoding anything.

use std::time::Duration;

/// Container-level metadata plus the selected video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Metadata of the best video stream.
    pub video: VideoMetadata,
    /// Container duration as reported by the demuxer, `Duration::ZERO` when
    /// unknown.
    pub container_duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

/// Metadata for a video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Nominal frames per second. Zero when the container does not declare
    /// a rate.
    pub frames_per_second: f64,
    /// Total number of frames: the stream's declared count when present,
    /// otherwise estimated from duration and frame rate.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}

impl VideoMetadata {
    /// Duration implied by the frame count and rate, in seconds.
    ///
    /// Returns `None` when the frame rate is zero or not finite.
    pub fn duration_seconds(&self) -> Option<f64> {
        if self.frames_per_second > 0.0 && self.frames_per_second.is_finite() {
            Some(self.frame_count as f64 / self.frames_per_second)
        } else {
            None
        }
    }
}
