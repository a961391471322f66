//! Opening downloaded media for sampling.
//!
//! [`MediaFile`] owns the FFmpeg demuxer for one local file and the metadata
//! of its best video stream. Dropping it closes the demuxer, so whatever path
//! the caller exits through, the decoder resources go with it.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{
    configuration::SampleOptions,
    error::ClipsightError,
    metadata::{MediaMetadata, VideoMetadata},
    sampler::FrameSampler,
    validation::{ValidationReport, validate_for_sampling},
};

/// An opened media file with cached video metadata.
///
/// # Example
///
/// ```no_run
/// use clipsight::{ClipsightError, MediaFile};
///
/// let media = MediaFile::open("input.mp4")?;
/// let video = &media.metadata().video;
/// println!("{} frames at {:.2} fps", video.frame_count, video.frames_per_second);
/// # Ok::<(), ClipsightError>(())
/// ```
pub struct MediaFile {
    pub(crate) input_context: Input,
    pub(crate) metadata: MediaMetadata,
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file and read the metadata of its best video stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClipsightError::MediaOpen`] if FFmpeg cannot open or probe
    /// the file, or if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClipsightError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        let open_error = |reason: String| ClipsightError::MediaOpen {
            path: file_path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(path).map_err(|error| open_error(error.to_string()))?;

        let container_duration = match input_context.duration() {
            microseconds if microseconds > 0 => Duration::from_micros(microseconds as u64),
            _ => Duration::ZERO,
        };
        let format = input_context.format().name().to_string();

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| open_error(ClipsightError::NoVideoStream.to_string()))?;
        let stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_error(format!("Failed to read video codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        // Prefer the average frame rate, fall back to the stream's base rate.
        let frames_per_second = [stream.avg_frame_rate(), stream.rate()]
            .into_iter()
            .find(|rate| rate.numerator() > 0 && rate.denominator() > 0)
            .map(|rate| rate.numerator() as f64 / rate.denominator() as f64)
            .unwrap_or(0.0);

        let frame_count = match stream.frames() {
            declared if declared > 0 => declared as u64,
            _ if frames_per_second > 0.0 => {
                (container_duration.as_secs_f64() * frames_per_second) as u64
            }
            _ => 0,
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = MediaMetadata {
            video: VideoMetadata {
                width: decoder.width(),
                height: decoder.height(),
                frames_per_second,
                frame_count,
                codec,
                stream_index,
            },
            container_duration,
            format,
        };

        log::info!(
            "Opened media file: {} (format={}, {}x{}, {:.2} fps, {} frames, codec={})",
            file_path.display(),
            metadata.format,
            metadata.video.width,
            metadata.video.height,
            metadata.video.frames_per_second,
            metadata.video.frame_count,
            metadata.video.codec,
        );

        Ok(Self {
            input_context,
            metadata,
            file_path,
        })
    }

    /// Cached metadata read at open time.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Check whether the file can be sampled.
    pub fn validate(&self) -> ValidationReport {
        validate_for_sampling(&self.metadata)
    }

    /// Start a forward pass that yields the frames selected by the stride
    /// plan for `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ClipsightError::MediaOpen`] if validation fails, or FFmpeg
    /// errors from setting up the decoder and scaler.
    pub fn sample_frames(
        &mut self,
        options: &SampleOptions,
    ) -> Result<FrameSampler<'_>, ClipsightError> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(ClipsightError::MediaOpen {
                path: self.file_path.clone(),
                reason: report.to_string(),
            });
        }
        for warning in &report.warnings {
            log::warn!("{}: {warning}", self.file_path.display());
        }
        FrameSampler::new(self, options)
    }
}
