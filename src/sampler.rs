//! Fixed-stride frame sampling.
//!
//! Sampling happens in one forward pass over the decoded video, without
//! seeking. [`FramePlan`] decides which frame indices are kept: every
//! `stride`-th frame, where `stride = max(1, total_frames / max_frames)`,
//! until `max_frames` have been taken. [`FrameSampler`] is the lazy iterator
//! that decodes, scales and converts only the selected frames, and
//! [`sample`] drives it end to end, writing each frame as a JPEG.
//!
//! # Example
//!
//! ```no_run
//! use clipsight::{ClipsightError, SampleOptions, sampler};
//!
//! let output = tempfile::tempdir()?;
//! let result = sampler::sample("input.mp4", output.path(), &SampleOptions::new())?;
//! for frame in &result.frames {
//!     println!("{} -> {}", frame.timestamp, frame.path.display());
//! }
//! println!("duration: {:.2}s", result.duration_seconds);
//! # Ok::<(), ClipsightError>(())
//! ```

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder};
use serde::Serialize;

use crate::{
    configuration::SampleOptions,
    conversion::{format_timestamp, frame_to_buffer, round_to_hundredths},
    error::ClipsightError,
    media::MediaFile,
};

/// Which frame indices a forward pass keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    total_frames: u64,
    max_frames: usize,
    stride: u64,
}

impl FramePlan {
    /// Plan a pass over `total_frames` frames keeping at most `max_frames`.
    pub fn new(total_frames: u64, max_frames: usize) -> Self {
        let stride = (total_frames / (max_frames.max(1) as u64)).max(1);
        Self {
            total_frames,
            max_frames,
            stride,
        }
    }

    /// Distance in frames between consecutive selections.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Whether the frame at `index` is kept, given `selected` frames already
    /// kept.
    pub fn selects(&self, index: u64, selected: usize) -> bool {
        selected < self.max_frames && index < self.total_frames && index % self.stride == 0
    }

    /// Whether the pass can stop before decoding the frame at `index`.
    pub fn is_complete(&self, index: u64, selected: usize) -> bool {
        selected >= self.max_frames || index >= self.total_frames
    }

    /// Indices the plan selects if the stream yields every declared frame.
    pub fn indices(&self) -> Vec<u64> {
        (0..self.total_frames)
            .step_by(self.stride as usize)
            .take(self.max_frames)
            .collect()
    }
}

/// One encoded, resized still image with its timeline position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameArtifact {
    /// Location of the JPEG file.
    pub path: PathBuf,
    /// Zero-based index of the frame in decode order.
    pub frame_index: u64,
    /// Position formatted as `H:MM:SS[.ffffff]`.
    pub timestamp: String,
}

/// Frames selected from one video plus its duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleResult {
    /// Selected frames in timeline order.
    pub frames: Vec<FrameArtifact>,
    /// `total_frames / frames_per_second`, rounded to two decimals.
    pub duration_seconds: f64,
}

impl SampleResult {
    /// Timestamps of the selected frames, in order.
    pub fn timestamps(&self) -> Vec<String> {
        self.frames
            .iter()
            .map(|frame| frame.timestamp.clone())
            .collect()
    }
}

/// A lazy iterator over the frames a [`FramePlan`] selects.
///
/// Packets are read and decoded strictly in order; every decoded frame
/// advances the index, but only selected frames are scaled and converted.
/// Each item is `(frame_index, image)`.
///
/// Created via [`MediaFile::sample_frames`].
pub struct FrameSampler<'a> {
    media: &'a mut MediaFile,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    plan: FramePlan,
    target_width: u32,
    target_height: u32,
    next_index: u64,
    selected: usize,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameSampler<'a> {
    pub(crate) fn new(
        media: &'a mut MediaFile,
        options: &SampleOptions,
    ) -> Result<Self, ClipsightError> {
        let video = &media.metadata.video;
        let video_stream_index = video.stream_index;
        let plan = FramePlan::new(video.frame_count, options.max_frames);

        let stream = media
            .input_context
            .stream(video_stream_index)
            .ok_or(ClipsightError::NoVideoStream)?;
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        // Scale to the output size and convert to packed RGB in one step.
        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            options.width,
            options.height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Sampling {} with stride {} (max {} of {} frames)",
            media.file_path.display(),
            plan.stride(),
            options.max_frames,
            video.frame_count,
        );

        Ok(Self {
            media,
            decoder,
            scaler,
            video_stream_index,
            plan,
            target_width: options.width,
            target_height: options.height,
            next_index: 0,
            selected: 0,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// The stride plan driving this pass.
    pub fn plan(&self) -> FramePlan {
        self.plan
    }

    /// Scale and convert the current `decoded_frame` to an RGB image.
    fn convert_current_frame(&mut self) -> Result<DynamicImage, ClipsightError> {
        self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;

        let width = self.target_width;
        let height = self.target_height;
        let buffer = frame_to_buffer(&self.scaled_frame, width, height, 3);
        let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            ClipsightError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }

    fn fail(&mut self, error: ClipsightError) -> Option<Result<(u64, DynamicImage), ClipsightError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl Iterator for FrameSampler<'_> {
    type Item = Result<(u64, DynamicImage), ClipsightError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.plan.is_complete(self.next_index, self.selected) {
            self.done = true;
            return None;
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let index = self.next_index;
                self.next_index += 1;

                if self.plan.selects(index, self.selected) {
                    return match self.convert_current_frame() {
                        Ok(image) => {
                            self.selected += 1;
                            Some(Ok((index, image)))
                        }
                        Err(error) => self.fail(error),
                    };
                }

                if self.plan.is_complete(self.next_index, self.selected) {
                    self.done = true;
                    return None;
                }
                continue;
            }

            if self.eof_sent {
                self.done = true;
                return None;
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.media.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            return self.fail(ClipsightError::from(error));
                        }
                    }
                }
                Err(error) => {
                    if let Err(error) = end_of_demux(error) {
                        return self.fail(error);
                    }
                    if let Err(error) = self.decoder.send_eof() {
                        return self.fail(ClipsightError::from(error));
                    }
                    self.eof_sent = true;
                }
            }
        }
    }
}

/// Classify a demuxer read error. `Eof` ends the pass normally and
/// `InvalidData` (a damaged tail) ends it with a warning; both drain the
/// decoder. Anything else, I/O failures included, aborts the pass.
fn end_of_demux(error: FfmpegError) -> Result<(), ClipsightError> {
    match error {
        FfmpegError::Eof => Ok(()),
        FfmpegError::InvalidData => {
            log::warn!("Stopping demux at invalid data");
            Ok(())
        }
        other => {
            log::warn!("Demux failed: {other}");
            Err(ClipsightError::from(other))
        }
    }
}

/// Sample frames from the video at `path`, writing them into `output_directory`.
///
/// Frames are written as `frame_{ordinal}.jpg`, where `ordinal` is the
/// position among selected frames. The duration is derived from the frame
/// count and rate, not from how many frames decoded successfully.
///
/// # Errors
///
/// - [`ClipsightError::MediaOpen`] if the file cannot be opened or has no
///   frames or no usable frame rate.
/// - Decoder errors abort the pass; no partial result is returned.
/// - [`ClipsightError::IoError`] / [`ClipsightError::ImageError`] if a frame
///   cannot be written.
pub fn sample(
    path: impl AsRef<Path>,
    output_directory: &Path,
    options: &SampleOptions,
) -> Result<SampleResult, ClipsightError> {
    let mut media = MediaFile::open(path)?;
    let video = media.metadata().video.clone();

    let mut frames = Vec::with_capacity(options.max_frames);
    for item in media.sample_frames(options)? {
        let (frame_index, image) = item?;
        let frame_path = output_directory.join(format!("frame_{}.jpg", frames.len()));
        write_jpeg(&image, &frame_path, options.jpeg_quality)?;

        frames.push(FrameArtifact {
            path: frame_path,
            frame_index,
            timestamp: format_timestamp(frame_index as f64 / video.frames_per_second),
        });
    }

    let duration_seconds = round_to_hundredths(video.duration_seconds().unwrap_or_default());

    log::info!(
        "Sampled {} frame(s) from {} (duration={duration_seconds:.2}s)",
        frames.len(),
        media.path().display(),
    );

    Ok(SampleResult {
        frames,
        duration_seconds,
    })
}

/// Encode `image` as a JPEG at `quality` and write it to `path`.
fn write_jpeg(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), ClipsightError> {
    let mut writer = BufWriter::new(File::create(path)?);
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))?;
    writer.flush()?;
    Ok(())
}
