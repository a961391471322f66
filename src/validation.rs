//! Pre-sampling validation.
//!
//! [`validate_for_sampling`] inspects cached [`MediaMetadata`] and reports
//! anything that would make sampling impossible (no frames, no usable frame
//! rate, empty picture) as errors, and oddities worth logging as warnings.
//! The sampler refuses to decode a file whose report is not valid.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::metadata::MediaMetadata;

/// Summary of media validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Non-fatal issues that may affect sampling quality.
    pub warnings: Vec<String>,
    /// Fatal issues that prevent sampling.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut first = true;
        for item in self.errors.iter().chain(self.warnings.iter()) {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{item}")?;
            first = false;
        }
        if first {
            write!(f, "no issues found")?;
        }
        Ok(())
    }
}

/// Run sampling checks on the cached metadata.
pub(crate) fn validate_for_sampling(metadata: &MediaMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();
    let video = &metadata.video;

    if !(video.frames_per_second.is_finite() && video.frames_per_second > 0.0) {
        report
            .errors
            .push(format!("invalid frame rate {}", video.frames_per_second));
    } else if video.frames_per_second > 240.0 {
        report.warnings.push(format!(
            "unusually high frame rate: {:.2} fps",
            video.frames_per_second
        ));
    }

    if video.frame_count == 0 {
        report.errors.push("video stream has no frames".to_string());
    }

    if video.width == 0 || video.height == 0 {
        report.errors.push(format!(
            "invalid dimensions {}x{}",
            video.width, video.height
        ));
    }

    if let (Some(stream_seconds), false) = (
        video.duration_seconds(),
        metadata.container_duration.is_zero(),
    ) {
        let container_seconds = metadata.container_duration.as_secs_f64();
        if (stream_seconds - container_seconds).abs() > 1.0 {
            report.warnings.push(format!(
                "frame-count duration {stream_seconds:.2}s differs from container duration {container_seconds:.2}s"
            ));
        }
    }

    report
}
