//! Internal conversion helpers.
//!
//! Pixel-data copying out of FFmpeg frames, plus the timestamp and duration
//! formatting used in sample results.

use ffmpeg_next::frame::Video as VideoFrame;

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp).
/// The padding is stripped so the result can be handed to
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Format a position in seconds as `H:MM:SS`, appending `.ffffff`
/// microseconds when the fractional part is non-zero.
///
/// Hours are not zero-padded and are not wrapped into days. Negative or
/// non-finite input formats as `0:00:00`.
pub fn format_timestamp(seconds: f64) -> String {
    let total_micros = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1_000_000.0).round() as u64
    } else {
        0
    };

    let micros = total_micros % 1_000_000;
    let total_seconds = total_micros / 1_000_000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if micros == 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{hours}:{minutes:02}:{secs:02}.{micros:06}")
    }
}

/// Round to two decimal places.
pub(crate) fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_have_no_fraction() {
        assert_eq!(format_timestamp(0.0), "0:00:00");
        assert_eq!(format_timestamp(6.0), "0:00:06");
        assert_eq!(format_timestamp(24.0), "0:00:24");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
    }

    #[test]
    fn fractional_seconds_use_six_digits() {
        assert_eq!(format_timestamp(0.5), "0:00:00.500000");
        assert_eq!(format_timestamp(180.0 / 29.97), "0:00:06.006006");
    }

    #[test]
    fn long_durations_keep_counting_hours() {
        assert_eq!(format_timestamp(90_000.0), "25:00:00");
    }

    #[test]
    fn invalid_input_clamps_to_zero() {
        assert_eq!(format_timestamp(-3.0), "0:00:00");
        assert_eq!(format_timestamp(f64::NAN), "0:00:00");
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_to_hundredths(30.0), 30.0);
        assert_eq!(round_to_hundredths(10.012), 10.01);
        assert_eq!(round_to_hundredths(1001.0 / 30.0), 33.37);
    }
}
