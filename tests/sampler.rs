//! Frame sampling integration tests.
//!
//! Tests that decode real video require fixture files from
//! `tests/fixtures/generate_fixtures.sh` and are skipped when they are absent.

use std::path::Path;

use clipsight::{ClipsightError, FramePlan, MediaFile, SampleOptions, sampler};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn open_nonexistent_file() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let error = sampler::sample(
        "this_file_does_not_exist.mp4",
        output.path(),
        &SampleOptions::new(),
    )
    .unwrap_err();

    assert!(
        matches!(error, ClipsightError::MediaOpen { .. }),
        "unexpected error: {error}"
    );
    assert!(!error.is_client_error());
}

#[test]
fn open_invalid_file() {
    // Create a temporary file with garbage content.
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let error = sampler::sample(
        &invalid_file_path,
        temporary_directory.path(),
        &SampleOptions::new(),
    )
    .unwrap_err();

    let error_message = error.to_string();
    assert!(
        error_message.contains("Failed to open video file"),
        "Error message should mention file open failure: {error_message}",
    );
    assert!(!temporary_directory.path().join("frame_0.jpg").exists());
}

#[test]
fn metadata_of_fixture() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let media = MediaFile::open(path).expect("Failed to open test video");
    let video = &media.metadata().video;
    assert_eq!(video.width, 640);
    assert_eq!(video.height, 480);
    assert!((video.frames_per_second - 30.0).abs() < 0.01);
    assert!(video.frame_count > 0);
    assert!(media.validate().is_valid());
}

#[test]
fn samples_five_evenly_spaced_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let result = sampler::sample(path, output.path(), &SampleOptions::new())
        .expect("Failed to sample fixture");

    assert_eq!(result.frames.len(), 5);
    assert!((result.duration_seconds - 10.0).abs() < 0.1);
    assert_eq!(result.timestamps()[0], "0:00:00");

    let indices: Vec<u64> = result.frames.iter().map(|frame| frame.frame_index).collect();
    let mut media = MediaFile::open(path).expect("Failed to open test video");
    let frame_count = media.metadata().video.frame_count;
    let sampler = media
        .sample_frames(&SampleOptions::new())
        .expect("Failed to start sampling");
    assert_eq!(sampler.plan(), FramePlan::new(frame_count, 5));
    assert_eq!(indices, sampler.plan().indices());

    for (ordinal, frame) in result.frames.iter().enumerate() {
        assert_eq!(frame.path, output.path().join(format!("frame_{ordinal}.jpg")));
        let decoded = image::open(&frame.path).expect("Frame should be a readable JPEG");
        assert_eq!((decoded.width(), decoded.height()), (640, 360));
    }
}

#[test]
fn frame_limit_and_resolution_are_configurable() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let options = SampleOptions::new()
        .with_max_frames(2)
        .with_resolution(160, 90)
        .with_jpeg_quality(50);
    let result = sampler::sample(path, output.path(), &options).expect("Failed to sample fixture");

    assert_eq!(result.frames.len(), 2);
    let timestamps = result.timestamps();
    assert_eq!(timestamps[0], "0:00:00");
    assert_eq!(timestamps[1], "0:00:05");

    let decoded = image::open(&result.frames[1].path).expect("Frame should be a readable JPEG");
    assert_eq!((decoded.width(), decoded.height()), (160, 90));
}

#[test]
fn zero_frame_limit_writes_nothing() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let result = sampler::sample(path, output.path(), &SampleOptions::new().with_max_frames(0))
        .expect("Failed to sample fixture");

    assert!(result.frames.is_empty());
    assert!(result.duration_seconds > 0.0);
    assert_eq!(
        std::fs::read_dir(output.path())
            .expect("Failed to read output")
            .count(),
        0
    );
}
