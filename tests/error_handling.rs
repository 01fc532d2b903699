//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned when a video
//! cannot be analyzed, and that no result is produced in that case.

use std::path::Path;

use activity_meter::{
    ActivityAnalyzer, ActivityError, AnalysisOptions, PixelFormat, RegionOfInterest,
    VideoSource, WorkCriteria,
};

fn default_options() -> AnalysisOptions {
    AnalysisOptions::new(
        RegionOfInterest::new(0, 10, 0, 10).expect("region"),
        5,
        WorkCriteria::new(10.0).expect("criteria"),
    )
}

#[test]
fn open_nonexistent_file() {
    let result = VideoSource::open("this_file_does_not_exist.mp4", PixelFormat::Rgb8);
    assert!(result.is_err());

    let error = result.unwrap_err();
    assert!(matches!(error, ActivityError::UnreadableSource { .. }));

    let error_message = error.to_string();
    assert!(
        error_message.contains("Could not open video file"),
        "Error message should mention file open failure: {error_message}",
    );
    assert!(error_message.contains("this_file_does_not_exist.mp4"));
}

#[test]
fn analyze_nonexistent_file_yields_no_result() {
    let analyzer = ActivityAnalyzer::new(default_options());
    let result = analyzer.analyze("this_file_does_not_exist.mp4");

    assert!(matches!(
        result,
        Err(ActivityError::UnreadableSource { ref path, .. })
            if path == Path::new("this_file_does_not_exist.mp4")
    ));
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let result = activity_meter::analyze_video(
        &invalid_file_path,
        RegionOfInterest::new(0, 10, 0, 10).unwrap(),
        5,
        WorkCriteria::new(10.0).unwrap(),
    );
    assert!(result.is_err(), "Expected error for invalid video file");
}

#[test]
fn no_video_stream_error() {
    let path = "tests/fixtures/sample_audio_only.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let result = VideoSource::open(path, PixelFormat::Rgb8);
    assert!(matches!(result, Err(ActivityError::NoVideoStream)));
}

#[test]
fn region_larger_than_video() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let options = AnalysisOptions::new(
        RegionOfInterest::new(0, 100_000, 0, 100_000).unwrap(),
        5,
        WorkCriteria::new(10.0).unwrap(),
    );
    let result = ActivityAnalyzer::new(options).analyze(path);

    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Invalid region"),
        "Error should mention the region: {error_message}",
    );
}

#[test]
fn error_messages_are_descriptive() {
    let error = ActivityError::InvalidFrameRate(-1.0);
    assert_eq!(error.to_string(), "Invalid frame rate: -1");

    let error = ActivityError::InvalidRegionSpec("1,2".to_string());
    assert!(error.to_string().contains("TOP,BOTTOM,LEFT,RIGHT"));

    let error = ActivityError::NoVideoStream;
    assert_eq!(error.to_string(), "No video stream found in file");
}

#[test]
fn ffmpeg_errors_convert_to_ffmpeg_variant() {
    let error = ActivityError::from(ffmpeg_next::Error::Eof);
    assert!(matches!(error, ActivityError::FfmpegError(_)));
    assert!(error.to_string().starts_with("FFmpeg error: "));
}
