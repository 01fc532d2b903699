//! Error types for the `activity_meter` crate.
//!
//! This module defines [`ActivityError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry the path, bounds, or
//! upstream message needed to diagnose a failure without extra logging at the
//! call site.

use std::path::PathBuf;

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `activity_meter` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActivityError {
    /// The video source could not be opened (missing, corrupt, or an
    /// unsupported codec).
    #[error("Could not open video file at {path}: {reason}")]
    UnreadableSource {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The region of interest is malformed or does not fit inside the frame.
    #[error("Invalid region (top={top}, bottom={bottom}, left={left}, right={right}): {reason}")]
    InvalidRegion {
        /// First row of the region (inclusive).
        top: u32,
        /// Last row of the region (exclusive).
        bottom: u32,
        /// First column of the region (inclusive).
        left: u32,
        /// Last column of the region (exclusive).
        right: u32,
        /// Why the region was rejected.
        reason: String,
    },

    /// The work criteria are unusable (e.g. a non-positive minimum duration).
    #[error("Invalid work criteria: {0}")]
    InvalidCriteria(String),

    /// The configured frame rate is not a positive, finite number.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    /// A region specification string could not be parsed.
    #[error("Invalid region specification '{0}' (expected TOP,BOTTOM,LEFT,RIGHT)")]
    InvalidRegionSpec(String),

    /// A video frame could not be decoded or converted.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl From<FfmpegError> for ActivityError {
    fn from(error: FfmpegError) -> Self {
        ActivityError::FfmpegError(error.to_string())
    }
}
