//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a builder that carries the region, threshold and
//! criteria of an analysis run together with the optional knobs: frame-rate
//! policy, decoded pixel format, background-model parameters and a progress
//! callback.
//!
//! # Example
//!
//! ```
//! use activity_meter::{AnalysisOptions, FrameRate, PixelFormat, RegionOfInterest, WorkCriteria};
//!
//! let options = AnalysisOptions::new(
//!     RegionOfInterest::new(200, 500, 100, 300)?,
//!     50,
//!     WorkCriteria::new(60.0)?,
//! )
//! .with_frame_rate(FrameRate::Source { fallback: 30.0 })
//! .with_pixel_format(PixelFormat::Gray8);
//! # Ok::<(), activity_meter::ActivityError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use ffmpeg_next::format::Pixel;

use crate::criteria::WorkCriteria;
use crate::error::ActivityError;
use crate::progress::{NoOpProgress, ProgressCallback};
use crate::region::RegionOfInterest;
use crate::segmentation::SegmentationOptions;

/// Frame rate assumed when none is configured.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 30.0;

/// Pixel format frames are decoded into before segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit grayscale (8 bpp). Cheaper, but blind to pure colour changes.
    Gray8,
}

impl PixelFormat {
    /// Map to the corresponding FFmpeg pixel format constant.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Bytes per pixel in the packed output plane.
    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// How the frames-per-second factor of the work duration is chosen.
///
/// The work duration is `work_frames / frame_count × fps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRate {
    /// Always use this rate, whatever the source reports.
    Fixed(f64),
    /// Use the rate reported by the source, or `fallback` when the source
    /// does not report a usable one.
    Source {
        /// Rate used when the source rate is missing or zero.
        fallback: f64,
    },
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::Fixed(DEFAULT_FRAMES_PER_SECOND)
    }
}

impl FrameRate {
    /// Pick the effective rate given what the source reports (0 if unknown).
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidFrameRate`] if the chosen rate is not
    /// positive and finite.
    pub fn resolve(self, source_frames_per_second: f64) -> Result<f64, ActivityError> {
        let rate = match self {
            FrameRate::Fixed(rate) => rate,
            FrameRate::Source { fallback } => {
                if source_frames_per_second.is_finite() && source_frames_per_second > 0.0 {
                    source_frames_per_second
                } else {
                    log::debug!(
                        "Source reports no usable frame rate; falling back to {fallback} fps"
                    );
                    fallback
                }
            }
        };

        if !rate.is_finite() || rate <= 0.0 {
            return Err(ActivityError::InvalidFrameRate(rate));
        }
        Ok(rate)
    }
}

/// Configuration for one analysis run.
#[derive(Clone)]
pub struct AnalysisOptions {
    pub(crate) region: RegionOfInterest,
    /// A frame counts as work when strictly more mask pixels than this are set.
    pub(crate) foreground_threshold: u64,
    pub(crate) criteria: WorkCriteria,
    pub(crate) frame_rate: FrameRate,
    pub(crate) pixel_format: PixelFormat,
    pub(crate) segmentation: SegmentationOptions,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("region", &self.region)
            .field("foreground_threshold", &self.foreground_threshold)
            .field("criteria", &self.criteria)
            .field("frame_rate", &self.frame_rate)
            .field("pixel_format", &self.pixel_format)
            .field("segmentation", &self.segmentation)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl AnalysisOptions {
    /// Create options for the given region, foreground-pixel threshold and
    /// criteria.
    ///
    /// Defaults: fixed 30 fps, RGB decoding, default background model, no
    /// progress callback, batch size 1.
    pub fn new(region: RegionOfInterest, foreground_threshold: u64, criteria: WorkCriteria) -> Self {
        Self {
            region,
            foreground_threshold,
            criteria,
            frame_rate: FrameRate::default(),
            pixel_format: PixelFormat::default(),
            segmentation: SegmentationOptions::default(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Region of interest.
    pub fn region(&self) -> RegionOfInterest {
        self.region
    }

    /// Foreground-pixel threshold.
    pub fn foreground_threshold(&self) -> u64 {
        self.foreground_threshold
    }

    /// Work criteria.
    pub fn criteria(&self) -> WorkCriteria {
        self.criteria
    }

    /// Frame-rate policy.
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    /// Decoded pixel format.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Background-model parameters.
    pub fn segmentation(&self) -> &SegmentationOptions {
        &self.segmentation
    }

    /// Set the frame-rate policy.
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the pixel format frames are decoded into.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    /// Set the background-model parameters.
    #[must_use]
    pub fn with_segmentation(mut self, segmentation: SegmentationOptions) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Attach a progress callback.
    ///
    /// The callback is invoked every
    /// [`batch_size`](AnalysisOptions::with_batch_size) frames.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }
}
