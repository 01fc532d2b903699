//! Activity analysis.
//!
//! [`ActivityAnalyzer`] drives one analysis run: it pulls frames from a
//! [`FrameSource`] in order, crops each one to the region of interest, feeds
//! the crop to a [`ForegroundSegmenter`], and counts the frames whose
//! foreground pixel count exceeds the threshold. The ratio of work frames to
//! all frames, scaled by the frame rate, is the work duration, which is then
//! rated against the [`WorkCriteria`](crate::WorkCriteria).
//!
//! # Example
//!
//! ```no_run
//! use activity_meter::{RegionOfInterest, WorkCriteria};
//!
//! let result = activity_meter::analyze_video(
//!     "recording.mp4",
//!     RegionOfInterest::new(200, 500, 100, 300)?,
//!     50,
//!     WorkCriteria::new(60.0)?,
//! )?;
//! println!("{result}");
//! # Ok::<(), activity_meter::ActivityError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use crate::{
    criteria::{PerformanceCategory, WorkCriteria, classify},
    error::ActivityError,
    options::AnalysisOptions,
    progress::ProgressTracker,
    region::RegionOfInterest,
    segmentation::{BackgroundSubtractor, ForegroundSegmenter},
    source::{FrameSource, VideoSource},
};

/// Outcome of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisResult {
    /// Estimated seconds of work: `work_frames / frame_count × frames_per_second`.
    pub work_duration: f64,
    /// Rating of `work_duration` against the criteria.
    pub performance: PerformanceCategory,
    /// Frames processed.
    pub frame_count: u64,
    /// Frames whose foreground count exceeded the threshold.
    pub work_frames: u64,
    /// Frame rate used to scale the work ratio.
    pub frames_per_second: f64,
}

impl Display for AnalysisResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "Work Duration: {:.2} seconds", self.work_duration)?;
        write!(f, "Performance Category: {}", self.performance)
    }
}

/// Scale the work-frame ratio by the frame rate.
///
/// An empty source yields `0.0` rather than dividing by zero.
pub fn compute_work_duration(work_frames: u64, frame_count: u64, frames_per_second: f64) -> f64 {
    if frame_count == 0 {
        return 0.0;
    }
    (work_frames as f64 / frame_count as f64) * frames_per_second
}

/// Runs activity analyses with a fixed set of options.
///
/// The analyzer holds no state between runs: every call builds a fresh
/// background model, so repeated analyses of the same input agree.
#[derive(Debug, Clone)]
pub struct ActivityAnalyzer {
    options: AnalysisOptions,
}

impl ActivityAnalyzer {
    /// Create an analyzer.
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    /// The options this analyzer runs with.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Open the video at `path` and analyze it.
    ///
    /// The video source is released before this returns, whether the
    /// analysis succeeded or failed.
    ///
    /// # Errors
    ///
    /// - [`ActivityError::UnreadableSource`] / [`ActivityError::NoVideoStream`]
    ///   if the video cannot be opened.
    /// - [`ActivityError::InvalidRegion`] if the region exceeds the frame.
    /// - [`ActivityError::InvalidFrameRate`] if the frame-rate policy yields
    ///   an unusable rate.
    /// - Decoding errors from the source.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisResult, ActivityError> {
        let source = VideoSource::open(path, self.options.pixel_format)?;
        self.analyze_owned(source)
    }

    /// Analyze `source` and drop it before returning, on success and on
    /// error alike.
    ///
    /// # Errors
    ///
    /// See [`analyze`](ActivityAnalyzer::analyze).
    pub fn analyze_owned<S: FrameSource>(
        &self,
        mut source: S,
    ) -> Result<AnalysisResult, ActivityError> {
        let result = self.analyze_source(&mut source);
        drop(source);
        result
    }

    /// Analyze an already opened source with a fresh background model.
    ///
    /// # Errors
    ///
    /// See [`analyze`](ActivityAnalyzer::analyze).
    pub fn analyze_source<S>(&self, source: &mut S) -> Result<AnalysisResult, ActivityError>
    where
        S: FrameSource + ?Sized,
    {
        let mut segmenter = BackgroundSubtractor::new(self.options.segmentation.clone());
        self.analyze_with(source, &mut segmenter)
    }

    /// Analyze `source` using a caller-supplied segmenter.
    ///
    /// The segmenter is used as-is; call
    /// [`reset`](ForegroundSegmenter::reset) first to start from a blank
    /// model.
    ///
    /// # Errors
    ///
    /// See [`analyze`](ActivityAnalyzer::analyze), plus any error returned by
    /// the segmenter.
    pub fn analyze_with<S, G>(
        &self,
        source: &mut S,
        segmenter: &mut G,
    ) -> Result<AnalysisResult, ActivityError>
    where
        S: FrameSource + ?Sized,
        G: ForegroundSegmenter + ?Sized,
    {
        let metadata = source.metadata();
        let frames_per_second = self.options.frame_rate.resolve(metadata.frames_per_second)?;
        let estimated_total = metadata.estimated_frame_count;

        let region = self.options.region;
        let threshold = self.options.foreground_threshold;

        log::debug!(
            "Analyzing region {region} with threshold {threshold} at {frames_per_second:.2} fps"
        );

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            Some(estimated_total),
            self.options.batch_size,
        );

        let mut frame_count: u64 = 0;
        let mut work_frames: u64 = 0;

        while let Some(frame) = source.next_frame()? {
            let cropped = region.crop(&frame)?;
            let mask = segmenter.apply(&cropped)?;
            let foreground = mask.count_nonzero();

            let is_work = foreground > threshold;
            if is_work {
                work_frames += 1;
            }
            frame_count += 1;

            log::trace!("frame {frame_count}: {foreground} foreground pixel(s), work={is_work}");
            tracker.advance(is_work);
        }

        tracker.finish();

        if frame_count == 0 {
            log::warn!("Source yielded no frames; reporting zero work duration");
        }

        let work_duration = compute_work_duration(work_frames, frame_count, frames_per_second);
        let performance = classify(work_duration, &self.options.criteria);

        log::info!("Work Duration: {work_duration:.2} seconds");
        log::info!("Performance Category: {performance}");

        Ok(AnalysisResult {
            work_duration,
            performance,
            frame_count,
            work_frames,
            frames_per_second,
        })
    }
}

/// Analyze a video file with default options.
///
/// Equivalent to building [`AnalysisOptions::new`] from the four arguments
/// and calling [`ActivityAnalyzer::analyze`].
///
/// # Errors
///
/// See [`ActivityAnalyzer::analyze`].
pub fn analyze_video<P: AsRef<Path>>(
    path: P,
    region: RegionOfInterest,
    foreground_threshold: u64,
    criteria: WorkCriteria,
) -> Result<AnalysisResult, ActivityError> {
    let options = AnalysisOptions::new(region, foreground_threshold, criteria);
    ActivityAnalyzer::new(options).analyze(path)
}
