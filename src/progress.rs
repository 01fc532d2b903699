//! Progress reporting.
//!
//! [`ProgressCallback`] observes an analysis while it runs. Snapshots are
//! delivered as [`ProgressInfo`] every
//! [`batch_size`](crate::AnalysisOptions::with_batch_size) frames, plus one
//! final report when the stream ends.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use activity_meter::{
//!     ActivityAnalyzer, AnalysisOptions, ProgressCallback, ProgressInfo, RegionOfInterest,
//!     WorkCriteria,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% ({} work frames so far)", info.work_frames);
//!         }
//!     }
//! }
//!
//! let options = AnalysisOptions::new(
//!     RegionOfInterest::new(0, 100, 0, 100)?,
//!     50,
//!     WorkCriteria::new(10.0)?,
//! )
//! .with_progress(Arc::new(PrintProgress))
//! .with_batch_size(30);
//!
//! let result = ActivityAnalyzer::new(options).analyze("input.mp4")?;
//! # Ok::<(), activity_meter::ActivityError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of analysis progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames processed so far.
    pub current: u64,
    /// Frames counted as work so far.
    pub work_frames: u64,
    /// Estimated total frames, if the container reports one.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the analysis started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Trait for receiving progress updates during analysis.
///
/// Callbacks observe but cannot halt the analysis.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals while frames are processed.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. Default when no callback is set.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing and fires the callback every `batch_size` frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    work_frames: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            total: total.filter(|&t| t > 0),
            current: 0,
            work_frames: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one processed frame.
    pub(crate) fn advance(&mut self, is_work: bool) {
        self.current += 1;
        if is_work {
            self.work_frames += 1;
        }
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report();
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report();
    }

    fn report(&self) {
        let elapsed = self.start_time.elapsed();

        // Container frame counts are estimates; never report past 100%.
        let percentage = self
            .total
            .map(|t| ((self.current as f32 / t as f32) * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            work_frames: self.work_frames,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
        };

        self.callback.on_progress(&info);
    }
}
