//! # activity_meter
//!
//! Estimate how long someone was actively working in a video by counting
//! motion-positive frames inside a fixed region of interest, then rate the
//! result as `Poor`, `Good`, `Better` or `Best`.
//!
//! Frames are decoded with FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate and segmented
//! by an adaptive Gaussian-mixture background model.
//!
//! ## Quick Start
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
//!
//! println!("{result}");
//! // Work Duration: 21.00 seconds
//! // Performance Category: Poor
//! # Ok::<(), activity_meter::ActivityError>(())
//! ```
//!
//! ## How the estimate is computed
//!
//! 1. Every decoded frame is cropped to the region of interest.
//! 2. The crop is fed to the background model, which returns a mask of
//!    moving pixels.
//! 3. A frame is a *work frame* when its mask has strictly more non-zero
//!    pixels than the threshold.
//! 4. `work_duration = work_frames / frame_count × fps`, where `fps` is a
//!    fixed 30 unless configured otherwise (see [`FrameRate`]).
//! 5. The duration is rated with strict thresholds at 1×, 1.5× and 2× the
//!    minimum work duration (see [`classify`]).
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod analyzer;
mod conversion;
pub mod criteria;
pub mod error;
pub mod ffmpeg;
pub mod options;
pub mod progress;
pub mod region;
pub mod segmentation;
pub mod source;

pub use analyzer::{ActivityAnalyzer, AnalysisResult, analyze_video, compute_work_duration};
pub use criteria::{PerformanceCategory, WorkCriteria, classify};
pub use error::ActivityError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use options::{AnalysisOptions, DEFAULT_FRAMES_PER_SECOND, FrameRate, PixelFormat};
pub use progress::{ProgressCallback, ProgressInfo};
pub use region::RegionOfInterest;
pub use segmentation::{
    BackgroundSubtractor, ForegroundMask, ForegroundSegmenter, SegmentationOptions,
};
pub use source::{FrameSource, SourceMetadata, VideoSource};
