//! Region of interest.
//!
//! A [`RegionOfInterest`] is the rectangular sub-window of every frame that
//! is fed to the background model. Bounds follow the `frame[top:bottom,
//! left:right]` convention: `top`/`left` are inclusive and `bottom`/`right`
//! are exclusive.
//!
//! # Example
//!
//! ```
//! use activity_meter::RegionOfInterest;
//!
//! let region: RegionOfInterest = "200,500,100,300".parse()?;
//! assert_eq!(region.width(), 200);
//! assert_eq!(region.height(), 300);
//! # Ok::<(), activity_meter::ActivityError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use image::DynamicImage;

use crate::error::ActivityError;

/// Rectangular window `(top, bottom, left, right)` in pixel coordinates.
///
/// Construction guarantees `top < bottom` and `left < right`. The upper
/// bounds can only be checked once the frame size is known; see
/// [`check_within`](RegionOfInterest::check_within).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionOfInterest {
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
}

impl RegionOfInterest {
    /// Create a region from its four bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidRegion`] if the region is empty
    /// (`top >= bottom` or `left >= right`).
    pub fn new(top: u32, bottom: u32, left: u32, right: u32) -> Result<Self, ActivityError> {
        let region = Self {
            top,
            bottom,
            left,
            right,
        };

        if top >= bottom {
            return Err(region.rejected("top must be less than bottom"));
        }
        if left >= right {
            return Err(region.rejected("left must be less than right"));
        }

        Ok(region)
    }

    /// First row (inclusive).
    pub fn top(&self) -> u32 {
        self.top
    }

    /// Last row (exclusive).
    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    /// First column (inclusive).
    pub fn left(&self) -> u32 {
        self.left
    }

    /// Last column (exclusive).
    pub fn right(&self) -> u32 {
        self.right
    }

    /// Width of the region in pixels.
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Height of the region in pixels.
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Number of pixels covered by the region.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Verify the region fits inside a `frame_width` × `frame_height` frame.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidRegion`] if `bottom` exceeds the frame
    /// height or `right` exceeds the frame width.
    pub fn check_within(&self, frame_width: u32, frame_height: u32) -> Result<(), ActivityError> {
        if self.bottom > frame_height || self.right > frame_width {
            return Err(self.rejected(&format!(
                "region exceeds the {frame_width}x{frame_height} frame"
            )));
        }
        Ok(())
    }

    /// Crop `frame` to this region.
    ///
    /// The bounds are checked against the frame first, so an out-of-range
    /// region fails instead of being silently clipped.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidRegion`] if the region does not fit.
    pub fn crop(&self, frame: &DynamicImage) -> Result<DynamicImage, ActivityError> {
        self.check_within(frame.width(), frame.height())?;
        Ok(frame.crop_imm(self.left, self.top, self.width(), self.height()))
    }

    fn rejected(&self, reason: &str) -> ActivityError {
        ActivityError::InvalidRegion {
            top: self.top,
            bottom: self.bottom,
            left: self.left,
            right: self.right,
            reason: reason.to_string(),
        }
    }
}

impl Display for RegionOfInterest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{},{},{}", self.top, self.bottom, self.left, self.right)
    }
}

impl FromStr for RegionOfInterest {
    type Err = ActivityError;

    /// Parse `TOP,BOTTOM,LEFT,RIGHT` (whitespace around values is ignored).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ActivityError::InvalidRegionSpec(value.to_string());

        let bounds = value
            .split(',')
            .map(|part| part.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<u32>, ActivityError>>()?;

        match bounds.as_slice() {
            &[top, bottom, left, right] => Self::new(top, bottom, left, right),
            _ => Err(invalid()),
        }
    }
}
