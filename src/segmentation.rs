//! Foreground / background segmentation.
//!
//! [`ForegroundSegmenter`] is the seam between the analyzer and the motion
//! model: it receives one cropped frame at a time and returns a
//! [`ForegroundMask`]. The default implementation, [`BackgroundSubtractor`],
//! keeps an adaptive mixture of Gaussians per pixel and per channel set,
//! learns the static scene over time, and flags samples that none of the
//! dominant background modes explain.
//!
//! Mask values are `0` for background, `255` for foreground and
//! [`SegmentationOptions::shadow_value`] for pixels classified as a shadow
//! cast on the background. Shadows are non-zero and therefore count as
//! foreground in [`ForegroundMask::count_nonzero`].
//!
//! # Example
//!
//! ```
//! use activity_meter::{BackgroundSubtractor, ForegroundSegmenter};
//! use image::{DynamicImage, GrayImage, Luma};
//!
//! let mut model = BackgroundSubtractor::default();
//! let still = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([40])));
//!
//! for _ in 0..50 {
//!     model.apply(&still)?;
//! }
//! assert_eq!(model.apply(&still)?.count_nonzero(), 0);
//! # Ok::<(), activity_meter::ActivityError>(())
//! ```

use std::borrow::Cow;

use image::{DynamicImage, GrayImage};

use crate::error::ActivityError;

/// A binary foreground mask with the same dimensions as the segmented frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ForegroundMask {
    /// Wrap a row-major mask buffer.
    ///
    /// Returns `None` if `data.len()` is not `width × height`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw mask values, row-major.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Number of non-zero (foreground or shadow) pixels.
    pub fn count_nonzero(&self) -> u64 {
        self.data.iter().filter(|&&value| value != 0).count() as u64
    }

    /// Fraction of the mask that is non-zero, in `0.0..=1.0`.
    pub fn foreground_ratio(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.count_nonzero() as f64 / self.data.len() as f64
    }

    /// Convert into a grayscale image, e.g. for saving a debug snapshot.
    pub fn into_image(self) -> GrayImage {
        // Length is checked at construction.
        GrayImage::from_raw(self.width, self.height, self.data)
            .unwrap_or_else(|| GrayImage::new(0, 0))
    }
}

/// A stateful model that turns frames into foreground masks.
///
/// Implementations adapt to the scene across successive calls, so frames
/// must be passed in their natural order.
pub trait ForegroundSegmenter {
    /// Segment `frame` and update the model with it.
    fn apply(&mut self, frame: &DynamicImage) -> Result<ForegroundMask, ActivityError>;

    /// Forget everything learned so far.
    fn reset(&mut self);
}

/// Tuning parameters for [`BackgroundSubtractor`].
///
/// Defaults match the widely used MOG2 parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationOptions {
    /// Number of frames that effectively make up the background history.
    /// The automatic learning rate is `1 / min(2 × frames_seen, history)`.
    pub history: u32,
    /// Squared Mahalanobis distance under which a sample is explained by a
    /// background mode.
    pub var_threshold: f32,
    /// Squared Mahalanobis distance under which a sample updates an existing
    /// mode instead of spawning a new one.
    pub var_threshold_gen: f32,
    /// Cumulative weight of the modes that are treated as background.
    pub background_ratio: f32,
    /// Maximum number of Gaussian modes per pixel.
    pub max_modes: u8,
    /// Variance assigned to a freshly created mode.
    pub var_init: f32,
    /// Lower clamp for mode variance.
    pub var_min: f32,
    /// Upper clamp for mode variance.
    pub var_max: f32,
    /// Prior that shrinks the weight of unsupported modes each frame.
    pub complexity_reduction: f32,
    /// Whether shadows are labelled separately.
    pub detect_shadows: bool,
    /// Mask value written for shadow pixels.
    pub shadow_value: u8,
    /// Lowest brightness ratio against the background still treated as a
    /// shadow.
    pub shadow_threshold: f32,
    /// Fixed learning rate in `0.0..=1.0`. `None` selects the automatic
    /// history-based rate.
    pub learning_rate: Option<f32>,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self {
            history: 500,
            var_threshold: 16.0,
            var_threshold_gen: 9.0,
            background_ratio: 0.9,
            max_modes: 5,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            complexity_reduction: 0.05,
            detect_shadows: true,
            shadow_value: 127,
            shadow_threshold: 0.5,
            learning_rate: None,
        }
    }
}

impl SegmentationOptions {
    /// Create options with the default parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the background history length (clamped to at least 1).
    #[must_use]
    pub fn with_history(mut self, history: u32) -> Self {
        self.history = history.max(1);
        self
    }

    /// Set the foreground decision threshold.
    #[must_use]
    pub fn with_var_threshold(mut self, threshold: f32) -> Self {
        self.var_threshold = threshold;
        self
    }

    /// Set the maximum number of modes per pixel (clamped to `1..=8`).
    #[must_use]
    pub fn with_max_modes(mut self, modes: u8) -> Self {
        self.max_modes = modes.clamp(1, 8);
        self
    }

    /// Enable or disable shadow labelling.
    #[must_use]
    pub fn with_detect_shadows(mut self, detect: bool) -> Self {
        self.detect_shadows = detect;
        self
    }

    /// Use a fixed learning rate instead of the automatic one.
    ///
    /// The rate is clamped to `0.0..=1.0`. A rate of `0.0` freezes the model.
    #[must_use]
    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = Some(rate.clamp(0.0, 1.0));
        self
    }
}

/// Per-frame constants derived from the options and the learning rate.
#[derive(Clone, Copy)]
struct UpdateParams {
    alpha: f32,
    retain: f32,
    prune: f32,
    var_threshold: f32,
    var_threshold_gen: f32,
    background_ratio: f32,
    var_init: f32,
    var_min: f32,
    var_max: f32,
    detect_shadows: bool,
    shadow_value: u8,
    shadow_threshold: f32,
}

/// Mutable view of one pixel's modes.
struct PixelModel<'a> {
    weights: &'a mut [f32],
    variances: &'a mut [f32],
    means: &'a mut [f32],
    count: &'a mut u8,
    channels: usize,
}

impl PixelModel<'_> {
    fn mean(&self, mode: usize) -> &[f32] {
        &self.means[mode * self.channels..(mode + 1) * self.channels]
    }

    fn distance2(&self, mode: usize, sample: &[u8]) -> f32 {
        self.mean(mode)
            .iter()
            .zip(sample)
            .map(|(&mean, &value)| {
                let diff = value as f32 - mean;
                diff * diff
            })
            .sum()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.weights.swap(a, b);
        self.variances.swap(a, b);
        for channel in 0..self.channels {
            self.means
                .swap(a * self.channels + channel, b * self.channels + channel);
        }
    }

    /// Drop modes whose weight fell to zero, keeping the order of the rest.
    fn compact(&mut self, count: usize) -> usize {
        let mut kept = 0;
        for mode in 0..count {
            if self.weights[mode] > 0.0 {
                if mode != kept {
                    self.swap(mode, kept);
                }
                kept += 1;
            }
        }
        kept
    }

    /// Update the modes with `sample` and return its mask value.
    fn update(&mut self, sample: &[u8], params: &UpdateParams) -> u8 {
        let capacity = self.weights.len();
        let mut count = *self.count as usize;
        let mut background = false;
        let mut fits = false;
        let mut total_weight = 0.0_f32;

        for mode in 0..count {
            let mut weight = params.retain * self.weights[mode] + params.prune;
            let mut slot = mode;

            if !fits {
                let variance = self.variances[mode];
                let distance2 = self.distance2(mode, sample);

                if total_weight < params.background_ratio
                    && distance2 < params.var_threshold * variance
                {
                    background = true;
                }

                if distance2 < params.var_threshold_gen * variance {
                    fits = true;
                    weight += params.alpha;
                    let gain = params.alpha / weight;

                    let start = mode * self.channels;
                    let end = start + self.channels;
                    for (mean, &value) in self.means[start..end]
                        .iter_mut()
                        .zip(sample)
                    {
                        *mean += gain * (value as f32 - *mean);
                    }
                    self.variances[mode] = (variance + gain * (distance2 - variance))
                        .clamp(params.var_min, params.var_max);

                    // Keep modes sorted by weight.
                    while slot > 0 && weight >= self.weights[slot - 1] {
                        self.swap(slot, slot - 1);
                        slot -= 1;
                    }
                }
            }

            if weight < -params.prune {
                weight = 0.0;
            }
            self.weights[slot] = weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            for weight in &mut self.weights[..count] {
                *weight /= total_weight;
            }
        }
        count = self.compact(count);

        if !fits && params.alpha > 0.0 {
            let slot = if count == capacity {
                capacity - 1
            } else {
                count += 1;
                count - 1
            };

            if count == 1 {
                self.weights[slot] = 1.0;
            } else {
                for (mode, weight) in self.weights[..count].iter_mut().enumerate() {
                    if mode != slot {
                        *weight *= params.retain;
                    }
                }
                self.weights[slot] = params.alpha;
            }

            let start = slot * self.channels;
            let end = start + self.channels;
            for (mean, &value) in self.means[start..end]
                .iter_mut()
                .zip(sample)
            {
                *mean = value as f32;
            }
            self.variances[slot] = params.var_init;

            let mut position = slot;
            while position > 0 && params.alpha >= self.weights[position - 1] {
                self.swap(position, position - 1);
                position -= 1;
            }
        }

        *self.count = count as u8;

        if background {
            0
        } else if params.detect_shadows && self.is_shadow(sample, params) {
            params.shadow_value
        } else {
            255
        }
    }

    /// A sample is a shadow when it is a darker, scaled copy of one of the
    /// background modes.
    fn is_shadow(&self, sample: &[u8], params: &UpdateParams) -> bool {
        let mut total_weight = 0.0_f32;

        for mode in 0..*self.count as usize {
            let mean = self.mean(mode);
            let mut numerator = 0.0_f32;
            let mut denominator = 0.0_f32;
            for (&mean_value, &value) in mean.iter().zip(sample) {
                numerator += mean_value * value as f32;
                denominator += mean_value * mean_value;
            }

            if denominator == 0.0 {
                return false;
            }

            if numerator <= denominator && numerator >= params.shadow_threshold * denominator {
                let scale = numerator / denominator;
                let distance2: f32 = mean
                    .iter()
                    .zip(sample)
                    .map(|(&mean_value, &value)| {
                        let diff = scale * mean_value - value as f32;
                        diff * diff
                    })
                    .sum();

                if distance2 < params.var_threshold * self.variances[mode] * scale * scale {
                    return true;
                }
            }

            total_weight += self.weights[mode];
            if total_weight > params.background_ratio {
                return false;
            }
        }

        false
    }
}

/// Adaptive Gaussian-mixture background model.
///
/// Each pixel carries up to [`SegmentationOptions::max_modes`] Gaussian
/// modes (weight, mean per channel, shared variance). Modes are updated
/// online; the heaviest modes whose cumulative weight stays below
/// [`SegmentationOptions::background_ratio`] form the background.
///
/// Grayscale frames are modelled with one channel, everything else is
/// converted to RGB. A change of frame size or channel count resets the
/// model.
#[derive(Debug, Clone)]
pub struct BackgroundSubtractor {
    options: SegmentationOptions,
    width: u32,
    height: u32,
    channels: usize,
    frames_seen: u64,
    mode_counts: Vec<u8>,
    weights: Vec<f32>,
    variances: Vec<f32>,
    means: Vec<f32>,
}

impl Default for BackgroundSubtractor {
    fn default() -> Self {
        Self::new(SegmentationOptions::default())
    }
}

impl BackgroundSubtractor {
    /// Create an empty model. Storage is allocated on the first frame.
    pub fn new(options: SegmentationOptions) -> Self {
        Self {
            options,
            width: 0,
            height: 0,
            channels: 0,
            frames_seen: 0,
            mode_counts: Vec::new(),
            weights: Vec::new(),
            variances: Vec::new(),
            means: Vec::new(),
        }
    }

    /// The options this model was built with.
    pub fn options(&self) -> &SegmentationOptions {
        &self.options
    }

    /// Number of frames the model has learned from since the last reset.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    fn allocate(&mut self, width: u32, height: u32, channels: usize) {
        let pixels = width as usize * height as usize;
        let modes = self.options.max_modes.max(1) as usize;

        log::debug!(
            "Allocating background model: {width}x{height}, {channels} channel(s), {modes} modes"
        );

        self.width = width;
        self.height = height;
        self.channels = channels;
        self.frames_seen = 0;
        self.mode_counts = vec![0; pixels];
        self.weights = vec![0.0; pixels * modes];
        self.variances = vec![0.0; pixels * modes];
        self.means = vec![0.0; pixels * modes * channels];
    }

    fn update_params(&self) -> UpdateParams {
        let history = self.options.history.max(1) as f64;
        let alpha = match self.options.learning_rate {
            Some(rate) if self.frames_seen > 1 => rate,
            _ => (1.0 / (2.0 * self.frames_seen as f64).min(history)) as f32,
        };

        UpdateParams {
            alpha,
            retain: 1.0 - alpha,
            prune: -alpha * self.options.complexity_reduction,
            var_threshold: self.options.var_threshold,
            var_threshold_gen: self.options.var_threshold_gen,
            background_ratio: self.options.background_ratio,
            var_init: self.options.var_init,
            var_min: self.options.var_min,
            var_max: self.options.var_max,
            detect_shadows: self.options.detect_shadows,
            shadow_value: self.options.shadow_value,
            shadow_threshold: self.options.shadow_threshold,
        }
    }
}

impl ForegroundSegmenter for BackgroundSubtractor {
    fn apply(&mut self, frame: &DynamicImage) -> Result<ForegroundMask, ActivityError> {
        let (width, height) = (frame.width(), frame.height());
        let (channels, samples): (usize, Cow<'_, [u8]>) = match frame {
            DynamicImage::ImageLuma8(gray) => (1, Cow::Borrowed(gray.as_raw().as_slice())),
            DynamicImage::ImageRgb8(rgb) => (3, Cow::Borrowed(rgb.as_raw().as_slice())),
            other => (3, Cow::Owned(other.to_rgb8().into_raw())),
        };

        if width != self.width || height != self.height || channels != self.channels {
            if self.frames_seen > 0 {
                log::warn!(
                    "Frame shape changed from {}x{}x{} to {width}x{height}x{channels}; resetting background model",
                    self.width,
                    self.height,
                    self.channels,
                );
            }
            self.allocate(width, height, channels);
        }

        self.frames_seen += 1;
        let params = self.update_params();
        let modes = self.options.max_modes.max(1) as usize;
        let mut mask = vec![0_u8; width as usize * height as usize];

        let pixels = self
            .weights
            .chunks_mut(modes)
            .zip(self.variances.chunks_mut(modes))
            .zip(self.means.chunks_mut(modes * channels))
            .zip(self.mode_counts.iter_mut())
            .zip(samples.chunks(channels))
            .zip(mask.iter_mut());

        for (((((weights, variances), means), count), sample), mask_value) in pixels {
            let mut pixel = PixelModel {
                weights,
                variances,
                means,
                count,
                channels,
            };
            *mask_value = pixel.update(sample, &params);
        }

        ForegroundMask::from_raw(width, height, mask).ok_or_else(|| {
            ActivityError::VideoDecodeError(
                "Foreground mask size does not match the frame".to_string(),
            )
        })
    }

    fn reset(&mut self) {
        self.width = 0;
        self.height = 0;
        self.channels = 0;
        self.frames_seen = 0;
        self.mode_counts.clear();
        self.weights.clear();
        self.variances.clear();
        self.means.clear();
    }
}
