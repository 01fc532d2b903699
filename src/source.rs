//! Sequential frame sources.
//!
//! [`FrameSource`] is what the analyzer pulls frames from. [`VideoSource`] is
//! the FFmpeg-backed implementation: it opens a file, picks the best video
//! stream, and decodes every frame in presentation order without seeking.
//!
//! The demuxer and decoder are owned by the `VideoSource` and released when
//! it is dropped, so the handle is freed exactly once on every exit path.
//!
//! # Example
//!
//! ```no_run
//! use activity_meter::{FrameSource, PixelFormat, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4", PixelFormat::Rgb8)?;
//! println!("{:.2} fps", source.metadata().frames_per_second);
//!
//! while let Some(frame) = source.next_frame()? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), activity_meter::ActivityError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage};

use crate::{conversion, error::ActivityError, options::PixelFormat};

/// Metadata for the stream a source decodes.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SourceMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second reported by the container, `0.0` if unknown.
    pub frames_per_second: f64,
    /// Frame count estimated from duration and frame rate, `0` if unknown.
    pub estimated_frame_count: u64,
    /// Container duration, [`Duration::ZERO`] if unknown.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

/// A sequential supplier of decoded frames.
pub trait FrameSource {
    /// Metadata describing the frames this source yields.
    fn metadata(&self) -> &SourceMetadata;

    /// Decode the next frame, or return `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>, ActivityError>;
}

/// Non-EOF demuxer errors tolerated in a row before decoding gives up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 32;

/// FFmpeg-backed [`FrameSource`] over a video file.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    converter: FrameConverter,
    video_stream_index: usize,
    metadata: SourceMetadata,
    decoded_frame: VideoFrame,
    frames_decoded: u64,
    read_errors: u32,
    eof_sent: bool,
    finished: bool,
    path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("pixel_format", &self.converter.pixel_format)
            .field("frames_decoded", &self.frames_decoded)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file for sequential decoding.
    ///
    /// Initialises FFmpeg (idempotent), opens the container, selects the
    /// best video stream, and prepares its decoder.
    ///
    /// # Errors
    ///
    /// - [`ActivityError::UnreadableSource`] if the file is missing, corrupt,
    ///   or uses a codec FFmpeg cannot decode.
    /// - [`ActivityError::NoVideoStream`] if the container has no video.
    pub fn open<P: AsRef<Path>>(path: P, pixel_format: PixelFormat) -> Result<Self, ActivityError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video source: {}", path.display());

        let result = Self::open_inner(&path, pixel_format);
        if let Err(error) = &result {
            log::error!("Could not open video file {}: {error}", path.display());
        }
        result
    }

    fn open_inner(path: &Path, pixel_format: PixelFormat) -> Result<Self, ActivityError> {
        let unreadable = |reason: String| ActivityError::UnreadableSource {
            path: path.to_path_buf(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| unreadable(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(path).map_err(|error| unreadable(error.to_string()))?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };
        let format = input_context.format().name().to_string();

        let (video_stream_index, frames_per_second, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(ActivityError::NoVideoStream)?;

            let frames_per_second = conversion::rational_to_frames_per_second(
                stream.avg_frame_rate(),
            )
            .or_else(|| conversion::rational_to_frames_per_second(stream.rate()))
            .unwrap_or(0.0);

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| {
                    unreadable(format!("Failed to read video codec parameters: {error}"))
                })?;
            let decoder = decoder_context
                .decoder()
                .video()
                .map_err(|error| unreadable(format!("Failed to create video decoder: {error}")))?;

            (stream.index(), frames_per_second, decoder)
        };

        let estimated_frame_count = if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = SourceMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            estimated_frame_count,
            duration,
            codec,
            format,
        };

        log::info!(
            "Opened video source: {} ({}x{}, {:.2} fps, codec={}, ~{} frames)",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
            metadata.estimated_frame_count,
        );

        Ok(Self {
            input_context,
            decoder,
            converter: FrameConverter::new(pixel_format),
            video_stream_index,
            metadata,
            decoded_frame: VideoFrame::empty(),
            frames_decoded: 0,
            read_errors: 0,
            eof_sent: false,
            finished: false,
            path: path.to_path_buf(),
        })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames decoded so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
}

/// Scales decoded frames into packed RGB8 or GRAY8 images.
///
/// The scaler and its output frame are rebuilt together whenever the
/// decoded format or size changes.
struct FrameConverter {
    pixel_format: PixelFormat,
    scaler: Option<ScalingContext>,
    /// Input format and size the current scaler was built for.
    scaler_input: (Pixel, u32, u32),
    converted_frame: VideoFrame,
}

impl FrameConverter {
    fn new(pixel_format: PixelFormat) -> Self {
        Self {
            pixel_format,
            scaler: None,
            scaler_input: (Pixel::None, 0, 0),
            converted_frame: VideoFrame::empty(),
        }
    }

    fn convert(&mut self, decoded_frame: &VideoFrame) -> Result<DynamicImage, ActivityError> {
        let input = (
            decoded_frame.format(),
            decoded_frame.width(),
            decoded_frame.height(),
        );

        let scaler = match self.scaler.take() {
            Some(scaler) if self.scaler_input == input => scaler,
            _ => {
                let (format, width, height) = input;
                log::debug!("Building scaler for {format:?} {width}x{height}");
                // The scaler only allocates an empty output frame; a stale one
                // sized for the previous input would be rejected.
                self.converted_frame = VideoFrame::empty();
                ScalingContext::get(
                    format,
                    width,
                    height,
                    self.pixel_format.to_ffmpeg_pixel(),
                    width,
                    height,
                    ScalingFlags::BILINEAR,
                )?
            }
        };
        self.scaler_input = input;
        let scaler = self.scaler.insert(scaler);
        scaler.run(decoded_frame, &mut self.converted_frame)?;

        let (_, width, height) = input;
        let buffer = conversion::frame_to_buffer(
            &self.converted_frame,
            width,
            height,
            self.pixel_format.bytes_per_pixel(),
        );

        match self.pixel_format {
            PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| {
                    ActivityError::VideoDecodeError(
                        "Failed to construct RGB image from decoded frame data".to_string(),
                    )
                }),
            PixelFormat::Gray8 => GrayImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| {
                    ActivityError::VideoDecodeError(
                        "Failed to construct grayscale image from decoded frame data".to_string(),
                    )
                }),
        }
    }
}

impl FrameSource for VideoSource {
    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<DynamicImage>, ActivityError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let image = match self.converter.convert(&self.decoded_frame) {
                    Ok(image) => image,
                    Err(error) => {
                        self.finished = true;
                        return Err(error);
                    }
                };
                self.frames_decoded += 1;
                return Ok(Some(image));
            }

            if self.eof_sent {
                self.finished = true;
                log::debug!(
                    "End of stream after {} frame(s): {}",
                    self.frames_decoded,
                    self.path.display()
                );
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    self.read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            self.finished = true;
                            return Err(error.into());
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        self.finished = true;
                        return Err(error.into());
                    }
                    self.eof_sent = true;
                }
                Err(error) => {
                    self.read_errors += 1;
                    log::debug!("Skipping unreadable packet: {error}");
                    if read_errors_exhausted(self.read_errors) {
                        self.finished = true;
                        return Err(ActivityError::VideoDecodeError(format!(
                            "giving up after {} consecutive read errors: {error}",
                            self.read_errors
                        )));
                    }
                }
            }
        }
    }
}

fn read_errors_exhausted(consecutive: u32) -> bool {
    consecutive >= MAX_CONSECUTIVE_READ_ERRORS
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        log::debug!("Releasing video source: {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};

    use super::{FrameConverter, MAX_CONSECUTIVE_READ_ERRORS, read_errors_exhausted};
    use crate::options::PixelFormat;

    #[test]
    fn converter_follows_resolution_changes() {
        let mut converter = FrameConverter::new(PixelFormat::Rgb8);

        let small = VideoFrame::new(Pixel::YUV420P, 64, 48);
        let image = converter.convert(&small).expect("first size");
        assert_eq!((image.width(), image.height()), (64, 48));

        let large = VideoFrame::new(Pixel::YUV420P, 128, 96);
        let image = converter.convert(&large).expect("after resize");
        assert_eq!((image.width(), image.height()), (128, 96));

        let image = converter.convert(&small).expect("back to first size");
        assert_eq!((image.width(), image.height()), (64, 48));
    }

    #[test]
    fn converter_rebuilds_for_new_pixel_format() {
        let mut converter = FrameConverter::new(PixelFormat::Gray8);

        let yuv = VideoFrame::new(Pixel::YUV420P, 32, 32);
        assert!(converter.convert(&yuv).expect("yuv").as_luma8().is_some());

        let rgb = VideoFrame::new(Pixel::RGB24, 32, 32);
        assert!(converter.convert(&rgb).expect("rgb").as_luma8().is_some());
    }

    #[test]
    fn read_errors_have_a_limit() {
        assert!(!read_errors_exhausted(1));
        assert!(!read_errors_exhausted(MAX_CONSECUTIVE_READ_ERRORS - 1));
        assert!(read_errors_exhausted(MAX_CONSECUTIVE_READ_ERRORS));
    }
}
