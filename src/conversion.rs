//! Internal conversion helpers.
//!
//! Pixel-plane copying and rate conversion shared by the FFmpeg-backed
//! [`VideoSource`](crate::VideoSource).

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy the first plane of a packed video frame into a tightly-packed buffer.
///
/// FFmpeg pads rows for alignment, so the stride can be larger than
/// `width × bytes_per_pixel`. Padding is stripped row by row in that case.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_length {
        data[..row_length * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_length * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_length]);
        }
        buffer
    }
}

/// Convert a frame-rate rational to frames per second.
///
/// Returns `None` for a zero numerator or denominator.
pub(crate) fn rational_to_frames_per_second(rate: Rational) -> Option<f64> {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return None;
    }
    Some(rate.numerator() as f64 / rate.denominator() as f64)
}
