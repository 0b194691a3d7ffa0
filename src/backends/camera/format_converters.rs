// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion to RGB
//!
//! Every captured buffer is turned into an [`RgbImage`] before detection and
//! drawing, whatever format the device was negotiated to.

use super::types::{CameraFormat, PixelFormat};
use crate::errors::{CameraError, CameraResult};
use image::RgbImage;

/// Convert a raw capture buffer into an RGB frame
pub fn to_rgb_image(format: &CameraFormat, data: &[u8]) -> CameraResult<RgbImage> {
    let rgb = match format.pixel_format {
        PixelFormat::Mjpeg => return decode_mjpeg(data),
        PixelFormat::Yuyv => packed_422_to_rgb(exact_frame(format, data)?, [0, 2, 1, 3]),
        PixelFormat::Uyvy => packed_422_to_rgb(exact_frame(format, data)?, [1, 3, 0, 2]),
        PixelFormat::Rgb24 => exact_frame(format, data)?.to_vec(),
        PixelFormat::Gray8 => exact_frame(format, data)?
            .iter()
            .flat_map(|&v| [v, v, v])
            .collect(),
    };

    RgbImage::from_raw(format.width, format.height, rgb).ok_or_else(|| {
        CameraError::InvalidFormat(format!("buffer does not match {}", format))
    })
}

/// The frame's bytes without driver padding, or an error if the buffer is short
fn exact_frame<'a>(format: &CameraFormat, data: &'a [u8]) -> CameraResult<&'a [u8]> {
    let expected = format
        .pixel_format
        .frame_size(format.width, format.height)
        .unwrap_or(data.len());
    data.get(..expected).ok_or_else(|| {
        CameraError::CaptureFailed(format!(
            "short {} buffer: {} of {} bytes",
            format.pixel_format,
            data.len(),
            expected
        ))
    })
}

/// Decode one Motion-JPEG buffer
pub fn decode_mjpeg(data: &[u8]) -> CameraResult<RgbImage> {
    image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map(|img| img.to_rgb8())
        .map_err(|e| CameraError::CaptureFailed(format!("MJPEG decode failed: {}", e)))
}

/// Convert packed 4:2:2 YUV to RGB
///
/// `layout` gives the byte offsets of Y0, Y1, U and V within each 4-byte
/// group (two pixels). Uses BT.601 coefficients.
fn packed_422_to_rgb(data: &[u8], layout: [usize; 4]) -> Vec<u8> {
    let [y0_at, y1_at, u_at, v_at] = layout;
    let mut rgb = Vec::with_capacity(data.len() / 2 * 3);

    for chunk in data.chunks_exact(4) {
        let u = chunk[u_at];
        let v = chunk[v_at];
        for luma in [chunk[y0_at], chunk[y1_at]] {
            let (r, g, b) = yuv_to_rgb(luma, u, v);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    rgb
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
