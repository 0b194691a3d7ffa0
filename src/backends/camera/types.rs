// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use std::fmt;

/// Pixel formats the frame converters understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Motion JPEG, one JPEG image per buffer
    Mjpeg,
    /// Packed YUV 4:2:2, Y0 U Y1 V
    Yuyv,
    /// Packed YUV 4:2:2, U Y0 V Y1
    Uyvy,
    /// Packed 8-bit RGB
    Rgb24,
    /// 8-bit grayscale
    Gray8,
}

impl PixelFormat {
    /// Preference order when negotiating with a device
    pub const PREFERRED: [PixelFormat; 5] = [
        PixelFormat::Mjpeg,
        PixelFormat::Yuyv,
        PixelFormat::Uyvy,
        PixelFormat::Rgb24,
        PixelFormat::Gray8,
    ];

    /// V4L2 fourcc code
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Self::Mjpeg => *b"MJPG",
            Self::Yuyv => *b"YUYV",
            Self::Uyvy => *b"UYVY",
            Self::Rgb24 => *b"RGB3",
            Self::Gray8 => *b"GREY",
        }
    }

    /// Parse a V4L2 fourcc code
    pub fn from_fourcc(code: &[u8; 4]) -> Option<Self> {
        Self::PREFERRED
            .into_iter()
            .find(|format| &format.fourcc() == code)
    }

    /// Bytes per frame for uncompressed formats
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        let pixels = width as usize * height as usize;
        match self {
            Self::Mjpeg => None,
            Self::Yuyv | Self::Uyvy => Some(pixels * 2),
            Self::Rgb24 => Some(pixels * 3),
            Self::Gray8 => Some(pixels),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.fourcc()))
    }
}

/// Negotiated capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

impl fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
    }
}

/// A capture device found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Index used in `/dev/video{index}`
    pub index: usize,
    /// Human-readable name (V4L2 card)
    pub name: String,
    /// Device node path
    pub path: String,
    /// Fourcc codes the device advertises, as text
    pub formats: Vec<String>,
}
