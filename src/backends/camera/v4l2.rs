// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 frame source
//!
//! Opens `/dev/video{index}`, negotiates the first pixel format from
//! [`PixelFormat::PREFERRED`] the driver accepts, and streams frames through
//! memory-mapped buffers.

use super::FrameSource;
use super::format_converters;
use super::types::{CameraFormat, PixelFormat};
use crate::constants::{MAX_UNDECODABLE_FRAMES, V4L2_BUFFER_COUNT};
use crate::errors::{CameraError, CameraResult};
use image::RgbImage;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Live capture from a V4L2 device
pub struct V4l2FrameSource {
    index: usize,
    format: CameraFormat,
    // Dropped before the device
    stream: Option<Stream<'static>>,
    _device: Device,
}

impl V4l2FrameSource {
    /// Open a capture device and start streaming
    ///
    /// Fails if the device node does not exist, cannot be opened, offers none
    /// of the supported pixel formats, or refuses to stream.
    pub fn open(index: usize, width: u32, height: u32) -> CameraResult<Self> {
        info!(index, width, height, "Opening V4L2 capture device");

        let device = Device::new(index).map_err(|e| {
            CameraError::InitializationFailed(format!("/dev/video{}: {}", index, e))
        })?;

        let format = negotiate_format(&device, width, height)?;
        info!(index, format = %format, "V4L2 format configured");

        let stream = Stream::with_buffers(&device, Type::VideoCapture, V4L2_BUFFER_COUNT)
            .map_err(|e| {
                CameraError::InitializationFailed(format!("failed to create stream: {}", e))
            })?;

        Ok(Self {
            index,
            format,
            stream: Some(stream),
            _device: device,
        })
    }
}

impl FrameSource for V4l2FrameSource {
    fn read_frame(&mut self) -> CameraResult<RgbImage> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(CameraError::Disconnected);
        };

        let index = self.index;
        let format = self.format;
        super::next_decodable(MAX_UNDECODABLE_FRAMES, || {
            let (buf, meta) = stream.next().map_err(|e| {
                warn!(index, error = %e, "Failed to dequeue frame");
                CameraError::CaptureFailed(e.to_string())
            })?;

            let used = meta.bytesused as usize;
            let data = if used > 0 && used <= buf.len() {
                &buf[..used]
            } else {
                buf
            };

            Ok(format_converters::to_rgb_image(&format, data))
        })
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            info!(index = self.index, "V4L2 capture stopped");
        }
    }
}

/// Try each preferred pixel format until the driver accepts one we can convert
fn negotiate_format(device: &Device, width: u32, height: u32) -> CameraResult<CameraFormat> {
    for pixel_format in PixelFormat::PREFERRED {
        let request = Format::new(width, height, FourCC::new(&pixel_format.fourcc()));
        let actual = match device.set_format(&request) {
            Ok(actual) => actual,
            Err(e) => {
                debug!(format = %pixel_format, error = %e, "Format rejected");
                continue;
            }
        };

        // Drivers may substitute another format or size
        match PixelFormat::from_fourcc(&actual.fourcc.repr) {
            Some(negotiated) => {
                return Ok(CameraFormat {
                    width: actual.width,
                    height: actual.height,
                    pixel_format: negotiated,
                });
            }
            None => debug!(fourcc = ?actual.fourcc, "Driver offered unsupported format"),
        }
    }

    Err(CameraError::InvalidFormat(
        "device offers no supported pixel format".to_string(),
    ))
}
