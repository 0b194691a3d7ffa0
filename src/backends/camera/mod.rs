// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │    Scanner loop     │
//! └──────────┬──────────┘
//!            │ read_frame()
//!            ▼
//! ┌─────────────────────┐
//! │     SourceGuard     │  ← releases the device exactly once
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ FrameSource trait   │
//! └──────────┬──────────┘
//!            │
//!            ▼
//!       ┌────────┐
//!       │  V4L2  │  ← /dev/video{index}
//!       └────────┘
//! ```

pub mod format_converters;
pub mod types;
pub mod v4l2;
pub mod v4l2_utils;

pub use types::*;
pub use v4l2::V4l2FrameSource;

use crate::errors::{CameraError, CameraResult};
use image::RgbImage;
use tracing::{debug, warn};

/// A device that produces RGB frames on demand
pub trait FrameSource {
    /// Block until the next frame is available.
    ///
    /// An error means the stream is over (device lost, or already released);
    /// callers stop reading and release the source.
    fn read_frame(&mut self) -> CameraResult<RgbImage>;

    /// Stop streaming and give the device back
    fn release(&mut self);
}

/// Owns a [`FrameSource`] and releases it exactly once
///
/// Release happens on the first explicit [`SourceGuard::release`] call or on
/// drop, including drops during unwinding.
pub struct SourceGuard<S: FrameSource> {
    source: S,
    released: bool,
}

impl<S: FrameSource> SourceGuard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    pub fn read_frame(&mut self) -> CameraResult<RgbImage> {
        if self.released {
            return Err(CameraError::Disconnected);
        }
        self.source.read_frame()
    }

    /// Release the source; later calls do nothing
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!("Releasing frame source");
        self.source.release();
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<S: FrameSource> Drop for SourceGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Pull buffers until one converts to a frame
///
/// `next` returns the dequeue result wrapping the conversion result. A
/// dequeue error ends the stream at once; a buffer that fails to convert
/// (a torn MJPEG frame, say) is skipped, up to `max_skipped` in a row.
pub fn next_decodable(
    max_skipped: u32,
    mut next: impl FnMut() -> CameraResult<CameraResult<RgbImage>>,
) -> CameraResult<RgbImage> {
    let mut skipped = 0;
    loop {
        match next()? {
            Ok(frame) => return Ok(frame),
            Err(err) if skipped < max_skipped => {
                skipped += 1;
                warn!(error = %err, skipped, "Skipping undecodable frame");
            }
            Err(err) => return Err(err),
        }
    }
}
