// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use image::Rgb;
use std::time::Duration;

/// Title shown on the live preview
pub const WINDOW_TITLE: &str = "QR & Barcode Scanner";

/// How long each loop iteration waits for a key press
pub const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Camera device index used when the configuration does not name one
pub const DEFAULT_DEVICE_INDEX: u32 = 0;

/// Requested capture size; the driver may pick the nearest supported one
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Number of mmap buffers requested from the V4L2 driver
pub const V4L2_BUFFER_COUNT: u32 = 4;

/// Corrupt buffers skipped in a row before the stream counts as lost
pub const MAX_UNDECODABLE_FRAMES: u32 = 30;

/// Payload prefixes that are handed to the system browser
pub const URL_PREFIXES: [&str; 2] = ["http://", "https://"];

/// Overlay drawing parameters
pub mod overlay {
    use super::Rgb;

    /// Outline and label background color
    pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
    /// Label text color
    pub const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
    /// Outline thickness in pixels
    pub const OUTLINE_THICKNESS: u32 = 2;
    /// Each glyph pixel becomes a LABEL_SCALE x LABEL_SCALE block
    pub const LABEL_SCALE: u32 = 2;
    /// Extra space between the label text and the top of the symbol
    pub const LABEL_PADDING: u32 = 4;
    /// Distance from the symbol's top edge to the text baseline
    pub const LABEL_BASELINE_OFFSET: u32 = 5;
}

/// Rows between linear-barcode scanlines
pub const DEFAULT_SCANLINE_STEP: u32 = 8;

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
