// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! Each detector handles one symbology; [`CodeDetector`] runs all of them on
//! a frame and returns the combined records.

pub mod ean_detector;
pub mod qr_detector;

pub use ean_detector::EanDetector;
pub use qr_detector::QrDetector;

use crate::app::frame_processor::types::DecodedSymbol;
use image::RgbImage;
use tracing::trace;

/// Runs every symbology detector on a frame
///
/// Holds configuration only; no state carries over between frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeDetector {
    qr: QrDetector,
    ean: EanDetector,
}

impl CodeDetector {
    pub fn new(scanline_step: u32) -> Self {
        Self {
            qr: QrDetector::new(),
            ean: EanDetector::new(scanline_step),
        }
    }

    /// Decode every QR code and barcode in the frame.
    ///
    /// Zero detections is an empty list, never an error.
    pub fn detect(&self, frame: &RgbImage) -> Vec<DecodedSymbol> {
        let start = std::time::Instant::now();
        let gray = image::imageops::grayscale(frame);

        let mut symbols = self.qr.detect(&gray);
        for symbol in self.ean.detect(&gray) {
            merge_symbol(&mut symbols, symbol);
        }

        trace!(
            count = symbols.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Frame decoded"
        );
        symbols
    }
}

/// Add `symbol`, folding it into an existing record with the same type and payload
fn merge_symbol(symbols: &mut Vec<DecodedSymbol>, symbol: DecodedSymbol) {
    match symbols
        .iter_mut()
        .find(|s| s.symbol_type == symbol.symbol_type && s.data == symbol.data)
    {
        Some(existing) => existing.rect = existing.rect.union(&symbol.rect),
        None => symbols.push(symbol),
    }
}
