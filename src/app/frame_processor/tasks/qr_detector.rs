// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! Frames are converted to grayscale, searched for finder patterns and
//! each grid found is decoded. Payload bytes are decoded lossily so that a
//! code carrying non-UTF-8 data still produces a record.

use crate::app::frame_processor::types::{DecodedSymbol, PixelPoint, SymbolType, payload_to_text};
use image::GrayImage;
use tracing::{debug, trace};

/// QR code detector
///
/// Stateless: every call to [`QrDetector::detect`] depends only on the frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDetector;

impl QrDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect and decode all QR codes in a grayscale frame
    pub fn detect(&self, gray: &GrayImage) -> Vec<DecodedSymbol> {
        let start = std::time::Instant::now();

        let (width, height) = gray.dimensions();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                gray.get_pixel(x as u32, y as u32).0[0]
            });

        let grids = prepared.detect_grids();
        trace!(
            count = grids.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "QR grid search complete"
        );

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            let mut payload = Vec::new();
            let meta = match grid.decode_to(&mut payload) {
                Ok(meta) => meta,
                Err(e) => {
                    // A grid that fails error correction is not a detection
                    debug!(error = %e, "Failed to decode QR grid");
                    continue;
                }
            };

            let polygon: Vec<PixelPoint> = grid
                .bounds
                .iter()
                .map(|p| PixelPoint::new(p.x, p.y))
                .collect();

            let data = payload_to_text(&payload);
            debug!(
                content = %data,
                version = meta.version.0,
                ecc_level = meta.ecc_level,
                "Detected QR code"
            );

            detections.push(DecodedSymbol::from_polygon(SymbolType::QrCode, data, polygon));
        }

        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::types::BoundingRect;
    use image::Luma;

    /// Render `payload` as a QR code, `module_px` pixels per module
    fn render(payload: &[u8], module_px: u32, quiet: u32) -> GrayImage {
        let code = qrcode::QrCode::new(payload).unwrap();
        let modules = code.width() as i64;
        let colors = code.to_colors();
        let size = (modules as u32 + 2 * quiet) * module_px;
        GrayImage::from_fn(size, size, |x, y| {
            let mx = (x / module_px) as i64 - quiet as i64;
            let my = (y / module_px) as i64 - quiet as i64;
            let inside = (0..modules).contains(&mx) && (0..modules).contains(&my);
            let dark = inside && colors[(my * modules + mx) as usize] == qrcode::Color::Dark;
            Luma([if dark { 0 } else { 255 }])
        })
    }

    #[test]
    fn test_blank_frame_has_no_codes() {
        let gray = GrayImage::from_pixel(64, 48, Luma([255]));
        assert!(QrDetector::new().detect(&gray).is_empty());
    }

    #[test]
    fn test_noise_frame_has_no_codes() {
        // Deterministic stripes, nothing resembling finder patterns
        let gray = GrayImage::from_fn(80, 60, |x, _| Luma([if (x / 3) % 2 == 0 { 0 } else { 255 }]));
        assert!(QrDetector::new().detect(&gray).is_empty());
    }

    #[test]
    fn test_decode_url_code() {
        let (module_px, quiet) = (6, 4);
        let gray = render(b"https://example.com", module_px, quiet);
        let found = QrDetector::new().detect(&gray);

        assert_eq!(found.len(), 1);
        let symbol = &found[0];
        assert_eq!(symbol.symbol_type, SymbolType::QrCode);
        assert_eq!(symbol.data, "https://example.com");
        assert_eq!(symbol.polygon.len(), 4);
        assert_eq!(BoundingRect::enclosing(&symbol.polygon), Some(symbol.rect));

        // Corners land on the code's outer edge, give or take a module
        let modules = qrcode::QrCode::new(b"https://example.com").unwrap().width() as u32;
        let offset = (quiet * module_px) as i32;
        let tolerance = 2 * module_px;
        assert!(symbol.rect.x.abs_diff(offset) <= tolerance, "rect {:?}", symbol.rect);
        assert!(symbol.rect.y.abs_diff(offset) <= tolerance, "rect {:?}", symbol.rect);
        assert!(
            symbol.rect.width.abs_diff(modules * module_px) <= tolerance,
            "rect {:?}",
            symbol.rect
        );
    }

    #[test]
    fn test_invalid_utf8_payload_uses_placeholder() {
        let gray = render(b"ok\xff\xfe", 6, 4);
        let found = QrDetector::new().detect(&gray);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data, "ok\u{FFFD}\u{FFFD}");
    }
}
