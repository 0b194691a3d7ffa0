// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! A [`DecodedSymbol`] lives for exactly one frame: it is produced by the
//! detector, read by the URL dispatcher and the annotator, then dropped.

use std::fmt;

/// Symbol kind reported by the detectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolType {
    /// QR code
    QrCode,
    /// EAN-13 linear barcode (includes UPC-A with a leading zero)
    Ean13,
    /// EAN-8 linear barcode
    Ean8,
}

impl SymbolType {
    /// Tag used in labels and console output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QrCode => "QRCODE",
            Self::Ean13 => "EAN13",
            Self::Ean8 => "EAN8",
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pixel position in frame coordinates, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in integer pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingRect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing every point, or `None` for an empty slice
    pub fn enclosing(points: &[PixelPoint]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x,
            min_y,
            max_x.abs_diff(min_x),
            max_y.abs_diff(min_y),
        ))
    }

    /// Smallest rectangle containing both rectangles
    pub fn union(&self, other: &Self) -> Self {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(left, top, right.abs_diff(left), bottom.abs_diff(top))
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }
}

/// One decoded QR code or barcode in a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    /// Symbol kind
    pub symbol_type: SymbolType,
    /// Payload text; undecodable bytes are replaced with U+FFFD
    pub data: String,
    /// Axis-aligned bounds, always present
    pub rect: BoundingRect,
    /// Outline points in order; fewer than 4 means "draw the rect instead"
    pub polygon: Vec<PixelPoint>,
}

impl DecodedSymbol {
    pub fn new(
        symbol_type: SymbolType,
        data: String,
        rect: BoundingRect,
        polygon: Vec<PixelPoint>,
    ) -> Self {
        Self {
            symbol_type,
            data,
            rect,
            polygon,
        }
    }

    /// Build a record whose rect is derived from its outline
    pub fn from_polygon(symbol_type: SymbolType, data: String, polygon: Vec<PixelPoint>) -> Self {
        let rect = BoundingRect::enclosing(&polygon).unwrap_or(BoundingRect::new(0, 0, 0, 0));
        Self::new(symbol_type, data, rect, polygon)
    }

    /// Overlay label text, `"{type}: {data}"`
    pub fn label(&self) -> String {
        format!("{}: {}", self.symbol_type, self.data)
    }

    /// Whether the outline is usable for drawing
    pub fn has_outline(&self) -> bool {
        self.polygon.len() >= 4
    }
}

/// Decode payload bytes as UTF-8, substituting U+FFFD for invalid sequences
pub fn payload_to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_format() {
        let symbol = DecodedSymbol::new(
            SymbolType::Ean13,
            "4006381333931".to_string(),
            BoundingRect::new(0, 0, 10, 10),
            Vec::new(),
        );
        assert_eq!(symbol.label(), "EAN13: 4006381333931");
    }

    #[test]
    fn test_invalid_utf8_uses_placeholder() {
        let text = payload_to_text(&[b'o', b'k', 0xff, 0xfe]);
        assert!(text.starts_with("ok"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_enclosing_rect() {
        let points = [
            PixelPoint::new(10, 20),
            PixelPoint::new(50, 18),
            PixelPoint::new(48, 60),
            PixelPoint::new(12, 62),
        ];
        let rect = BoundingRect::enclosing(&points).unwrap();
        assert_eq!(rect, BoundingRect::new(10, 18, 40, 44));
        assert!(BoundingRect::enclosing(&[]).is_none());
    }

    #[test]
    fn test_union() {
        let a = BoundingRect::new(0, 0, 10, 10);
        let b = BoundingRect::new(5, -5, 10, 5);
        assert_eq!(a.union(&b), BoundingRect::new(0, -5, 15, 15));
    }

    #[test]
    fn test_short_polygon_has_no_outline() {
        let symbol = DecodedSymbol::from_polygon(
            SymbolType::QrCode,
            "x".to_string(),
            vec![PixelPoint::new(0, 0), PixelPoint::new(4, 0), PixelPoint::new(4, 4)],
        );
        assert!(!symbol.has_outline());
        assert_eq!(symbol.rect, BoundingRect::new(0, 0, 4, 4));
    }
}
