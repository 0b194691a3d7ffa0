// SPDX-License-Identifier: GPL-3.0-only

//! EAN-13 / EAN-8 barcode detection task
//!
//! Linear barcodes are read along horizontal scanlines. Each scanline is
//! binarized at the midpoint of its darkest and brightest pixel, turned into
//! alternating dark/light runs, and every dark run is tried as the start
//! guard of an EAN symbol. Digits are matched against the L, G and R width
//! tables, the EAN-13 leading digit is recovered from the L/G parity
//! pattern, and the checksum must hold. Rows are also read right to left so
//! upside-down codes decode.

use crate::app::frame_processor::types::{BoundingRect, DecodedSymbol, SymbolType};
use image::GrayImage;
use tracing::{debug, trace};

/// L-code bar widths (space, bar, space, bar) per digit.
///
/// R-codes use the same widths starting with a bar; G-codes are the L
/// widths reversed.
pub(crate) const L_CODES: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// L/G parity of the six left-hand digits for each EAN-13 leading digit.
/// Bit 5 is the first left digit; a set bit means G.
pub(crate) const FIRST_DIGIT_PARITY: [u8; 10] = [
    0b000000, 0b001011, 0b001101, 0b001110, 0b010011, 0b011001, 0b011100, 0b010101, 0b010110,
    0b011010,
];

/// Minimum light run before the start guard and after the end guard
const QUIET_ZONE_MODULES: f32 = 3.0;

/// Accepted total deviation (in modules) between a digit and its best code
const MAX_DIGIT_ERROR: f32 = 1.5;

/// Scanlines with less spread than this between dark and light are skipped
const MIN_CONTRAST: u8 = 48;

/// Guard bars may deviate this far from one module
const GUARD_TOLERANCE: (f32, f32) = (0.5, 1.6);

/// EAN symbol layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Ean13,
    Ean8,
}

impl Layout {
    fn half_digits(self) -> usize {
        match self {
            Self::Ean13 => 6,
            Self::Ean8 => 4,
        }
    }

    fn modules(self) -> usize {
        // guards 3 + 5 + 3, 7 modules per encoded digit
        11 + 7 * 2 * self.half_digits()
    }

    fn run_count(self) -> usize {
        3 + 4 * self.half_digits() + 5 + 4 * self.half_digits() + 3
    }

    fn symbol_type(self) -> SymbolType {
        match self {
            Self::Ean13 => SymbolType::Ean13,
            Self::Ean8 => SymbolType::Ean8,
        }
    }
}

/// A maximal stretch of same-colored pixels on a scanline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    dark: bool,
    start: usize,
    len: usize,
}

/// A symbol decoded on a single scanline
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinearHit {
    symbol_type: SymbolType,
    data: String,
    x_start: usize,
    x_end: usize,
}

/// Accumulates hits of the same symbol across scanlines
struct Merged {
    symbol_type: SymbolType,
    data: String,
    x_start: usize,
    x_end: usize,
    y_first: u32,
    y_last: u32,
}

/// EAN-13 / EAN-8 barcode detector
#[derive(Debug, Clone, Copy)]
pub struct EanDetector {
    /// Rows between scanlines
    scanline_step: u32,
}

impl Default for EanDetector {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_SCANLINE_STEP)
    }
}

impl EanDetector {
    pub fn new(scanline_step: u32) -> Self {
        Self {
            scanline_step: scanline_step.max(1),
        }
    }

    /// Detect and decode all EAN symbols in a grayscale frame
    pub fn detect(&self, gray: &GrayImage) -> Vec<DecodedSymbol> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let step = self.scanline_step;
        let mut merged: Vec<Merged> = Vec::new();
        let mut row = Vec::with_capacity(width as usize);

        let mut y = step / 2;
        while y < height {
            row.clear();
            row.extend((0..width).map(|x| gray.get_pixel(x, y).0[0]));

            for hit in decode_row(&row) {
                trace!(y, data = %hit.data, "Barcode hit on scanline");
                match merged
                    .iter_mut()
                    .find(|m| m.symbol_type == hit.symbol_type && m.data == hit.data)
                {
                    Some(m) => {
                        m.x_start = m.x_start.min(hit.x_start);
                        m.x_end = m.x_end.max(hit.x_end);
                        m.y_last = y;
                    }
                    None => merged.push(Merged {
                        symbol_type: hit.symbol_type,
                        data: hit.data,
                        x_start: hit.x_start,
                        x_end: hit.x_end,
                        y_first: y,
                        y_last: y,
                    }),
                }
            }

            y += step;
        }

        let half_step = step / 2;
        merged
            .into_iter()
            .map(|m| {
                let top = m.y_first.saturating_sub(half_step);
                let bottom = (m.y_last + half_step + 1).min(height);
                let rect = BoundingRect::new(
                    m.x_start as i32,
                    top as i32,
                    (m.x_end - m.x_start) as u32,
                    bottom - top,
                );
                debug!(
                    symbol_type = %m.symbol_type,
                    content = %m.data,
                    x = rect.x,
                    y = rect.y,
                    "Detected barcode"
                );
                DecodedSymbol::new(m.symbol_type, m.data, rect, Vec::new())
            })
            .collect()
    }
}

/// Decode every EAN symbol crossing a scanline, in both directions
fn decode_row(row: &[u8]) -> Vec<LinearHit> {
    let Some(threshold) = row_threshold(row) else {
        return Vec::new();
    };

    let mut hits = scan_runs(&runs_of(row.iter().copied(), threshold));

    let reversed = runs_of(row.iter().rev().copied(), threshold);
    for mut hit in scan_runs(&reversed) {
        let (start, end) = (row.len() - hit.x_end, row.len() - hit.x_start);
        hit.x_start = start;
        hit.x_end = end;
        if !hits
            .iter()
            .any(|h| h.symbol_type == hit.symbol_type && h.data == hit.data)
        {
            hits.push(hit);
        }
    }

    hits
}

/// Midpoint threshold, or `None` when the row is too flat to hold bars
fn row_threshold(row: &[u8]) -> Option<u8> {
    let min = *row.iter().min()?;
    let max = *row.iter().max()?;
    if max - min < MIN_CONTRAST {
        return None;
    }
    Some(((min as u16 + max as u16) / 2) as u8)
}

fn runs_of(pixels: impl Iterator<Item = u8>, threshold: u8) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (x, value) in pixels.enumerate() {
        let dark = value < threshold;
        match runs.last_mut() {
            Some(run) if run.dark == dark => run.len += 1,
            _ => runs.push(Run {
                dark,
                start: x,
                len: 1,
            }),
        }
    }
    runs
}

fn scan_runs(runs: &[Run]) -> Vec<LinearHit> {
    let mut hits = Vec::new();
    let mut i = 0;
    while i < runs.len() {
        if runs[i].dark {
            if let Some((layout, hit)) = [Layout::Ean13, Layout::Ean8]
                .into_iter()
                .find_map(|layout| decode_at(runs, i, layout).map(|hit| (layout, hit)))
            {
                i += layout.run_count();
                hits.push(hit);
                continue;
            }
        }
        i += 1;
    }
    hits
}

/// Try to read a symbol whose start guard begins at `runs[i]`
fn decode_at(runs: &[Run], i: usize, layout: Layout) -> Option<LinearHit> {
    let needed = layout.run_count();
    let window = runs.get(i..i + needed)?;
    if !window[0].dark {
        return None;
    }

    let total: usize = window.iter().map(|r| r.len).sum();
    let unit = total as f32 / layout.modules() as f32;
    if unit < 1.0 {
        return None;
    }

    let quiet = QUIET_ZONE_MODULES * unit;
    if i > 0 && (runs[i - 1].len as f32) < quiet {
        return None;
    }
    if let Some(after) = runs.get(i + needed)
        && (after.len as f32) < quiet
    {
        return None;
    }

    let half = layout.half_digits();
    let mut digits: Vec<u8> = Vec::with_capacity(2 * half + 1);
    let mut parity = 0u8;
    let mut cursor = 0;

    check_guard(&window[cursor..cursor + 3], unit)?;
    cursor += 3;

    for _ in 0..half {
        let allow_g = layout == Layout::Ean13;
        let (digit, is_g) = match_left_digit(&window[cursor..cursor + 4], unit, allow_g)?;
        parity = (parity << 1) | u8::from(is_g);
        digits.push(digit);
        cursor += 4;
    }

    check_guard(&window[cursor..cursor + 5], unit)?;
    cursor += 5;

    for _ in 0..half {
        let digit = match_digit(&window[cursor..cursor + 4], unit, &L_CODES)?;
        digits.push(digit);
        cursor += 4;
    }

    check_guard(&window[cursor..cursor + 3], unit)?;

    if layout == Layout::Ean13 {
        let first = FIRST_DIGIT_PARITY.iter().position(|&p| p == parity)? as u8;
        digits.insert(0, first);
    }

    if !checksum_valid(&digits) {
        return None;
    }

    let last = window[needed - 1];
    Some(LinearHit {
        symbol_type: layout.symbol_type(),
        data: digits.iter().map(|d| char::from(b'0' + d)).collect(),
        x_start: window[0].start,
        x_end: last.start + last.len,
    })
}

fn check_guard(runs: &[Run], unit: f32) -> Option<()> {
    let (low, high) = GUARD_TOLERANCE;
    runs.iter()
        .all(|r| {
            let modules = r.len as f32 / unit;
            (low..=high).contains(&modules)
        })
        .then_some(())
}

/// Match a left-hand digit against L (and, for EAN-13, G) codes
fn match_left_digit(runs: &[Run], unit: f32, allow_g: bool) -> Option<(u8, bool)> {
    let g_codes = g_codes();
    let l = digit_error(runs, unit, &L_CODES);
    let g = if allow_g {
        digit_error(runs, unit, &g_codes)
    } else {
        None
    };
    match (l, g) {
        (Some((dl, el)), Some((dg, eg))) => Some(if eg < el { (dg, true) } else { (dl, false) }),
        (Some((dl, _)), None) => Some((dl, false)),
        (None, Some((dg, _))) => Some((dg, true)),
        (None, None) => None,
    }
}

fn match_digit(runs: &[Run], unit: f32, codes: &[[u8; 4]; 10]) -> Option<u8> {
    digit_error(runs, unit, codes).map(|(digit, _)| digit)
}

/// Best matching digit and its total width error in modules
fn digit_error(runs: &[Run], unit: f32, codes: &[[u8; 4]; 10]) -> Option<(u8, f32)> {
    let sum: usize = runs.iter().map(|r| r.len).sum();
    let sum = sum as f32;
    if sum < 5.0 * unit || sum > 9.0 * unit {
        return None;
    }
    let module = sum / 7.0;

    let (digit, error) = codes
        .iter()
        .enumerate()
        .map(|(digit, widths)| {
            let error: f32 = runs
                .iter()
                .zip(widths)
                .map(|(run, &w)| (run.len as f32 / module - w as f32).abs())
                .sum();
            (digit as u8, error)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    (error <= MAX_DIGIT_ERROR).then_some((digit, error))
}

pub(crate) fn g_codes() -> [[u8; 4]; 10] {
    L_CODES.map(|[a, b, c, d]| [d, c, b, a])
}

/// EAN check digit rule: weights 3 and 1 alternate leftwards from the last data digit
pub(crate) fn checksum_valid(digits: &[u8]) -> bool {
    let Some((&check, data)) = digits.split_last() else {
        return false;
    };
    let sum: u32 = data
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    (10 - sum % 10) % 10 == check as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Module pattern (true = bar) for an EAN-13 or EAN-8 payload
    fn encode(payload: &str) -> Vec<bool> {
        let digits: Vec<u8> = payload.bytes().map(|b| b - b'0').collect();
        let (parity, left, right) = match digits.len() {
            13 => (FIRST_DIGIT_PARITY[digits[0] as usize], &digits[1..7], &digits[7..13]),
            8 => (0, &digits[0..4], &digits[4..8]),
            n => panic!("unsupported length {n}"),
        };

        let mut modules = Vec::new();
        let push_widths = |modules: &mut Vec<bool>, widths: [u8; 4], first_dark: bool| {
            for (k, w) in widths.iter().enumerate() {
                let dark = (k % 2 == 0) == first_dark;
                modules.extend(std::iter::repeat_n(dark, *w as usize));
            }
        };

        modules.extend([true, false, true]);
        for (k, &d) in left.iter().enumerate() {
            let is_g = parity & (1 << (left.len() - 1 - k)) != 0;
            let widths = if is_g { g_codes()[d as usize] } else { L_CODES[d as usize] };
            push_widths(&mut modules, widths, false);
        }
        modules.extend([false, true, false, true, false]);
        for &d in right {
            push_widths(&mut modules, L_CODES[d as usize], true);
        }
        modules.extend([true, false, true]);
        modules
    }

    fn render(modules: &[bool], module_px: u32, quiet: u32, height: u32, flip: bool) -> GrayImage {
        let width = (modules.len() as u32 + 2 * quiet) * module_px;
        GrayImage::from_fn(width, height, |x, _| {
            let x = if flip { width - 1 - x } else { x };
            let m = (x / module_px) as i64 - quiet as i64;
            let dark = m >= 0 && (m as usize) < modules.len() && modules[m as usize];
            Luma([if dark { 0 } else { 255 }])
        })
    }

    #[test]
    fn test_checksum() {
        assert!(checksum_valid(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 1]));
        assert!(!checksum_valid(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 2]));
        assert!(checksum_valid(&[9, 6, 3, 8, 5, 0, 7, 4]));
        assert!(!checksum_valid(&[]));
    }

    #[test]
    fn test_ean13_pattern_length() {
        assert_eq!(encode("4006381333931").len(), Layout::Ean13.modules());
        assert_eq!(encode("96385074").len(), Layout::Ean8.modules());
    }

    #[test]
    fn test_decode_ean13() {
        let image = render(&encode("4006381333931"), 3, 10, 32, false);
        let found = EanDetector::new(8).detect(&image);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].symbol_type, SymbolType::Ean13);
        assert_eq!(found[0].data, "4006381333931");
        assert_eq!(found[0].rect.x, 30);
        assert_eq!(found[0].rect.width, 95 * 3);
        assert!(found[0].polygon.is_empty());
    }

    #[test]
    fn test_decode_ean8() {
        let image = render(&encode("96385074"), 2, 10, 24, false);
        let found = EanDetector::new(8).detect(&image);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].symbol_type, SymbolType::Ean8);
        assert_eq!(found[0].data, "96385074");
    }

    #[test]
    fn test_decode_upside_down() {
        let image = render(&encode("5901234123457"), 3, 10, 16, true);
        let found = EanDetector::new(4).detect(&image);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data, "5901234123457");
        assert_eq!(found[0].rect.x, 30);
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Last digit altered: bars are well formed but the check digit is wrong
        let image = render(&encode("4006381333932"), 3, 10, 16, false);
        assert!(EanDetector::new(8).detect(&image).is_empty());
    }

    #[test]
    fn test_flat_frame_has_no_codes() {
        let image = GrayImage::from_pixel(100, 20, Luma([128]));
        assert!(EanDetector::default().detect(&image).is_empty());
    }
}
