// SPDX-License-Identifier: MPL-2.0

//! Symbol overlay rendering
//!
//! Draws detection results straight into the frame before it is shown:
//!
//! - A closed outline around each symbol (convex hull of its polygon, or its
//!   bounding rectangle when the polygon has fewer than 4 points)
//! - A filled label box above the symbol with `"{type}: {data}"` in it
//!
//! Labels are not clamped to the frame; a symbol near the top edge gets a
//! label that is partly or entirely cut off.

pub mod glyphs;

use crate::app::frame_processor::{BoundingRect, DecodedSymbol, PixelPoint};
use crate::constants::overlay::{
    LABEL_BASELINE_OFFSET, LABEL_PADDING, LABEL_SCALE, LABEL_TEXT_COLOR, OUTLINE_COLOR,
    OUTLINE_THICKNESS,
};
use glyphs::{GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;

/// Geometry chosen to outline a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outline {
    /// Convex hull of the symbol polygon, in drawing order
    Hull(Vec<PixelPoint>),
    /// Axis-aligned bounding rectangle
    Rect(BoundingRect),
}

/// Measured size of a rendered label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
    /// Space reserved below the text inside the label box
    pub baseline: u32,
}

/// Draw outlines and labels for every symbol and hand the frame back
pub fn annotate(mut frame: RgbImage, symbols: &[DecodedSymbol]) -> RgbImage {
    for symbol in symbols {
        match outline_for(symbol) {
            Outline::Hull(points) => draw_closed_outline(&mut frame, &points, OUTLINE_COLOR),
            Outline::Rect(rect) => draw_rect_outline(&mut frame, rect, OUTLINE_COLOR),
        }
        draw_label(&mut frame, &symbol.label(), symbol.rect);
    }
    frame
}

/// Pick the outline geometry for a symbol
pub fn outline_for(symbol: &DecodedSymbol) -> Outline {
    if !symbol.has_outline() {
        return Outline::Rect(symbol.rect);
    }

    let points: Vec<Point<i32>> = symbol
        .polygon
        .iter()
        .map(|p| Point::new(p.x, p.y))
        .collect();
    let hull = imageproc::geometry::convex_hull(points.as_slice());
    Outline::Hull(hull.into_iter().map(|p| PixelPoint::new(p.x, p.y)).collect())
}

/// Size of `text` as drawn by [`draw_label`]
pub fn measure_label(text: &str) -> TextExtent {
    let chars = text.chars().count() as u32;
    TextExtent {
        width: chars * GLYPH_ADVANCE * LABEL_SCALE,
        height: GLYPH_HEIGHT * LABEL_SCALE,
        baseline: LABEL_SCALE,
    }
}

/// Filled label box sitting directly on top of `anchor`
pub fn label_box(text: &str, anchor: BoundingRect) -> Option<Rect> {
    let extent = measure_label(text);
    let box_height = extent.height + extent.baseline + LABEL_PADDING;
    if extent.width == 0 {
        return None;
    }
    Some(Rect::at(anchor.x, anchor.y - box_height as i32).of_size(extent.width, box_height))
}

fn draw_label(frame: &mut RgbImage, text: &str, anchor: BoundingRect) {
    let Some(background) = label_box(text, anchor) else {
        return;
    };
    draw_filled_rect_mut(frame, background, OUTLINE_COLOR);

    let extent = measure_label(text);
    let top = anchor.y - LABEL_BASELINE_OFFSET as i32 - extent.height as i32;
    draw_text(frame, text, anchor.x, top, LABEL_TEXT_COLOR);
}

fn draw_text(frame: &mut RgbImage, text: &str, left: i32, top: i32, color: Rgb<u8>) {
    let scale = LABEL_SCALE as i32;
    for (index, c) in text.chars().enumerate() {
        let glyph = glyphs::glyph(c);
        let origin_x = left + (index as u32 * GLYPH_ADVANCE) as i32 * scale;
        for col in 0..GLYPH_WIDTH {
            for row in 0..GLYPH_HEIGHT {
                if glyphs::is_set(glyph, col, row) {
                    let x = origin_x + col as i32 * scale;
                    let y = top + row as i32 * scale;
                    draw_filled_rect_mut(frame, Rect::at(x, y).of_size(LABEL_SCALE, LABEL_SCALE), color);
                }
            }
        }
    }
}

fn draw_rect_outline(frame: &mut RgbImage, rect: BoundingRect, color: Rgb<u8>) {
    for inset in 0..OUTLINE_THICKNESS {
        let width = rect.width.saturating_sub(2 * inset).max(1);
        let height = rect.height.saturating_sub(2 * inset).max(1);
        let r = Rect::at(rect.x + inset as i32, rect.y + inset as i32).of_size(width, height);
        draw_hollow_rect_mut(frame, r, color);
    }
}

fn draw_closed_outline(frame: &mut RgbImage, points: &[PixelPoint], color: Rgb<u8>) {
    if points.is_empty() {
        return;
    }
    let next = points.iter().cycle().skip(1);
    for (a, b) in points.iter().zip(next) {
        for dx in 0..OUTLINE_THICKNESS as i32 {
            for dy in 0..OUTLINE_THICKNESS as i32 {
                draw_line_segment_mut(
                    frame,
                    ((a.x + dx) as f32, (a.y + dy) as f32),
                    ((b.x + dx) as f32, (b.y + dy) as f32),
                    color,
                );
            }
        }
    }
}
