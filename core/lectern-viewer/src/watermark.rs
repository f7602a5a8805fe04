//! Watermark compositor.
//!
//! Stamps the viewer's contact identifiers over a surface as rotated,
//! low-opacity text tiles. Tiles sit on a lattice aligned with the text
//! direction: one step along the text is the text width plus a gap, one
//! step across is three font heights. Boxes therefore never overlap, and
//! every point of the surface is within half a step (in each lattice
//! direction) of some tile anchor.
//!
//! The compositor writes only to [`Layer::Watermark`], which it resets
//! first, so reapplying it after a re-rasterization (zoom, page change)
//! never stacks a second pass on top of the first.

use crate::canvas::{Canvas, Layer, Rgba, TextStamp};
use lectern_types::ViewerIdentity;
use serde::Serialize;
use std::sync::Arc;

/// Fixed tile rotation, in degrees. Negative rises to the right in
/// y-down surface coordinates.
pub const WATERMARK_ANGLE_DEG: f32 = -30.0;

/// Semi-transparent dark fill.
pub const WATERMARK_FILL: Rgba = Rgba::new(0, 0, 0, 0.15);

/// Smallest surface side the tiling is planned for (px).
pub const MIN_SURFACE: u32 = 16;

/// Largest raster side the document viewer will present (px). The tiling
/// itself is laid out over whatever size it is given.
pub const MAX_SURFACE: u32 = 32_768;

const MIN_FONT_PX: f32 = 12.0;
const MAX_FONT_PX: f32 = 28.0;
/// Surface short side divided by this gives the font size.
const FONT_DIVISOR: f32 = 32.0;
/// Gap between neighbouring tiles along the text, in font heights.
const GAP_ALONG_EM: f32 = 2.0;
/// Lattice step across the text, in font heights.
const STEP_ACROSS_EM: f32 = 3.0;

/// Anchor of one tile, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilePlacement {
    pub x: f32,
    pub y: f32,
}

/// Tile geometry for one surface size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkPlan {
    pub width: u32,
    pub height: u32,
    pub font_px: f32,
    pub angle_rad: f32,
    pub text_width: f32,
    /// Lattice step along the text direction.
    pub step_along: f32,
    /// Lattice step perpendicular to the text direction.
    pub step_across: f32,
    pub tiles: Vec<TilePlacement>,
}

impl WatermarkPlan {
    /// Font size used for a surface of the given size.
    pub fn font_px_for(width: u32, height: u32) -> f32 {
        let short = width.min(height).max(MIN_SURFACE) as f32;
        (short / FONT_DIVISOR).clamp(MIN_FONT_PX, MAX_FONT_PX)
    }

    /// Lays out tiles for a `width` x `height` surface and a text of
    /// `text_width` px at `font_px`.
    ///
    /// Sides below `MIN_SURFACE` are planned as `MIN_SURFACE`, which still
    /// covers the smaller surface.
    pub fn compute(width: u32, height: u32, text_width: f32, font_px: f32) -> Self {
        let w = width.max(MIN_SURFACE) as f32;
        let h = height.max(MIN_SURFACE) as f32;
        let angle_rad = WATERMARK_ANGLE_DEG.to_radians();
        let (sin, cos) = angle_rad.sin_cos();

        let text_width = text_width.max(font_px);
        let step_along = text_width + GAP_ALONG_EM * font_px;
        let step_across = STEP_ACROSS_EM * font_px;

        // Anchors up to one full diagonal step outside the surface still
        // cover its edges.
        let margin = step_along.hypot(step_across);
        let (cx, cy) = (w / 2.0, h / 2.0);
        let reach = (w.hypot(h) / 2.0) + margin;
        let max_i = (reach / step_along).ceil() as i32 + 1;
        let max_j = (reach / step_across).ceil() as i32 + 1;

        let mut tiles = Vec::new();
        for j in -max_j..=max_j {
            // Alternate rows are shifted half a step for a brick pattern.
            let row_offset = if j.rem_euclid(2) == 1 { step_along / 2.0 } else { 0.0 };
            let v = j as f32 * step_across;
            for i in -max_i..=max_i {
                let u = i as f32 * step_along + row_offset;
                let x = cx + u * cos - v * sin;
                let y = cy + u * sin + v * cos;
                if x >= -margin && x <= w + margin && y >= -margin && y <= h + margin {
                    tiles.push(TilePlacement { x, y });
                }
            }
        }

        Self {
            width: w as u32,
            height: h as u32,
            font_px,
            angle_rad,
            text_width,
            step_along,
            step_across,
            tiles,
        }
    }

    /// Converts a surface point into lattice coordinates relative to the
    /// surface center.
    pub fn to_lattice(&self, x: f32, y: f32) -> (f32, f32) {
        let (sin, cos) = self.angle_rad.sin_cos();
        let dx = x - self.width as f32 / 2.0;
        let dy = y - self.height as f32 / 2.0;
        (dx * cos + dy * sin, -dx * sin + dy * cos)
    }
}

/// Stamps `identity` over `canvas`, replacing any earlier watermark.
///
/// Returns the number of tiles drawn. A blank identity only clears the
/// watermark layer.
pub fn apply_watermark<C: Canvas + ?Sized>(
    canvas: &mut C,
    width: u32,
    height: u32,
    identity: &ViewerIdentity,
) -> usize {
    canvas.begin_layer(Layer::Watermark);

    let text = identity.watermark_text();
    if text.is_empty() {
        return 0;
    }

    let font_px = WatermarkPlan::font_px_for(width, height);
    let text_width = canvas.measure_text(&text, font_px);
    let plan = WatermarkPlan::compute(width, height, text_width, font_px);
    let text: Arc<str> = text.into();

    for tile in &plan.tiles {
        canvas.fill_text(TextStamp {
            text: text.clone(),
            x: tile.x,
            y: tile.y,
            angle_rad: plan.angle_rad,
            font_px,
            width: plan.text_width,
            fill: WATERMARK_FILL,
        });
    }
    plan.tiles.len()
}
