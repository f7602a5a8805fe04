//! Drawing seam and layered display lists.
//!
//! Renderers never draw straight to the screen. They build a
//! [`DisplayList`] (a page raster on the content layer, identity stamps on
//! the watermark layer) and hand the finished frame to a
//! [`FramePresenter`].

use std::collections::BTreeMap;
use std::sync::Arc;

/// Approximate glyph advance as a fraction of the font size, used when no
/// real text shaper is available.
const APPROX_ADVANCE_EM: f32 = 0.6;

/// An sRGB color with straight alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Stacking layers of a frame, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Content,
    Watermark,
}

/// A rasterized page in RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRaster {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PageRaster {
    /// Wraps an RGBA8 buffer. Returns `None` if the length doesn't match.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (rgba.len() == expected).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    /// An opaque white page.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0xff; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// A single line of text drawn centered on `(x, y)` and rotated by
/// `angle_rad` around that point.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStamp {
    pub text: Arc<str>,
    pub x: f32,
    pub y: f32,
    pub angle_rad: f32,
    pub font_px: f32,
    /// Measured advance width of `text`.
    pub width: f32,
    pub fill: Rgba,
}

impl TextStamp {
    /// Returns true if `(px, py)` falls inside the stamp's rotated box.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        let (sin, cos) = self.angle_rad.sin_cos();
        let dx = px - self.x;
        let dy = py - self.y;
        let u = dx * cos + dy * sin;
        let v = -dx * sin + dy * cos;
        u.abs() <= self.width / 2.0 && v.abs() <= self.font_px / 2.0
    }
}

/// A recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Raster(Arc<PageRaster>),
    Text(TextStamp),
}

/// The drawing surface renderers and the compositor target.
pub trait Canvas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Makes `layer` current and discards whatever it held.
    fn begin_layer(&mut self, layer: Layer);

    /// Draws a raster scaled to the full surface on the current layer.
    fn draw_raster(&mut self, raster: Arc<PageRaster>);

    /// Draws a text stamp on the current layer.
    fn fill_text(&mut self, stamp: TextStamp);

    /// Advance width of `text` at `font_px`.
    fn measure_text(&self, text: &str, font_px: f32) -> f32 {
        text.chars().count() as f32 * font_px * APPROX_ADVANCE_EM
    }
}

/// Receives finished frames.
pub trait FramePresenter: Send + Sync {
    /// Shows `frame`, replacing whatever was shown before.
    fn present(&self, frame: DisplayList);

    /// Removes the current frame (viewer unmounted or switched).
    fn clear(&self);
}

/// A [`Canvas`] that records operations per layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList {
    width: u32,
    height: u32,
    layers: BTreeMap<Layer, Vec<DrawOp>>,
    current: Layer,
}

impl DisplayList {
    /// An empty frame of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: BTreeMap::new(),
            current: Layer::Content,
        }
    }

    /// Operations recorded on `layer`.
    pub fn ops(&self, layer: Layer) -> &[DrawOp] {
        self.layers.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Text stamps on the watermark layer.
    pub fn watermark_stamps(&self) -> impl Iterator<Item = &TextStamp> {
        self.ops(Layer::Watermark).iter().filter_map(|op| match op {
            DrawOp::Text(stamp) => Some(stamp),
            DrawOp::Raster(_) => None,
        })
    }

    /// Combined watermark opacity at a pixel (source-over of every stamp
    /// covering it).
    pub fn watermark_alpha_at(&self, x: f32, y: f32) -> f32 {
        let transparency = self
            .watermark_stamps()
            .filter(|s| s.contains(x, y))
            .fold(1.0_f32, |t, s| t * (1.0 - s.fill.a));
        1.0 - transparency
    }

    /// Total operations over all layers.
    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Canvas for DisplayList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn begin_layer(&mut self, layer: Layer) {
        self.layers.insert(layer, Vec::new());
        self.current = layer;
    }

    fn draw_raster(&mut self, raster: Arc<PageRaster>) {
        self.layers
            .entry(self.current)
            .or_default()
            .push(DrawOp::Raster(raster));
    }

    fn fill_text(&mut self, stamp: TextStamp) {
        self.layers
            .entry(self.current)
            .or_default()
            .push(DrawOp::Text(stamp));
    }
}
