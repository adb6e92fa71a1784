//! Software raster for whiteboard replay.
//!
//! Rasterization is deterministic: a pixel is painted when its center lies
//! inside the primitive's stroked outline. Replaying the same operations onto
//! two blank rasters of the same size yields identical pixels, which is what
//! lets peers converge on the same picture from the same operation stream.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use frames::{DrawKind, DrawOp, Point};

use crate::consts::{GLYPH_ADVANCE, GLYPH_ASCENT, TEXT_SIZE_PER_WIDTH};

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self { r: 0xFF, g: 0xFF, b: 0xFF };
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS hex color in `#rgb` or `#rrggbb` form.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn parse(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix('#')?;
        let nibbles = hex.chars().map(|c| c.to_digit(16).map(|d| d as u8)).collect::<Option<Vec<u8>>>()?;
        match nibbles.as_slice() {
            [r, g, b] => Some(Self::new(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => Some(Self::new((r1 << 4) | r0, (g1 << 4) | g0, (b1 << 4) | b0)),
            _ => None,
        }
    }
}

/// Fixed-size pixel grid, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Raster {
    /// Blank raster filled with the background color.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![Rgb::WHITE; width * height] }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(x, y)`, or `None` outside the raster.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Number of pixels currently painted `color`.
    #[must_use]
    pub fn count(&self, color: Rgb) -> usize {
        self.pixels.iter().filter(|px| **px == color).count()
    }

    /// True when every pixel is the background color.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|px| *px == Rgb::WHITE)
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Replay one drawing operation.
    pub fn draw(&mut self, op: &DrawOp) {
        let color = Rgb::parse(op.stroke_color()).unwrap_or(Rgb::BLACK);
        match op.kind {
            DrawKind::Free | DrawKind::Line => self.stroke_segment(op.start, op.end, op.line_width, color),
            DrawKind::Rectangle => self.stroke_rect(op.start, op.end, op.line_width, color),
            DrawKind::Circle => self.stroke_circle(op.start, op.radius(), op.line_width, color),
            DrawKind::Text => {
                if let Some(text) = &op.text {
                    self.fill_text(op.start, text, op.line_width * TEXT_SIZE_PER_WIDTH, color);
                }
            }
        }
    }

    /// Round-capped segment of the given stroke width.
    pub fn stroke_segment(&mut self, a: Point, b: Point, width: f64, color: Rgb) {
        let half = half_width(width);
        let min = Point::new(a.x.min(b.x) - half, a.y.min(b.y) - half);
        let max = Point::new(a.x.max(b.x) + half, a.y.max(b.y) + half);
        self.paint_where(min, max, color, |p| distance_to_segment(p, a, b) <= half);
    }

    /// Axis-aligned rectangle outline with corners at `a` and `b`.
    pub fn stroke_rect(&mut self, a: Point, b: Point, width: f64, color: Rgb) {
        let corners = [a, Point::new(b.x, a.y), b, Point::new(a.x, b.y)];
        for (from, to) in corners.iter().zip(corners.iter().cycle().skip(1)) {
            self.stroke_segment(*from, *to, width, color);
        }
    }

    /// Circle outline centered on `center`.
    pub fn stroke_circle(&mut self, center: Point, radius: f64, width: f64, color: Rgb) {
        let half = half_width(width);
        let reach = radius + half;
        let min = Point::new(center.x - reach, center.y - reach);
        let max = Point::new(center.x + reach, center.y + reach);
        self.paint_where(min, max, color, |p| (p.distance(center) - radius).abs() <= half);
    }

    /// Text as one solid block per non-blank glyph, anchored on the baseline.
    #[allow(clippy::cast_precision_loss)]
    pub fn fill_text(&mut self, at: Point, text: &str, size: f64, color: Rgb) {
        let advance = size * GLYPH_ADVANCE;
        let top = at.y - size * GLYPH_ASCENT;
        for (i, glyph) in text.chars().enumerate() {
            if glyph.is_whitespace() {
                continue;
            }
            let left = at.x + advance * i as f64;
            let min = Point::new(left + advance * 0.1, top);
            let max = Point::new(left + advance * 0.9, at.y);
            self.paint_where(min, max, color, |p| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn paint_where(&mut self, min: Point, max: Point, color: Rgb, inside: impl Fn(Point) -> bool) {
        let x0 = clamp_index(min.x.floor(), self.width);
        let x1 = clamp_index(max.x.ceil() + 1.0, self.width);
        let y0 = clamp_index(min.y.floor(), self.height);
        let y1 = clamp_index(max.y.ceil() + 1.0, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if !inside(center) {
                    continue;
                }
                if let Some(px) = self.pixels.get_mut(y * self.width + x) {
                    *px = color;
                }
            }
        }
    }
}

fn half_width(width: f64) -> f64 {
    (width / 2.0).max(0.5)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn clamp_index(value: f64, limit: usize) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= limit as f64 {
        limit
    } else {
        value as usize
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}
