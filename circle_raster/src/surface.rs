use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, RgbaImage};

use crate::geometry::{Circle, Point};

/// Non-premultiplied RGBA, one byte per channel.
pub type Color = [u8; 4];

pub const WHITE: Color = [0xFF, 0xFF, 0xFF, 0xFF];
pub const BLACK: Color = [0x00, 0x00, 0x00, 0xFF];
pub const TRANSPARENT: Color = [0x00, 0x00, 0x00, 0x00];

/// Compositing rules the diff passes rely on.
///
/// `Over` is plain source-over. `Atop` writes the source color only where
/// the destination already has non-zero alpha and preserves the destination
/// alpha there; pixels the drawn shape does not cover are never touched by
/// either rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOp {
    Over,
    Atop,
}

/// An addressable RGBA pixel buffer, row-major with top-left origin.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "surface dimensions must be non-zero (got {width}x{height})"
        );
        Ok(Surface {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major from the top-left corner.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Replace the whole buffer with previously read-back pixel data.
    pub fn write_pixels(&mut self, buffer: &[u8]) -> Result<()> {
        ensure!(
            buffer.len() == self.pixels.len(),
            "pixel buffer length {} does not match surface {}x{} ({} bytes)",
            buffer.len(),
            self.width,
            self.height,
            self.pixels.len()
        );
        self.pixels.copy_from_slice(buffer);
        Ok(())
    }

    /// Reset every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    fn composite_at(&mut self, x: u32, y: u32, color: Color, op: CompositeOp) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let dst = &mut self.pixels[idx..idx + 4];
        let sa = color[3] as f32 / 255.0;
        match op {
            CompositeOp::Over => {
                let da = dst[3] as f32 / 255.0;
                let oa = sa + da * (1.0 - sa);
                if oa <= 0.0 {
                    dst.copy_from_slice(&TRANSPARENT);
                    return;
                }
                for channel in 0..3 {
                    let blended = (color[channel] as f32 * sa
                        + dst[channel] as f32 * da * (1.0 - sa))
                        / oa;
                    dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
                }
                dst[3] = (oa * 255.0).round().clamp(0.0, 255.0) as u8;
            }
            CompositeOp::Atop => {
                if dst[3] == 0 {
                    return;
                }
                for channel in 0..3 {
                    let blended =
                        color[channel] as f32 * sa + dst[channel] as f32 * (1.0 - sa);
                    dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
                }
                // destination alpha kept as-is
            }
        }
    }

    /// Fill a circle, compositing `color` under `op` at every covered pixel.
    /// Coverage is binary: a pixel belongs to the circle when its center
    /// lies within the radius.
    pub fn fill_circle(&mut self, circle: &Circle, color: Color, op: CompositeOp) {
        if circle.radius <= 0.0 {
            return;
        }
        let min_x = ((circle.x - circle.radius).floor().max(0.0)) as u32;
        let min_y = ((circle.y - circle.radius).floor().max(0.0)) as u32;
        let max_x = ((circle.x + circle.radius).ceil()).min(self.width as f32 - 1.0);
        let max_y = ((circle.y + circle.radius).ceil()).min(self.height as f32 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let r2 = circle.radius * circle.radius;
        for y in min_y..=max_y as u32 {
            let cy = y as f32 + 0.5 - circle.y;
            for x in min_x..=max_x as u32 {
                let cx = x as f32 + 0.5 - circle.x;
                if cx * cx + cy * cy <= r2 {
                    self.composite_at(x, y, color, op);
                }
            }
        }
    }

    /// Fill the closed polygon formed by `points` (implicitly closed
    /// last -> first) using even-odd scanline coverage. Fewer than three
    /// points describe no interior and fill nothing.
    pub fn fill_closed_path(&mut self, points: &[Point], color: Color, op: CompositeOp) {
        if points.len() < 3 {
            return;
        }
        let mut crossings: Vec<f32> = Vec::new();
        for y in 0..self.height {
            let scan_y = y as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                if (a.y <= scan_y && scan_y < b.y) || (b.y <= scan_y && scan_y < a.y) {
                    let t = (scan_y - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
            crossings.sort_by(|l, r| l.partial_cmp(r).unwrap_or(std::cmp::Ordering::Equal));
            for pair in crossings.chunks_exact(2) {
                let start = pair[0].max(0.0);
                let end = pair[1].min(self.width as f32);
                if end <= start {
                    continue;
                }
                // pixel centers in [start, end)
                let first = (start - 0.5).ceil().max(0.0) as u32;
                let mut x = first;
                while (x as f32 + 0.5) < end && x < self.width {
                    self.composite_at(x, y, color, op);
                    x += 1;
                }
            }
        }
    }

    /// Stroke the closed polygon outline with a solid line of `line_width`
    /// pixels. Used for preview rendering only, so it always draws `Over`.
    pub fn stroke_closed_path(&mut self, points: &[Point], color: Color, line_width: f32) {
        if points.len() < 2 || line_width <= 0.0 {
            return;
        }
        let half = line_width / 2.0;
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            self.stroke_segment(a, b, color, half);
        }
    }

    fn stroke_segment(&mut self, a: Point, b: Point, color: Color, half_width: f32) {
        let min_x = (a.x.min(b.x) - half_width).floor().max(0.0) as u32;
        let min_y = (a.y.min(b.y) - half_width).floor().max(0.0) as u32;
        let max_x = ((a.x.max(b.x) + half_width).ceil() as u32).min(self.width.saturating_sub(1));
        let max_y = ((a.y.max(b.y) + half_width).ceil() as u32).min(self.height.saturating_sub(1));
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len2 = dx * dx + dy * dy;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                let t = if len2 <= f32::EPSILON {
                    0.0
                } else {
                    (((px - a.x) * dx + (py - a.y) * dy) / len2).clamp(0.0, 1.0)
                };
                let nx = a.x + t * dx - px;
                let ny = a.y + t * dy - py;
                if nx * nx + ny * ny <= half_width * half_width {
                    self.composite_at(x, y, color, CompositeOp::Over);
                }
            }
        }
    }

    /// Draw another surface of identical dimensions onto this one with
    /// per-pixel source-over. This is the merge step's `drawImage`.
    pub fn blit(&mut self, source: &Surface) -> Result<()> {
        ensure!(
            source.width == self.width && source.height == self.height,
            "blit dimension mismatch: {}x{} onto {}x{}",
            source.width,
            source.height,
            self.width,
            self.height
        );
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = (y as usize * self.width as usize + x as usize) * 4;
                let src: Color = source.pixels[idx..idx + 4].try_into().unwrap();
                if src[3] == 0 {
                    continue;
                }
                self.composite_at(x, y, src, CompositeOp::Over);
            }
        }
        Ok(())
    }

    /// Snapshot the buffer into an owned `image::RgbaImage`.
    pub fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .context("surface buffer does not match its declared dimensions")
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&self.pixels, self.width, self.height, ColorType::Rgba8)
            .context("encoding surface as PNG")?;
        Ok(out)
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let png = self.encode_png()?;
        std::fs::write(path, png)
            .with_context(|| format!("writing PNG to {}", path.display()))?;
        Ok(())
    }
}
