use circle_raster::Circle;
use rand::Rng;
use serde::Serialize;

/// Fraction of the smaller viewport dimension used as the lower bound of
/// the radius draw.
pub const DEFAULT_FLOOR_FRACTION: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// Produce a fresh target. The radius comes from a uniform integer draw in
/// `[min_dim * floor_fraction, min_dim]` (both ends inclusive), halved and
/// scaled by 0.9 so the circle always clears the viewport edges; the center
/// is pinned to the viewport midpoint, so successive targets vary only in
/// radius.
pub fn generate_target<R: Rng>(viewport: Viewport, floor_fraction: f32, rng: &mut R) -> Circle {
    let max = viewport.min_dimension();
    let min = ((max as f32 * floor_fraction).floor() as u32).min(max);
    let draw = rng.random_range(min..=max);
    let radius = ((draw as f32 / 2.0) * 0.9).floor().max(1.0);
    let (x, y) = viewport.center();
    Circle::new(x, y, radius)
}
