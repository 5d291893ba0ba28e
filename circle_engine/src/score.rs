use circle_raster::Circle;

use crate::diff::OverlapCount;

pub const MAX_SCORE: f64 = 100.0;

/// Convert a mismatch count into a percentage score.
///
/// The normalizing baseline is the target circumference rather than its
/// area: mismatch pixels scale with the boundary a user traces, not with
/// the filled interior. `allowance` widens the tolerance multiplicatively.
/// A zero mismatch total is treated as degenerate and scores 0 instead of
/// dividing.
pub fn score(target: &Circle, counts: &OverlapCount, allowance: f64) -> f64 {
    if counts.total == 0 {
        return 0.0;
    }
    let percentage = target.circumference() * (1.0 + allowance) / counts.total as f64;
    let rounded = (percentage * 100.0 * 100.0).round() / 100.0;
    rounded.min(MAX_SCORE)
}
