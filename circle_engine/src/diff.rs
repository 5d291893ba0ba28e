use anyhow::Result;
use circle_raster::{Circle, CompositeOp, Point, Surface, BLACK, WHITE};
use log::debug;
use serde::Serialize;

/// Mismatch pixel counts from the two overlap passes.
///
/// `inner` counts stroke pixels that fall outside the target; `outer`
/// counts target pixels the stroke left uncovered. `total` is always their
/// sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapCount {
    pub inner: usize,
    pub outer: usize,
    pub total: usize,
}

/// Result of diffing one stroke against one target: the merged visual diff
/// plus the per-direction counts.
#[derive(Debug, Clone)]
pub struct DiffOutcome {
    pub image: Surface,
    pub counts: OverlapCount,
}

/// Quantify stroke-vs-target mismatch in both directions.
///
/// Each pass paints one shape opaquely and then paints the other ATOP in
/// white, so the only surviving black pixels are the ones where the first
/// shape extends past the intersection. Both passes start from a cleared
/// scratch surface and the second pass must not start before the first has
/// been read back; the scratch buffer is shared, so the sequencing here is
/// the ordering guarantee.
///
/// Degenerate strokes (fewer than three points) fill no area: the inner
/// pass finds nothing and the outer pass reports the target's full pixel
/// area as uncovered.
pub fn compute_diff(scratch: &mut Surface, stroke: &[Point], target: &Circle) -> Result<DiffOutcome> {
    // inner pass: stroke area extending beyond the target
    scratch.clear();
    scratch.fill_closed_path(stroke, BLACK, CompositeOp::Over);
    scratch.fill_circle(target, WHITE, CompositeOp::Atop);
    let (inner_image, inner) = isolate_mismatch(scratch)?;
    debug!("inner pass: {inner} mismatch pixels");

    // outer pass: target area the stroke failed to cover
    scratch.clear();
    scratch.fill_circle(target, BLACK, CompositeOp::Over);
    scratch.fill_closed_path(stroke, WHITE, CompositeOp::Atop);
    let (outer_image, outer) = isolate_mismatch(scratch)?;
    debug!("outer pass: {outer} mismatch pixels");

    // merge for display: outer first, inner on top, both source-over
    scratch.clear();
    scratch.blit(&outer_image)?;
    scratch.blit(&inner_image)?;
    let image = scratch.clone();
    scratch.clear();

    Ok(DiffOutcome {
        image,
        counts: OverlapCount {
            inner,
            outer,
            total: inner + outer,
        },
    })
}

/// Read the pass result back and keep only the mismatch pixels: a pixel
/// counts iff its RGB is exactly black and its alpha is non-zero; every
/// other pixel has its alpha forced to zero so the returned surface is a
/// pure overlay of the mismatch region.
fn isolate_mismatch(scratch: &Surface) -> Result<(Surface, usize)> {
    let mut buffer = scratch.pixels().to_vec();
    let mut count = 0usize;
    for pixel in buffer.chunks_exact_mut(4) {
        let is_black = pixel[0] == 0 && pixel[1] == 0 && pixel[2] == 0;
        if is_black && pixel[3] > 0 {
            count += 1;
        } else {
            pixel[3] = 0;
        }
    }
    let mut image = Surface::new(scratch.width(), scratch.height())?;
    image.write_pixels(&buffer)?;
    Ok((image, count))
}
