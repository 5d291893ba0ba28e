pub mod geometry;
pub mod surface;

pub use geometry::{Circle, Point};
pub use surface::{CompositeOp, Surface, BLACK, TRANSPARENT, WHITE};
