//! Accuracy-scoring engine for freehand circle tracing.
//!
//! A [`session::Session`] owns the active target, the stroke being
//! recorded, and the last/best attempt records. Completing an attempt
//! rasterizes the stroke against the target twice (once per overlap
//! direction), counts the mismatched pixels, and converts the counts into
//! a circumference-normalized score.

pub mod diff;
pub mod error;
pub mod score;
pub mod session;
pub mod stroke;
pub mod target;
