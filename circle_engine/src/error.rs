use thiserror::Error;

/// Recoverable session failures. Degenerate strokes and zero-mismatch
/// divisions are handled in-band by the pipeline (they score low or zero)
/// and never surface here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("previous attempt is still being scored")]
    SurfaceBusy,
    #[error("a stroke is already being recorded")]
    AlreadyRecording,
}
