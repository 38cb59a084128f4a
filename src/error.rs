//! Error types for sampling, rendering, export, and sinks.

use thiserror::Error;

/// Errors raised while sampling pixels from a frame source.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The source reported zero-sized natural dimensions, so no grid can
    /// be derived from it.
    #[error(
        "source has invalid dimensions {width}x{height}; \
         wait for metadata to load or try a different file"
    )]
    InvalidSourceDimensions { width: u32, height: u32 },

    /// The platform decoder refused to hand back pixel data.
    #[error(
        "pixel readback denied: {reason}; \
         check that the file is readable and the decoder can open it"
    )]
    PixelAccessDenied { reason: String },
}

/// Errors raised while assembling a full ASCII frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("frame render failed: {0}")]
    Sample(#[from] SampleError),
}

/// Errors raised by display and export sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("sink write failed")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the export sweep.
///
/// A per-frame render failure is not represented here: the exporter skips
/// the frame and continues. Only whole-sweep failures surface.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The source never settled after a seek.
    #[error(
        "seek to {position:.3}s did not settle; \
         the source may be truncated or still buffering"
    )]
    SeekTimeout { position: f64 },

    /// The export sink rejected the finished artifact. The accumulated
    /// frames are discarded with the sweep.
    #[error("export sink unavailable, {captured} captured frame(s) discarded: {source}")]
    SinkUnavailable {
        captured: usize,
        source: SinkError,
    },

    /// The sweep was cancelled between frames.
    #[error("export cancelled after {captured} of {total} frame(s)")]
    Cancelled { captured: usize, total: usize },
}
