//! Effect error taxonomy.
//!
//! Every variant is recoverable at the pipeline boundary: [`GlassPipeline`]
//! degrades to a pass-through image instead of letting any of these escape
//! a `render()` call.
//!
//! [`GlassPipeline`]: crate::pipeline::GlassPipeline

use thiserror::Error;

/// Errors from the displacement-map / distortion core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlassError {
    /// Width, height or radius is non-positive or non-finite.
    #[error("invalid geometry: width={width}, height={height}, radius={radius}")]
    InvalidGeometry {
        width: f32,
        height: f32,
        radius: f32,
    },

    /// A displacement field or source image extent disagrees with the
    /// geometry the resampler was asked to cover.
    #[error("dimension mismatch: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },

    /// The GPU compute backend failed to initialise (or a dispatch/readback
    /// failed mid-render on a dying device).
    #[error("compute backend unavailable")]
    BackendUnavailable,
}

impl GlassError {
    /// Stable key used for once-per-kind error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            GlassError::InvalidGeometry { .. } => "invalid-geometry",
            GlassError::DimensionMismatch { .. } => "dimension-mismatch",
            GlassError::BackendUnavailable => "backend-unavailable",
        }
    }
}
