//! Liquid-glass lens distortion.
//!
//! Captured background pixels go in, a glass-warped image comes out. The
//! core is a two-stage pipeline: a procedural displacement-field generator
//! (rounded-rect bezel profile) and a distortion resampler with chromatic
//! aberration, composed with ancillary blur and color stages by
//! [`GlassPipeline`]. Both stages run on the GPU (wgpu compute) when an
//! adapter exists and on the CPU (rayon) otherwise.
//!
//! ```no_run
//! use liquidglass::{GlassPipeline, RenderBackend};
//!
//! let mut pipeline = GlassPipeline::with_backend(RenderBackend::Auto);
//! pipeline.set_radius(60.0).unwrap();
//! pipeline.set_scale(80.0);
//! pipeline.set_aberration(0.2);
//! let source = image::open("capture.png").unwrap().to_rgba8();
//! let warped = pipeline.render(&source);
//! warped.save("glass.png").unwrap();
//! ```

#![allow(clippy::too_many_arguments)]

pub mod cli;
pub mod distort;
pub mod error;
pub mod field;
pub mod gpu;
pub mod logger;
pub mod ops;
pub mod params;
pub mod pipeline;

pub use error::GlassError;
pub use field::{DisplacementField, generate_field};
pub use params::{ColorControls, DistortParams, ShapeParams};
pub use pipeline::{GlassPipeline, RenderBackend};
