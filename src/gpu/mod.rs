// ============================================================================
// GPU MODULE — wgpu compute backend for the liquid-glass effect
// ============================================================================
//
// Architecture:
//   context.rs — wgpu Device, Queue, adapter init (process-wide, load-once)
//   shaders.rs — all WGSL shader source (inline strings)
//   compute.rs — compute pipelines: field generator, glass warp, blur, color
//   engine.rs  — top-level GpuEngine coordinator
// ============================================================================

pub mod compute;
pub mod context;
pub mod engine;
pub mod shaders;

pub use context::GpuContext;
pub use engine::GpuEngine;

/// WGPU requires `bytes_per_row` to be a multiple of 256 for buffer copies.
pub const COPY_BYTES_PER_ROW_ALIGNMENT: u32 = 256;
