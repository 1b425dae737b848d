// ============================================================================
// GPU ENGINE — top-level coordinator for the GPU compute backend
// ============================================================================

use image::RgbaImage;

use crate::error::GlassError;
use crate::field::DisplacementField;
use crate::params::{ColorControls, DistortParams, ShapeParams};

use super::compute::{
    GpuBoxBlurPipeline, GpuColorControlsPipeline, GpuFieldPipeline, GpuWarpPipeline,
};
use super::context::GpuContext;

/// Width of the seam-blend band at the field boundary, mirroring the CPU
/// resampler's constant.
const EDGE_BLEND_PX: f32 = 2.0;

/// Owns the compute pipelines for every stage of the effect.
///
/// Construction goes through the process-wide [`GpuContext`]; if that is
/// unavailable there is no engine and the caller picks the CPU path or
/// degrades to pass-through.
pub struct GpuEngine {
    ctx: std::sync::Arc<GpuContext>,
    field_pipeline: GpuFieldPipeline,
    warp_pipeline: GpuWarpPipeline,
    blur_pipeline: GpuBoxBlurPipeline,
    color_pipeline: GpuColorControlsPipeline,
}

impl GpuEngine {
    /// `None` when no usable adapter exists (the failure is cached in the
    /// global context, so repeated calls stay cheap).
    pub fn new() -> Option<Self> {
        let ctx = GpuContext::global()?;
        let device = ctx.device.clone();
        Some(Self {
            field_pipeline: GpuFieldPipeline::new(&device),
            warp_pipeline: GpuWarpPipeline::new(&device),
            blur_pipeline: GpuBoxBlurPipeline::new(&device),
            color_pipeline: GpuColorControlsPipeline::new(&device),
            ctx,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }

    /// Generate the displacement field on the GPU. Same contract as the CPU
    /// [`crate::field::generate_field`]; a mid-dispatch readback failure
    /// surfaces as `BackendUnavailable`.
    pub fn generate_field(
        &mut self,
        params: &ShapeParams,
    ) -> Result<DisplacementField, GlassError> {
        params.validate()?;
        let p = params.clamped();
        let (w, h) = p.extent();
        if w == 0 || h == 0 {
            return Err(GlassError::InvalidGeometry {
                width: params.width,
                height: params.height,
                radius: params.radius,
            });
        }
        if p.radius <= 0.0 {
            return Ok(DisplacementField::zero(w, h));
        }
        if !self.ctx.supports_size(w, h) {
            return Err(GlassError::BackendUnavailable);
        }

        let data = self
            .field_pipeline
            .generate(&self.ctx, &p, w, h)
            .ok_or(GlassError::BackendUnavailable)?;
        Ok(DisplacementField::from_raw(w, h, data))
    }

    /// Warp `source` through `field` on the GPU. Same contract as the CPU
    /// [`crate::distort::warp`], including the dimension checks.
    pub fn warp(
        &mut self,
        source: &RgbaImage,
        field: &DisplacementField,
        params: &DistortParams,
    ) -> Result<RgbaImage, GlassError> {
        let field_w = params.width.round() as u32;
        let field_h = params.height.round() as u32;
        if field.width() != field_w || field.height() != field_h {
            return Err(GlassError::DimensionMismatch {
                expected_w: field_w,
                expected_h: field_h,
                got_w: field.width(),
                got_h: field.height(),
            });
        }
        let (out_w, out_h) = params.output_extent();
        if source.width() != out_w || source.height() != out_h {
            return Err(GlassError::DimensionMismatch {
                expected_w: out_w,
                expected_h: out_h,
                got_w: source.width(),
                got_h: source.height(),
            });
        }
        if !self.ctx.supports_size(out_w, out_h) {
            return Err(GlassError::BackendUnavailable);
        }

        let data = self
            .warp_pipeline
            .apply(
                &self.ctx,
                source.as_raw(),
                out_w,
                out_h,
                field.as_slice(),
                field_w,
                field_h,
                params.scale,
                params.padding.max(0.0),
                params.aberration,
                EDGE_BLEND_PX,
            )
            .ok_or(GlassError::BackendUnavailable)?;
        Ok(RgbaImage::from_raw(out_w, out_h, data).unwrap())
    }

    /// Box blur on the GPU.
    pub fn box_blur(&mut self, src: &RgbaImage, radius: f32) -> Result<RgbaImage, GlassError> {
        let r = radius.round().max(0.0) as u32;
        let (w, h) = src.dimensions();
        if r == 0 || w == 0 || h == 0 {
            return Ok(src.clone());
        }
        let data = self
            .blur_pipeline
            .apply(&self.ctx, src.as_raw(), w, h, r)
            .ok_or(GlassError::BackendUnavailable)?;
        Ok(RgbaImage::from_raw(w, h, data).unwrap())
    }

    /// Color controls on the GPU.
    pub fn color_controls(
        &mut self,
        src: &RgbaImage,
        cc: &ColorControls,
    ) -> Result<RgbaImage, GlassError> {
        if cc.is_identity() {
            return Ok(src.clone());
        }
        let (w, h) = src.dimensions();
        if w == 0 || h == 0 {
            return Ok(src.clone());
        }
        let data = self
            .color_pipeline
            .apply(
                &self.ctx,
                src.as_raw(),
                w,
                h,
                cc.brightness,
                cc.saturation,
                cc.contrast,
            )
            .ok_or(GlassError::BackendUnavailable)?;
        Ok(RgbaImage::from_raw(w, h, data).unwrap())
    }
}
