//! Pipeline orchestrator: parameter state, dirty tracking, and the render
//! entry point.
//!
//! Setters only mutate state and mark things dirty; all work happens in an
//! explicit [`GlassPipeline::render`] call, so a batch of parameter updates
//! costs one field regeneration and one resample instead of one per touched
//! field.
//!
//! `render()` never fails and never panics: every internal error degrades to
//! a pass-through copy of the source image, reported to the session log once
//! per error kind per pipeline.

use image::RgbaImage;

use crate::distort;
use crate::error::GlassError;
use crate::field::{self, DisplacementField};
use crate::gpu::GpuEngine;
use crate::log_err;
use crate::ops::{blur, color};
use crate::params::{ColorControls, DistortParams, ShapeParams};

/// Which compute backend the pipeline should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderBackend {
    /// GPU when an adapter exists, CPU otherwise. Never reports
    /// `BackendUnavailable`.
    Auto,
    /// GPU only. Without an adapter every render degrades to pass-through
    /// with `BackendUnavailable` reported once.
    ForceGpu,
    /// CPU reference path.
    ForceCpu,
}

pub(crate) enum Engine {
    Cpu,
    Gpu(Box<GpuEngine>),
    Unavailable,
}

impl Engine {
    fn for_backend(backend: RenderBackend) -> Engine {
        match backend {
            RenderBackend::ForceCpu => Engine::Cpu,
            RenderBackend::ForceGpu => match GpuEngine::new() {
                Some(engine) => Engine::Gpu(Box::new(engine)),
                None => Engine::Unavailable,
            },
            RenderBackend::Auto => match GpuEngine::new() {
                Some(engine) => Engine::Gpu(Box::new(engine)),
                None => Engine::Cpu,
            },
        }
    }
}

/// The liquid-glass effect pipeline.
///
/// Single-writer: no internal locks; share behind external synchronization
/// or give each thread its own instance (field generation and warping are
/// pure, so instances never interfere).
pub struct GlassPipeline {
    shape: ShapeParams,
    scale: f32,
    padding: f32,
    aberration: f32,
    blur: f32,
    color: ColorControls,
    show_map: bool,

    engine: Engine,
    field: Option<DisplacementField>,
    field_dirty: bool,
    output_dirty: bool,
    reported: Vec<&'static str>,
}

impl Default for GlassPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl GlassPipeline {
    /// Pipeline with the [`RenderBackend::Auto`] backend.
    pub fn new() -> Self {
        Self::with_backend(RenderBackend::Auto)
    }

    pub fn with_backend(backend: RenderBackend) -> Self {
        Self::with_engine(Engine::for_backend(backend))
    }

    pub(crate) fn with_engine(engine: Engine) -> Self {
        Self {
            shape: ShapeParams::default(),
            scale: 50.0,
            padding: 0.0,
            aberration: 0.0,
            blur: 0.0,
            color: ColorControls::default(),
            show_map: false,
            engine,
            field: None,
            field_dirty: true,
            output_dirty: true,
            reported: Vec::new(),
        }
    }

    // ========================================================================
    // PARAMETER SETTERS — mutate, clamp/validate, mark dirty; nothing renders
    // ========================================================================

    /// Set the effect rect. Rejects non-positive or non-finite extents,
    /// leaving the previous geometry in place.
    pub fn set_size(&mut self, width: f32, height: f32) -> Result<(), GlassError> {
        let candidate = ShapeParams {
            width,
            height,
            ..self.shape
        };
        candidate.validate()?;
        if self.shape.width != width || self.shape.height != height {
            self.shape.width = width;
            self.shape.height = height;
            self.mark_shape_dirty();
        }
        Ok(())
    }

    /// Set the bezel radius in pixels. Rejects non-finite or negative
    /// values; clamping to half the short side happens at generation time.
    pub fn set_radius(&mut self, radius: f32) -> Result<(), GlassError> {
        let candidate = ShapeParams {
            radius,
            ..self.shape
        };
        candidate.validate()?;
        if self.shape.radius != radius {
            self.shape.radius = radius;
            self.mark_shape_dirty();
        }
        Ok(())
    }

    pub fn set_bezel(&mut self, bezel: f32) {
        let bezel = if bezel.is_finite() { bezel } else { self.shape.bezel };
        if self.shape.bezel != bezel {
            self.shape.bezel = bezel;
            self.mark_shape_dirty();
        }
    }

    pub fn set_magic(&mut self, magic: f32) {
        let magic = if magic.is_finite() { magic } else { self.shape.magic };
        if self.shape.magic != magic {
            self.shape.magic = magic;
            self.mark_shape_dirty();
        }
    }

    pub fn set_rim(&mut self, rim: f32) {
        let rim = if rim.is_finite() { rim } else { self.shape.rim };
        if self.shape.rim != rim {
            self.shape.rim = rim;
            self.mark_shape_dirty();
        }
    }

    pub fn set_noise(&mut self, noise: f32) {
        let noise = if noise.is_finite() { noise.max(0.0) } else { self.shape.noise };
        if self.shape.noise != noise {
            self.shape.noise = noise;
            self.mark_shape_dirty();
        }
    }

    /// Displacement magnitude in pixels (signed).
    pub fn set_scale(&mut self, scale: f32) {
        let scale = if scale.is_finite() { scale } else { self.scale };
        if self.scale != scale {
            self.scale = scale;
            self.output_dirty = true;
        }
    }

    /// Extra border in pixels; the source image handed to `render` must
    /// already include it.
    pub fn set_padding(&mut self, padding: f32) {
        let padding = if padding.is_finite() { padding.max(0.0) } else { self.padding };
        if self.padding != padding {
            self.padding = padding;
            self.output_dirty = true;
        }
    }

    pub fn set_aberration(&mut self, aberration: f32) {
        let aberration = if aberration.is_finite() { aberration } else { self.aberration };
        if self.aberration != aberration {
            self.aberration = aberration;
            self.output_dirty = true;
        }
    }

    /// Pre-stage box blur radius in pixels.
    pub fn set_blur(&mut self, blur: f32) {
        let blur = if blur.is_finite() { blur.max(0.0) } else { self.blur };
        if self.blur != blur {
            self.blur = blur;
            self.output_dirty = true;
        }
    }

    /// Post-stage color controls.
    pub fn set_color_controls(&mut self, color: ColorControls) {
        if self.color != color {
            self.color = color;
            self.output_dirty = true;
        }
    }

    /// Show-map mode: `render` returns the displacement field visualized
    /// instead of the warped source.
    pub fn set_show_map(&mut self, show_map: bool) {
        if self.show_map != show_map {
            self.show_map = show_map;
            self.output_dirty = true;
        }
    }

    fn mark_shape_dirty(&mut self) {
        self.field_dirty = true;
        self.output_dirty = true;
    }

    // ========================================================================
    // STATE INSPECTION
    // ========================================================================

    pub fn shape(&self) -> &ShapeParams {
        &self.shape
    }

    pub fn is_field_dirty(&self) -> bool {
        self.field_dirty
    }

    pub fn is_output_dirty(&self) -> bool {
        self.output_dirty
    }

    /// Kinds of errors this pipeline has degraded on so far (each kind is
    /// reported to the log exactly once).
    pub fn reported_error_kinds(&self) -> &[&'static str] {
        &self.reported
    }

    /// Expected source extent for the current parameters:
    /// `(width + 2*padding) x (height + 2*padding)`.
    pub fn source_extent(&self) -> (u32, u32) {
        self.distort_params().output_extent()
    }

    fn distort_params(&self) -> DistortParams {
        let clamped = self.shape.clamped();
        DistortParams {
            scale: self.scale,
            radius: clamped.radius,
            padding: self.padding,
            aberration: self.aberration,
            width: self.shape.width,
            height: self.shape.height,
        }
    }

    // ========================================================================
    // RENDERING
    // ========================================================================

    /// Run the full effect over `source` and return the composed output.
    ///
    /// `source` must be the captured background at
    /// [`GlassPipeline::source_extent`]. On any internal error the source
    /// comes back unmodified (pass-through) and the error is logged once per
    /// kind; this method never fails and never panics.
    pub fn render(&mut self, source: &RgbaImage) -> RgbaImage {
        match self.render_checked(source) {
            Ok(image) => {
                self.output_dirty = false;
                image
            }
            Err(e) => {
                self.report_once(&e);
                source.clone()
            }
        }
    }

    /// The displacement field visualized as an image, regenerating it if
    /// dirty. `None` when the field cannot be produced (error reported as in
    /// [`GlassPipeline::render`]).
    pub fn render_map(&mut self) -> Option<RgbaImage> {
        match self.ensure_field() {
            Ok(()) => self.field.as_ref().map(|f| f.visualize()),
            Err(e) => {
                self.report_once(&e);
                None
            }
        }
    }

    fn render_checked(&mut self, source: &RgbaImage) -> Result<RgbaImage, GlassError> {
        self.ensure_field()?;
        let field = self.field.as_ref().unwrap();

        if self.show_map {
            return Ok(field.visualize());
        }

        let params = self.distort_params();

        // Pre-stage blur on the captured background.
        let blurred;
        let warp_input = if self.blur > 0.0 {
            blurred = match &mut self.engine {
                Engine::Cpu => blur::box_blur(source, self.blur),
                Engine::Gpu(engine) => engine.box_blur(source, self.blur)?,
                Engine::Unavailable => return Err(GlassError::BackendUnavailable),
            };
            &blurred
        } else {
            source
        };

        // Core distortion.
        let mut image = match &mut self.engine {
            Engine::Cpu => distort::warp(warp_input, field, &params)?,
            Engine::Gpu(engine) => engine.warp(warp_input, field, &params)?,
            Engine::Unavailable => return Err(GlassError::BackendUnavailable),
        };

        // Post-stage color controls.
        if !self.color.is_identity() {
            image = match &mut self.engine {
                Engine::Cpu => color::apply_color_controls(&image, &self.color),
                Engine::Gpu(engine) => engine.color_controls(&image, &self.color)?,
                Engine::Unavailable => return Err(GlassError::BackendUnavailable),
            };
        }

        Ok(image)
    }

    /// Regenerate the displacement field if a shape parameter changed.
    fn ensure_field(&mut self) -> Result<(), GlassError> {
        if matches!(self.engine, Engine::Unavailable) {
            return Err(GlassError::BackendUnavailable);
        }
        if !self.field_dirty && self.field.is_some() {
            return Ok(());
        }
        let field = match &mut self.engine {
            Engine::Cpu => field::generate_field(&self.shape)?,
            Engine::Gpu(engine) => engine.generate_field(&self.shape)?,
            Engine::Unavailable => return Err(GlassError::BackendUnavailable),
        };
        self.field = Some(field);
        self.field_dirty = false;
        Ok(())
    }

    fn report_once(&mut self, e: &GlassError) {
        let kind = e.kind();
        if !self.reported.contains(&kind) {
            self.reported.push(kind);
            log_err!("[pipeline] render degraded to pass-through: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn cpu_pipeline() -> GlassPipeline {
        GlassPipeline::with_backend(RenderBackend::ForceCpu)
    }

    fn uniform(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(c))
    }

    /// Vertical black/white split: black left of `split_x`, white from it on.
    fn split_image(w: u32, h: u32, split_x: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| {
            if x < split_x {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn zero_scale_on_uniform_source_is_pixel_identical() {
        // Scenario A: geometry 200x160, radius 40, everything else neutral.
        let mut p = cpu_pipeline();
        p.set_scale(0.0);
        let src = uniform(200, 160, [90, 120, 200, 255]);
        let out = p.render(&src);
        assert_eq!(out, src);
    }

    #[test]
    fn center_split_is_untouched_within_rounding() {
        // Scenario B, part 1: the split at x=100 sits outside every region
        // with horizontal displacement, so the output only moves pixels
        // within uniform color areas.
        let mut p = cpu_pipeline();
        let src = split_image(200, 160, 100);
        let out = p.render(&src);
        for (x, y, px) in out.enumerate_pixels() {
            let sp = src.get_pixel(x, y);
            for c in 0..4 {
                assert!(
                    px[c].abs_diff(sp[c]) <= 1,
                    "pixel ({x},{y}) channel {c}: {} vs {}",
                    px[c],
                    sp[c]
                );
            }
        }
    }

    #[test]
    fn split_crossing_the_bezel_band_is_displaced() {
        // Scenario B, part 2: a split at x=30 crosses the left bezel band,
        // where displacement points outward (-x). Sampling pulls black
        // edge-side content over the white side of the split.
        let mut p = cpu_pipeline();
        let src = split_image(200, 160, 30);
        let out = p.render(&src);
        // At (30, 80) the source is white but the sample lands left of the
        // split: the boundary visibly moved.
        assert_eq!(src.get_pixel(30, 80)[0], 255);
        assert!(out.get_pixel(30, 80)[0] < 50);
        // Far from the bezel nothing moves.
        assert_eq!(out.get_pixel(100, 80), src.get_pixel(100, 80));
    }

    #[test]
    fn unavailable_backend_passes_through_and_reports_once() {
        // Scenario C.
        let mut p = GlassPipeline::with_engine(Engine::Unavailable);
        let src = split_image(200, 160, 100);
        let out1 = p.render(&src);
        let out2 = p.render(&src);
        assert_eq!(out1, src);
        assert_eq!(out2, src);
        assert_eq!(p.reported_error_kinds(), &["backend-unavailable"]);
        assert!(p.render_map().is_none());
        // Still reported only once.
        assert_eq!(p.reported_error_kinds().len(), 1);
    }

    #[test]
    fn setters_mark_dirty_and_render_cleans() {
        let mut p = cpu_pipeline();
        assert!(p.is_field_dirty());
        assert!(p.is_output_dirty());

        let src = uniform(200, 160, [10, 20, 30, 255]);
        p.render(&src);
        assert!(!p.is_field_dirty());
        assert!(!p.is_output_dirty());

        // Distortion-only parameter: output dirty, field untouched.
        p.set_scale(10.0);
        assert!(!p.is_field_dirty());
        assert!(p.is_output_dirty());

        // Shape parameter: both dirty. Batched updates stay one flag flip.
        p.set_radius(60.0).unwrap();
        p.set_bezel(2.0);
        p.set_noise(0.25);
        assert!(p.is_field_dirty());
        assert!(p.is_output_dirty());

        p.render(&src);
        assert!(!p.is_field_dirty());
        assert!(!p.is_output_dirty());
    }

    #[test]
    fn setting_the_same_value_keeps_state_clean() {
        let mut p = cpu_pipeline();
        p.render(&uniform(200, 160, [0, 0, 0, 255]));
        p.set_scale(50.0); // default value, unchanged
        p.set_bezel(1.0);
        assert!(!p.is_output_dirty());
    }

    #[test]
    fn invalid_geometry_setters_reject_and_keep_state() {
        let mut p = cpu_pipeline();
        assert!(p.set_size(f32::NAN, 100.0).is_err());
        assert!(p.set_size(-5.0, 100.0).is_err());
        assert!(p.set_radius(f32::INFINITY).is_err());
        assert_eq!(p.shape().width, 200.0);
        assert_eq!(p.shape().radius, 40.0);
    }

    #[test]
    fn show_map_returns_field_visualization() {
        let mut p = cpu_pipeline();
        p.set_show_map(true);
        let out = p.render(&uniform(200, 160, [1, 2, 3, 255]));
        assert_eq!(out.dimensions(), (200, 160));
        // Zero-displacement center encodes as mid-gray red/green.
        assert_eq!(out.get_pixel(100, 80)[0], 128);

        let map = p.render_map().unwrap();
        assert_eq!(map.dimensions(), (200, 160));
    }

    #[test]
    fn padded_render_expects_padded_source() {
        let mut p = cpu_pipeline();
        p.set_padding(8.0);
        assert_eq!(p.source_extent(), (216, 176));
        let src = uniform(216, 176, [50, 60, 70, 255]);
        let out = p.render(&src);
        assert_eq!(out.dimensions(), (216, 176));
        assert!(p.reported_error_kinds().is_empty());
    }

    #[test]
    fn mismatched_source_degrades_to_pass_through() {
        let mut p = cpu_pipeline();
        let src = uniform(64, 64, [5, 6, 7, 255]);
        let out = p.render(&src);
        assert_eq!(out, src);
        assert_eq!(p.reported_error_kinds(), &["dimension-mismatch"]);
    }

    #[test]
    fn blur_and_color_stages_compose() {
        let mut p = cpu_pipeline();
        p.set_scale(0.0);
        p.set_blur(2.0);
        p.set_color_controls(ColorControls {
            saturation: 0.0,
            ..Default::default()
        });
        let src = split_image(200, 160, 100);
        let out = p.render(&src);
        assert_eq!(out.dimensions(), (200, 160));
        // Blur softened the split edge, so the column at the boundary is
        // neither black nor white.
        let p_edge = out.get_pixel(99, 80);
        assert!(p_edge[0] > 10 && p_edge[0] < 245);
        // Desaturation keeps channels equal.
        assert_eq!(p_edge[0], p_edge[1]);
        assert_eq!(p_edge[1], p_edge[2]);
    }
}
