//! Effect parameters: lens shape, distortion, and color controls.
//!
//! `ShapeParams` drives displacement-field generation; `DistortParams` drives
//! the resampler; `ColorControls` drives the post-stage color operator.
//! Setters on the pipeline clamp through [`ShapeParams::clamped`] so no
//! out-of-range value ever reaches a kernel unchecked.

use crate::error::GlassError;

/// Bezel steepness range. 1.0 is a full round bezel; larger values compress
/// the bezel toward the edge and flatten the center, smaller values stretch
/// it toward the center (more conic).
pub const BEZEL_RANGE: (f32, f32) = (0.0, 10.0);

/// Gamma-bias range for the `magic` curve parameter. Kept strictly inside
/// the range where `exp2(magic)` stays positive so the falloff curve keeps
/// its zero at the center.
pub const MAGIC_RANGE: (f32, f32) = (-4.0, 4.0);

/// Lens geometry and bezel profile parameters.
///
/// Defaults match the stock effect: a 200x160 rect with a 40 px round bezel
/// and no rim/noise/magic shaping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    /// Effect rect width in pixels.
    pub width: f32,
    /// Effect rect height in pixels.
    pub height: f32,
    /// Corner/bezel radius in pixels. Clamped to half the short side.
    pub radius: f32,
    /// Bezel profile steepness, see [`BEZEL_RANGE`].
    pub bezel: f32,
    /// Free-form curve bias (gamma on the falloff profile).
    pub magic: f32,
    /// Edge-emphasis term, active only near the outer edge of the bezel band.
    pub rim: f32,
    /// Deterministic per-pixel jitter amplitude, >= 0.
    pub noise: f32,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 160.0,
            radius: 40.0,
            bezel: 1.0,
            magic: 0.0,
            rim: 0.0,
            noise: 0.0,
        }
    }
}

impl ShapeParams {
    /// Reject geometry the generator cannot produce a defined field for.
    pub fn validate(&self) -> Result<(), GlassError> {
        let bad_extent = !self.width.is_finite()
            || !self.height.is_finite()
            || self.width <= 0.0
            || self.height <= 0.0;
        let bad_radius = !self.radius.is_finite() || self.radius < 0.0;
        if bad_extent || bad_radius {
            return Err(GlassError::InvalidGeometry {
                width: self.width,
                height: self.height,
                radius: self.radius,
            });
        }
        Ok(())
    }

    /// Copy with every tunable forced into its documented range.
    /// Geometry must already be valid (see [`ShapeParams::validate`]).
    pub fn clamped(&self) -> ShapeParams {
        let half_short = 0.5 * self.width.min(self.height);
        ShapeParams {
            width: self.width,
            height: self.height,
            radius: self.radius.clamp(0.0, half_short),
            bezel: self.bezel.clamp(BEZEL_RANGE.0, BEZEL_RANGE.1),
            magic: self.magic.clamp(MAGIC_RANGE.0, MAGIC_RANGE.1),
            rim: self.rim.max(0.0),
            noise: self.noise.max(0.0),
        }
    }

    /// Field extent in whole pixels.
    pub fn extent(&self) -> (u32, u32) {
        (self.width.round() as u32, self.height.round() as u32)
    }
}

/// Resampler parameters. `width`/`height` repeat the shape geometry so the
/// resampler can be driven standalone with a precomputed field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortParams {
    /// Displacement magnitude in pixels. Signed; the sign flips the sampling
    /// direction along the field vectors.
    pub scale: f32,
    /// Bezel radius, matching the field's generation radius.
    pub radius: f32,
    /// Extra border in pixels around the effect rect. The source image must
    /// already include this border; the output extent grows by it on every
    /// side.
    pub padding: f32,
    /// Chromatic aberration strength: red samples at `(1 + aberration)` times
    /// the base offset, blue at `(1 - aberration)`, green (and alpha) at the
    /// base offset. 0 disables the channel split.
    pub aberration: f32,
    /// Effect rect width in pixels (field extent, not output extent).
    pub width: f32,
    /// Effect rect height in pixels.
    pub height: f32,
}

impl Default for DistortParams {
    fn default() -> Self {
        Self {
            scale: 50.0,
            radius: 40.0,
            padding: 0.0,
            aberration: 0.0,
            width: 200.0,
            height: 160.0,
        }
    }
}

impl DistortParams {
    /// Output extent: `(width + 2*padding) x (height + 2*padding)`.
    pub fn output_extent(&self) -> (u32, u32) {
        let pad2 = 2.0 * self.padding.max(0.0);
        (
            (self.width + pad2).round() as u32,
            (self.height + pad2).round() as u32,
        )
    }
}

/// Post-stage color adjustment: saturation (BT.709 luminance mix), then
/// brightness offset (-1..1, fraction of full scale), then contrast pivoted
/// at mid-gray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorControls {
    pub brightness: f32,
    pub saturation: f32,
    pub contrast: f32,
}

impl Default for ColorControls {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            saturation: 1.0,
            contrast: 1.0,
        }
    }
}

impl ColorControls {
    /// True when the stage would not change any pixel and can be skipped.
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0 && self.saturation == 1.0 && self.contrast == 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_is_valid() {
        assert!(ShapeParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_nan_and_negative_geometry() {
        let mut p = ShapeParams::default();
        p.width = f32::NAN;
        assert!(matches!(
            p.validate(),
            Err(GlassError::InvalidGeometry { .. })
        ));

        let mut p = ShapeParams::default();
        p.height = -1.0;
        assert!(p.validate().is_err());

        let mut p = ShapeParams::default();
        p.radius = -5.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_radius_is_valid_geometry() {
        let p = ShapeParams {
            radius: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn clamp_limits_radius_to_half_short_side() {
        let p = ShapeParams {
            width: 200.0,
            height: 160.0,
            radius: 500.0,
            ..Default::default()
        };
        assert_eq!(p.clamped().radius, 80.0);
    }

    #[test]
    fn clamp_limits_bezel_and_noise() {
        let p = ShapeParams {
            bezel: 99.0,
            noise: -3.0,
            magic: -100.0,
            ..Default::default()
        };
        let c = p.clamped();
        assert_eq!(c.bezel, BEZEL_RANGE.1);
        assert_eq!(c.noise, 0.0);
        assert_eq!(c.magic, MAGIC_RANGE.0);
    }

    #[test]
    fn output_extent_includes_padding_both_sides() {
        let p = DistortParams {
            padding: 8.0,
            ..Default::default()
        };
        assert_eq!(p.output_extent(), (216, 176));

        let p = DistortParams::default();
        assert_eq!(p.output_extent(), (200, 160));
    }

    #[test]
    fn color_identity_detection() {
        assert!(ColorControls::default().is_identity());
        assert!(
            !ColorControls {
                saturation: 0.5,
                ..Default::default()
            }
            .is_identity()
        );
    }
}
