//! Displacement-field generation.
//!
//! The field is the lens profile of the effect: one `[dx, dy]` vector per
//! pixel of the effect rect, derived from the rounded-rect bezel shape.
//! Vectors are a unit profile (magnitude <= 1 + rim); the resampler's
//! `scale` converts them to pixel offsets.
//!
//! Sign convention: vectors point along the *outward* normal of the rounded
//! rect. With a positive resampler scale each destination pixel samples
//! toward the nearest edge, which pulls edge-side content inward and reads
//! as a convex lens.

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::GlassError;
use crate::params::ShapeParams;

/// A generated displacement field over the effect rect.
///
/// Immutable once produced; parameter changes regenerate a fresh field
/// rather than mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    width: u32,
    height: u32,
    data: Vec<[f32; 2]>,
}

impl DisplacementField {
    /// All-zero (pass-through) field.
    pub fn zero(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![[0.0, 0.0]; width as usize * height as usize],
        }
    }

    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<[f32; 2]>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Field vector at a pixel. Coordinates must be in bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [f32; 2] {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Flat `[dx, dy]` pairs, row-major. Pod-castable for GPU upload.
    pub fn as_slice(&self) -> &[[f32; 2]] {
        &self.data
    }

    /// Render the field as an inspectable image ("show map" mode):
    /// dx and dy map to red/green around a 0.5 bias, vector magnitude to
    /// blue, alpha opaque.
    pub fn visualize(&self) -> RgbaImage {
        let w = self.width as usize;
        let mut raw = vec![0u8; w * self.height as usize * 4];
        let stride = w * 4;
        raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            for x in 0..w {
                let [dx, dy] = self.data[y * w + x];
                let mag = (dx * dx + dy * dy).sqrt();
                let pi = x * 4;
                row[pi] = ((dx * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8;
                row[pi + 1] = ((dy * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8;
                row[pi + 2] = (mag * 255.0).round().clamp(0.0, 255.0) as u8;
                row[pi + 3] = 255;
            }
        });
        RgbaImage::from_raw(self.width, self.height, raw).unwrap()
    }
}

/// Generate the displacement field for a lens shape on the CPU.
///
/// Pure function of its inputs: same parameters always yield the same field.
/// Fails with [`GlassError::InvalidGeometry`] for non-positive or non-finite
/// geometry; callers wanting pass-through behavior in that case can
/// substitute [`DisplacementField::zero`].
pub fn generate_field(params: &ShapeParams) -> Result<DisplacementField, GlassError> {
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
    // No bezel band, no displacement.
    if p.radius <= 0.0 {
        return Ok(DisplacementField::zero(w, h));
    }

    let mut data = vec![[0.0f32; 2]; w as usize * h as usize];
    data.par_chunks_mut(w as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = displace_at(x as u32, y as u32, &p);
            }
        });

    Ok(DisplacementField::from_raw(w, h, data))
}

/// Sign with a genuine zero at 0, so the direction degenerates to the zero
/// vector exactly on the rect's center lines (f32::signum maps 0.0 to 1.0).
#[inline]
fn sgn(v: f32) -> f32 {
    if v == 0.0 { 0.0 } else { v.signum() }
}

/// Displacement vector for one pixel. `p` must be validated and clamped.
#[inline]
fn displace_at(x: u32, y: u32, p: &ShapeParams) -> [f32; 2] {
    let half_w = p.width * 0.5;
    let half_h = p.height * 0.5;
    // Pixel-center coordinates relative to the rect center.
    let px = x as f32 + 0.5 - half_w;
    let py = y as f32 + 0.5 - half_h;

    // Rounded-rect signed distance (negative inside).
    let qx = px.abs() - (half_w - p.radius);
    let qy = py.abs() - (half_h - p.radius);
    let mx = qx.max(0.0);
    let my = qy.max(0.0);
    let sd = (mx * mx + my * my).sqrt() + qx.max(qy).min(0.0) - p.radius;

    // Strictly outside the boundary: no displacement, no discontinuity.
    if sd > 0.0 {
        return [0.0, 0.0];
    }

    // Bezel falloff: depth inside the boundary, normalized to the band.
    // v is 1 at the boundary and reaches 0 at the band's inner edge; bezel
    // rescales where that inner edge sits, magic gamma-biases the curve.
    let s = -sd / p.radius;
    let v = (1.0 - s * p.bezel).clamp(0.0, 1.0);
    let smooth = v * v * (3.0 - 2.0 * v);
    let m = smooth.powf(p.magic.exp2());

    // Outward normal of the rounded rect: axis normal on the flat sides,
    // radial around the corner circles. On the diagonal ridge between two
    // flat sides the split is even; at the exact center sgn() zeroes it.
    let (dir_x, dir_y) = if qx > 0.0 && qy > 0.0 {
        let len = (qx * qx + qy * qy).sqrt();
        (sgn(px) * qx / len, sgn(py) * qy / len)
    } else if qx > qy {
        (sgn(px), 0.0)
    } else if qy > qx {
        (0.0, sgn(py))
    } else {
        (sgn(px) * std::f32::consts::FRAC_1_SQRT_2, sgn(py) * std::f32::consts::FRAC_1_SQRT_2)
    };

    // Rim emphasis rides on top of the base profile near the band's outer
    // edge and dies with v toward the interior.
    let mag = m + p.rim * v.powi(6);
    let mut dx = dir_x * mag;
    let mut dy = dir_y * mag;

    if p.noise > 0.0 {
        // Deterministic per-pixel jitter, masked by the profile and the
        // normal magnitude so zero-displacement points (outside the
        // boundary, beyond the band, the exact center) stay exactly zero.
        let amp = p.noise * m * (dir_x * dir_x + dir_y * dir_y).sqrt();
        let jx = hash_f32(x, y, 0x51AB) * 2.0 - 1.0;
        let jy = hash_f32(x, y, 0xC0DE) * 2.0 - 1.0;
        dx += jx * amp;
        dy += jy * amp;
    }

    [dx, dy]
}

/// Simple hash for deterministic noise.
#[inline]
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Hash to f32 in [0, 1).
#[inline]
fn hash_f32(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(
        x.wrapping_mul(374761393)
            .wrapping_add(y.wrapping_mul(668265263))
            .wrapping_add(seed),
    );
    (h & 0x00FF_FFFF) as f32 / 16777216.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mag(v: [f32; 2]) -> f32 {
        (v[0] * v[0] + v[1] * v[1]).sqrt()
    }

    #[test]
    fn zero_radius_yields_zero_field() {
        let field = generate_field(&ShapeParams {
            radius: 0.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(field.width(), 200);
        assert_eq!(field.height(), 160);
        assert!(field.as_slice().iter().all(|v| *v == [0.0, 0.0]));
    }

    #[test]
    fn center_pixel_has_exactly_zero_displacement() {
        // Odd extent so one pixel center lands exactly on the rect center.
        let field = generate_field(&ShapeParams {
            width: 201.0,
            height: 161.0,
            radius: 40.0,
            // Stretch the band through the center: the center must stay
            // zero even when the profile is nonzero right next to it.
            bezel: 0.2,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(field.get(100, 80), [0.0, 0.0]);
    }

    #[test]
    fn magnitude_grows_from_center_to_edge() {
        let field = generate_field(&ShapeParams::default()).unwrap();
        // Walk the center row rightward: magnitude must never decrease.
        let y = 80;
        let mut prev = mag(field.get(100, y));
        for x in 101..200 {
            let cur = mag(field.get(x, y));
            assert!(
                cur + 1e-6 >= prev,
                "magnitude dropped at x={x}: {prev} -> {cur}"
            );
            prev = cur;
        }
        // And the band edge really displaces.
        assert!(mag(field.get(199, y)) > 0.5);
    }

    #[test]
    fn corners_outside_the_rounded_boundary_are_zero() {
        let field = generate_field(&ShapeParams::default()).unwrap();
        // (0,0) lies outside the 40 px corner circle of a 200x160 rect.
        assert_eq!(field.get(0, 0), [0.0, 0.0]);
        assert_eq!(field.get(199, 0), [0.0, 0.0]);
        assert_eq!(field.get(0, 159), [0.0, 0.0]);
        assert_eq!(field.get(199, 159), [0.0, 0.0]);
    }

    #[test]
    fn side_midpoints_displace_along_the_axis_normal() {
        let field = generate_field(&ShapeParams::default()).unwrap();
        // Near the left edge on the center row: pure -x displacement.
        let [dx, dy] = field.get(1, 80);
        assert!(dx < 0.0);
        assert_eq!(dy, 0.0);
        // Near the top edge on the center column: pure -y displacement.
        let [dx, dy] = field.get(100, 1);
        assert_eq!(dx, 0.0);
        assert!(dy < 0.0);
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let bad = ShapeParams {
            width: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            generate_field(&bad),
            Err(GlassError::InvalidGeometry { .. })
        ));

        let bad = ShapeParams {
            radius: -1.0,
            ..Default::default()
        };
        assert!(generate_field(&bad).is_err());
    }

    #[test]
    fn noise_is_deterministic() {
        let p = ShapeParams {
            noise: 0.5,
            ..Default::default()
        };
        let a = generate_field(&p).unwrap();
        let b = generate_field(&p).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn noise_leaves_zero_regions_zero() {
        let p = ShapeParams {
            noise: 2.0,
            ..Default::default()
        };
        let field = generate_field(&p).unwrap();
        // Outside the rounded corner the profile is zero, so jitter is too.
        assert_eq!(field.get(0, 0), [0.0, 0.0]);
        // Deep interior (band does not reach the center for bezel=1).
        assert_eq!(field.get(100, 80), [0.0, 0.0]);

        // Even a band stretched through the center leaves the exact center
        // pixel untouched.
        let p = ShapeParams {
            width: 201.0,
            height: 161.0,
            bezel: 0.2,
            noise: 2.0,
            ..Default::default()
        };
        let field = generate_field(&p).unwrap();
        assert_eq!(field.get(100, 80), [0.0, 0.0]);
    }

    #[test]
    fn visualization_matches_field_extent() {
        let field = generate_field(&ShapeParams::default()).unwrap();
        let img = field.visualize();
        assert_eq!(img.dimensions(), (200, 160));
        // Zero vector encodes as mid-gray red/green, zero blue.
        let center = img.get_pixel(100, 80);
        assert_eq!(center[0], 128);
        assert_eq!(center[1], 128);
        assert_eq!(center[2], 0);
        assert_eq!(center[3], 255);
    }
}
