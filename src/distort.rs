//! Distortion resampler: warp a source image through a displacement field.
//!
//! The output covers `(width + 2*padding) x (height + 2*padding)`; the field
//! covers `width x height` and sits `padding` pixels inset from the output
//! origin. The source image must already carry the padding border (the
//! capture collaborator hands it over that way), so source and output share
//! one coordinate frame.
//!
//! Chromatic aberration convention: red samples at `(1 + aberration)` times
//! the base offset, blue at `(1 - aberration)`, green at the base offset,
//! and alpha rides with the green tap.

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::GlassError;
use crate::field::DisplacementField;
use crate::params::DistortParams;

/// Width of the smooth attenuation band at the field boundary, in pixels.
/// Only active when a padding border exists; it hides the seam between the
/// displaced interior and the pass-through border.
const EDGE_BLEND_PX: f32 = 2.0;

/// Warp `source` through `field`.
///
/// Pure function of its inputs. Fails with
/// [`GlassError::DimensionMismatch`] when the field extent disagrees with
/// `params.width x params.height` or the source extent disagrees with the
/// output extent; no partial output is ever produced.
pub fn warp(
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
    if out_w == 0 || out_h == 0 {
        return Ok(source.clone());
    }

    let padding = params.padding.max(0.0);
    let scale = params.scale;
    let aberration = params.aberration;

    let stride = out_w as usize * 4;
    let mut dst = vec![0u8; stride * out_h as usize];

    dst.par_chunks_mut(stride).enumerate().for_each(|(oy, row)| {
        for ox in 0..out_w as usize {
            // Field-space position of this output pixel; nearest lookup
            // (field and pixel grids are 1:1).
            let fx = ox as f32 - padding;
            let fy = oy as f32 - padding;
            let fxi = fx.round() as i64;
            let fyi = fy.round() as i64;
            let in_field = fxi >= 0
                && fyi >= 0
                && (fxi as u32) < field_w
                && (fyi as u32) < field_h;

            let (base_x, base_y) = if in_field {
                let [dx, dy] = field.get(fxi as u32, fyi as u32);
                let fade = edge_fade(fx, fy, field_w, field_h, padding);
                (scale * dx * fade, scale * dy * fade)
            } else {
                // Padding border: the field has no value here, pass through.
                (0.0, 0.0)
            };

            let pi = ox * 4;
            if base_x == 0.0 && base_y == 0.0 {
                let p = source.get_pixel(ox as u32, oy as u32);
                row[pi..pi + 4].copy_from_slice(&p.0);
                continue;
            }

            let ox_f = ox as f32;
            let oy_f = oy as f32;
            let g = sample_bilinear(source, ox_f + base_x, oy_f + base_y);
            let (r, b) = if aberration == 0.0 {
                (g, g)
            } else {
                let ka = 1.0 + aberration;
                let kb = 1.0 - aberration;
                (
                    sample_bilinear(source, ox_f + base_x * ka, oy_f + base_y * ka),
                    sample_bilinear(source, ox_f + base_x * kb, oy_f + base_y * kb),
                )
            };

            row[pi] = r[0].round().clamp(0.0, 255.0) as u8;
            row[pi + 1] = g[1].round().clamp(0.0, 255.0) as u8;
            row[pi + 2] = b[2].round().clamp(0.0, 255.0) as u8;
            row[pi + 3] = g[3].round().clamp(0.0, 255.0) as u8;
        }
    });

    Ok(RgbaImage::from_raw(out_w, out_h, dst).unwrap())
}

/// Attenuation toward the field boundary when a padding border exists.
/// 1.0 everywhere with no padding: the bezel may legitimately reach the
/// output edge and must not be faded there.
#[inline]
fn edge_fade(fx: f32, fy: f32, field_w: u32, field_h: u32, padding: f32) -> f32 {
    if padding <= 0.0 {
        return 1.0;
    }
    let d = fx
        .min(fy)
        .min(field_w as f32 - 1.0 - fx)
        .min(field_h as f32 - 1.0 - fy);
    let t = (d / EDGE_BLEND_PX).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Clamp-sample a pixel (clamp-to-edge policy).
#[inline]
fn sample_clamped(img: &RgbaImage, x: i64, y: i64) -> [f32; 4] {
    let cx = x.clamp(0, img.width() as i64 - 1) as u32;
    let cy = y.clamp(0, img.height() as i64 - 1) as u32;
    let p = img.get_pixel(cx, cy);
    [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
}

/// Bilinear-sample at fractional pixel-index coordinates with clamp-to-edge.
#[inline]
fn sample_bilinear(img: &RgbaImage, fx: f32, fy: f32) -> [f32; 4] {
    let x0 = fx.floor() as i64;
    let y0 = fy.floor() as i64;
    let dx = fx - x0 as f32;
    let dy = fy - y0 as f32;

    let p00 = sample_clamped(img, x0, y0);
    let p10 = sample_clamped(img, x0 + 1, y0);
    let p01 = sample_clamped(img, x0, y0 + 1);
    let p11 = sample_clamped(img, x0 + 1, y0 + 1);

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        out[c] = p00[c] * (1.0 - dx) * (1.0 - dy)
            + p10[c] * dx * (1.0 - dy)
            + p01[c] * (1.0 - dx) * dy
            + p11[c] * dx * dy;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::generate_field;
    use crate::params::ShapeParams;
    use image::Rgba;

    /// Diagonal gradient test image, distinct per channel.
    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([
                (x % 256) as u8,
                (y % 256) as u8,
                ((x + y) % 256) as u8,
                255,
            ])
        })
    }

    fn constant_field(w: u32, h: u32, v: [f32; 2]) -> DisplacementField {
        DisplacementField::from_raw(w, h, vec![v; w as usize * h as usize])
    }

    #[test]
    fn zero_scale_is_identity() {
        let src = gradient(200, 160);
        let field = generate_field(&ShapeParams::default()).unwrap();
        let params = DistortParams {
            scale: 0.0,
            ..Default::default()
        };
        let out = warp(&src, &field, &params).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn zero_padding_output_matches_field_extent() {
        let src = gradient(200, 160);
        let field = generate_field(&ShapeParams::default()).unwrap();
        let out = warp(&src, &field, &DistortParams::default()).unwrap();
        assert_eq!(out.dimensions(), (200, 160));
    }

    #[test]
    fn padded_output_grows_by_padding_on_each_side() {
        let field = generate_field(&ShapeParams::default()).unwrap();
        let params = DistortParams {
            padding: 8.0,
            ..Default::default()
        };
        let src = gradient(216, 176);
        let out = warp(&src, &field, &params).unwrap();
        assert_eq!(out.dimensions(), (216, 176));
    }

    #[test]
    fn padding_border_passes_source_through() {
        let field = generate_field(&ShapeParams::default()).unwrap();
        let params = DistortParams {
            padding: 8.0,
            scale: 50.0,
            ..Default::default()
        };
        let src = gradient(216, 176);
        let out = warp(&src, &field, &params).unwrap();
        // Everything in the 8 px border is outside the field: untouched.
        for x in 0..216 {
            assert_eq!(out.get_pixel(x, 0), src.get_pixel(x, 0));
            assert_eq!(out.get_pixel(x, 175), src.get_pixel(x, 175));
        }
        for y in 0..176 {
            assert_eq!(out.get_pixel(0, y), src.get_pixel(0, y));
            assert_eq!(out.get_pixel(3, y), src.get_pixel(3, y));
        }
    }

    #[test]
    fn constant_field_shifts_all_channels_identically() {
        // Unit +x field, scale 5, no aberration: every channel reads 5 px
        // to the right.
        let src = gradient(64, 32);
        let field = constant_field(64, 32, [1.0, 0.0]);
        let params = DistortParams {
            scale: 5.0,
            radius: 8.0,
            padding: 0.0,
            aberration: 0.0,
            width: 64.0,
            height: 32.0,
        };
        let out = warp(&src, &field, &params).unwrap();
        for y in 10..20 {
            for x in 10..50 {
                assert_eq!(out.get_pixel(x, y), src.get_pixel(x + 5, y));
            }
        }
    }

    #[test]
    fn aberration_splits_red_and_blue() {
        let src = gradient(64, 32);
        let field = constant_field(64, 32, [1.0, 0.0]);
        let params = DistortParams {
            scale: 4.0,
            radius: 8.0,
            padding: 0.0,
            aberration: 0.5,
            width: 64.0,
            height: 32.0,
        };
        let out = warp(&src, &field, &params).unwrap();
        // Red offset 4*1.5=6, green 4, blue 4*0.5=2 (all integral).
        let p = out.get_pixel(20, 15);
        assert_eq!(p[0], src.get_pixel(26, 15)[0]);
        assert_eq!(p[1], src.get_pixel(24, 15)[1]);
        assert_eq!(p[2], src.get_pixel(22, 15)[2]);
        assert_eq!(p[3], src.get_pixel(24, 15)[3]);
    }

    #[test]
    fn sampling_clamps_at_the_source_edge() {
        // Field pushes far beyond the right edge; the sample clamps to the
        // last column instead of reading out of bounds or wrapping.
        let src = gradient(32, 16);
        let field = constant_field(32, 16, [1.0, 0.0]);
        let params = DistortParams {
            scale: 1000.0,
            radius: 8.0,
            padding: 0.0,
            aberration: 0.0,
            width: 32.0,
            height: 16.0,
        };
        let out = warp(&src, &field, &params).unwrap();
        assert_eq!(out.get_pixel(5, 8), src.get_pixel(31, 8));
    }

    #[test]
    fn field_extent_mismatch_is_rejected() {
        let src = gradient(200, 160);
        let field = DisplacementField::zero(100, 80);
        let err = warp(&src, &field, &DistortParams::default()).unwrap_err();
        assert!(matches!(err, GlassError::DimensionMismatch { .. }));
    }

    #[test]
    fn source_extent_mismatch_is_rejected() {
        let src = gradient(64, 64);
        let field = DisplacementField::zero(200, 160);
        let err = warp(&src, &field, &DistortParams::default()).unwrap_err();
        assert!(matches!(err, GlassError::DimensionMismatch { .. }));
    }
}
