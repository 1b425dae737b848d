//! Color controls: saturation, brightness, contrast.
//!
//! Order matches the stock color-controls operator: saturation first
//! (luminance mix with BT.709 weights), then brightness as an offset
//! (fraction of full scale, -1..1), then contrast pivoted at mid-gray.
//! Alpha is preserved.

use image::RgbaImage;
use rayon::prelude::*;

use crate::params::ColorControls;

/// Apply color controls to every pixel. Identity parameters return a copy.
pub fn apply_color_controls(src: &RgbaImage, cc: &ColorControls) -> RgbaImage {
    if cc.is_identity() {
        return src.clone();
    }

    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; src_raw.len()];
    let offset = cc.brightness * 255.0;

    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let r = row_in[pi] as f32;
            let g = row_in[pi + 1] as f32;
            let b = row_in[pi + 2] as f32;

            // BT.709 luminance.
            let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            let mut rgb = [
                luma + (r - luma) * cc.saturation,
                luma + (g - luma) * cc.saturation,
                luma + (b - luma) * cc.saturation,
            ];
            for c in &mut rgb {
                *c += offset;
                *c = (*c - 127.5) * cc.contrast + 127.5;
            }

            row_out[pi] = rgb[0].round().clamp(0.0, 255.0) as u8;
            row_out[pi + 1] = rgb[1].round().clamp(0.0, 255.0) as u8;
            row_out[pi + 2] = rgb[2].round().clamp(0.0, 255.0) as u8;
            row_out[pi + 3] = row_in[pi + 3];
        }
    });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn one_pixel(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba([r, g, b, 255]))
    }

    #[test]
    fn identity_returns_equal_image() {
        let src = one_pixel(100, 150, 200);
        assert_eq!(apply_color_controls(&src, &ColorControls::default()), src);
    }

    #[test]
    fn zero_saturation_desaturates_to_luminance() {
        let src = one_pixel(100, 150, 200);
        let cc = ColorControls {
            saturation: 0.0,
            ..Default::default()
        };
        let out = apply_color_controls(&src, &cc);
        // 0.2126*100 + 0.7152*150 + 0.0722*200 = 142.98 -> 143
        let p = out.get_pixel(0, 0);
        assert_eq!(p[0], 143);
        assert_eq!(p[1], 143);
        assert_eq!(p[2], 143);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn brightness_offsets_and_clamps() {
        let src = one_pixel(100, 200, 250);
        let cc = ColorControls {
            brightness: 0.1,
            ..Default::default()
        };
        let p = apply_color_controls(&src, &cc);
        let p = p.get_pixel(0, 0);
        // +25.5 per channel, clamped at 255.
        assert_eq!(p[0], 126);
        assert_eq!(p[1], 226);
        assert_eq!(p[2], 255);
    }

    #[test]
    fn contrast_pivots_at_mid_gray() {
        let src = one_pixel(128, 128, 128);
        let cc = ColorControls {
            contrast: 2.0,
            ..Default::default()
        };
        let p = apply_color_controls(&src, &cc);
        // (128 - 127.5) * 2 + 127.5 = 128.5 -> 129 (barely moves off-pivot).
        assert_eq!(p.get_pixel(0, 0)[0], 129);

        let src = one_pixel(100, 100, 100);
        let p = apply_color_controls(&src, &cc);
        // (100 - 127.5) * 2 + 127.5 = 72.5 -> 73
        assert_eq!(p.get_pixel(0, 0)[0], 73);
    }
}
