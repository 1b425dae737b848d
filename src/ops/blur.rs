//! Separable box blur, rayon-parallelized by row.
//!
//! The pre-stage softens the captured background before it is warped, which
//! reads as frosted glass. A box kernel (uniform weights) matches the stock
//! effect's blur; edge handling is clamp-to-edge like every other sampler in
//! this crate.

use image::RgbaImage;
use rayon::prelude::*;

/// Two-pass box blur with kernel radius `radius` (pixels, rounded).
/// Radius below one returns the input unchanged.
pub fn box_blur(src: &RgbaImage, radius: f32) -> RgbaImage {
    let r = radius.round().max(0.0) as i64;
    let w = src.width() as usize;
    let h = src.height() as usize;
    if r == 0 || w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let stride = w * 4;
    let inv = 1.0 / (2 * r + 1) as f32;

    // Keep the intermediate in f32 so the two passes do not accumulate
    // quantization error.
    let buf_in: Vec<f32> = src_raw.iter().map(|&b| b as f32).collect();

    // --- Horizontal pass (parallel by row) ---
    let mut buf_h = vec![0.0f32; buf_in.len()];
    buf_h.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &buf_in[y * stride..(y + 1) * stride];
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for k in -r..=r {
                let sx = (x as i64 + k).clamp(0, w as i64 - 1) as usize;
                let idx = sx * 4;
                for c in 0..4 {
                    acc[c] += row_in[idx + c];
                }
            }
            let out_idx = x * 4;
            for c in 0..4 {
                row_out[out_idx + c] = acc[c] * inv;
            }
        }
    });

    // --- Vertical pass (parallel by row) ---
    let mut buf_v = vec![0.0f32; buf_h.len()];
    buf_v.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for k in -r..=r {
                let sy = (y as i64 + k).clamp(0, h as i64 - 1) as usize;
                let idx = sy * stride + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c];
                }
            }
            let out_idx = x * 4;
            for c in 0..4 {
                row_out[out_idx + c] = acc[c] * inv;
            }
        }
    });

    let dst: Vec<u8> = buf_v
        .iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    RgbaImage::from_raw(w as u32, h as u32, dst).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn zero_radius_is_identity() {
        let src = RgbaImage::from_fn(8, 8, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 0, 255]));
        assert_eq!(box_blur(&src, 0.0), src);
        assert_eq!(box_blur(&src, 0.4), src);
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let src = RgbaImage::from_pixel(16, 16, Rgba([40, 90, 200, 255]));
        assert_eq!(box_blur(&src, 3.0), src);
    }

    #[test]
    fn single_bright_row_spreads_evenly() {
        // 3x1 gray ramp [0, 255, 0] with r=1: clamp-to-edge makes every
        // horizontal average (0 + 255 + 0-or-clamped)/3 = 85.
        let mut src = RgbaImage::from_pixel(3, 1, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let out = box_blur(&src, 1.0);
        for x in 0..3 {
            let p = out.get_pixel(x, 0);
            assert_eq!(p[0], 85, "x={x}");
            assert_eq!(p[3], 255);
        }
    }
}
