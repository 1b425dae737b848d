// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================

// ============================================================================
// DISPLACEMENT FIELD GENERATOR — rounded-rect bezel profile into a flat
// (dx, dy) storage buffer, one pair per pixel of the effect rect.
//
// Same math as the CPU generator in src/field.rs; that implementation is the
// reference for the formulas and sign conventions.
// ============================================================================

pub const DISPLACEMENT_FIELD_SHADER: &str = r#"
struct FieldParams {
    grid_w: u32,
    grid_h: u32,
    rect_w: f32,
    rect_h: f32,
    radius: f32,
    bezel: f32,
    magic: f32,
    rim: f32,
    noise: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

// Output displacement field — flat array of (dx, dy) pairs, length = grid_w * grid_h * 2.
@group(0) @binding(0) var<storage, read_write> field_out: array<f32>;
@group(0) @binding(1) var<uniform> params: FieldParams;

fn hash_u32(x_in: u32) -> u32 {
    var x = x_in * 0x9E3779B9u;
    x = x ^ (x >> 16u);
    x = x * 0x85EBCA6Bu;
    x = x ^ (x >> 13u);
    x = x * 0xC2B2AE35u;
    x = x ^ (x >> 16u);
    return x;
}

fn hash_f32(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(x * 374761393u + y * 668265263u + seed);
    return f32(h & 0x00FFFFFFu) / 16777216.0;
}

@compute @workgroup_size(16, 16)
fn cs_displacement_field(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.grid_w || gid.y >= params.grid_h) {
        return;
    }
    let idx = (gid.y * params.grid_w + gid.x) * 2u;

    let half_w = params.rect_w * 0.5;
    let half_h = params.rect_h * 0.5;
    // Pixel-center coordinates relative to the rect center.
    let px = f32(gid.x) + 0.5 - half_w;
    let py = f32(gid.y) + 0.5 - half_h;

    // Rounded-rect signed distance (negative inside).
    let qx = abs(px) - (half_w - params.radius);
    let qy = abs(py) - (half_h - params.radius);
    let mq = max(vec2<f32>(qx, qy), vec2<f32>(0.0, 0.0));
    let sd = length(mq) + min(max(qx, qy), 0.0) - params.radius;

    if (sd > 0.0) {
        field_out[idx] = 0.0;
        field_out[idx + 1u] = 0.0;
        return;
    }

    // Bezel falloff: v is 1 at the boundary, 0 at the band's inner edge.
    let s = -sd / params.radius;
    let v = clamp(1.0 - s * params.bezel, 0.0, 1.0);
    let sm = v * v * (3.0 - 2.0 * v);
    let m = pow(sm, exp2(params.magic));

    // Outward normal: axis normal on the flat sides, radial at the corners.
    // sign() is 0 at 0, which zeroes the direction on the center lines.
    var dir_x = 0.0;
    var dir_y = 0.0;
    if (qx > 0.0 && qy > 0.0) {
        let len = length(vec2<f32>(qx, qy));
        dir_x = sign(px) * qx / len;
        dir_y = sign(py) * qy / len;
    } else if (qx > qy) {
        dir_x = sign(px);
    } else if (qy > qx) {
        dir_y = sign(py);
    } else {
        dir_x = sign(px) * 0.70710678;
        dir_y = sign(py) * 0.70710678;
    }

    let mag = m + params.rim * v * v * v * v * v * v;
    var dx = dir_x * mag;
    var dy = dir_y * mag;

    if (params.noise > 0.0) {
        // Jitter masked by the profile and the normal magnitude so
        // zero-displacement points stay exactly zero.
        let amp = params.noise * m * length(vec2<f32>(dir_x, dir_y));
        let jx = hash_f32(gid.x, gid.y, 0x51ABu) * 2.0 - 1.0;
        let jy = hash_f32(gid.x, gid.y, 0xC0DEu) * 2.0 - 1.0;
        dx = dx + jx * amp;
        dy = dy + jy * amp;
    }

    field_out[idx] = dx;
    field_out[idx + 1u] = dy;
}
"#;

// ============================================================================
// GLASS WARP — resample the source through the displacement field with
// per-channel (chromatic) offsets and a pass-through padding border.
// ============================================================================

pub const GLASS_WARP_SHADER: &str = r#"
struct WarpParams {
    out_w: u32,
    out_h: u32,
    field_w: u32,
    field_h: u32,
    scale: f32,
    padding: f32,
    aberration: f32,
    blend_px: f32,
};

@group(0) @binding(0) var source_tex: texture_2d<f32>;
@group(0) @binding(1) var output_tex: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(2) var<storage, read> field: array<f32>;
@group(0) @binding(3) var<uniform> params: WarpParams;

// Clamp-to-edge texel load: sampling never reads outside the source.
fn load_clamped(x: i32, y: i32) -> vec4<f32> {
    let cx = clamp(x, 0, i32(params.out_w) - 1);
    let cy = clamp(y, 0, i32(params.out_h) - 1);
    return textureLoad(source_tex, vec2<i32>(cx, cy), 0);
}

fn sample_bilinear(pos: vec2<f32>) -> vec4<f32> {
    let x0 = i32(floor(pos.x));
    let y0 = i32(floor(pos.y));
    let fx = pos.x - floor(pos.x);
    let fy = pos.y - floor(pos.y);

    let tl = load_clamped(x0,     y0);
    let tr = load_clamped(x0 + 1, y0);
    let bl = load_clamped(x0,     y0 + 1);
    let br = load_clamped(x0 + 1, y0 + 1);

    return mix(mix(tl, tr, fx), mix(bl, br, fx), fy);
}

// Attenuation toward the field boundary; only active with a padding border.
fn edge_fade(fx: f32, fy: f32) -> f32 {
    if (params.padding <= 0.0) {
        return 1.0;
    }
    let d = min(
        min(fx, fy),
        min(f32(params.field_w) - 1.0 - fx, f32(params.field_h) - 1.0 - fy)
    );
    let t = clamp(d / params.blend_px, 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}

@compute @workgroup_size(16, 16)
fn cs_glass_warp(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.out_w || gid.y >= params.out_h) {
        return;
    }

    // Field-space position; nearest lookup (field and pixel grids are 1:1).
    let fx = f32(gid.x) - params.padding;
    let fy = f32(gid.y) - params.padding;
    let fxi = i32(round(fx));
    let fyi = i32(round(fy));

    var base = vec2<f32>(0.0, 0.0);
    if (fxi >= 0 && fyi >= 0 && fxi < i32(params.field_w) && fyi < i32(params.field_h)) {
        let idx = (u32(fyi) * params.field_w + u32(fxi)) * 2u;
        let d = vec2<f32>(field[idx], field[idx + 1u]);
        base = params.scale * d * edge_fade(fx, fy);
    }

    let pos = vec2<f32>(f32(gid.x), f32(gid.y));
    // Green (and alpha) ride the base offset; red and blue split around it.
    let g = sample_bilinear(pos + base);
    var color = g;
    if (params.aberration != 0.0) {
        let r = sample_bilinear(pos + base * (1.0 + params.aberration));
        let b = sample_bilinear(pos + base * (1.0 - params.aberration));
        color = vec4<f32>(r.r, g.g, b.b, g.a);
    }

    textureStore(output_tex, vec2<u32>(gid.x, gid.y), color);
}
"#;

// ============================================================================
// BOX BLUR — two-pass separable, direction selected by uniform.
// ============================================================================

pub const BOX_BLUR_SHADER: &str = r#"
struct BlurParams {
    width: u32,
    height: u32,
    radius: u32,
    direction: u32,  // 0 = horizontal, 1 = vertical
};

@group(0) @binding(0) var input_tex: texture_2d<f32>;
@group(0) @binding(1) var output_tex: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(2) var<uniform> params: BlurParams;

@compute @workgroup_size(16, 16)
fn cs_box_blur(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }

    let r = i32(params.radius);
    var acc = vec4<f32>(0.0, 0.0, 0.0, 0.0);

    if (params.direction == 0u) {
        for (var k: i32 = -r; k <= r; k = k + 1) {
            let sx = clamp(i32(gid.x) + k, 0, i32(params.width) - 1);
            acc = acc + textureLoad(input_tex, vec2<i32>(sx, i32(gid.y)), 0);
        }
    } else {
        for (var k: i32 = -r; k <= r; k = k + 1) {
            let sy = clamp(i32(gid.y) + k, 0, i32(params.height) - 1);
            acc = acc + textureLoad(input_tex, vec2<i32>(i32(gid.x), sy), 0);
        }
    }

    let color = acc / f32(2 * r + 1);
    textureStore(output_tex, vec2<u32>(gid.x, gid.y), color);
}
"#;

// ============================================================================
// COLOR CONTROLS — saturation (BT.709 luminance mix), brightness offset,
// contrast pivoted at mid-gray. Same formulas as the CPU version in
// src/ops/color.rs, in 0-1 space.
// ============================================================================

pub const COLOR_CONTROLS_SHADER: &str = r#"
struct ColorParams {
    width:      u32,
    height:     u32,
    brightness: f32,
    saturation: f32,
    contrast:   f32,
    _pad0:      f32,
    _pad1:      f32,
    _pad2:      f32,
};

@group(0) @binding(0) var input_tex:  texture_2d<f32>;
@group(0) @binding(1) var output_tex: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(2) var<uniform> params: ColorParams;

@compute @workgroup_size(16, 16)
fn cs_color_controls(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }

    let px = textureLoad(input_tex, vec2<u32>(gid.x, gid.y), 0);

    let luma = dot(px.rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    var rgb = vec3<f32>(luma) + (px.rgb - vec3<f32>(luma)) * params.saturation;
    rgb = rgb + vec3<f32>(params.brightness);
    rgb = (rgb - vec3<f32>(0.5)) * params.contrast + vec3<f32>(0.5);
    rgb = clamp(rgb, vec3<f32>(0.0), vec3<f32>(1.0));

    textureStore(output_tex, vec2<u32>(gid.x, gid.y), vec4<f32>(rgb, px.a));
}
"#;
