// ============================================================================
// liquidglass CLI — headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   liquidglass --input photo.png --output glass.png
//   liquidglass -i photo.png -o glass.png --radius 60 --scale 80 --aberration 0.3
//   liquidglass -i "shots/*.png" --output-dir processed/ --padding 16 --blur 4
//   liquidglass -i photo.png -o map.png --show-map
//
// The input image is treated as the captured background, padding border
// included: with --padding P the effect rect is the image minus a P px
// border on every side.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::RgbaImage;

use crate::params::ColorControls;
use crate::pipeline::{GlassPipeline, RenderBackend};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// GPU when available, CPU otherwise.
    Auto,
    /// GPU only; renders pass through unchanged without one.
    Gpu,
    /// CPU only.
    Cpu,
}

/// liquidglass headless image processor.
///
/// Apply the liquid-glass lens distortion to image files — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "liquidglass",
    about = "Liquid-glass lens distortion for image files",
    long_about = "Warp images through a procedurally generated lens displacement map\n\
                  with optional chromatic aberration, blur, and color controls.\n\n\
                  Example:\n  \
                  liquidglass --input photo.png --output glass.png --radius 60 --scale 80\n  \
                  liquidglass -i \"shots/*.png\" --output-dir out/ --padding 16"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and a `_glass` suffix.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JPEG quality (1-100) when the output extension is .jpg/.jpeg.
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Bezel radius in pixels (clamped to half the short side).
    #[arg(long, default_value_t = 40.0)]
    pub radius: f32,

    /// Displacement magnitude in pixels (signed).
    #[arg(long, default_value_t = 50.0)]
    pub scale: f32,

    /// Bezel profile steepness (0-10; 1 = full round bezel).
    #[arg(long, default_value_t = 1.0)]
    pub bezel: f32,

    /// Falloff curve bias.
    #[arg(long, default_value_t = 0.0)]
    pub magic: f32,

    /// Edge-emphasis strength near the bezel rim.
    #[arg(long, default_value_t = 0.0)]
    pub rim: f32,

    /// Deterministic jitter amplitude.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f32,

    /// Chromatic aberration strength (0 = no channel split).
    #[arg(long, default_value_t = 0.0)]
    pub aberration: f32,

    /// Border width in pixels treated as pass-through padding.
    #[arg(long, default_value_t = 0.0)]
    pub padding: f32,

    /// Pre-stage box blur radius in pixels.
    #[arg(long, default_value_t = 0.0)]
    pub blur: f32,

    /// Brightness offset (-1..1).
    #[arg(long, default_value_t = 0.0)]
    pub brightness: f32,

    /// Saturation factor (1 = unchanged, 0 = grayscale).
    #[arg(long, default_value_t = 1.0)]
    pub saturation: f32,

    /// Contrast factor pivoted at mid-gray (1 = unchanged).
    #[arg(long, default_value_t = 1.0)]
    pub contrast: f32,

    /// Write the displacement map visualization instead of the warped image.
    #[arg(long)]
    pub show_map: bool,

    /// Compute backend selection.
    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let backend = match args.backend {
        BackendArg::Auto => RenderBackend::Auto,
        BackendArg::Gpu => RenderBackend::ForceGpu,
        BackendArg::Cpu => RenderBackend::ForceCpu,
    };
    let mut pipeline = GlassPipeline::with_backend(backend);
    pipeline.set_bezel(args.bezel);
    pipeline.set_magic(args.magic);
    pipeline.set_rim(args.rim);
    pipeline.set_noise(args.noise);
    pipeline.set_scale(args.scale);
    pipeline.set_padding(args.padding.max(0.0));
    pipeline.set_aberration(args.aberration);
    pipeline.set_blur(args.blur);
    pipeline.set_color_controls(ColorControls {
        brightness: args.brightness,
        saturation: args.saturation,
        contrast: args.contrast,
    });
    pipeline.set_show_map(args.show_map);
    if let Err(e) = pipeline.set_radius(args.radius) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, &mut pipeline, &args) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    pipeline: &mut GlassPipeline,
    args: &CliArgs,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let source: RgbaImage = image::open(input)
        .map_err(|e| format!("load failed: {}", e))?
        .to_rgba8();

    // -- Step 2: Fit the effect rect to the image ------------------------
    // The image is the capture, padding border included.
    let pad2 = 2.0 * args.padding.max(0.0);
    let rect_w = source.width() as f32 - pad2;
    let rect_h = source.height() as f32 - pad2;
    if rect_w < 1.0 || rect_h < 1.0 {
        return Err(format!(
            "image {}x{} is too small for a {} px padding border",
            source.width(),
            source.height(),
            args.padding
        ));
    }
    pipeline
        .set_size(rect_w, rect_h)
        .map_err(|e| e.to_string())?;

    // -- Step 3: Render + save -------------------------------------------
    let result = pipeline.render(&source);
    save_image(&result, output, args.quality)
}

/// Encode and write; JPEG goes through the quality-aware encoder (after
/// dropping alpha), everything else through the extension-driven writer.
fn save_image(img: &RgbaImage, path: &Path, quality: u8) -> Result<(), String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext == "jpg" || ext == "jpeg" {
        let file = std::fs::File::create(path).map_err(|e| format!("save failed: {}", e))?;
        let mut writer = std::io::BufWriter::new(file);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut writer,
            quality.clamp(1, 100),
        );
        let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ColorType::Rgb8,
            )
            .map_err(|e| format!("save failed: {}", e))
    } else {
        img.save(path).map_err(|e| format!("save failed: {}", e))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, `_glass` appended to the stem
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_string();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}_glass.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}_glass.{}", stem, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_output_path_wins() {
        let p = build_output_path(
            Path::new("shots/a.png"),
            Some(Path::new("out.png")),
            Some(Path::new("dir")),
        );
        assert_eq!(p, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn output_dir_derives_suffixed_name() {
        let p = build_output_path(Path::new("shots/a.png"), None, Some(Path::new("dir")));
        assert_eq!(p, Some(PathBuf::from("dir/a_glass.png")));
    }

    #[test]
    fn fallback_writes_next_to_input() {
        let p = build_output_path(Path::new("shots/a.jpg"), None, None);
        assert_eq!(p, Some(PathBuf::from("shots/a_glass.jpg")));
    }
}
