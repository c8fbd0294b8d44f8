// ============================================================================
// ColorShift CLI — headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   colorshift grayscale -i photo.png -o photo_bw.png
//   colorshift recolor --target "(102, 147, 163)" --channel r -i photo.jpg
//   colorshift preset sepia -i shots/ --output-dir processed/ --format png
//   colorshift adjust --contrast 1.4 --brightness 0.9 -i "shots/*.jpg"
//   colorshift menu                                   (interactive prompts)
//   colorshift config --reset                         (write the settings file)
//
// Files are processed one after another; a failing file is reported and the
// batch carries on.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::io::{
    SaveFormat, avoid_input, is_supported_image, load_raster, modified_path, save_raster,
    source_format,
};
use crate::ops::{self, Channel, Color, KernelKind, Preset, TransformParameters};
use crate::settings::Settings;
use crate::{log_err, log_info, log_warn};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// ColorShift image recolouring tool.
#[derive(Parser, Debug)]
#[command(
    name = "colorshift",
    about = "Apply a color transform to one or many images",
    long_about = "Load images, apply one pixel transform and save the result.\n\
                  Inputs may be files, directories or glob patterns.\n\n\
                  Example:\n  \
                  colorshift grayscale -i photo.png -o photo_bw.png\n  \
                  colorshift preset warm -i shots/ --output-dir out/"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub transform: TransformCommand,

    /// Input file(s): paths, directories (non-recursive) or glob patterns.
    #[arg(short, long, num_args = 1.., global = true)]
    pub input: Vec<String>,

    /// Output file path. Only valid for a single input.
    #[arg(short, long, value_name = "FILE", global = true, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing. Files keep their stem.
    #[arg(long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp, tga, tiff.
    /// Defaults to the output's extension, then the input's, then the settings file.
    #[arg(short, long, value_name = "FORMAT", global = true)]
    pub format: Option<String>,

    /// JPEG quality (1-100). Defaults to the settings file.
    #[arg(short, long, value_name = "1-100", global = true,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Print per-file timing information.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum TransformCommand {
    /// Convert to grayscale.
    Grayscale,
    /// Replace near-black background pixels with a color.
    Background {
        /// Replacement color, e.g. "(255, 255, 255)" or 255,255,255
        #[arg(long)]
        color: Color,
        /// Pixels with every channel below this are replaced.
        #[arg(long)]
        threshold: Option<u8>,
    },
    /// Blend pixels dominated by one channel toward a target color.
    Recolor {
        #[arg(long)]
        target: Color,
        /// r, g or b
        #[arg(long)]
        channel: Channel,
    },
    /// Cover dark pixels with a mask color.
    Mask {
        #[arg(long)]
        color: Color,
        #[arg(long)]
        threshold: Option<u8>,
    },
    /// Contrast and brightness factors (0.0-2.0, 1.0 = unchanged).
    Adjust {
        #[arg(long, default_value_t = 1.0, value_parser = parse_factor)]
        contrast: f32,
        #[arg(long, default_value_t = 1.0, value_parser = parse_factor)]
        brightness: f32,
    },
    /// Named color preset: warm, cool, vintage, sepia.
    Preset { name: Preset },
    /// Blend a vertical two-color gradient over the image.
    Gradient {
        #[arg(long)]
        from: Color,
        #[arg(long)]
        to: Color,
    },
    /// 3x3 sharpen.
    Sharpen,
    /// 3x3 box blur.
    Blur,
    /// Set a uniform alpha level (0-255).
    Transparency {
        #[arg(long)]
        level: u8,
    },
    /// Interactive prompt menu.
    Menu,
    /// Write the effective settings to the settings file.
    Config {
        /// Write the built-in defaults instead.
        #[arg(long)]
        reset: bool,
    },
}

fn parse_factor(s: &str) -> Result<f32, String> {
    let v: f32 = s.trim().parse().map_err(|_| format!("'{}' is not a number", s))?;
    if v.is_finite() && (0.0..=2.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{} is outside 0.0-2.0", v))
    }
}

impl TransformCommand {
    /// Engine parameters for this command; `None` for `menu` and `config`.
    pub fn to_params(&self, settings: &Settings) -> Option<TransformParameters> {
        let params = match self {
            TransformCommand::Grayscale => TransformParameters::Grayscale,
            TransformCommand::Background { color, threshold } => {
                TransformParameters::BackgroundReplace {
                    new_color: *color,
                    threshold: threshold.unwrap_or(settings.background_threshold),
                }
            }
            TransformCommand::Recolor { target, channel } => TransformParameters::Recolor {
                target: *target,
                channel: *channel,
            },
            TransformCommand::Mask { color, threshold } => TransformParameters::ColorMask {
                mask_color: *color,
                threshold: threshold.unwrap_or(settings.mask_threshold),
            },
            TransformCommand::Adjust { contrast, brightness } => {
                TransformParameters::ContrastBrightness {
                    contrast: *contrast,
                    brightness: *brightness,
                }
            }
            TransformCommand::Preset { name } => TransformParameters::Preset(*name),
            TransformCommand::Gradient { from, to } => TransformParameters::Gradient {
                from: *from,
                to: *to,
            },
            TransformCommand::Sharpen => TransformParameters::SharpenBlur(KernelKind::Sharpen),
            TransformCommand::Blur => TransformParameters::SharpenBlur(KernelKind::Blur),
            TransformCommand::Transparency { level } => {
                TransformParameters::Transparency { level: *level }
            }
            TransformCommand::Menu | TransformCommand::Config { .. } => return None,
        };
        Some(params)
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run with settings from the user's config file.
pub fn run(args: CliArgs) -> ExitCode {
    run_with_settings(args, &Settings::load())
}

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run_with_settings(args: CliArgs, settings: &Settings) -> ExitCode {
    let Some(params) = args.transform.to_params(settings) else {
        return match args.transform {
            TransformCommand::Config { reset } => write_config(settings, reset),
            _ => run_menu(settings),
        };
    };

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given path(s) or pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let forced_format = match args.format.as_deref() {
        Some(name) => match SaveFormat::from_name(name) {
            Some(f) => Some(f),
            None => {
                eprintln!("error: unknown output format '{}'.", name);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };
    let quality = args.quality.unwrap_or(settings.jpeg_quality);

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    log_info!("Batch {} over {} file(s)", params.name(), inputs.len());

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let format = forced_format.unwrap_or_else(|| {
            infer_format(input_path, args.output.as_deref(), settings.default_format)
        });
        let output_path = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            &settings.output_suffix,
            format,
        );

        match run_one(input_path, &output_path, &params, format, quality) {
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
                log_err!("{}: {}", input_path.display(), e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn run_menu(settings: &Settings) -> ExitCode {
    let mut input = std::io::stdin().lock();
    let mut output = std::io::stdout();
    match crate::menu::run(&mut input, &mut output, settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            log_err!("Menu aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn write_config(settings: &Settings, reset: bool) -> ExitCode {
    let settings = if reset { Settings::default() } else { settings.clone() };
    match settings.save() {
        Ok(path) => {
            println!("Settings written to {}", path.display());
            print!("{}", settings.to_config_string());
            log_info!("Settings written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            log_err!("Settings not written: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    params: &TransformParameters,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let raster = load_raster(input).map_err(|e| format!("load failed: {}", e))?;
    let result = ops::apply(&raster, params).map_err(|e| format!("transform failed: {}", e))?;
    save_raster(&result, output, format, quality).map_err(|e| format!("save failed: {}", e))?;
    log_info!("{} -> {}", input.display(), output.display());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand literal paths, directories and glob patterns into a deduplicated,
/// ordered list. Directory entries are filtered to supported images and sorted.
pub fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.is_dir() {
            match std::fs::read_dir(as_path) {
                Ok(entries) => {
                    let mut files: Vec<PathBuf> = entries
                        .flatten()
                        .map(|e| e.path())
                        .filter(|p| p.is_file() && is_supported_image(p))
                        .collect();
                    files.sort();
                    if files.is_empty() {
                        eprintln!("warning: directory '{}' holds no supported images.", pattern);
                        log_warn!("Directory {} holds no supported images", pattern);
                    }
                    for f in files {
                        push_unique(&mut result, f);
                    }
                }
                Err(e) => eprintln!("warning: could not read directory '{}': {}", pattern, e),
            }
            continue;
        }

        if as_path.exists() {
            push_unique(&mut result, as_path.to_path_buf());
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    push_unique(&mut result, entry);
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

fn push_unique(result: &mut Vec<PathBuf>, path: PathBuf) {
    if !result.contains(&path) {
        result.push(path);
    }
}

/// Output extension decides first, then the input's own format, then `fallback`.
fn infer_format(input: &Path, output: Option<&Path>, fallback: SaveFormat) -> SaveFormat {
    output
        .and_then(SaveFormat::from_extension)
        .unwrap_or_else(|| source_format(input, fallback))
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, keeps the input stem)
/// 3. Next to the input, with `suffix` appended to the stem
///
/// Paths from 2 and 3 never name the input itself; a clash becomes `<stem>_out.<ext>`.
pub fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    suffix: &str,
    format: SaveFormat,
) -> PathBuf {
    if let Some(out) = output {
        return out.to_path_buf();
    }

    if let Some(dir) = output_dir {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        return avoid_input(input, dir.join(format!("{}.{}", stem, format.extension())));
    }

    modified_path(input, suffix, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommand_with_global_inputs_parses() {
        let args = CliArgs::try_parse_from([
            "colorshift", "recolor", "--target", "(0, 0, 255)", "--channel", "r", "-i", "a.png",
            "b.png",
        ])
        .unwrap();
        assert_eq!(args.input, vec!["a.png", "b.png"]);
        assert_eq!(
            args.transform.to_params(&Settings::default()),
            Some(TransformParameters::Recolor {
                target: Color::new(0, 0, 255),
                channel: Channel::R
            })
        );
    }

    #[test]
    fn thresholds_default_from_settings() {
        let settings = Settings { mask_threshold: 42, ..Settings::default() };
        let args =
            CliArgs::try_parse_from(["colorshift", "mask", "--color", "9,9,9", "-i", "x.png"])
                .unwrap();
        assert_eq!(
            args.transform.to_params(&settings),
            Some(TransformParameters::ColorMask { mask_color: Color::new(9, 9, 9), threshold: 42 })
        );
    }

    #[test]
    fn ranges_are_enforced_by_the_parser() {
        for argv in [
            vec!["colorshift", "adjust", "--contrast", "2.5"],
            vec!["colorshift", "transparency", "--level", "300"],
            vec!["colorshift", "background", "--color", "(256, 0, 0)"],
            vec!["colorshift", "preset", "neon"],
            vec!["colorshift", "grayscale", "-q", "0"],
        ] {
            assert!(CliArgs::try_parse_from(argv.clone()).is_err(), "{:?}", argv);
        }
    }

    #[test]
    fn menu_and_config_have_no_params() {
        assert_eq!(TransformCommand::Menu.to_params(&Settings::default()), None);
        let args = CliArgs::try_parse_from(["colorshift", "config", "--reset"]).unwrap();
        assert_eq!(args.transform, TransformCommand::Config { reset: true });
        assert_eq!(args.transform.to_params(&Settings::default()), None);
    }

    #[test]
    fn output_file_and_output_dir_are_exclusive() {
        let argv = [
            "colorshift", "grayscale", "-i", "a.png", "b.png", "-o", "one.png", "--output-dir",
            "od",
        ];
        assert!(CliArgs::try_parse_from(argv).is_err());
    }

    #[test]
    fn output_path_priority() {
        let input = Path::new("in/photo.jpg");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), None, "-Modified", SaveFormat::Png),
            PathBuf::from("x.png")
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), "-Modified", SaveFormat::Png),
            PathBuf::from("out/photo.png")
        );
        assert_eq!(
            build_output_path(input, None, None, "-Modified", SaveFormat::Jpeg),
            PathBuf::from("in/photo-Modified.jpg")
        );
    }

    #[test]
    fn format_inference_order() {
        let input = Path::new("photo.bmp");
        assert_eq!(
            infer_format(input, Some(Path::new("o.tga")), SaveFormat::Png),
            SaveFormat::Tga
        );
        assert_eq!(infer_format(input, None, SaveFormat::Png), SaveFormat::Bmp);
        assert_eq!(infer_format(Path::new("photo.gif"), None, SaveFormat::Jpeg), SaveFormat::Jpeg);
    }
}
