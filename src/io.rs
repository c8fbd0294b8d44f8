use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{ColorType, DynamicImage, ImageError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::raster::Raster;

/// Extensions the loader accepts (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tga", "tif", "tiff"];

/// Check if a path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

// ============================================================================
// ERRORS
// ============================================================================

/// Error type for image load/save
#[derive(Debug)]
pub enum IoError {
    NotFound(PathBuf),
    Decode(String),
    Write(String),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::NotFound(p) => write!(f, "File not found: {}", p.display()),
            IoError::Decode(e) => write!(f, "Could not decode image: {}", e),
            IoError::Write(e) => write!(f, "Could not write image: {}", e),
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Write(e.to_string())
    }
}

impl From<ImageError> for IoError {
    fn from(e: ImageError) -> Self {
        IoError::Write(e.to_string())
    }
}

// ============================================================================
// SAVE FORMAT
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpeg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpeg" | "jpg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "tiff" | "tif" => Some(SaveFormat::Tiff),
            _ => None,
        }
    }

    /// Format named by a path's extension, if it is one we write.
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_name)
    }

    /// Infer from a path's extension, defaulting to PNG.
    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(path).unwrap_or_default()
    }
}

// ============================================================================
// LOAD / SAVE
// ============================================================================

/// Decode an image file into a raster. RGB and RGBA sources keep their layout;
/// other color types are widened to RGBA8 with alpha kept only if present.
pub fn load_raster(path: &Path) -> Result<Raster, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    match image::open(path) {
        Ok(img) => Ok(Raster::from_dynamic(img)),
        Err(ImageError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(IoError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(IoError::Decode(e.to_string())),
    }
}

/// Encode `raster` to `path`. RGB rasters are written with three channels;
/// JPEG always drops alpha. `quality` is used by JPEG only (1-100).
pub fn save_raster(
    raster: &Raster,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (w, h) = raster.dimensions();
    let color = if raster.has_alpha() { ColorType::Rgba8 } else { ColorType::Rgb8 };

    match format {
        SaveFormat::Png => {
            let bytes = raster.to_bytes();
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(&bytes, w, h, color)?;
        }
        SaveFormat::Jpeg => {
            let rgb_image = raster.to_dynamic().to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder.encode(rgb_image.as_raw(), w, h, ColorType::Rgb8)?;
        }
        SaveFormat::Bmp => {
            let bytes = raster.to_bytes();
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(&bytes, w, h, color)?;
        }
        SaveFormat::Tga => {
            let bytes = raster.to_bytes();
            let encoder = TgaEncoder::new(&mut writer);
            encoder.encode(&bytes, w, h, color)?;
        }
        SaveFormat::Tiff => {
            let dyn_img: DynamicImage = raster.to_dynamic();
            dyn_img.write_to(&mut writer, image::ImageOutputFormat::Tiff)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Format to write an edit of `source` in: its own format when we can write
/// it, otherwise `fallback`.
pub fn source_format(source: &Path, fallback: SaveFormat) -> SaveFormat {
    SaveFormat::from_extension(source).unwrap_or(fallback)
}

/// Output path next to the input: `<dir>/<stem><suffix>.<ext>`.
/// `photo.jpg` with suffix `-Modified` and PNG output becomes `photo-Modified.png`.
pub fn modified_path(input: &Path, suffix: &str, format: SaveFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let parent = input.parent().unwrap_or(Path::new(""));
    avoid_input(input, parent.join(format!("{}{}.{}", stem, suffix, format.extension())))
}

/// Return `candidate`, or `<stem>_out.<ext>` beside it when `candidate` names
/// the same file as `input`.
pub fn avoid_input(input: &Path, candidate: PathBuf) -> PathBuf {
    if !same_file(input, &candidate) {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = candidate
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| SaveFormat::default().extension().to_string());
    let parent = candidate.parent().unwrap_or(Path::new(""));
    parent.join(format!("{}_out.{}", stem, ext))
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
