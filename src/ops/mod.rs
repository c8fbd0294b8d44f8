// ============================================================================
// PIXEL TRANSFORM ENGINE — one exhaustive entry point over every transform
// ============================================================================
//
// Every transform reads an immutable source raster and returns a new one.
// No state survives between calls; callers own the rasters.
// ============================================================================

pub mod adjustments;
pub mod color_keying;
pub mod effects;
pub mod filters;

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use rayon::prelude::*;

use crate::raster::Raster;

/// Pixels with every channel below this are treated as background.
pub const DEFAULT_BACKGROUND_THRESHOLD: u8 = 30;
/// Pixels with every channel below this are covered by the mask color.
pub const DEFAULT_MASK_THRESHOLD: u8 = 100;
/// Weight of the synthetic gradient when blended over the source.
pub const GRADIENT_MIX: f32 = 0.5;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Empty or malformed raster.
    InvalidInput(String),
    /// Parameter outside its documented domain.
    InvalidParameter(String),
    /// Raw buffer declared a channel count other than 3 or 4.
    UnsupportedChannels(usize),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            TransformError::InvalidParameter(e) => write!(f, "Invalid parameter: {}", e),
            TransformError::UnsupportedChannels(n) => {
                write!(f, "Unsupported channel count: {} (expected 3 or 4)", n)
            }
        }
    }
}

impl std::error::Error for TransformError {}

// ============================================================================
// PARAMETER TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::R => self.r,
            Channel::G => self.g,
            Channel::B => self.b,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Accepts `r,g,b` or `(r, g, b)`.
impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim();
        let inner = inner
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(inner);
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected three components like (102, 147, 163), got '{}'", s));
        }
        let mut values = [0u8; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            let v: u32 = part
                .parse()
                .map_err(|_| format!("'{}' is not a whole number", part))?;
            *slot = u8::try_from(v).map_err(|_| format!("{} is outside 0-255", v))?;
        }
        Ok(Color::new(values[0], values[1], values[2]))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "r" | "red" => Ok(Channel::R),
            "g" | "green" => Ok(Channel::G),
            "b" | "blue" => Ok(Channel::B),
            other => Err(format!("unknown channel '{}', use r, g or b", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Warm,
    Cool,
    Vintage,
    Sepia,
}

impl Preset {
    pub fn all() -> &'static [Preset] {
        &[Preset::Warm, Preset::Cool, Preset::Vintage, Preset::Sepia]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Warm => "warm",
            Preset::Cool => "cool",
            Preset::Vintage => "vintage",
            Preset::Sepia => "sepia",
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warm" => Ok(Preset::Warm),
            "cool" => Ok(Preset::Cool),
            "vintage" => Ok(Preset::Vintage),
            "sepia" => Ok(Preset::Sepia),
            other => Err(format!(
                "unknown preset '{}', use warm, cool, vintage or sepia",
                other
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelKind {
    Sharpen,
    Blur,
}

impl FromStr for KernelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sharpen" => Ok(KernelKind::Sharpen),
            "blur" => Ok(KernelKind::Blur),
            other => Err(format!("unknown filter '{}', use sharpen or blur", other)),
        }
    }
}

/// One transform and exactly the inputs it needs.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformParameters {
    Grayscale,
    BackgroundReplace { new_color: Color, threshold: u8 },
    Recolor { target: Color, channel: Channel },
    ColorMask { mask_color: Color, threshold: u8 },
    ContrastBrightness { contrast: f32, brightness: f32 },
    Preset(Preset),
    Gradient { from: Color, to: Color },
    SharpenBlur(KernelKind),
    Transparency { level: u8 },
}

impl TransformParameters {
    pub fn background_replace(new_color: Color) -> Self {
        TransformParameters::BackgroundReplace {
            new_color,
            threshold: DEFAULT_BACKGROUND_THRESHOLD,
        }
    }

    pub fn color_mask(mask_color: Color) -> Self {
        TransformParameters::ColorMask {
            mask_color,
            threshold: DEFAULT_MASK_THRESHOLD,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransformParameters::Grayscale => "grayscale",
            TransformParameters::BackgroundReplace { .. } => "background",
            TransformParameters::Recolor { .. } => "recolor",
            TransformParameters::ColorMask { .. } => "mask",
            TransformParameters::ContrastBrightness { .. } => "adjust",
            TransformParameters::Preset(_) => "preset",
            TransformParameters::Gradient { .. } => "gradient",
            TransformParameters::SharpenBlur(KernelKind::Sharpen) => "sharpen",
            TransformParameters::SharpenBlur(KernelKind::Blur) => "blur",
            TransformParameters::Transparency { .. } => "transparency",
        }
    }

    /// Reject values outside their documented domain. Integer parameters are
    /// bounded by their types; only the float factors need checking.
    pub fn validate(&self) -> Result<(), TransformError> {
        if let TransformParameters::ContrastBrightness { contrast, brightness } = self {
            check_factor("contrast", *contrast)?;
            check_factor("brightness", *brightness)?;
        }
        Ok(())
    }
}

fn check_factor(label: &str, value: f32) -> Result<(), TransformError> {
    if value.is_finite() && (0.0..=2.0).contains(&value) {
        Ok(())
    } else {
        Err(TransformError::InvalidParameter(format!(
            "{} factor {} is outside 0.0-2.0",
            label, value
        )))
    }
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Apply one transform to `raster`, returning a new raster of the same size.
/// The source is never modified, so a failed call leaves the caller's image intact.
pub fn apply(raster: &Raster, params: &TransformParameters) -> Result<Raster, TransformError> {
    if raster.is_empty() {
        return Err(TransformError::InvalidInput(format!(
            "raster is empty ({}x{})",
            raster.width(),
            raster.height()
        )));
    }
    params.validate()?;

    let out = match *params {
        TransformParameters::Grayscale => adjustments::grayscale(raster),
        TransformParameters::BackgroundReplace { new_color, threshold } => {
            color_keying::background_replace(raster, new_color, threshold)
        }
        TransformParameters::Recolor { target, channel } => {
            color_keying::recolor(raster, target, channel)
        }
        TransformParameters::ColorMask { mask_color, threshold } => {
            color_keying::color_mask(raster, mask_color, threshold)
        }
        TransformParameters::ContrastBrightness { contrast, brightness } => {
            adjustments::contrast_brightness(raster, contrast, brightness)
        }
        TransformParameters::Preset(preset) => adjustments::preset(raster, preset),
        TransformParameters::Gradient { from, to } => effects::gradient(raster, from, to),
        TransformParameters::SharpenBlur(kind) => filters::sharpen_blur(raster, kind),
        TransformParameters::Transparency { level } => adjustments::transparency(raster, level),
    };
    Ok(out)
}

// ============================================================================
// SHARED HELPER: row-parallel per-pixel transform
// ============================================================================

/// Run `transform` over every pixel of `src`.
/// `transform` receives (x, y, r, g, b, a) as f32 and returns (r, g, b, a);
/// results are rounded and clamped into [0, 255].
pub(crate) fn apply_per_pixel<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(u32, u32, f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 {
        return src.clone();
    }

    let src_raw = src.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let pi = x * 4;
                let r = row_in[pi] as f32;
                let g = row_in[pi + 1] as f32;
                let b = row_in[pi + 2] as f32;
                let a = row_in[pi + 3] as f32;
                let (nr, ng, nb, na) = transform(x as u32, y as u32, r, g, b, a);
                row_out[pi] = clamp_channel(nr);
                row_out[pi + 1] = clamp_channel(ng);
                row_out[pi + 2] = clamp_channel(nb);
                row_out[pi + 3] = clamp_channel(na);
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}

#[inline]
pub(crate) fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
