// ============================================================================
// RASTER — owned RGB / RGBA pixel grid handed between loader, engine and saver
// ============================================================================
//
// Pixels are always stored as RGBA8 so every transform walks one layout.
// `has_alpha` records whether the image logically carries a fourth channel;
// RGB rasters keep alpha at 255 and are written back as 3-channel data.
// ============================================================================

use image::{DynamicImage, Rgba, RgbaImage};

use crate::ops::{Color, TransformError};

#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pixels: RgbaImage,
    has_alpha: bool,
}

impl Raster {
    /// Wrap an already-decoded RGBA buffer.
    pub fn from_rgba_image(pixels: RgbaImage, has_alpha: bool) -> Self {
        Self { pixels, has_alpha }
    }

    /// Build from interleaved RGB bytes (`w * h * 3`).
    pub fn from_rgb(width: u32, height: u32, bytes: &[u8]) -> Result<Self, TransformError> {
        Self::from_raw(width, height, 3, bytes)
    }

    /// Build from interleaved RGBA bytes (`w * h * 4`).
    pub fn from_rgba(width: u32, height: u32, bytes: &[u8]) -> Result<Self, TransformError> {
        Self::from_raw(width, height, 4, bytes)
    }

    /// Build from interleaved bytes with an explicit channel count.
    /// Only 3 (RGB) and 4 (RGBA) channels are accepted.
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: usize,
        bytes: &[u8],
    ) -> Result<Self, TransformError> {
        if channels != 3 && channels != 4 {
            return Err(TransformError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * channels;
        if bytes.len() != expected {
            return Err(TransformError::InvalidInput(format!(
                "buffer holds {} bytes, {}x{} with {} channels needs {}",
                bytes.len(),
                width,
                height,
                channels,
                expected
            )));
        }

        let raw = if channels == 4 {
            bytes.to_vec()
        } else {
            let mut raw = Vec::with_capacity(width as usize * height as usize * 4);
            for px in bytes.chunks_exact(3) {
                raw.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
            raw
        };

        let pixels = RgbaImage::from_raw(width, height, raw)
            .ok_or_else(|| TransformError::InvalidInput("pixel buffer size mismatch".into()))?;
        Ok(Self { pixels, has_alpha: channels == 4 })
    }

    /// Convert a decoded image. Alpha is kept only if the source color type has it.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let has_alpha = img.color().has_alpha();
        Self { pixels: img.into_rgba8(), has_alpha }
    }

    /// A single-color RGB raster.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let pixels = RgbaImage::from_pixel(width, height, Rgba([color.r, color.g, color.b, 255]));
        Self { pixels, has_alpha: false }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Logical channel count: 3 or 4.
    pub fn channels(&self) -> usize {
        if self.has_alpha { 4 } else { 3 }
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    /// RGBA value at (x, y). Alpha reads 255 for RGB rasters.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn rgb(&self, x: u32, y: u32) -> Color {
        let [r, g, b, _] = self.pixel(x, y);
        Color::new(r, g, b)
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Interleaved bytes in the logical layout (3 or 4 per pixel).
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.has_alpha {
            return self.pixels.as_raw().clone();
        }
        let mut out = Vec::with_capacity(self.pixels.as_raw().len() / 4 * 3);
        for px in self.pixels.as_raw().chunks_exact(4) {
            out.extend_from_slice(&px[..3]);
        }
        out
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        let rgba = DynamicImage::ImageRgba8(self.pixels.clone());
        if self.has_alpha { rgba } else { DynamicImage::ImageRgb8(rgba.to_rgb8()) }
    }
}
