// ============================================================================
// ADJUSTMENT OPERATIONS — pixel-level tone and color adjustments
// ============================================================================
//
// Each operation maps one pixel to one pixel and never reads neighbours.
// Alpha passes through untouched except in `transparency`.
// Operations are parallelized via rayon (see `ops::apply_per_pixel`).
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use super::{Preset, apply_per_pixel};
use crate::raster::Raster;

// ============================================================================
// GRAYSCALE
// ============================================================================

/// ITU-R 601-2 luma in 16.16 fixed point (0.299, 0.587, 0.114).
/// The weights sum to 65536, so a gray pixel maps to itself.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let l = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
    l.min(255) as u8
}

/// Replace R, G and B with the pixel's luma. Channel count is preserved.
pub fn grayscale(src: &Raster) -> Raster {
    let img = src.as_rgba();
    let w = img.width() as usize;
    let h = img.height() as usize;
    let mut dst_raw = img.as_raw().clone();

    dst_raw.par_chunks_mut(w.max(1) * 4).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let l = luma(px[0], px[1], px[2]);
            px[0] = l;
            px[1] = l;
            px[2] = l;
        }
    });

    let out = RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| img.clone());
    Raster::from_rgba_image(out, src.has_alpha())
}

// ============================================================================
// CONTRAST / BRIGHTNESS
// ============================================================================

/// Scale each channel's distance from mid-gray by `contrast`, then scale the
/// result by `brightness`. Both factors live in [0, 2]; 1.0 is the identity.
pub fn contrast_brightness(src: &Raster, contrast: f32, brightness: f32) -> Raster {
    let curve = move |v: f32| ((v - 128.0) * contrast + 128.0) * brightness;
    let out = apply_per_pixel(src.as_rgba(), move |_, _, r, g, b, a| {
        (curve(r), curve(g), curve(b), a)
    });
    Raster::from_rgba_image(out, src.has_alpha())
}

// ============================================================================
// COLOR PRESETS
// ============================================================================

/// Row-major 3x3 color matrix for a preset.
pub fn preset_matrix(preset: Preset) -> [[f32; 3]; 3] {
    match preset {
        Preset::Sepia => [
            [0.393, 0.769, 0.189],
            [0.349, 0.686, 0.168],
            [0.272, 0.534, 0.131],
        ],
        Preset::Cool => [
            [0.8, 0.0, 0.0],
            [0.0, 0.9, 0.0],
            [0.0, 0.0, 1.1],
        ],
        Preset::Warm => [
            [1.1, 0.0, 0.0],
            [0.0, 0.9, 0.0],
            [0.0, 0.0, 0.8],
        ],
        Preset::Vintage => [
            [0.9, 0.7, 0.4],
            [0.6, 0.5, 0.3],
            [0.3, 0.2, 0.1],
        ],
    }
}

/// Apply a preset color matrix. Results are clamped, not re-normalized,
/// so bright pixels saturate at 255.
pub fn preset(src: &Raster, preset: Preset) -> Raster {
    let m = preset_matrix(preset);
    let out = apply_per_pixel(src.as_rgba(), move |_, _, r, g, b, a| {
        let nr = m[0][0] * r + m[0][1] * g + m[0][2] * b;
        let ng = m[1][0] * r + m[1][1] * g + m[1][2] * b;
        let nb = m[2][0] * r + m[2][1] * g + m[2][2] * b;
        (nr, ng, nb, a)
    });
    Raster::from_rgba_image(out, src.has_alpha())
}

// ============================================================================
// TRANSPARENCY
// ============================================================================

/// Set every pixel's alpha to `level`. The result always carries alpha.
pub fn transparency(src: &Raster, level: u8) -> Raster {
    let mut out = src.as_rgba().clone();
    for px in out.pixels_mut() {
        px.0[3] = level;
    }
    Raster::from_rgba_image(out, true)
}
