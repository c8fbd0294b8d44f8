// ============================================================================
// IMAGE FILTERS — fixed 3x3 sharpen / blur convolution
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use super::{KernelKind, clamp_channel};
use crate::raster::Raster;

/// Center-weighted high-pass: weights sum to 1, so flat areas are unchanged.
pub const SHARPEN_KERNEL: [[f32; 3]; 3] = [
    [0.0, -1.0, 0.0],
    [-1.0, 5.0, -1.0],
    [0.0, -1.0, 0.0],
];

const NINTH: f32 = 1.0 / 9.0;

/// Uniform 3x3 box blur.
pub const BLUR_KERNEL: [[f32; 3]; 3] = [
    [NINTH, NINTH, NINTH],
    [NINTH, NINTH, NINTH],
    [NINTH, NINTH, NINTH],
];

pub fn kernel_for(kind: KernelKind) -> &'static [[f32; 3]; 3] {
    match kind {
        KernelKind::Sharpen => &SHARPEN_KERNEL,
        KernelKind::Blur => &BLUR_KERNEL,
    }
}

/// Apply the sharpen or blur kernel to R, G and B. Alpha is copied through.
pub fn sharpen_blur(src: &Raster, kind: KernelKind) -> Raster {
    let out = convolve_3x3(src.as_rgba(), kernel_for(kind));
    Raster::from_rgba_image(out, src.has_alpha())
}

/// Row-parallel 3x3 convolution. Samples outside the image are clamped
/// to the nearest edge pixel.
pub fn convolve_3x3(src: &RgbaImage, kernel: &[[f32; 3]; 3]) -> RgbaImage {
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
            for x in 0..w {
                let mut sums = [0.0f32; 3];
                for (ky, krow) in kernel.iter().enumerate() {
                    let sy = (y as i32 + ky as i32 - 1).clamp(0, h as i32 - 1) as usize;
                    for (kx, &kv) in krow.iter().enumerate() {
                        if kv == 0.0 {
                            continue;
                        }
                        let sx = (x as i32 + kx as i32 - 1).clamp(0, w as i32 - 1) as usize;
                        let si = sy * stride + sx * 4;
                        for c in 0..3 {
                            sums[c] += src_raw[si + c] as f32 * kv;
                        }
                    }
                }
                let pi = x * 4;
                for c in 0..3 {
                    row_out[pi + c] = clamp_channel(sums[c]);
                }
                row_out[pi + 3] = src_raw[y * stride + pi + 3];
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
}
