use super::{Channel, Color, apply_per_pixel};
use crate::raster::Raster;

/// Replace every pixel whose R, G and B are all strictly below `threshold`
/// with `new_color`. Used to swap out a near-black background.
pub fn background_replace(src: &Raster, new_color: Color, threshold: u8) -> Raster {
    replace_dark(src, new_color, threshold)
}

/// Cover every pixel whose R, G and B are all strictly below `threshold`
/// with `mask_color`.
pub fn color_mask(src: &Raster, mask_color: Color, threshold: u8) -> Raster {
    replace_dark(src, mask_color, threshold)
}

fn replace_dark(src: &Raster, color: Color, threshold: u8) -> Raster {
    let t = threshold as f32;
    let (cr, cg, cb) = (color.r as f32, color.g as f32, color.b as f32);
    let out = apply_per_pixel(src.as_rgba(), move |_, _, r, g, b, a| {
        if r < t && g < t && b < t {
            (cr, cg, cb, a)
        } else {
            (r, g, b, a)
        }
    });
    Raster::from_rgba_image(out, src.has_alpha())
}

/// Dominant-channel recolor.
///
/// A pixel matches when the selected `channel` is at least as large as each
/// of R, G and B (ties match). Matching pixels are blended toward `target`
/// with factor `v / 255`, where `v` is the selected channel's value, so
/// faint pixels move a little and saturated pixels move almost entirely.
/// Non-matching pixels pass through unchanged.
pub fn recolor(src: &Raster, target: Color, channel: Channel) -> Raster {
    let (tr, tg, tb) = (target.r as f32, target.g as f32, target.b as f32);
    let out = apply_per_pixel(src.as_rgba(), move |_, _, r, g, b, a| {
        let v = match channel {
            Channel::R => r,
            Channel::G => g,
            Channel::B => b,
        };
        if v >= r && v >= g && v >= b {
            let f = v / 255.0;
            let inv = 1.0 - f;
            (inv * r + f * tr, inv * g + f * tg, inv * b + f * tb, a)
        } else {
            (r, g, b, a)
        }
    });
    Raster::from_rgba_image(out, src.has_alpha())
}
