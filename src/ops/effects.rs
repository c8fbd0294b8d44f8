// ============================================================================
// EFFECTS — synthetic overlays blended onto the source
// ============================================================================

use super::{Color, GRADIENT_MIX, apply_per_pixel};
use crate::raster::Raster;

/// Color of gradient row `row` out of `height`: `from + (to - from) * row / height`,
/// truncated toward zero. Row 0 is exactly `from`; the last row approaches `to`.
pub fn gradient_row(from: Color, to: Color, row: u32, height: u32) -> Color {
    if height == 0 {
        return from;
    }
    let lerp = |a: u8, b: u8| {
        let a = a as i64;
        let b = b as i64;
        (a + (b - a) * row as i64 / height as i64).clamp(0, 255) as u8
    };
    Color::new(lerp(from.r, to.r), lerp(from.g, to.g), lerp(from.b, to.b))
}

/// All row colors of the synthetic vertical gradient for a raster of `height` rows.
pub fn gradient_rows(from: Color, to: Color, height: u32) -> Vec<Color> {
    (0..height).map(|row| gradient_row(from, to, row, height)).collect()
}

/// Blend a top-to-bottom `from` → `to` gradient over the source at a fixed
/// 50% mix. Alpha is preserved.
pub fn gradient(src: &Raster, from: Color, to: Color) -> Raster {
    let rows = gradient_rows(from, to, src.height());
    let keep = 1.0 - GRADIENT_MIX;
    let out = apply_per_pixel(src.as_rgba(), |_, y, r, g, b, a| {
        let c = rows[y as usize];
        (
            keep * r + GRADIENT_MIX * c.r as f32,
            keep * g + GRADIENT_MIX * c.g as f32,
            keep * b + GRADIENT_MIX * c.b as f32,
            a,
        )
    });
    Raster::from_rgba_image(out, src.has_alpha())
}
