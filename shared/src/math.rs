//! Numeric helpers for exported values
//!
//! Every float written to a model document goes through [`round_to`] first.
//! Rounding is what makes two attribute values that differ only past the kept
//! precision compare equal, so it has to happen before any comparison.

use crate::format::DECIMALS_COLORS;

/// Round `value` to `decimals` decimal places.
///
/// Negative zero is folded into positive zero so it prints as `0`.
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    rounded + 0.0
}

/// Round every component of a fixed-size array
#[inline]
pub fn round_array<const N: usize>(values: [f64; N], decimals: u32) -> [f64; N] {
    values.map(|v| round_to(v, decimals))
}

/// Convert f64 to unsigned normalized 8-bit integer (unorm8)
///
/// Maps [0.0, 1.0] to [0, 255], truncating.
#[inline]
pub fn f64_to_unorm8(value: f64) -> u8 {
    let clamped = value.clamp(0.0, 1.0);
    (clamped * 255.0) as u8
}

/// Pack an RGB color into a single `0xRRGGBB` integer.
///
/// Channels are rounded to [`DECIMALS_COLORS`] before quantisation.
#[inline]
pub fn pack_color_rgb8(rgb: [f64; 3]) -> u32 {
    let [r, g, b] = round_array(rgb, DECIMALS_COLORS).map(f64_to_unorm8);
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Unpack a `0xRRGGBB` integer to [0.0, 1.0] channels
#[inline]
pub fn unpack_color_rgb8(packed: u32) -> [f64; 3] {
    [
        ((packed >> 16) & 0xFF) as f64 / 255.0,
        ((packed >> 8) & 0xFF) as f64 / 255.0,
        (packed & 0xFF) as f64 / 255.0,
    ]
}
