// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use serde_json::Value;

use crate::error::SorrelError;

const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = (h.fract() * 6.0).max(0.0);
    let c = v * s;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

/// Generate `n` visually distinct colors
///
/// Hues are spaced by the golden ratio so the same `n` always yields the same
/// colors and neighbouring labels never share a hue.
///
/// ```
/// use sorrel_core::vis::palette::generate_palette;
///
/// let palette = generate_palette(4);
/// assert_eq!(palette.len(), 4);
/// assert_eq!(palette, generate_palette(4));
/// assert_ne!(palette[0], palette[1]);
/// ```
pub fn generate_palette(n: usize) -> Vec<[u8; 3]> {
    (0..n).map(generated_color).collect()
}

/// Color at `index` of any generated palette longer than `index`
pub fn generated_color(index: usize) -> [u8; 3] {
    hsv_to_rgb(index as f32 * GOLDEN_RATIO_CONJUGATE, 0.75, 0.95)
}

/// Read a palette given as a list of `[r, g, b]` triplets
pub fn palette_from_value(value: &Value) -> Result<Vec<[u8; 3]>, SorrelError> {
    let invalid = || {
        SorrelError::DatasetError(format!(
            "palette must be a list of [r, g, b] values in 0-255 but got {}",
            value
        ))
    };

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|color| {
            let channels = color.as_array().filter(|c| c.len() == 3).ok_or_else(invalid)?;

            let mut rgb = [0u8; 3];
            for (slot, channel) in rgb.iter_mut().zip(channels) {
                *slot = channel
                    .as_u64()
                    .and_then(|c| u8::try_from(c).ok())
                    .ok_or_else(invalid)?;
            }

            Ok(rgb)
        })
        .collect()
}
