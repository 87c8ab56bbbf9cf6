// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

//! Minimal rasterization of annotations onto rgb images.
//!
//! All primitives clip to the image bounds, so annotations that extend past
//! the image (common for boxes in augmented datasets) are drawn partially.

use image::{Rgb, RgbImage};

use crate::im::LabelMap;

/// Blend `color` into the pixel at (x, y) with opacity `alpha`
fn blend_pixel(image: &mut RgbImage, x: i64, y: i64, color: [u8; 3], alpha: f32) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }

    let alpha = alpha.clamp(0.0, 1.0);
    let pixel = image.get_pixel_mut(x as u32, y as u32);

    for (channel, &target) in pixel.0.iter_mut().zip(color.iter()) {
        let blended = (1.0 - alpha) * (*channel as f32) + alpha * (target as f32);
        *channel = blended.round().clamp(0.0, 255.0) as u8;
    }
}

/// Paint a square brush of side `width` centred on (x, y)
fn stamp(image: &mut RgbImage, x: i64, y: i64, color: [u8; 3], width: u32) {
    let width = width.max(1) as i64;
    let offset = (width - 1) / 2;

    for dy in 0..width {
        for dx in 0..width {
            blend_pixel(image, x - offset + dx, y - offset + dy, color, 1.0);
        }
    }
}

/// Draw a line segment with Bresenham's algorithm
///
/// ```
/// use image::{Rgb, RgbImage};
/// use sorrel_core::im::draw::draw_line;
///
/// let mut image = RgbImage::new(5, 5);
/// draw_line(&mut image, [0., 0.], [4., 4.], [255, 0, 0], 1);
///
/// for i in 0..5 {
///     assert_eq!(image.get_pixel(i, i), &Rgb([255, 0, 0]));
/// }
/// assert_eq!(image.get_pixel(4, 0), &Rgb([0, 0, 0]));
/// ```
pub fn draw_line(image: &mut RgbImage, start: [f32; 2], end: [f32; 2], color: [u8; 3], width: u32) {
    let (mut x0, mut y0) = (start[0].round() as i64, start[1].round() as i64);
    let (x1, y1) = (end[0].round() as i64, end[1].round() as i64);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(image, x0, y0, color, width);

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draw the outline of an xyxy box
pub fn draw_rectangle(image: &mut RgbImage, bbox: [f32; 4], color: [u8; 3], width: u32) {
    let [min_x, min_y, max_x, max_y] = bbox;

    draw_line(image, [min_x, min_y], [max_x, min_y], color, width);
    draw_line(image, [max_x, min_y], [max_x, max_y], color, width);
    draw_line(image, [max_x, max_y], [min_x, max_y], color, width);
    draw_line(image, [min_x, max_y], [min_x, min_y], color, width);
}

/// Draw the closed outline of a polygon
pub fn draw_polygon(image: &mut RgbImage, points: &[[f32; 2]], color: [u8; 3], width: u32) {
    if points.len() < 2 {
        return;
    }

    for (idx, &start) in points.iter().enumerate() {
        let end = points[(idx + 1) % points.len()];
        draw_line(image, start, end, color, width);
    }
}

/// Fill a polygon with a translucent color using even-odd scanlines
///
/// ```
/// use image::{Rgb, RgbImage};
/// use sorrel_core::im::draw::fill_polygon;
///
/// let mut image = RgbImage::new(10, 10);
/// fill_polygon(&mut image, &[[2., 2.], [8., 2.], [8., 8.], [2., 8.]], [0, 0, 200], 1.0);
///
/// assert_eq!(image.get_pixel(5, 5), &Rgb([0, 0, 200]));
/// assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
/// ```
pub fn fill_polygon(image: &mut RgbImage, points: &[[f32; 2]], color: [u8; 3], alpha: f32) {
    if points.len() < 3 {
        return;
    }

    let min_y = points.iter().map(|p| p[1]).fold(f32::INFINITY, f32::min);
    let max_y = points.iter().map(|p| p[1]).fold(f32::NEG_INFINITY, f32::max);

    let start = (min_y.floor() as i64).max(0);
    let end = (max_y.ceil() as i64).min(image.height() as i64 - 1);

    let mut crossings: Vec<f32> = Vec::with_capacity(points.len());

    for y in start..=end {
        let scan = y as f32 + 0.5;
        crossings.clear();

        for (idx, &[x0, y0]) in points.iter().enumerate() {
            let [x1, y1] = points[(idx + 1) % points.len()];
            if (y0 <= scan && y1 > scan) || (y1 <= scan && y0 > scan) {
                crossings.push(x0 + (scan - y0) / (y1 - y0) * (x1 - x0));
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let from = (span[0] - 0.5).ceil() as i64;
            let to = (span[1] - 0.5).floor() as i64;

            for x in from.max(0)..=to.min(image.width() as i64 - 1) {
                blend_pixel(image, x, y, color, alpha);
            }
        }
    }
}

/// Overlay a label map with a per-class palette
///
/// Pixels whose label equals `ignore_index` are left untouched. Labels
/// beyond the palette wrap around it.
///
/// ```
/// use image::{Rgb, RgbImage};
/// use sorrel_core::im::LabelMap;
/// use sorrel_core::im::draw::blend_mask;
///
/// let mut image = RgbImage::new(2, 1);
/// let mask = LabelMap::new(2, 1, vec![1, 255]).unwrap();
/// blend_mask(&mut image, &mask, &[[0, 0, 0], [100, 50, 0]], 0.5, 255);
///
/// assert_eq!(image.get_pixel(0, 0), &Rgb([50, 25, 0]));
/// assert_eq!(image.get_pixel(1, 0), &Rgb([0, 0, 0]));
/// ```
pub fn blend_mask(
    image: &mut RgbImage,
    mask: &LabelMap,
    palette: &[[u8; 3]],
    alpha: f32,
    ignore_index: u32,
) {
    if palette.is_empty() {
        return;
    }

    let width = image.width().min(mask.width());
    let height = image.height().min(mask.height());

    for y in 0..height {
        for x in 0..width {
            match mask.get(x, y) {
                Some(label) if label != ignore_index => {
                    let color = palette[label as usize % palette.len()];
                    blend_pixel(image, x as i64, y as i64, color, alpha);
                }
                _ => {}
            }
        }
    }
}

/// Solid color for a pixel, mostly useful in tests
pub fn pixel(image: &RgbImage, x: u32, y: u32) -> Option<Rgb<u8>> {
    image.get_pixel_checked(x, y).copied()
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_rectangle_outline_only() {
        let mut image = RgbImage::new(10, 10);
        draw_rectangle(&mut image, [1., 1., 8., 8.], [0, 255, 0], 1);

        assert_eq!(pixel(&image, 1, 1), Some(Rgb([0, 255, 0])));
        assert_eq!(pixel(&image, 8, 5), Some(Rgb([0, 255, 0])));
        assert_eq!(pixel(&image, 4, 8), Some(Rgb([0, 255, 0])));
        assert_eq!(pixel(&image, 4, 4), Some(Rgb([0, 0, 0])));
    }

    #[test]
    fn test_rectangle_clipped() {
        let mut image = RgbImage::new(4, 4);
        draw_rectangle(&mut image, [-5., -5., 20., 2.], [9, 9, 9], 1);

        assert_eq!(pixel(&image, 0, 2), Some(Rgb([9, 9, 9])));
        assert_eq!(pixel(&image, 3, 2), Some(Rgb([9, 9, 9])));
        assert_eq!(pixel(&image, 1, 1), Some(Rgb([0, 0, 0])));
    }

    #[test]
    fn test_line_width() {
        let mut image = RgbImage::new(9, 9);
        draw_line(&mut image, [0., 4.], [8., 4.], [1, 2, 3], 3);

        assert_eq!(pixel(&image, 4, 3), Some(Rgb([1, 2, 3])));
        assert_eq!(pixel(&image, 4, 5), Some(Rgb([1, 2, 3])));
        assert_eq!(pixel(&image, 4, 6), Some(Rgb([0, 0, 0])));
    }

    #[test]
    fn test_fill_triangle_alpha() {
        let mut image = RgbImage::from_pixel(10, 10, Rgb([100, 100, 100]));
        fill_polygon(&mut image, &[[0., 0.], [10., 0.], [0., 10.]], [200, 0, 0], 0.5);

        assert_eq!(pixel(&image, 1, 1), Some(Rgb([150, 50, 50])));
        assert_eq!(pixel(&image, 9, 9), Some(Rgb([100, 100, 100])));
    }
}
