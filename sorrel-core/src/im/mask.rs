// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use image::{DynamicImage, open as open_dynamic};

use crate::constant;
use crate::error::SorrelError;

/// A single-channel label map holding one class index per pixel
///
/// Label maps are the ground truth of semantic segmentation datasets.
/// They are read from 8 or 16-bit grayscale images.
///
/// # Examples
///
/// ```
/// use sorrel_core::im::LabelMap;
///
/// let mask = LabelMap::new(2, 2, vec![0, 1, 1, 255]).unwrap();
/// assert_eq!(mask.get(1, 0), Some(1));
/// assert_eq!(mask.labels(), vec![0, 1, 255]);
///
/// let mask = LabelMap::new(2, 2, vec![0, 1, 1]);
/// assert!(mask.is_err()); // Buffer size does not match dimensions
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl LabelMap {
    /// Initialize a new label map
    ///
    /// # Arguments
    ///
    /// * `width` - Width of the map
    /// * `height` - Height of the map
    /// * `data` - Row-major labels
    pub fn new(width: u32, height: u32, data: Vec<u32>) -> Result<Self, SorrelError> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(SorrelError::MaskFormatError);
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }
}

// >>> I/O METHODS

impl LabelMap {
    /// Open a label map from a provided path
    ///
    /// # Arguments
    ///
    /// * `path` - A path to a grayscale image with a valid extension
    ///
    /// ```no_run
    /// use sorrel_core::im::LabelMap;
    /// let mask = LabelMap::open("mask.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LabelMap, SorrelError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if let Some(ext) = extension {
            if constant::SUPPORTED_MASK_FORMATS.iter().any(|e| e == &ext) {
                let mask = open_dynamic(&path).map_err(|_| {
                    SorrelError::MaskReadError(path.as_ref().display().to_string())
                })?;

                return Self::new_from_dynamic(mask);
            }
        }

        Err(SorrelError::ImageExtensionError)
    }

    /// Initialize a new label map from a DynamicImage
    ///
    /// # Arguments
    ///
    /// * `mask` - An 8 or 16-bit grayscale DynamicImage
    pub fn new_from_dynamic(mask: DynamicImage) -> Result<LabelMap, SorrelError> {
        let width = mask.width();
        let height = mask.height();

        match mask {
            DynamicImage::ImageLuma8(buffer) => LabelMap::new(
                width,
                height,
                buffer.into_raw().into_iter().map(u32::from).collect(),
            ),
            DynamicImage::ImageLuma16(buffer) => LabelMap::new(
                width,
                height,
                buffer.into_raw().into_iter().map(u32::from).collect(),
            ),
            _ => Err(SorrelError::MaskFormatError),
        }
    }
}

// <<< I/O METHODS

// >>> PROPERTY METHODS

impl LabelMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_raw(&self) -> &Vec<u32> {
        &self.data
    }

    /// Label at pixel (x, y)
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }

        self.data
            .get((y as usize) * (self.width as usize) + (x as usize))
            .copied()
    }

    /// Sorted unique labels present in the map
    pub fn labels(&self) -> Vec<u32> {
        let mut labels = self.data.clone();
        labels.sort_unstable();
        labels.dedup();
        labels
    }
}

// <<< PROPERTY METHODS

#[cfg(test)]
mod test {

    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};

    #[test]
    fn test_mask_open_u8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");

        GrayImage::from_raw(3, 1, vec![0, 2, 255]).unwrap().save(&path).unwrap();

        let mask = LabelMap::open(&path).unwrap();
        assert_eq!(mask.width(), 3);
        assert_eq!(mask.height(), 1);
        assert_eq!(mask.as_raw(), &vec![0, 2, 255]);
    }

    #[test]
    fn test_mask_open_u16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");

        ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(2, 2, vec![0, 300, 1, 2])
            .unwrap()
            .save(&path)
            .unwrap();

        let mask = LabelMap::open(&path).unwrap();
        assert_eq!(mask, LabelMap::new(2, 2, vec![0, 300, 1, 2]).unwrap());
    }

    #[test]
    fn test_mask_rejects_color() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        assert_eq!(
            LabelMap::new_from_dynamic(rgb),
            Err(SorrelError::MaskFormatError)
        );
    }

    #[test]
    fn test_mask_open_extension() {
        assert_eq!(
            LabelMap::open("mask.jpg"),
            Err(SorrelError::ImageExtensionError)
        );
    }
}
