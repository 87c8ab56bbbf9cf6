// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use image::{RgbImage, open as open_dynamic};

use crate::constant;
use crate::error::SorrelError;

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

/// Open an image as 8-bit rgb
///
/// Grayscale, alpha and 16-bit images are converted.
///
/// # Arguments
///
/// * `path` - A path to an image with a valid extension
///
/// ```no_run
/// use sorrel_core::im::open_rgb;
/// let image = open_rgb("image.png");
/// ```
pub fn open_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage, SorrelError> {
    let path = path.as_ref();

    match extension_of(path) {
        Some(ext) if constant::SUPPORTED_IMAGE_FORMATS.contains(&ext.as_str()) => {
            let image = open_dynamic(path)
                .map_err(|_| SorrelError::ImageReadError(path.display().to_string()))?;

            Ok(image.to_rgb8())
        }
        _ => Err(SorrelError::ImageExtensionError),
    }
}

/// Save an rgb image, creating missing parent directories
///
/// # Arguments
///
/// * `image` - Image to save
/// * `path` - Output path with a valid extension
pub fn save_rgb<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<(), SorrelError> {
    let path = path.as_ref();

    match extension_of(path) {
        Some(ext) if constant::SUPPORTED_IMAGE_FORMATS.contains(&ext.as_str()) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        SorrelError::DirError(format!("{}: {}", parent.display(), err))
                    })?;
                }
            }

            image
                .save(path)
                .map_err(|_| SorrelError::ImageWriteError(path.display().to_string()))
        }
        _ => Err(SorrelError::ImageExtensionError),
    }
}
