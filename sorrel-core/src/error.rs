// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SorrelError {
    ConfigReadError(String),
    ConfigFormatError(String),
    ConfigKeyError(String),
    CfgOptionError(String),
    MergeError(String),
    ImageReadError(String),
    ImageWriteError(String),
    ImageExtensionError,
    MaskReadError(String),
    MaskFormatError,
    BoxesSizeError,
    BoxesReadError,
    PolygonsSizeError,
    PolygonsReadError,
    AnnotationError(String),
    RegistryError(String),
    DatasetError(String),
    IndexError(usize, usize),
    UnsupportedScope(String),
    DisplayError(String),
    NoFileError(String),
    DirError(String),
    OtherError(String),
}

impl fmt::Display for SorrelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SorrelError::ConfigReadError(message) => {
                write!(
                    f,
                    "[sorrel::ConfigReadError] Config file could not be read. {}",
                    message
                )
            }
            SorrelError::ConfigFormatError(message) => {
                write!(
                    f,
                    "[sorrel::ConfigFormatError] Config file is malformed. {}",
                    message
                )
            }
            SorrelError::ConfigKeyError(key) => {
                write!(
                    f,
                    "[sorrel::ConfigKeyError] Config has no value at key `{}`.",
                    key
                )
            }
            SorrelError::CfgOptionError(message) => {
                write!(
                    f,
                    "[sorrel::CfgOptionError] Invalid config override. {}",
                    message
                )
            }
            SorrelError::MergeError(message) => {
                write!(
                    f,
                    "[sorrel::MergeError] Config overrides could not be merged. {}",
                    message
                )
            }
            SorrelError::ImageReadError(path) => {
                write!(f, "[sorrel::ImageReadError] Failed to read image {}.", path)
            }
            SorrelError::ImageWriteError(path) => {
                write!(f, "[sorrel::ImageWriteError] Failed to write image {}.", path)
            }
            SorrelError::ImageExtensionError => {
                write!(
                    f,
                    "[sorrel::ImageExtensionError] Could not detect a valid image extension for input."
                )
            }
            SorrelError::MaskReadError(path) => {
                write!(f, "[sorrel::MaskReadError] Failed to read mask {}.", path)
            }
            SorrelError::MaskFormatError => {
                write!(
                    f,
                    "[sorrel::MaskFormatError] Only 1-channel u8 and u16 masks are currently supported."
                )
            }
            SorrelError::BoxesSizeError => {
                write!(
                    f,
                    "[sorrel::BoxesSizeError] Bounding box must satisfy x_min <= x_max and y_min <= y_max.",
                )
            }
            SorrelError::BoxesReadError => {
                write!(
                    f,
                    "[sorrel::BoxesReadError] Bounding boxes could not be read."
                )
            }
            SorrelError::PolygonsSizeError => {
                write!(
                    f,
                    "[sorrel::PolygonsSizeError] Polygons must contain at least 3 points.",
                )
            }
            SorrelError::PolygonsReadError => {
                write!(f, "[sorrel::PolygonsReadError] Polygons could not be read.")
            }
            SorrelError::AnnotationError(message) => {
                write!(
                    f,
                    "[sorrel::AnnotationError] Annotations could not be loaded. {}",
                    message
                )
            }
            SorrelError::RegistryError(message) => {
                write!(f, "[sorrel::RegistryError] {}", message)
            }
            SorrelError::DatasetError(message) => {
                write!(
                    f,
                    "[sorrel::DatasetError] Dataset could not be built. {}",
                    message
                )
            }
            SorrelError::IndexError(index, len) => {
                write!(
                    f,
                    "[sorrel::IndexError] Index {} is out of range for a dataset of length {}.",
                    index, len
                )
            }
            SorrelError::UnsupportedScope(scope) => {
                write!(
                    f,
                    "[sorrel::UnsupportedScope] Browsing for {} is not implemented. Add a renderer for it to the scope table in sorrel-cli/src/dataset/scope.rs.",
                    scope
                )
            }
            SorrelError::DisplayError(message) => {
                write!(
                    f,
                    "[sorrel::DisplayError] Failed to display image. {}",
                    message
                )
            }
            SorrelError::NoFileError(message) => {
                write!(
                    f,
                    "[sorrel::NoFileError] File could not be found. {}.",
                    message
                )
            }
            SorrelError::DirError(message) => {
                write!(
                    f,
                    "[sorrel::DirError] Directory could not be read. {}.",
                    message
                )
            }
            SorrelError::OtherError(message) => {
                write!(f, "[sorrel::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for SorrelError {}
