// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// All currently supported image formats
pub const SUPPORTED_IMAGE_FORMATS: [&str; 15] = [
    "bmp", "dds", "hdr", "ico", "jpeg", "jpg", "exr", "png", "pbm", "pgm", "ppm", "qoi", "tga",
    "tif", "tiff",
];

// Formats a label map (segmentation mask) may be stored in
pub const SUPPORTED_MASK_FORMATS: [&str; 5] = ["png", "bmp", "tif", "tiff", "pgm"];

// All currently supported annotation formats
pub const SUPPORTED_ARRAY_FORMATS: [&str; 1] = ["json"];

// The valid json keys indicating bounding box values
pub const BOUNDING_BOX_JSON_VALID_KEYS: [&str; 7] = [
    "bounding_boxes",
    "bboxes",
    "bbox",
    "bounding_box",
    "boxes",
    "box",
    "xyxy",
];

// The valid json keys indicating polygon values
pub const POLYGON_JSON_VALID_KEYS: [&str; 5] =
    ["polygons", "contours", "outlines", "shapes", "points"];

// The valid json keys indicating per-object class labels
pub const LABEL_JSON_VALID_KEYS: [&str; 4] = ["labels", "classes", "category_ids", "bbox_label"];

// Scope used when a config does not declare `default_scope`
pub const DEFAULT_SCOPE: &str = "mmdet";

// Label value conventionally used for "ignore" pixels in segmentation maps
pub const IGNORE_INDEX: u32 = 255;

// Width of the zero-padded per-sample output directory names
pub const SAMPLE_DIR_WIDTH: usize = 6;

// Provenance record written next to rendered detection images
pub const INFO_FILE_NAME: &str = "info.txt";
