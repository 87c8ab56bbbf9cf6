// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

mod coco;
mod folder;
mod seg;

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde_json::Value;

use crate::error::SorrelError;
use crate::im::{BoundingBoxes, LabelMap, Polygons};
use crate::registry::Registry;
use crate::ut::path::join_root;
use crate::vis::palette::palette_from_value;

pub use coco::CocoDataset;
pub use folder::{ImageBoxesDataset, ImageFolderDataset};
pub use seg::BaseSegDataset;

/// Dataset level meta information shared with the visualizer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaInfo {
    pub classes: Vec<String>,
    pub palette: Option<Vec<[u8; 3]>>,
}

impl MetaInfo {
    /// Read `classes` and `palette` from an optional `metainfo` block
    ///
    /// ```
    /// use serde_json::json;
    /// use sorrel_core::data::MetaInfo;
    ///
    /// let meta = MetaInfo::from_config(Some(&json!({"classes": ["cat", "dog"]}))).unwrap();
    /// assert_eq!(meta.classes, vec!["cat", "dog"]);
    /// assert_eq!(meta.palette, None);
    /// ```
    pub fn from_config(metainfo: Option<&Value>) -> Result<MetaInfo, SorrelError> {
        let Some(metainfo) = metainfo else {
            return Ok(MetaInfo::default());
        };

        let classes = match metainfo.get("classes") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(classes)) => classes
                .iter()
                .map(|class| {
                    class.as_str().map(str::to_string).ok_or_else(|| {
                        SorrelError::DatasetError(format!(
                            "metainfo.classes must be strings but got {}",
                            class
                        ))
                    })
                })
                .collect::<Result<Vec<String>, SorrelError>>()?,
            Some(other) => {
                return Err(SorrelError::DatasetError(format!(
                    "metainfo.classes must be a list but got {}",
                    other
                )));
            }
        };

        let palette = match metainfo.get("palette") {
            None | Some(Value::Null) => None,
            Some(palette) => Some(palette_from_value(palette)?),
        };

        Ok(MetaInfo { classes, palette })
    }
}

/// Ground truth instances of a detection sample
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetAnnotation {
    pub boxes: BoundingBoxes,
    pub labels: Vec<u32>,
    pub polygons: Polygons,
    pub polygon_labels: Vec<u32>,
}

/// Ground truth attached to a single image
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Detection(DetAnnotation),
    Segmentation(LabelMap),
    Empty,
}

/// One image with its ground truth
#[derive(Debug, Clone)]
pub struct DataSample {
    pub img_path: PathBuf,
    pub image: RgbImage,
    pub annotation: Annotation,
}

/// Everything a dataset yields for one index
///
/// An item usually holds a single image but multi-view or multi-frame
/// datasets may yield several.
#[derive(Debug, Clone)]
pub struct DataItem {
    pub samples: Vec<DataSample>,
}

/// An indexable collection of annotated images
///
/// Images are decoded on access so iterating a prefix of a large dataset
/// only reads the files it touches.
pub trait Dataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn metainfo(&self) -> &MetaInfo;

    fn get(&self, index: usize) -> Result<DataItem, SorrelError>;
}

impl dyn Dataset + '_ {
    /// Iterate items in index order
    pub fn iter(&self) -> DatasetIter<'_> {
        DatasetIter {
            dataset: self,
            index: 0,
        }
    }
}

/// Lazy iterator over the items of a dataset
pub struct DatasetIter<'a> {
    dataset: &'a dyn Dataset,
    index: usize,
}

impl Iterator for DatasetIter<'_> {
    type Item = Result<DataItem, SorrelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.dataset.len() {
            return None;
        }

        let item = self.dataset.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

/// Dataset registry with the built-in dataset types
///
/// The root holds scope independent types and the `mmdet` and `mmseg`
/// children hold detection and segmentation datasets respectively.
pub fn dataset_registry() -> Registry<Box<dyn Dataset>> {
    let mut registry: Registry<Box<dyn Dataset>> = Registry::new("dataset");

    registry.register("ImageFolderDataset", folder::build_image_folder);

    let det = registry.child_mut("mmdet");
    det.register("CocoDataset", coco::build_coco);
    det.register("ImageBoxesDataset", folder::build_image_boxes);

    let seg = registry.child_mut("mmseg");
    seg.register("BaseSegDataset", seg::build_base_seg);

    registry
}

// >>> CONFIG HELPERS

/// Optional string at `key`, erroring if present with another type
pub(crate) fn opt_str<'a>(cfg: &'a Value, key: &str) -> Result<Option<&'a str>, SorrelError> {
    match cfg.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(SorrelError::DatasetError(format!(
            "`{}` must be a string but got {}",
            key, other
        ))),
    }
}

/// Required string at `key`
pub(crate) fn req_str<'a>(cfg: &'a Value, key: &str) -> Result<&'a str, SorrelError> {
    opt_str(cfg, key)?
        .ok_or_else(|| SorrelError::DatasetError(format!("Missing required key `{}`", key)))
}

/// Optional string nested under `data_prefix`
pub(crate) fn prefix_str<'a>(cfg: &'a Value, key: &str) -> Result<Option<&'a str>, SorrelError> {
    match cfg.get("data_prefix") {
        None | Some(Value::Null) => Ok(None),
        Some(prefix) => opt_str(prefix, key),
    }
}

/// Optional boolean at `key`
pub(crate) fn opt_bool(cfg: &Value, key: &str, default: bool) -> Result<bool, SorrelError> {
    match cfg.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(SorrelError::DatasetError(format!(
            "`{}` must be a boolean but got {}",
            key, other
        ))),
    }
}

/// Resolve a directory relative to the optional `data_root`
pub(crate) fn resolve(root: Option<&Path>, path: Option<&str>) -> PathBuf {
    match path {
        Some(path) => join_root(root, path),
        None => root.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
    }
}

// <<< CONFIG HELPERS
