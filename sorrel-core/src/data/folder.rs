// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::constant::{LABEL_JSON_VALID_KEYS, SUPPORTED_ARRAY_FORMATS, SUPPORTED_IMAGE_FORMATS};
use crate::data::{
    Annotation, DataItem, DataSample, Dataset, DetAnnotation, MetaInfo, opt_str, resolve,
};
use crate::error::SorrelError;
use crate::im::{BoundingBoxes, Polygons, open_rgb};
use crate::ut::path::{collect_file_pairs, collect_file_paths};

/// Unannotated images read from a directory
///
/// Config keys: `data_root`, `img_dir`, `img_suffix` and `metainfo`.
#[derive(Debug, Clone)]
pub struct ImageFolderDataset {
    images: Vec<PathBuf>,
    meta: MetaInfo,
}

impl ImageFolderDataset {
    pub fn new(img_dir: &Path, img_suffix: Option<&str>, meta: MetaInfo) -> Result<Self, SorrelError> {
        let images = collect_file_paths(img_dir, SUPPORTED_IMAGE_FORMATS.as_slice(), img_suffix)?;
        Ok(Self { images, meta })
    }
}

impl Dataset for ImageFolderDataset {
    fn len(&self) -> usize {
        self.images.len()
    }

    fn metainfo(&self) -> &MetaInfo {
        &self.meta
    }

    fn get(&self, index: usize) -> Result<DataItem, SorrelError> {
        let img_path = self
            .images
            .get(index)
            .ok_or(SorrelError::IndexError(index, self.images.len()))?;

        Ok(DataItem {
            samples: vec![DataSample {
                img_path: img_path.clone(),
                image: open_rgb(img_path)?,
                annotation: Annotation::Empty,
            }],
        })
    }
}

pub(crate) fn build_image_folder(cfg: &Value) -> Result<Box<dyn Dataset>, SorrelError> {
    let root = opt_str(cfg, "data_root")?.map(PathBuf::from);
    let img_dir = resolve(root.as_deref(), opt_str(cfg, "img_dir")?);
    let meta = MetaInfo::from_config(cfg.get("metainfo"))?;

    Ok(Box::new(ImageFolderDataset::new(
        &img_dir,
        opt_str(cfg, "img_suffix")?,
        meta,
    )?))
}

/// Images paired with per-image json annotation files
///
/// Each annotation file holds boxes (xyxy) and/or polygons under any of the
/// accepted keys, plus optional integer class labels, e.g.
/// `{"bboxes": [[0, 0, 10, 10]], "labels": [2]}`. Images and annotation
/// files are paired by name once `img_suffix` and `ann_suffix` are removed.
///
/// Config keys: `data_root`, `img_dir`, `ann_dir`, `img_suffix` (default: the
/// file extension), `ann_suffix` (default `.json`) and `metainfo`.
#[derive(Debug, Clone)]
pub struct ImageBoxesDataset {
    pairs: Vec<(PathBuf, PathBuf)>,
    meta: MetaInfo,
}

impl ImageBoxesDataset {
    pub fn new(
        img_dir: &Path,
        ann_dir: &Path,
        img_suffix: &str,
        ann_suffix: &str,
        meta: MetaInfo,
    ) -> Result<Self, SorrelError> {
        let img_filter = (!img_suffix.is_empty()).then_some(img_suffix);

        let images = collect_file_paths(img_dir, SUPPORTED_IMAGE_FORMATS.as_slice(), img_filter)?;
        let annotations =
            collect_file_paths(ann_dir, SUPPORTED_ARRAY_FORMATS.as_slice(), Some(ann_suffix))?;

        let pairs = collect_file_pairs(&images, &annotations, img_suffix, ann_suffix)
            .into_iter()
            .map(|(_, image, annotation)| (image, annotation))
            .collect();

        Ok(Self { pairs, meta })
    }
}

impl Dataset for ImageBoxesDataset {
    fn len(&self) -> usize {
        self.pairs.len()
    }

    fn metainfo(&self) -> &MetaInfo {
        &self.meta
    }

    fn get(&self, index: usize) -> Result<DataItem, SorrelError> {
        let (img_path, ann_path) = self
            .pairs
            .get(index)
            .ok_or(SorrelError::IndexError(index, self.pairs.len()))?;

        Ok(DataItem {
            samples: vec![DataSample {
                img_path: img_path.clone(),
                image: open_rgb(img_path)?,
                annotation: Annotation::Detection(read_instances(ann_path)?),
            }],
        })
    }
}

pub(crate) fn build_image_boxes(cfg: &Value) -> Result<Box<dyn Dataset>, SorrelError> {
    let root = opt_str(cfg, "data_root")?.map(PathBuf::from);
    let img_dir = resolve(root.as_deref(), opt_str(cfg, "img_dir")?);
    let ann_dir = resolve(root.as_deref(), opt_str(cfg, "ann_dir")?);
    let meta = MetaInfo::from_config(cfg.get("metainfo"))?;

    Ok(Box::new(ImageBoxesDataset::new(
        &img_dir,
        &ann_dir,
        opt_str(cfg, "img_suffix")?.unwrap_or(""),
        opt_str(cfg, "ann_suffix")?.unwrap_or(".json"),
        meta,
    )?))
}

/// Read the instances stored in a per-image annotation file
///
/// Boxes are derived from the polygons when only polygons are present.
pub fn read_instances<P: AsRef<Path>>(path: P) -> Result<DetAnnotation, SorrelError> {
    let path = path.as_ref();
    let describe = |message: &str| {
        SorrelError::AnnotationError(format!("{}: {}", path.display(), message))
    };

    let contents = std::fs::read_to_string(path)
        .map_err(|err| SorrelError::NoFileError(format!("{}: {}", path.display(), err)))?;

    let value: Value = serde_json::from_str(&contents).map_err(|err| describe(&err.to_string()))?;

    let boxes = BoundingBoxes::from_json_value(&value)?;
    let polygons = Polygons::from_json_value(&value)?;

    let (boxes, polygons) = match (boxes, polygons) {
        (Some(boxes), polygons) => (boxes, polygons.unwrap_or_default()),
        (None, Some(polygons)) => (polygons.to_bounding_boxes()?, polygons),
        (None, None) => return Err(describe("no bounding boxes or polygons found")),
    };

    let labels = match read_labels(&value) {
        Some(labels) => labels.ok_or_else(|| describe("labels must be non-negative integers"))?,
        None => vec![0; boxes.len()],
    };

    if labels.len() != boxes.len() {
        return Err(describe(&format!(
            "{} labels for {} boxes",
            labels.len(),
            boxes.len()
        )));
    }

    let polygon_labels = if polygons.len() == labels.len() {
        labels.clone()
    } else {
        vec![0; polygons.len()]
    };

    Ok(DetAnnotation {
        boxes,
        labels,
        polygons,
        polygon_labels,
    })
}

/// Labels under the first accepted key; the inner option is `None` if malformed
fn read_labels(value: &Value) -> Option<Option<Vec<u32>>> {
    LABEL_JSON_VALID_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_array))
        .map(|labels| {
            labels
                .iter()
                .map(|label| label.as_u64().and_then(|l| u32::try_from(l).ok()))
                .collect::<Option<Vec<u32>>>()
        })
}
