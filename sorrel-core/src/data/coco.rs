// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::data::{
    Annotation, DataItem, DataSample, Dataset, DetAnnotation, MetaInfo, opt_bool, opt_str,
    prefix_str, req_str, resolve,
};
use crate::error::SorrelError;
use crate::im::{BoundingBoxes, Polygons, open_rgb};
use crate::ut::path::join_root;

#[derive(Debug, Deserialize)]
struct CocoFile {
    images: Vec<CocoImage>,
    #[serde(default)]
    annotations: Vec<CocoAnnotation>,
    #[serde(default)]
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    image_id: u64,
    category_id: u64,
    bbox: [f32; 4],
    #[serde(default)]
    area: Option<f32>,
    #[serde(default)]
    iscrowd: u8,
    #[serde(default)]
    segmentation: Value,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

/// Detection dataset described by a COCO style annotation file
///
/// Category ids are mapped to contiguous labels in id order, or in the order
/// of `metainfo.classes` when given (categories not listed are dropped).
/// Crowd annotations and boxes narrower or shorter than one pixel are
/// skipped. Polygon segmentations are kept; run-length encoded masks are
/// ignored.
///
/// Config keys: `data_root`, `ann_file`, `data_prefix.img`, `metainfo` and
/// `filter_cfg.filter_empty_gt`.
#[derive(Debug, Clone)]
pub struct CocoDataset {
    entries: Vec<(PathBuf, DetAnnotation)>,
    meta: MetaInfo,
}

impl CocoDataset {
    /// Parse a COCO annotation file
    ///
    /// # Arguments
    ///
    /// * `ann_file` - Path to the annotation json
    /// * `img_dir` - Directory that image `file_name`s are relative to
    /// * `meta` - Meta information; empty classes are filled from the file
    /// * `filter_empty_gt` - Drop images without any kept instance
    pub fn new(
        ann_file: &Path,
        img_dir: &Path,
        mut meta: MetaInfo,
        filter_empty_gt: bool,
    ) -> Result<Self, SorrelError> {
        let contents = std::fs::read_to_string(ann_file)
            .map_err(|err| SorrelError::NoFileError(format!("{}: {}", ann_file.display(), err)))?;

        let coco: CocoFile = serde_json::from_str(&contents).map_err(|err| {
            SorrelError::AnnotationError(format!("{}: {}", ann_file.display(), err))
        })?;

        let mut categories: Vec<&CocoCategory> = coco.categories.iter().collect();
        categories.sort_by_key(|category| category.id);

        let cat2label: HashMap<u64, u32> = if meta.classes.is_empty() {
            meta.classes = categories.iter().map(|c| c.name.clone()).collect();
            categories
                .iter()
                .enumerate()
                .map(|(label, category)| (category.id, label as u32))
                .collect()
        } else {
            categories
                .iter()
                .filter_map(|category| {
                    meta.classes
                        .iter()
                        .position(|class| class == &category.name)
                        .map(|label| (category.id, label as u32))
                })
                .collect()
        };

        let mut by_image: HashMap<u64, Vec<&CocoAnnotation>> = HashMap::new();
        for annotation in &coco.annotations {
            by_image
                .entry(annotation.image_id)
                .or_default()
                .push(annotation);
        }

        let mut entries = Vec::with_capacity(coco.images.len());

        for image in &coco.images {
            let annotations = by_image.get(&image.id).map(Vec::as_slice).unwrap_or(&[]);
            let instances = parse_instances(annotations, &cat2label)?;

            if filter_empty_gt && instances.boxes.is_empty() {
                continue;
            }

            entries.push((img_dir.join(&image.file_name), instances));
        }

        Ok(Self { entries, meta })
    }
}

fn parse_instances(
    annotations: &[&CocoAnnotation],
    cat2label: &HashMap<u64, u32>,
) -> Result<DetAnnotation, SorrelError> {
    let mut boxes = Vec::new();
    let mut labels = Vec::new();
    let mut polygons = Vec::new();
    let mut polygon_labels = Vec::new();

    for annotation in annotations {
        let [_, _, w, h] = annotation.bbox;

        if annotation.iscrowd != 0 || w < 1.0 || h < 1.0 {
            continue;
        }

        if annotation.area.is_some_and(|area| area <= 0.0) {
            continue;
        }

        let Some(&label) = cat2label.get(&annotation.category_id) else {
            continue;
        };

        boxes.push(annotation.bbox);
        labels.push(label);

        // Run-length encoded segmentations are objects rather than lists
        if let Some(parts) = annotation.segmentation.as_array() {
            for part in parts {
                let coords: Option<Vec<f32>> = part
                    .as_array()
                    .map(|coords| coords.iter().filter_map(|c| c.as_f64()).map(|c| c as f32).collect());

                if let Some(coords) = coords {
                    if coords.len() >= 6 && coords.len() % 2 == 0 {
                        polygons.push(coords);
                        polygon_labels.push(label);
                    }
                }
            }
        }
    }

    Ok(DetAnnotation {
        boxes: BoundingBoxes::from_xywh(boxes)?,
        labels,
        polygons: Polygons::from_flat(&polygons)?,
        polygon_labels,
    })
}

impl Dataset for CocoDataset {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn metainfo(&self) -> &MetaInfo {
        &self.meta
    }

    fn get(&self, index: usize) -> Result<DataItem, SorrelError> {
        let (img_path, instances) = self
            .entries
            .get(index)
            .ok_or(SorrelError::IndexError(index, self.entries.len()))?;

        Ok(DataItem {
            samples: vec![DataSample {
                img_path: img_path.clone(),
                image: open_rgb(img_path)?,
                annotation: Annotation::Detection(instances.clone()),
            }],
        })
    }
}

pub(crate) fn build_coco(cfg: &Value) -> Result<Box<dyn Dataset>, SorrelError> {
    let root = opt_str(cfg, "data_root")?.map(PathBuf::from);
    let ann_file = join_root(root.as_deref(), req_str(cfg, "ann_file")?);
    let img_dir = resolve(root.as_deref(), prefix_str(cfg, "img")?);
    let meta = MetaInfo::from_config(cfg.get("metainfo"))?;

    let filter_empty_gt = match cfg.get("filter_cfg") {
        Some(filter_cfg) if filter_cfg.is_object() => {
            opt_bool(filter_cfg, "filter_empty_gt", false)?
        }
        _ => false,
    };

    Ok(Box::new(CocoDataset::new(
        &ann_file,
        &img_dir,
        meta,
        filter_empty_gt,
    )?))
}

#[cfg(test)]
mod test {

    use super::*;
    use serde_json::json;

    fn coco_fixture() -> Value {
        json!({
            "images": [
                {"id": 1, "file_name": "one.jpg", "width": 10, "height": 10},
                {"id": 2, "file_name": "two.jpg", "width": 10, "height": 10},
                {"id": 3, "file_name": "three.jpg", "width": 10, "height": 10}
            ],
            "annotations": [
                {"id": 1, "image_id": 1, "category_id": 7, "bbox": [1, 1, 4, 4], "area": 16,
                 "segmentation": [[1, 1, 5, 1, 5, 5, 1, 5]], "iscrowd": 0},
                {"id": 2, "image_id": 1, "category_id": 3, "bbox": [0, 0, 2, 3], "area": 6,
                 "segmentation": {"counts": [1, 2], "size": [10, 10]}, "iscrowd": 0},
                {"id": 3, "image_id": 2, "category_id": 3, "bbox": [0, 0, 2, 2], "iscrowd": 1},
                {"id": 4, "image_id": 2, "category_id": 3, "bbox": [0, 0, 0.5, 2]}
            ],
            "categories": [{"id": 7, "name": "dog"}, {"id": 3, "name": "cat"}]
        })
    }

    fn write_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("instances.json");
        std::fs::write(&path, serde_json::to_string(&coco_fixture()).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_coco_labels_follow_category_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ann_file = write_fixture(dir.path());

        let dataset = CocoDataset::new(&ann_file, dir.path(), MetaInfo::default(), false).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.metainfo().classes, vec!["cat", "dog"]);

        let (img_path, instances) = &dataset.entries[0];
        assert!(img_path.ends_with("one.jpg"));
        assert_eq!(instances.labels, vec![1, 0]);
        assert_eq!(instances.boxes.as_xyxy(), &vec![[1., 1., 5., 5.], [0., 0., 2., 3.]]);
        assert_eq!(instances.polygons.len(), 1);
        assert_eq!(instances.polygon_labels, vec![1]);

        // Crowd and sub-pixel boxes are skipped
        assert!(dataset.entries[1].1.boxes.is_empty());
    }

    #[test]
    fn test_coco_classes_from_metainfo() {
        let dir = tempfile::tempdir().unwrap();
        let ann_file = write_fixture(dir.path());

        let meta = MetaInfo {
            classes: vec!["dog".to_string()],
            palette: None,
        };

        let dataset = CocoDataset::new(&ann_file, dir.path(), meta, true).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.entries[0].1.labels, vec![0]);
    }

    #[test]
    fn test_build_coco_config() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let cfg = json!({
            "type": "CocoDataset",
            "data_root": dir.path().to_str().unwrap(),
            "ann_file": "instances.json",
            "data_prefix": {"img": "train/"},
            "filter_cfg": {"filter_empty_gt": true}
        });

        let dataset = build_coco(&cfg).unwrap();
        assert_eq!(dataset.len(), 1);

        // Images are only read on access
        assert!(matches!(dataset.get(0), Err(SorrelError::ImageReadError(_))));
    }

    #[test]
    fn test_build_coco_requires_ann_file() {
        assert!(matches!(
            build_coco(&json!({"type": "CocoDataset"})),
            Err(SorrelError::DatasetError(_))
        ));
    }
}
