// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::constant::{IGNORE_INDEX, SUPPORTED_IMAGE_FORMATS, SUPPORTED_MASK_FORMATS};
use crate::data::{
    Annotation, DataItem, DataSample, Dataset, MetaInfo, opt_bool, opt_str, prefix_str, resolve,
};
use crate::error::SorrelError;
use crate::im::{LabelMap, open_rgb};
use crate::ut::path::{collect_file_pairs, collect_file_paths};

/// Semantic segmentation dataset of images and label maps
///
/// Images under `data_prefix.img_path` are paired with label maps under
/// `data_prefix.seg_map_path` by their name once `img_suffix` (default
/// `.jpg`) and `seg_map_suffix` (default `.png`) are removed.
///
/// With `reduce_zero_label` the background label 0 becomes the ignore index
/// and every other label is shifted down by one.
#[derive(Debug, Clone)]
pub struct BaseSegDataset {
    pairs: Vec<(PathBuf, PathBuf)>,
    reduce_zero_label: bool,
    meta: MetaInfo,
}

impl BaseSegDataset {
    pub fn new(
        img_dir: &Path,
        seg_dir: &Path,
        img_suffix: &str,
        seg_map_suffix: &str,
        reduce_zero_label: bool,
        meta: MetaInfo,
    ) -> Result<Self, SorrelError> {
        let images =
            collect_file_paths(img_dir, SUPPORTED_IMAGE_FORMATS.as_slice(), Some(img_suffix))?;
        let masks =
            collect_file_paths(seg_dir, SUPPORTED_MASK_FORMATS.as_slice(), Some(seg_map_suffix))?;

        let pairs = collect_file_pairs(&images, &masks, img_suffix, seg_map_suffix)
            .into_iter()
            .map(|(_, image, mask)| (image, mask))
            .collect();

        Ok(Self {
            pairs,
            reduce_zero_label,
            meta,
        })
    }
}

/// Map background to the ignore index and shift remaining labels down
fn reduce_zero_label(mask: LabelMap) -> Result<LabelMap, SorrelError> {
    let data = mask
        .as_raw()
        .iter()
        .map(|&label| match label {
            0 => IGNORE_INDEX,
            IGNORE_INDEX => IGNORE_INDEX,
            label => label - 1,
        })
        .collect();

    LabelMap::new(mask.width(), mask.height(), data)
}

impl Dataset for BaseSegDataset {
    fn len(&self) -> usize {
        self.pairs.len()
    }

    fn metainfo(&self) -> &MetaInfo {
        &self.meta
    }

    fn get(&self, index: usize) -> Result<DataItem, SorrelError> {
        let (img_path, seg_path) = self
            .pairs
            .get(index)
            .ok_or(SorrelError::IndexError(index, self.pairs.len()))?;

        let mut mask = LabelMap::open(seg_path)?;
        if self.reduce_zero_label {
            mask = reduce_zero_label(mask)?;
        }

        Ok(DataItem {
            samples: vec![DataSample {
                img_path: img_path.clone(),
                image: open_rgb(img_path)?,
                annotation: Annotation::Segmentation(mask),
            }],
        })
    }
}

pub(crate) fn build_base_seg(cfg: &Value) -> Result<Box<dyn Dataset>, SorrelError> {
    let root = opt_str(cfg, "data_root")?.map(PathBuf::from);
    let img_dir = resolve(root.as_deref(), prefix_str(cfg, "img_path")?);
    let seg_dir = resolve(root.as_deref(), prefix_str(cfg, "seg_map_path")?);
    let meta = MetaInfo::from_config(cfg.get("metainfo"))?;

    Ok(Box::new(BaseSegDataset::new(
        &img_dir,
        &seg_dir,
        opt_str(cfg, "img_suffix")?.unwrap_or(".jpg"),
        opt_str(cfg, "seg_map_suffix")?.unwrap_or(".png"),
        opt_bool(cfg, "reduce_zero_label", false)?,
        meta,
    )?))
}

#[cfg(test)]
mod test {

    use super::*;
    use image::{GrayImage, Luma, RgbImage};
    use serde_json::json;

    fn write_pair(root: &Path, name: &str, label: u8) {
        let img_dir = root.join("img_dir");
        let ann_dir = root.join("ann_dir");
        std::fs::create_dir_all(&img_dir).unwrap();
        std::fs::create_dir_all(&ann_dir).unwrap();

        RgbImage::new(4, 4)
            .save(img_dir.join(format!("{}.jpg", name)))
            .unwrap();

        GrayImage::from_fn(4, 4, |x, _| if x < 2 { Luma([0]) } else { Luma([label]) })
            .save(ann_dir.join(format!("{}.png", name)))
            .unwrap();
    }

    #[test]
    fn test_seg_pairs_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_pair(dir.path(), "b", 2);
        write_pair(dir.path(), "a", 1);

        // Unpaired image is ignored
        RgbImage::new(2, 2)
            .save(dir.path().join("img_dir").join("c.jpg"))
            .unwrap();

        let cfg = json!({
            "type": "BaseSegDataset",
            "data_root": dir.path().to_str().unwrap(),
            "data_prefix": {"img_path": "img_dir", "seg_map_path": "ann_dir"},
            "metainfo": {"classes": ["background", "a", "b"]}
        });

        let dataset = build_base_seg(&cfg).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.metainfo().classes.len(), 3);

        let item = dataset.get(1).unwrap();
        assert!(item.samples[0].img_path.ends_with("b.jpg"));

        match &item.samples[0].annotation {
            Annotation::Segmentation(mask) => assert_eq!(mask.labels(), vec![0, 2]),
            other => panic!("expected a label map, got {:?}", other),
        }
    }

    #[test]
    fn test_reduce_zero_label() {
        let mask = LabelMap::new(4, 1, vec![0, 1, 3, 255]).unwrap();
        let reduced = reduce_zero_label(mask).unwrap();
        assert_eq!(reduced.as_raw(), &vec![255, 0, 2, 255]);
    }

    #[test]
    fn test_seg_missing_dir() {
        let cfg = json!({
            "type": "BaseSegDataset",
            "data_prefix": {"img_path": "/does/not/exist", "seg_map_path": "/does/not/exist"}
        });

        assert!(build_base_seg(&cfg).is_err());
    }
}
