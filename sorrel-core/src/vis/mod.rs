// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod palette;

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;
use serde_json::Value;

use crate::data::{Annotation, MetaInfo};
use crate::error::SorrelError;
use crate::im::draw::{blend_mask, draw_polygon, draw_rectangle, fill_polygon};
use crate::im::save_rgb;
use crate::registry::Registry;
use crate::constant::IGNORE_INDEX;

use palette::{generate_palette, generated_color, palette_from_value};

/// Ground truth a visualizer knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizerKind {
    Plain,
    Detection,
    Segmentation,
}

/// Draws ground truth onto images and writes or displays the result
#[derive(Debug, Clone)]
pub struct Visualizer {
    pub name: String,
    pub kind: VisualizerKind,
    pub line_width: u32,
    pub alpha: f32,
    pub bbox_color: Option<[u8; 3]>,
    pub ignore_index: u32,
    classes: Vec<String>,
    palette: Vec<[u8; 3]>,
}

impl Visualizer {
    pub fn new(kind: VisualizerKind) -> Self {
        let alpha = match kind {
            VisualizerKind::Segmentation => 0.5,
            _ => 0.8,
        };

        Self {
            name: "visualizer".to_string(),
            kind,
            line_width: 3,
            alpha,
            bbox_color: None,
            ignore_index: IGNORE_INDEX,
            classes: Vec::new(),
            palette: Vec::new(),
        }
    }

    /// Initialize from a `visualizer` config block
    ///
    /// Recognized keys are `name`, `line_width`, `alpha`, `bbox_color` and
    /// `ignore_index`. Unknown keys are ignored.
    pub fn from_config(kind: VisualizerKind, cfg: &Value) -> Result<Self, SorrelError> {
        let mut visualizer = Visualizer::new(kind);

        if let Some(name) = cfg.get("name").and_then(Value::as_str) {
            visualizer.name = name.to_string();
        }

        if let Some(width) = cfg.get("line_width").filter(|v| !v.is_null()) {
            visualizer.line_width = width
                .as_f64()
                .filter(|w| *w >= 0.0)
                .map(|w| w.round() as u32)
                .ok_or_else(|| invalid_key("line_width", width))?;
        }

        if let Some(alpha) = cfg.get("alpha").filter(|v| !v.is_null()) {
            visualizer.alpha = alpha
                .as_f64()
                .filter(|a| (0.0..=1.0).contains(a))
                .ok_or_else(|| invalid_key("alpha", alpha))? as f32;
        }

        if let Some(color) = cfg.get("bbox_color").filter(|v| !v.is_null()) {
            let colors = palette_from_value(&Value::Array(vec![color.clone()]))
                .map_err(|_| invalid_key("bbox_color", color))?;
            visualizer.bbox_color = colors.first().copied();
        }

        if let Some(index) = cfg.get("ignore_index").filter(|v| !v.is_null()) {
            visualizer.ignore_index = index
                .as_u64()
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(|| invalid_key("ignore_index", index))?;
        }

        Ok(visualizer)
    }

    /// Adopt class names and colors from a dataset
    ///
    /// Without a dataset palette, one color per class is generated. Without
    /// classes either, colors are generated from the labels being drawn.
    pub fn set_dataset_meta(&mut self, meta: &MetaInfo) {
        self.classes = meta.classes.clone();
        self.palette = match &meta.palette {
            Some(palette) if !palette.is_empty() => palette.clone(),
            _ => generate_palette(meta.classes.len()),
        };
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn color(&self, label: u32) -> [u8; 3] {
        if self.palette.is_empty() {
            return generated_color(label as usize);
        }

        self.palette[label as usize % self.palette.len()]
    }

    /// Render ground truth onto a copy of `image`
    ///
    /// Annotations the visualizer kind does not handle are left off.
    pub fn draw(&self, image: &RgbImage, annotation: &Annotation) -> RgbImage {
        let mut canvas = image.clone();

        match (self.kind, annotation) {
            (VisualizerKind::Detection, Annotation::Detection(instances)) => {
                for (i, polygon) in instances.polygons.as_points().iter().enumerate() {
                    let label = instances.polygon_labels.get(i).copied().unwrap_or(0);
                    let color = self.color(label);
                    fill_polygon(&mut canvas, polygon, color, self.alpha * 0.5);
                    draw_polygon(&mut canvas, polygon, color, 1);
                }

                for (i, bbox) in instances.boxes.as_xyxy().iter().enumerate() {
                    let label = instances.labels.get(i).copied().unwrap_or(0);
                    let color = self.bbox_color.unwrap_or_else(|| self.color(label));
                    draw_rectangle(&mut canvas, *bbox, color, self.line_width);
                }
            }
            (VisualizerKind::Segmentation, Annotation::Segmentation(mask)) => {
                let palette = if self.palette.is_empty() {
                    let n = mask
                        .labels()
                        .into_iter()
                        .filter(|&l| l != self.ignore_index)
                        .max()
                        .map_or(1, |l| l as usize + 1);
                    generate_palette(n)
                } else {
                    self.palette.clone()
                };

                blend_mask(&mut canvas, mask, &palette, self.alpha, self.ignore_index);
            }
            _ => {}
        }

        canvas
    }

    /// Draw a sample and write and/or display it
    ///
    /// # Arguments
    ///
    /// * `name` - Identifier of the sample, used for temporary display files
    /// * `image` - Image to draw on
    /// * `annotation` - Ground truth to draw
    /// * `show` - Open the rendered image in the system viewer
    /// * `wait_time` - Seconds to wait after opening the viewer
    /// * `out_file` - Where to write the rendered image
    pub fn add_datasample(
        &self,
        name: &str,
        image: &RgbImage,
        annotation: &Annotation,
        show: bool,
        wait_time: f64,
        out_file: Option<&Path>,
    ) -> Result<(), SorrelError> {
        let canvas = self.draw(image, annotation);

        if let Some(out_file) = out_file {
            save_rgb(&canvas, out_file)?;
        }

        if show {
            let display_path = match out_file {
                Some(out_file) => out_file.to_path_buf(),
                None => {
                    let path = display_file(name);
                    save_rgb(&canvas, &path)?;
                    path
                }
            };

            open::that(&display_path).map_err(|err| {
                SorrelError::DisplayError(format!("{}: {}", display_path.display(), err))
            })?;

            if wait_time > 0.0 && wait_time.is_finite() {
                std::thread::sleep(Duration::from_secs_f64(wait_time));
            }
        }

        Ok(())
    }
}

fn invalid_key(key: &str, value: &Value) -> SorrelError {
    SorrelError::ConfigFormatError(format!("Invalid visualizer `{}`: {}", key, value))
}

/// Temporary file a sample is written to when only displayed
fn display_file(name: &str) -> PathBuf {
    let name: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '_' })
        .collect();

    std::env::temp_dir().join(format!("sorrel_{}.png", name.trim_end_matches(".png")))
}

fn build_plain(cfg: &Value) -> Result<Visualizer, SorrelError> {
    Visualizer::from_config(VisualizerKind::Plain, cfg)
}

fn build_det(cfg: &Value) -> Result<Visualizer, SorrelError> {
    Visualizer::from_config(VisualizerKind::Detection, cfg)
}

fn build_seg(cfg: &Value) -> Result<Visualizer, SorrelError> {
    Visualizer::from_config(VisualizerKind::Segmentation, cfg)
}

/// Visualizer registry with the built-in visualizer types
pub fn visualizer_registry() -> Registry<Visualizer> {
    let mut registry: Registry<Visualizer> = Registry::new("visualizer");

    registry.register("Visualizer", build_plain);
    registry.child_mut("mmdet").register("DetLocalVisualizer", build_det);
    registry.child_mut("mmseg").register("SegLocalVisualizer", build_seg);

    registry
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::data::DetAnnotation;
    use crate::im::{BoundingBoxes, LabelMap, Polygons};
    use image::Rgb;
    use serde_json::json;

    fn detection() -> Annotation {
        Annotation::Detection(DetAnnotation {
            boxes: BoundingBoxes::new(vec![[2., 2., 7., 7.]]).unwrap(),
            labels: vec![0],
            polygons: Polygons::default(),
            polygon_labels: vec![],
        })
    }

    #[test]
    fn test_registry_scopes() {
        let registry = visualizer_registry();

        let det = registry
            .build(Some("mmdet"), &json!({"type": "DetLocalVisualizer", "line_width": 1}))
            .unwrap();
        assert_eq!(det.kind, VisualizerKind::Detection);
        assert_eq!(det.line_width, 1);
        assert_eq!(det.alpha, 0.8);

        let seg = registry
            .build(Some("mmseg"), &json!({"type": "SegLocalVisualizer"}))
            .unwrap();
        assert_eq!(seg.kind, VisualizerKind::Segmentation);
        assert_eq!(seg.alpha, 0.5);

        assert!(registry
            .build(Some("mmseg"), &json!({"type": "DetLocalVisualizer"}))
            .is_err());
    }

    #[test]
    fn test_invalid_config_values() {
        assert!(Visualizer::from_config(VisualizerKind::Plain, &json!({"alpha": 2})).is_err());
        assert!(Visualizer::from_config(VisualizerKind::Plain, &json!({"line_width": "x"})).is_err());
        assert!(
            Visualizer::from_config(VisualizerKind::Plain, &json!({"bbox_color": [1, 2]})).is_err()
        );
    }

    #[test]
    fn test_draw_detection() {
        let mut visualizer = Visualizer::new(VisualizerKind::Detection);
        visualizer.line_width = 1;
        visualizer.set_dataset_meta(&MetaInfo {
            classes: vec!["cat".to_string()],
            palette: Some(vec![[255, 0, 0]]),
        });

        let image = RgbImage::new(10, 10);
        let canvas = visualizer.draw(&image, &detection());

        assert_eq!(canvas.get_pixel(2, 2), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(5, 5), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(2, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_plain_draws_nothing() {
        let visualizer = Visualizer::new(VisualizerKind::Plain);
        let image = RgbImage::new(10, 10);
        assert_eq!(visualizer.draw(&image, &detection()), image);
    }

    #[test]
    fn test_draw_segmentation() {
        let mut visualizer = Visualizer::new(VisualizerKind::Segmentation);
        visualizer.alpha = 1.0;
        visualizer.set_dataset_meta(&MetaInfo {
            classes: vec!["bg".to_string(), "road".to_string()],
            palette: Some(vec![[0, 0, 0], [10, 20, 30]]),
        });

        let mask = LabelMap::new(2, 1, vec![1, 255]).unwrap();
        let canvas = visualizer.draw(&RgbImage::new(2, 1), &Annotation::Segmentation(mask));

        assert_eq!(canvas.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(canvas.get_pixel(1, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_segmentation_colors_without_classes() {
        let mut visualizer = Visualizer::new(VisualizerKind::Segmentation);
        visualizer.alpha = 1.0;
        visualizer.set_dataset_meta(&MetaInfo::default());

        let mask = LabelMap::new(3, 1, vec![0, 1, 2]).unwrap();
        let canvas = visualizer.draw(&RgbImage::new(3, 1), &Annotation::Segmentation(mask));

        let expected = generate_palette(3);
        for x in 0..3 {
            assert_eq!(canvas.get_pixel(x, 0), &Rgb(expected[x as usize]));
        }

        assert_ne!(canvas.get_pixel(0, 0), canvas.get_pixel(1, 0));
        assert_ne!(canvas.get_pixel(1, 0), canvas.get_pixel(2, 0));
    }

    #[test]
    fn test_detection_colors_without_classes() {
        let mut visualizer = Visualizer::new(VisualizerKind::Detection);
        visualizer.line_width = 1;
        visualizer.set_dataset_meta(&MetaInfo::default());

        let annotation = Annotation::Detection(DetAnnotation {
            boxes: BoundingBoxes::new(vec![[0., 0., 3., 3.], [5., 5., 8., 8.]]).unwrap(),
            labels: vec![0, 1],
            polygons: Polygons::default(),
            polygon_labels: vec![],
        });

        let canvas = visualizer.draw(&RgbImage::new(10, 10), &annotation);
        assert_ne!(canvas.get_pixel(0, 0), canvas.get_pixel(5, 5));
    }

    #[test]
    fn test_add_datasample_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out_file = dir.path().join("nested").join("img_0.jpg");

        let visualizer = Visualizer::new(VisualizerKind::Detection);
        visualizer
            .add_datasample(
                "sample",
                &RgbImage::new(10, 10),
                &detection(),
                false,
                0.0,
                Some(&out_file),
            )
            .unwrap();

        assert!(out_file.exists());
    }

    #[test]
    fn test_display_file_name() {
        let path = display_file("a/b.png%1");
        assert_eq!(path.file_name().unwrap(), "sorrel_a_b.png_1.png");
    }
}
