// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use image::{GrayImage, Luma, Rgb, RgbImage};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn sorrel() -> Command {
    cargo_bin_cmd!("sorrel")
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Five 16x16 images with one box each under `images/` and `annotations/`
fn detection_fixture(root: &Path) {
    fs::create_dir_all(root.join("images")).unwrap();
    fs::create_dir_all(root.join("annotations")).unwrap();

    for i in 0..5 {
        RgbImage::from_pixel(16, 16, Rgb([40, 40, 40]))
            .save(root.join("images").join(format!("img_{}.png", i)))
            .unwrap();

        write_json(
            &root.join("annotations").join(format!("img_{}.json", i)),
            &json!({"bboxes": [[2, 2, 12, 12]], "labels": [i % 2]}),
        );
    }
}

fn detection_config(root: &Path, img_dir: &str) -> Value {
    json!({
        "default_scope": "mmdet",
        "train_dataloader": {
            "batch_size": 2,
            "dataset": {
                "type": "ImageBoxesDataset",
                "data_root": root.to_str().unwrap(),
                "img_dir": img_dir,
                "ann_dir": "annotations",
                "metainfo": {"classes": ["cat", "dog"]}
            }
        },
        "visualizer": {"type": "DetLocalVisualizer", "line_width": 1}
    })
}

fn sample_dirs(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

mod dispatch {
    use super::*;

    #[test]
    fn test_no_command_prints_help() {
        sorrel()
            .assert()
            .code(1)
            .stdout(predicate::str::contains("sorrel <command> [<args>]"));
    }

    #[test]
    fn test_version() {
        sorrel()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("sorrel"));
    }

    #[test]
    fn test_help() {
        sorrel()
            .args(["dataset", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("browse"));
    }

    #[test]
    fn test_unknown_job_lists_choices() {
        sorrel()
            .args(["dataset", "unknown-job"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(
                "Error: missing a valid command. Choose from: [\"browse\"]",
            ));
    }

    #[test]
    fn test_missing_job_lists_choices() {
        sorrel()
            .arg("dataset")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Choose from"));
    }

    #[test]
    fn test_bad_flag_is_usage_error() {
        sorrel()
            .args(["dataset", "browse", "cfg.json", "--max-count", "0"])
            .assert()
            .code(2);
    }
}

mod browse {
    use super::*;

    #[test]
    fn test_max_count_limits_samples() {
        let dir = TempDir::new().unwrap();
        detection_fixture(dir.path());

        let config = dir.path().join("config.json");
        write_json(&config, &detection_config(dir.path(), "images"));

        let out = dir.path().join("out");

        sorrel()
            .args(["dataset", "browse"])
            .arg(&config)
            .arg("--save-dir")
            .arg(&out)
            .args(["--max-count", "3"])
            .assert()
            .success();

        assert_eq!(sample_dirs(&out), vec!["000000", "000001", "000002"]);
        assert!(out.join("000000").join("img_0.jpg").exists());

        let info = fs::read_to_string(out.join("000002").join("info.txt")).unwrap();
        assert!(info.starts_with("The source filepath of img_0.jpg is `"));
        assert!(info.trim_end().ends_with("img_2.png`."));
    }

    #[test]
    fn test_cfg_options_override() {
        let dir = TempDir::new().unwrap();
        detection_fixture(dir.path());

        let config = dir.path().join("config.json");
        write_json(&config, &detection_config(dir.path(), "missing"));

        let out = dir.path().join("out");

        sorrel()
            .args(["dataset", "browse"])
            .arg(&config)
            .arg("--save-dir")
            .arg(&out)
            .args([
                "--cfg-options",
                "train_dataloader.dataset.img_dir=images",
                "visualizer.line_width=2",
            ])
            .assert()
            .success();

        assert_eq!(sample_dirs(&out).len(), 5);
    }

    #[test]
    fn test_missing_mode_fails() {
        let dir = TempDir::new().unwrap();
        detection_fixture(dir.path());

        let config = dir.path().join("config.json");
        write_json(&config, &detection_config(dir.path(), "images"));

        sorrel()
            .args(["dataset", "browse"])
            .arg(&config)
            .args(["--mode", "val"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[sorrel::dataset::browse] ERROR:"))
            .stderr(predicate::str::contains("val_dataloader.dataset"));
    }

    #[test]
    fn test_unsupported_scope() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.json");
        write_json(&config, &json!({"default_scope": "mmpose"}));

        sorrel()
            .args(["dataset", "browse"])
            .arg(&config)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Browsing for mmpose is not implemented"));
    }

    #[test]
    fn test_unknown_dataset_type() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.json");
        write_json(
            &config,
            &json!({"train_dataloader": {"dataset": {"type": "VOCDataset"}}}),
        );

        sorrel()
            .args(["dataset", "browse"])
            .arg(&config)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("VOCDataset is not in the dataset registry"));
    }

    #[test]
    fn test_coco_with_base_config() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("train")).unwrap();
        for name in ["a.png", "b.png"] {
            RgbImage::new(12, 12).save(root.join("train").join(name)).unwrap();
        }

        write_json(
            &root.join("instances.json"),
            &json!({
                "images": [{"id": 1, "file_name": "a.png"}, {"id": 2, "file_name": "b.png"}],
                "annotations": [
                    {"id": 1, "image_id": 1, "category_id": 1, "bbox": [1, 1, 5, 5], "area": 25,
                     "segmentation": [[1, 1, 6, 1, 6, 6]]}
                ],
                "categories": [{"id": 1, "name": "cell"}]
            }),
        );

        write_json(
            &root.join("base.json"),
            &json!({
                "default_scope": "mmdet",
                "visualizer": {"type": "DetLocalVisualizer"},
                "train_dataloader": {"dataset": {"type": "CocoDataset", "data_prefix": {"img": "train/"}}}
            }),
        );

        let config = root.join("config.json");
        write_json(
            &config,
            &json!({
                "_base_": "base.json",
                "train_dataloader": {"dataset": {
                    "data_root": root.to_str().unwrap(),
                    "ann_file": "instances.json"
                }}
            }),
        );

        let out = root.join("out");

        sorrel()
            .args(["dataset", "browse"])
            .arg(&config)
            .arg("--save-dir")
            .arg(&out)
            .assert()
            .success();

        assert_eq!(sample_dirs(&out), vec!["000000", "000001"]);
    }

    #[test]
    fn test_segmentation_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("img_dir")).unwrap();
        fs::create_dir_all(root.join("ann_dir")).unwrap();

        for name in ["x", "y"] {
            RgbImage::new(8, 8)
                .save(root.join("img_dir").join(format!("{}.jpg", name)))
                .unwrap();
            GrayImage::from_fn(8, 8, |x, _| Luma([(x % 2) as u8]))
                .save(root.join("ann_dir").join(format!("{}.png", name)))
                .unwrap();
        }

        let config = root.join("config.json");
        write_json(
            &config,
            &json!({
                "default_scope": "mmseg",
                "train_dataloader": {"dataset": {
                    "type": "BaseSegDataset",
                    "data_root": root.to_str().unwrap(),
                    "data_prefix": {"img_path": "img_dir", "seg_map_path": "ann_dir"},
                    "metainfo": {"classes": ["a", "b"], "palette": [[0, 0, 0], [255, 0, 0]]}
                }},
                "visualizer": {"type": "SegLocalVisualizer", "alpha": 1.0}
            }),
        );

        let out = root.join("out");

        sorrel()
            .args(["dataset", "browse"])
            .arg(&config)
            .arg("--save-dir")
            .arg(&out)
            .assert()
            .success();

        assert!(out.join("x.jpg").exists());
        assert!(out.join("y.jpg").exists());
    }
}
