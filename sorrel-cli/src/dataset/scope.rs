// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use sorrel_core::constant::INFO_FILE_NAME;
use sorrel_core::data::DataItem;
use sorrel_core::error::SorrelError;
use sorrel_core::ut::path::sample_dir;
use sorrel_core::vis::Visualizer;

/// Output options shared by every rendered sample
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub save_dir: Option<&'a Path>,
    pub show: bool,
    pub wait_time: f64,
}

/// Draws and writes every image of the item at `index`
pub type Renderer =
    fn(&Visualizer, usize, &DataItem, &RenderContext) -> Result<(), SorrelError>;

/// How each scope lays out browsed samples
///
/// Supporting another scope only requires adding a renderer here.
pub const SCOPE_RENDERERS: &[(&str, Renderer)] = &[
    ("mmdet", render_detection),
    ("mmseg", render_segmentation),
];

/// Renderer registered for `scope`
pub fn renderer(scope: &str) -> Result<Renderer, SorrelError> {
    SCOPE_RENDERERS
        .iter()
        .find(|(name, _)| *name == scope)
        .map(|(_, renderer)| *renderer)
        .ok_or_else(|| SorrelError::UnsupportedScope(scope.to_string()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// One directory per item holding `img_<i>.jpg` files and an `info.txt`
/// recording where each image came from
fn render_detection(
    visualizer: &Visualizer,
    index: usize,
    item: &DataItem,
    ctx: &RenderContext,
) -> Result<(), SorrelError> {
    let item_dir = ctx.save_dir.map(|save_dir| sample_dir(save_dir, index));

    for (i, sample) in item.samples.iter().enumerate() {
        let out_name = format!("img_{}.jpg", i);
        let out_file = item_dir.as_ref().map(|dir| dir.join(&out_name));

        visualizer.add_datasample(
            &file_name(&sample.img_path),
            &sample.image,
            &sample.annotation,
            ctx.show,
            ctx.wait_time,
            out_file.as_deref(),
        )?;

        if let Some(dir) = &item_dir {
            append_info(dir, &out_name, &sample.img_path)?;
        }
    }

    Ok(())
}

fn append_info(dir: &Path, out_name: &str, img_path: &Path) -> Result<(), SorrelError> {
    let info_path = dir.join(INFO_FILE_NAME);
    let error = |err: std::io::Error| {
        SorrelError::OtherError(format!("Could not write {}: {}", info_path.display(), err))
    };

    std::fs::create_dir_all(dir).map_err(error)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&info_path)
        .map_err(error)?;

    writeln!(
        file,
        "The source filepath of {} is `{}`.",
        out_name,
        img_path.display()
    )
    .map_err(error)
}

/// Output path of frame `frame` out of `frames` for an image
fn frame_file(save_dir: &Path, img_path: &Path, frame: usize, frames: usize) -> PathBuf {
    if frames == 1 {
        return save_dir.join(file_name(img_path));
    }

    let stem = img_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();

    match img_path.extension() {
        Some(ext) => save_dir.join(format!("{}_{}.{}", stem, frame, ext.to_string_lossy())),
        None => save_dir.join(format!("{}_{}", stem, frame)),
    }
}

/// Rendered frames written flat into the save directory under their
/// source names
fn render_segmentation(
    visualizer: &Visualizer,
    _index: usize,
    item: &DataItem,
    ctx: &RenderContext,
) -> Result<(), SorrelError> {
    let frames = item.samples.len();

    for (i, sample) in item.samples.iter().enumerate() {
        let name = match frames {
            1 => file_name(&sample.img_path),
            _ => format!("{}%{}", file_name(&sample.img_path), i),
        };

        let out_file = ctx
            .save_dir
            .map(|save_dir| frame_file(save_dir, &sample.img_path, i, frames));

        visualizer.add_datasample(
            &name,
            &sample.image,
            &sample.annotation,
            ctx.show,
            ctx.wait_time,
            out_file.as_deref(),
        )?;
    }

    Ok(())
}
