// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::constant::SAMPLE_DIR_WIDTH;
use crate::error::SorrelError;

/// Collect file paths from a directory filtered by extension and an optional suffix
///
/// The returned paths are sorted by file name so that dataset indices are
/// stable across platforms and runs.
///
/// # Arguments
///
/// * `directory` - Path to directory containing files
/// * `valid_ext` - Lowercase extensions (without dot) to keep
/// * `suffix` - Only include files whose name ends with this suffix (e.g. `_mask.png`)
///
/// # Examples
///
/// ```no_run
/// use sorrel_core::ut::path::collect_file_paths;
/// use sorrel_core::constant::SUPPORTED_IMAGE_FORMATS;
/// let files = collect_file_paths("directory/", SUPPORTED_IMAGE_FORMATS.as_slice(), None);
/// ```
pub fn collect_file_paths<P: AsRef<Path>>(
    directory: P,
    valid_ext: &[&str],
    suffix: Option<&str>,
) -> Result<Vec<PathBuf>, SorrelError> {
    let directory = directory.as_ref();

    let mut files: Vec<PathBuf> = std::fs::read_dir(directory)
        .map_err(|err| SorrelError::DirError(format!("{}: {}", directory.display(), err)))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| valid_ext.contains(&ext.to_lowercase().as_str()))
        })
        .collect();

    if let Some(suffix) = suffix {
        files.retain(|f| {
            f.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix))
        });
    }

    files.sort();

    Ok(files)
}

/// Strip a suffix from a file name, falling back to the file stem
///
/// ```
/// use std::path::Path;
/// use sorrel_core::ut::path::strip_suffix;
///
/// assert_eq!(strip_suffix(Path::new("a/img_1_mask.png"), "_mask.png"), "img_1");
/// assert_eq!(strip_suffix(Path::new("a/img_1.png"), ""), "img_1");
/// ```
pub fn strip_suffix(path: &Path, suffix: &str) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    if !suffix.is_empty() {
        if let Some(stripped) = name.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }

    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or(name)
}

/// Collect file pairs that share a matching name once suffixes are removed
///
/// Pairs are returned sorted by their shared name.
///
/// # Arguments
///
/// * `files_a` - List of file paths
/// * `files_b` - List of file paths
/// * `suffix_a` - Suffix removed from the first set of file names
/// * `suffix_b` - Suffix removed from the second set of file names
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use sorrel_core::ut::path::collect_file_pairs;
///
/// let images = [
///     PathBuf::from("img/id_1.jpg"),
///     PathBuf::from("img/id_2.jpg"),
///     PathBuf::from("img/id_3.jpg"),
/// ];
///
/// let masks = [
///     PathBuf::from("ann/id_1_mask.png"),
///     PathBuf::from("ann/id_3_mask.png"),
/// ];
///
/// let pairs = collect_file_pairs(&images, &masks, ".jpg", "_mask.png");
/// assert_eq!(pairs.len(), 2);
/// assert_eq!(pairs[0].0, "id_1");
/// assert_eq!(pairs[1].0, "id_3");
/// ```
pub fn collect_file_pairs(
    files_a: &[PathBuf],
    files_b: &[PathBuf],
    suffix_a: &str,
    suffix_b: &str,
) -> Vec<(String, PathBuf, PathBuf)> {
    let file_map: HashMap<String, &PathBuf> = files_a
        .iter()
        .map(|file| (strip_suffix(file, suffix_a), file))
        .collect();

    let mut pairs: Vec<(String, PathBuf, PathBuf)> = files_b
        .par_iter()
        .filter_map(|file_b| {
            let name = strip_suffix(file_b, suffix_b);
            file_map
                .get(&name)
                .map(|file_a| (name, (*file_a).clone(), file_b.clone()))
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

/// Output directory for a single browsed sample (zero-padded index)
///
/// ```
/// use std::path::Path;
/// use sorrel_core::ut::path::sample_dir;
///
/// assert_eq!(sample_dir(Path::new("out"), 7), Path::new("out/000007"));
/// ```
pub fn sample_dir(save_dir: &Path, index: usize) -> PathBuf {
    save_dir.join(format!("{:0width$}", index, width = SAMPLE_DIR_WIDTH))
}

/// Join a possibly relative path onto a root, leaving absolute paths untouched
pub fn join_root(root: Option<&Path>, path: &str) -> PathBuf {
    match root {
        Some(root) if !Path::new(path).is_absolute() => root.join(path),
        _ => PathBuf::from(path),
    }
}
