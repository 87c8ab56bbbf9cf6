// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod options;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::SorrelError;

const BASE_KEY: &str = "_base_";
const DELETE_KEY: &str = "_delete_";

/// A training configuration loaded from a json file
///
/// Configs are json objects. A config may inherit from one or more base
/// configs through a top-level `_base_` key (a path or list of paths relative
/// to the config). Bases may not define the same top-level key, and the
/// config's own keys are merged on top of them. A nested object containing `"_delete_": true` replaces the
/// inherited value instead of being merged into it.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sorrel_core::config::Config;
///
/// let mut cfg = Config::from_value(json!({
///     "default_scope": "mmdet",
///     "train_dataloader": { "dataset": { "type": "CocoDataset" } }
/// })).unwrap();
///
/// cfg.merge_from_dict(&[("train_dataloader.dataset.type".to_string(), json!("ImageBoxesDataset"))])
///     .unwrap();
///
/// assert_eq!(
///     cfg.get_path("train_dataloader.dataset.type"),
///     Some(&json!("ImageBoxesDataset"))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    cfg: Value,
    filename: Option<PathBuf>,
}

// >>> I/O METHODS

impl Config {
    /// Load a config file, resolving `_base_` inheritance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a `.json` config file
    ///
    /// ```no_run
    /// use sorrel_core::config::Config;
    /// let cfg = Config::fromfile("configs/coco_detection.json");
    /// ```
    pub fn fromfile<P: AsRef<Path>>(path: P) -> Result<Config, SorrelError> {
        let mut visited = HashSet::new();
        let cfg = load_with_bases(path.as_ref(), &mut visited)?;

        Ok(Config {
            cfg,
            filename: Some(path.as_ref().to_path_buf()),
        })
    }

    /// Wrap an in-memory json object as a config
    pub fn from_value(value: Value) -> Result<Config, SorrelError> {
        if !value.is_object() {
            return Err(SorrelError::ConfigFormatError(
                "The top level of a config must be an object".to_string(),
            ));
        }

        Ok(Config {
            cfg: value,
            filename: None,
        })
    }

    /// Path the config was loaded from, if any
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }
}

// <<< I/O METHODS

// >>> ACCESS METHODS

impl Config {
    /// Top-level value at `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.cfg.get(key)
    }

    /// Top-level string at `key` or a default
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    /// Value at a dotted path, where numeric segments index into lists
    ///
    /// ```
    /// use serde_json::json;
    /// use sorrel_core::config::Config;
    ///
    /// let cfg = Config::from_value(json!({"a": {"b": [{"c": 1}]}})).unwrap();
    /// assert_eq!(cfg.get_path("a.b.0.c"), Some(&json!(1)));
    /// assert_eq!(cfg.get_path("a.x"), None);
    /// ```
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.cfg, |value, key| match value {
            Value::Array(list) => key.parse::<usize>().ok().and_then(|idx| list.get(idx)),
            _ => value.get(key),
        })
    }

    /// Value at a dotted path or a key error
    pub fn require(&self, path: &str) -> Result<&Value, SorrelError> {
        self.get_path(path)
            .ok_or_else(|| SorrelError::ConfigKeyError(path.to_string()))
    }

    /// Reference to the underlying json value
    pub fn as_value(&self) -> &Value {
        &self.cfg
    }
}

// <<< ACCESS METHODS

// >>> MERGE METHODS

impl Config {
    /// Merge `key=value` overrides into the config
    ///
    /// Dotted keys address nested objects (`model.backbone.depth`) and
    /// numeric segments address list elements (`pipeline.1.scale`). Indexing
    /// past the end of a list is an error.
    ///
    /// # Arguments
    ///
    /// * `options` - Parsed overrides in command line order
    pub fn merge_from_dict(&mut self, options: &[(String, Value)]) -> Result<(), SorrelError> {
        let mut tree = Map::new();

        for (full_key, value) in options {
            let keys: Vec<&str> = full_key.split('.').collect();
            let (last, parents) = keys
                .split_last()
                .ok_or_else(|| SorrelError::MergeError("Empty key".to_string()))?;

            let mut node = &mut tree;
            for key in parents {
                let child = node
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));

                node = child.as_object_mut().ok_or_else(|| {
                    SorrelError::MergeError(format!(
                        "`{}` is both a value and a parent of `{}`",
                        key, full_key
                    ))
                })?;
            }

            node.insert(last.to_string(), value.clone());
        }

        merge_into(tree, &mut self.cfg, true)
    }
}

// <<< MERGE METHODS

/// Recursively merge object `a` into value `b`
///
/// When `allow_list_keys` is set, numeric keys index into lists of `b`.
fn merge_into(a: Map<String, Value>, b: &mut Value, allow_list_keys: bool) -> Result<(), SorrelError> {
    for (key, value) in a {
        if allow_list_keys && !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()) {
            if let Value::Array(list) = b {
                let index: usize = key
                    .parse()
                    .map_err(|_| SorrelError::MergeError(format!("Invalid list index {}", key)))?;

                let len = list.len();
                let target = list.get_mut(index).ok_or_else(|| {
                    SorrelError::MergeError(format!(
                        "Index {} exceeds the length of list (len {})",
                        index, len
                    ))
                })?;

                merge_value(value, target, allow_list_keys)?;
                continue;
            }
        }

        let map = b.as_object_mut().ok_or_else(|| {
            SorrelError::MergeError(format!(
                "Cannot set `{}` on a value that is not an object",
                key
            ))
        })?;

        match value {
            Value::Object(mut inner) => {
                let delete = inner
                    .remove(DELETE_KEY)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);

                match map.get_mut(&key).filter(|_| !delete) {
                    Some(existing) => {
                        let mergeable =
                            existing.is_object() || (allow_list_keys && existing.is_array());

                        if !mergeable {
                            return Err(SorrelError::MergeError(format!(
                                "`{}` is an object in the override but a {} in the base config. Set `_delete_` to true to replace it",
                                key,
                                type_name(existing)
                            )));
                        }

                        merge_into(inner, existing, allow_list_keys)?;
                    }
                    None => {
                        map.insert(key, Value::Object(inner));
                    }
                }
            }
            value => {
                map.insert(key, value);
            }
        }
    }

    Ok(())
}

/// Merge an override value into a single slot
fn merge_value(value: Value, target: &mut Value, allow_list_keys: bool) -> Result<(), SorrelError> {
    match value {
        Value::Object(inner) if target.is_object() || target.is_array() => {
            merge_into(inner, target, allow_list_keys)
        }
        value => {
            *target = value;
            Ok(())
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Read a json config and fold its `_base_` configs underneath it
fn load_with_bases(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Value, SorrelError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    if extension.as_deref() != Some("json") {
        return Err(SorrelError::ConfigFormatError(format!(
            "Only .json configs are supported but got {}",
            path.display()
        )));
    }

    let canonical = path
        .canonicalize()
        .map_err(|err| SorrelError::ConfigReadError(format!("{}: {}", path.display(), err)))?;

    if !visited.insert(canonical.clone()) {
        return Err(SorrelError::ConfigFormatError(format!(
            "Circular _base_ inheritance through {}",
            path.display()
        )));
    }

    let contents = std::fs::read_to_string(&canonical)
        .map_err(|err| SorrelError::ConfigReadError(format!("{}: {}", path.display(), err)))?;

    let mut cfg: Value = serde_json::from_str(&contents)
        .map_err(|err| SorrelError::ConfigFormatError(format!("{}: {}", path.display(), err)))?;

    let Value::Object(map) = &mut cfg else {
        return Err(SorrelError::ConfigFormatError(format!(
            "The top level of {} must be an object",
            path.display()
        )));
    };

    let bases: Vec<String> = match map.remove(BASE_KEY) {
        None => Vec::new(),
        Some(Value::String(base)) => vec![base],
        Some(Value::Array(bases)) => bases
            .into_iter()
            .map(|base| match base {
                Value::String(base) => Ok(base),
                other => Err(SorrelError::ConfigFormatError(format!(
                    "_base_ entries must be paths but got {}",
                    other
                ))),
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(SorrelError::ConfigFormatError(format!(
                "_base_ must be a path or a list of paths but got {}",
                other
            )));
        }
    };

    if bases.is_empty() {
        visited.remove(&canonical);
        return Ok(cfg);
    }

    let parent = canonical.parent().unwrap_or_else(|| Path::new("."));
    let mut merged = Value::Object(Map::new());

    for base in bases {
        let base_cfg = load_with_bases(&parent.join(&base), visited)?;
        if let Value::Object(base_map) = base_cfg {
            if let Some(key) = merged
                .as_object()
                .and_then(|seen| base_map.keys().find(|key| seen.contains_key(*key)))
            {
                return Err(SorrelError::ConfigFormatError(format!(
                    "Duplicate key `{}` in _base_ {} of {}. Keys may only be defined by one base",
                    key,
                    base,
                    path.display()
                )));
            }

            merge_into(base_map, &mut merged, false)?;
        }
    }

    if let Value::Object(own) = cfg {
        merge_into(own, &mut merged, false)?;
    }

    visited.remove(&canonical);
    Ok(merged)
}
