// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::SorrelError;

/// Constructor for a registered type from its config block
pub type Builder<T> = fn(&Value) -> Result<T, SorrelError>;

/// A name-to-constructor lookup with optional per-scope children
///
/// Config blocks select a constructor through their `type` key. When a scope
/// is given and the registry has a child for it, the child is searched first
/// and the root is used as a fallback.
///
/// # Examples
///
/// ```
/// use serde_json::{Value, json};
/// use sorrel_core::error::SorrelError;
/// use sorrel_core::registry::Registry;
///
/// fn width(cfg: &Value) -> Result<u64, SorrelError> {
///     Ok(cfg.get("width").and_then(Value::as_u64).unwrap_or(1))
/// }
///
/// fn doubled(cfg: &Value) -> Result<u64, SorrelError> {
///     Ok(2 * cfg.get("width").and_then(Value::as_u64).unwrap_or(1))
/// }
///
/// let mut registry: Registry<u64> = Registry::new("widths");
/// registry.register("Width", width);
/// registry.child_mut("wide").register("Width", doubled);
///
/// let cfg = json!({"type": "Width", "width": 3});
/// assert_eq!(registry.build(None, &cfg).unwrap(), 3);
/// assert_eq!(registry.build(Some("wide"), &cfg).unwrap(), 6);
/// assert_eq!(registry.build(Some("other"), &cfg).unwrap(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Registry<T> {
    name: &'static str,
    builders: BTreeMap<&'static str, Builder<T>>,
    children: BTreeMap<&'static str, Registry<T>>,
}

impl<T> Registry<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            builders: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Register a constructor under `type_name`, returning any it replaces
    pub fn register(&mut self, type_name: &'static str, builder: Builder<T>) -> Option<Builder<T>> {
        self.builders.insert(type_name, builder)
    }

    /// Child registry for `scope`, created on first use
    pub fn child_mut(&mut self, scope: &'static str) -> &mut Registry<T> {
        let name = self.name;
        self.children
            .entry(scope)
            .or_insert_with(|| Registry::new(name))
    }

    /// Whether a child registry exists for `scope`
    pub fn has_child(&self, scope: &str) -> bool {
        self.children.contains_key(scope)
    }

    /// Sorted type names visible from `scope` (child and root)
    pub fn types(&self, scope: Option<&str>) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.builders.keys().copied().collect();

        if let Some(child) = scope.and_then(|scope| self.children.get(scope)) {
            types.extend(child.builders.keys().copied());
        }

        types.sort_unstable();
        types.dedup();
        types
    }

    /// Build an object from a config block with a `type` key
    pub fn build(&self, scope: Option<&str>, cfg: &Value) -> Result<T, SorrelError> {
        let type_name = cfg.get("type").and_then(Value::as_str).ok_or_else(|| {
            SorrelError::RegistryError(format!(
                "A {} config must name its `type` but got {}",
                self.name, cfg
            ))
        })?;

        let builder = scope
            .and_then(|scope| self.children.get(scope))
            .and_then(|child| child.builders.get(type_name))
            .or_else(|| self.builders.get(type_name))
            .ok_or_else(|| {
                SorrelError::RegistryError(format!(
                    "{} is not in the {} registry{}. Choose from: {:?}",
                    type_name,
                    self.name,
                    scope.map(|s| format!(" (scope {})", s)).unwrap_or_default(),
                    self.types(scope)
                ))
            })?;

        builder(cfg)
    }
}
