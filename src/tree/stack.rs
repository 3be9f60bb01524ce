//! Layered view over several folded dictionaries.

use std::collections::HashSet;

use tracing::debug;

use super::folded::{Entry, FoldedDict};
use super::value::Value;
use super::TreeError;

/// Combines read-only dictionaries and one writable overlay into one lookup surface.
///
/// Lookups consult the writable overlay first, then the read-only layers in
/// the order they were supplied. Writes only ever land in the overlay.
///
/// When a path resolves to subtrees in several layers, the result is a new
/// dictionary holding the union of their immediate children, with
/// higher-precedence layers winning on collisions. Deeper levels are not
/// merged: a child subtree comes from exactly one layer and shares its
/// storage.
#[derive(Debug)]
pub struct DictStack<'a> {
    layers: Vec<&'a FoldedDict>,
    writable: FoldedDict,
}

impl<'a> DictStack<'a> {
    /// Builds a stack with an empty overlay using the first layer's factory.
    pub fn new(layers: impl IntoIterator<Item = &'a FoldedDict>) -> Self {
        let layers: Vec<&'a FoldedDict> = layers.into_iter().collect();
        let writable = layers
            .first()
            .map(|layer| layer.empty_like())
            .unwrap_or_default();
        Self { layers, writable }
    }

    /// Builds a stack writing into `writable`.
    ///
    /// The overlay is a handle, so the caller's clone observes every write.
    pub fn with_writable(
        layers: impl IntoIterator<Item = &'a FoldedDict>,
        writable: FoldedDict,
    ) -> Self {
        Self {
            layers: layers.into_iter().collect(),
            writable,
        }
    }

    /// Every layer in lookup order: the overlay, then the read-only layers.
    pub fn layers(&self) -> impl Iterator<Item = &FoldedDict> + '_ {
        let read_only: &[&FoldedDict] = &self.layers;
        std::iter::once(&self.writable).chain(read_only.iter().copied())
    }

    pub fn writable(&self) -> &FoldedDict {
        &self.writable
    }

    /// Looks `path` up across all layers.
    ///
    /// A value found before any subtree wins outright. A value found after a
    /// subtree has been seen is a [`TreeError::LayerConflict`].
    pub fn get(&self, path: &str) -> Result<Entry, TreeError> {
        let mut subtrees = Vec::new();

        for (index, layer) in self.layers().enumerate() {
            if !layer.contains(path) {
                continue;
            }

            match layer.get(path)? {
                Entry::Dict(dict) => subtrees.push(dict),
                Entry::Value(value) if subtrees.is_empty() => return Ok(Entry::Value(value)),
                Entry::Value(_) => {
                    return Err(TreeError::LayerConflict {
                        path: path.to_string(),
                        layer: index,
                    })
                }
            }
        }

        match subtrees.as_slice() {
            [] => Err(TreeError::KeyNotFound(path.to_string())),
            found => {
                debug!(path, layers = found.len(), "merging subtrees");
                merge_subtrees(found).map(Entry::Dict)
            }
        }
    }

    /// Writes into the overlay. Read-only layers are never touched.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        self.writable.set(path, value)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.layers().any(|layer| layer.contains(path))
    }

    /// Number of read-only layers. The overlay and the merged keys are not counted.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Top-level keys of every layer, in lookup order, without duplicates.
    pub fn keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.layers()
            .flat_map(|layer| layer.keys())
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }
}

/// Builds a fresh dictionary from subtrees ordered highest precedence first.
///
/// The result uses the first subtree's factory. Children from layers built
/// with another factory are re-folded, so they are copies rather than views.
fn merge_subtrees(subtrees: &[FoldedDict]) -> Result<FoldedDict, TreeError> {
    let merged = subtrees[0].empty_like();
    for dict in subtrees {
        for (key, child) in dict.node().entries() {
            if !merged.node().contains_key(&key) {
                merged.adopt(merged.node(), &key, child)?;
            }
        }
        if merged.value().is_none() {
            merged.node().set_value(dict.value());
        }
    }
    Ok(merged)
}
