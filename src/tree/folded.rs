//! The folded-key dictionary.
//!
//! Keys are dotted paths. Building a dictionary folds every dotted key into
//! nested nodes, so `{"lang.english.one": 1}` and
//! `{"lang": {"english": {"one": 1}}}` produce the same tree. Every
//! accessor is path-aware.

use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};
use tracing::trace;

use super::factory::{DictNodeFactory, NodeFactory};
use super::node::{Child, Node};
use super::path;
use super::value::{Mapping, Value};
use super::TreeError;

/// Result of a path lookup: either a leaf value or a view of a subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(Value),
    Dict(FoldedDict),
}

impl Entry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Dict(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::Dict(_) => None,
        }
    }

    pub fn as_dict(&self) -> Option<&FoldedDict> {
        match self {
            Entry::Dict(dict) => Some(dict),
            Entry::Value(_) => None,
        }
    }

    pub fn into_dict(self) -> Option<FoldedDict> {
        match self {
            Entry::Dict(dict) => Some(dict),
            Entry::Value(_) => None,
        }
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Entry::Dict(_))
    }

    /// Plain projection of the entry, see [`FoldedDict::to_mapping`].
    pub fn to_value(&self) -> Value {
        match self {
            Entry::Value(value) => value.clone(),
            Entry::Dict(dict) => dict.root.to_value(),
        }
    }
}

/// A value-pair subtree compares equal to a scalar when its value slot does.
impl PartialEq<Value> for Entry {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Entry::Value(value) => value == other,
            Entry::Dict(dict) => dict.value().as_ref() == Some(other),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Value(value) => write!(f, "{value}"),
            Entry::Dict(dict) => write!(f, "{dict}"),
        }
    }
}

/// A tree of nodes addressed by dotted paths.
///
/// `FoldedDict` is a handle: [`Clone`] and sub-dictionaries returned by
/// [`get`](Self::get) share storage with the dictionary they came from, and
/// writes through any of them are visible to all. Use
/// [`snapshot`](Self::snapshot) for an independent copy.
///
/// ## Example
///
/// ```
/// use foldcfg::tree::{FoldedDict, Mapping, Value};
///
/// let mut raw = Mapping::new();
/// raw.insert("lang.english.counting.one".into(), Value::from(1));
/// raw.insert("lang.english.counting.two".into(), Value::from(2));
///
/// let dict = FoldedDict::from_mapping(raw)?;
/// assert_eq!(dict.get("lang.english.counting.one")?, Value::from(1));
/// assert!(dict.contains("lang.english"));
///
/// let mut english = dict.get("lang.english")?.into_dict().unwrap();
/// english.set("counting.three", 3)?;
/// assert_eq!(dict.get("lang.english.counting.three")?, Value::from(3));
/// # Ok::<(), foldcfg::tree::TreeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FoldedDict {
    root: Node,
    factory: Rc<dyn NodeFactory>,
}

impl FoldedDict {
    /// Creates an empty dictionary using [`DictNodeFactory`].
    pub fn new() -> Self {
        Self::with_factory(DictNodeFactory)
    }

    /// Creates an empty dictionary built from `factory`'s nodes.
    pub fn with_factory(factory: impl NodeFactory + 'static) -> Self {
        Self::with_shared_factory(Rc::new(factory))
    }

    pub fn with_shared_factory(factory: Rc<dyn NodeFactory>) -> Self {
        Self {
            root: factory.make_node(),
            factory,
        }
    }

    /// Folds a raw mapping using [`DictNodeFactory`].
    pub fn from_mapping(mapping: Mapping) -> Result<Self, TreeError> {
        Self::from_mapping_with(mapping, DictNodeFactory)
    }

    /// Folds a raw mapping into nodes made by `factory`.
    ///
    /// Dotted keys become nested nodes and nested mappings are folded
    /// recursively. When two keys describe the same subtree (for example
    /// `"a.b"` and `"a": {"c": ..}`) their contents are combined. This
    /// differs from [`set`](Self::set), where a mapping replaces the
    /// subtree already at its path.
    pub fn from_mapping_with(
        mapping: Mapping,
        factory: impl NodeFactory + 'static,
    ) -> Result<Self, TreeError> {
        Self::fold(mapping, Rc::new(factory))
    }

    pub fn fold(mapping: Mapping, factory: Rc<dyn NodeFactory>) -> Result<Self, TreeError> {
        let dict = Self::with_shared_factory(factory);
        dict.fold_into(&dict.root, mapping)?;
        Ok(dict)
    }

    /// Creates an empty dictionary sharing this one's factory.
    pub fn empty_like(&self) -> Self {
        Self::with_shared_factory(Rc::clone(&self.factory))
    }

    pub fn factory(&self) -> Rc<dyn NodeFactory> {
        Rc::clone(&self.factory)
    }

    /// The root node. Mutating it mutates this dictionary.
    pub fn node(&self) -> &Node {
        &self.root
    }

    fn view(&self, root: Node) -> Self {
        Self {
            root,
            factory: Rc::clone(&self.factory),
        }
    }

    fn fold_into(&self, node: &Node, mapping: Mapping) -> Result<(), TreeError> {
        for (key, value) in mapping {
            let (parents, leaf) = path::split_last(&key)?;
            let parent = self.build_path(node, &parents, &key)?;
            self.assign(&parent, leaf, value, true)?;
        }
        Ok(())
    }

    /// Walks `segments` from `start`, creating missing nodes on the way.
    fn build_path(&self, start: &Node, segments: &[&str], path: &str) -> Result<Node, TreeError> {
        segments
            .iter()
            .try_fold(start.clone(), |state, segment| self.build_node(&state, segment, path))
    }

    fn build_node(&self, state: &Node, segment: &str, path: &str) -> Result<Node, TreeError> {
        if !state.contains_key(segment) {
            trace!(segment, path, "creating node");
            self.factory
                .assign_value(state, segment, Child::Node(self.factory.make_node()));
        }

        match state.get(segment) {
            Some(Child::Node(node)) if self.factory.is_node(&node) => Ok(node),
            _ => Err(not_indexable(segment, path)),
        }
    }

    fn traverse(&self, state: &Child, segment: &str, path: &str) -> Result<Child, TreeError> {
        match state {
            Child::Node(node) if self.factory.is_node(node) => node
                .get(segment)
                .ok_or_else(|| TreeError::KeyNotFound(path.to_string())),
            _ => Err(not_indexable(segment, path)),
        }
    }

    /// Stores `value` under `key`, folding mappings into nodes first.
    ///
    /// With `merge`, a mapping is folded into a node already present under
    /// `key` instead of replacing it.
    fn assign(&self, parent: &Node, key: &str, value: Value, merge: bool) -> Result<(), TreeError> {
        let Value::Map(mapping) = value else {
            self.factory.assign_value(parent, key, Child::Value(value));
            return Ok(());
        };

        if merge {
            if let Some(Child::Node(existing)) = parent.get(key) {
                if self.factory.is_node(&existing) {
                    return self.fold_into(&existing, mapping);
                }
            }
        }

        let node = self.factory.make_node();
        self.fold_into(&node, mapping)?;
        self.factory.assign_value(parent, key, Child::Node(node));
        Ok(())
    }

    /// Stores a child taken from another dictionary under `key`.
    ///
    /// Nodes this factory did not make are re-folded into fresh nodes so the
    /// result stays walkable by path. Nodes of the right kind are shared.
    pub(crate) fn adopt(&self, parent: &Node, key: &str, child: Child) -> Result<(), TreeError> {
        match child {
            Child::Node(node) if !self.factory.is_node(&node) => {
                trace!(key, kind = ?node.kind(), "re-folding foreign node");
                self.assign(parent, key, node.to_value(), false)
            }
            child => {
                self.factory.assign_value(parent, key, child);
                Ok(())
            }
        }
    }

    /// Returns true if storing `dict` below `parents` would make a node its own descendant.
    fn creates_cycle(&self, parents: &[&str], dict: &FoldedDict) -> bool {
        let mut deepest = self.root.clone();
        for segment in parents {
            match deepest.get(segment) {
                Some(Child::Node(node)) if self.factory.is_node(&node) => deepest = node,
                _ => break,
            }
        }
        dict.root.reaches(&deepest)
    }

    fn entry(&self, child: Child) -> Entry {
        match child {
            Child::Node(node) if self.factory.is_node(&node) => Entry::Dict(self.view(node)),
            Child::Node(node) => Entry::Value(node.to_value()),
            Child::Value(value) => Entry::Value(value),
        }
    }

    /// Looks up a dotted path.
    ///
    /// A subtree comes back as a [`FoldedDict`] sharing storage with `self`.
    pub fn get(&self, path: &str) -> Result<Entry, TreeError> {
        let segments = path::split(path)?;
        let found = segments
            .iter()
            .try_fold(Child::Node(self.root.clone()), |state, segment| {
                self.traverse(&state, segment, path)
            })?;
        Ok(self.entry(found))
    }

    /// Stores `value` at `path`, creating intermediate nodes as needed.
    ///
    /// A [`Value::Map`] is folded into a subtree that replaces whatever was
    /// at `path`.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        let (parents, leaf) = path::split_last(path)?;
        let parent = self.build_path(&self.root, &parents, path)?;
        self.assign(&parent, leaf, value.into(), false)
    }

    /// Places a whole dictionary at `path`.
    ///
    /// When both dictionaries use the same node kind the subtree is shared,
    /// not copied. Otherwise its plain projection is folded into new nodes.
    ///
    /// Placing a dictionary below itself or below one of its own subtrees
    /// fails with [`TreeError::Cycle`].
    pub fn set_dict(&mut self, path: &str, dict: &FoldedDict) -> Result<(), TreeError> {
        let (parents, leaf) = path::split_last(path)?;
        if self.factory.is_node(&dict.root) && self.creates_cycle(&parents, dict) {
            return Err(TreeError::Cycle(path.to_string()));
        }

        let parent = self.build_path(&self.root, &parents, path)?;
        if self.factory.is_node(&dict.root) {
            self.factory
                .assign_value(&parent, leaf, Child::Node(dict.root.clone()));
            Ok(())
        } else {
            self.assign(&parent, leaf, Value::Map(dict.to_mapping()), false)
        }
    }

    /// Removes `path` and returns what was stored there.
    pub fn delete(&mut self, path: &str) -> Result<Entry, TreeError> {
        let (parents, leaf) = path::split_last(path)?;
        let parent = parents
            .iter()
            .try_fold(Child::Node(self.root.clone()), |state, segment| {
                self.traverse(&state, segment, path)
            })?;

        let removed = match &parent {
            Child::Node(node) if self.factory.is_node(node) => node.remove(leaf),
            _ => return Err(not_indexable(leaf, path)),
        };
        removed
            .map(|child| self.entry(child))
            .ok_or_else(|| TreeError::KeyNotFound(path.to_string()))
    }

    /// Returns true if `path` resolves to a value or subtree. Never fails.
    pub fn contains(&self, path: &str) -> bool {
        let Ok(segments) = path::split(path) else {
            return false;
        };

        let (_, exists) = segments.iter().fold(
            (Some(Child::Node(self.root.clone())), true),
            |(state, exists), segment| match state {
                Some(Child::Node(node)) if exists && self.factory.is_node(&node) => {
                    let next = node.get(segment);
                    let found = next.is_some();
                    (next, found)
                }
                _ => (None, false),
            },
        );
        exists
    }

    /// Number of immediate children of the root.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Immediate child keys, in the factory's ordering.
    pub fn keys(&self) -> Vec<String> {
        self.root.keys()
    }

    pub fn values(&self) -> Vec<Entry> {
        self.items().into_iter().map(|(_, entry)| entry).collect()
    }

    pub fn items(&self) -> Vec<(String, Entry)> {
        self.root
            .entries()
            .into_iter()
            .map(|(key, child)| (key, self.entry(child)))
            .collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<(String, Entry)> {
        self.items().into_iter()
    }

    /// Copies the immediate entries of `other` into this dictionary's root,
    /// overwriting on collision.
    ///
    /// Subtrees of the same node kind are shared, not copied. Subtrees built
    /// by another factory are re-folded with this one.
    pub fn update(&mut self, other: &FoldedDict) -> Result<(), TreeError> {
        for (key, child) in other.root.entries() {
            self.adopt(&self.root, &key, child)?;
        }
        Ok(())
    }

    /// Attribute-style lookup of a single segment.
    pub fn attr(&self, name: &str) -> Result<Entry, TreeError> {
        if name.contains(path::SEPARATOR) {
            return Err(TreeError::AttributeNotFound(name.to_string()));
        }
        self.get(name).map_err(|err| match err {
            TreeError::KeyNotFound(_) | TreeError::InvalidPath(_) => {
                TreeError::AttributeNotFound(name.to_string())
            }
            other => other,
        })
    }

    /// The scalar carried by the root when it is a value-pair node.
    pub fn value(&self) -> Option<Value> {
        self.root.value()
    }

    /// Sets the root's scalar slot, returning the previous one.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Option<Value> {
        self.root.set_value(Some(value.into()))
    }

    /// The child map of the root, without its value slot.
    pub fn data(&self) -> Mapping {
        self.to_mapping()
    }

    /// A deep copy that no longer shares storage with `self`.
    pub fn snapshot(&self) -> Self {
        self.view(self.root.deep_clone())
    }

    /// Plain nested mapping of the whole tree.
    ///
    /// Value-pair nodes without children turn into their value; those with
    /// children turn into mappings.
    pub fn to_mapping(&self) -> Mapping {
        self.root
            .entries()
            .into_iter()
            .map(|(key, child)| {
                let value = match child {
                    Child::Node(node) => node.to_value(),
                    Child::Value(value) => value,
                };
                (key, value)
            })
            .collect()
    }
}

fn not_indexable(segment: &str, path: &str) -> TreeError {
    TreeError::NotIndexable {
        key: segment.to_string(),
        path: path.to_string(),
    }
}

impl Default for FoldedDict {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FoldedDict {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl fmt::Display for FoldedDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl Serialize for FoldedDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::Map(self.to_mapping()).serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a FoldedDict {
    type Item = (String, Entry);
    type IntoIter = std::vec::IntoIter<(String, Entry)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
