//! Shared tree nodes.
//!
//! A [`Node`] is a handle to reference-counted storage. Cloning the handle
//! does not copy the node: every clone sees mutations made through any
//! other clone. Sub-dictionary views rely on this to write through to the
//! tree they were taken from. Use [`Node::deep_clone`] for a detached copy.
//!
//! Nodes are not thread-safe. Sharing one between threads is impossible
//! (`Node` is `!Send`), and callers mutating the same tree through several
//! views must serialize those writes themselves.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::{Mapping, Value};

/// The flavor of a node, used for node type tests while walking a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Child map with unspecified iteration order.
    Plain,
    /// Child map iterating in insertion order.
    Ordered,
    /// Child map plus an optional scalar value.
    ValuePair,
}

/// Whatever sits under a key of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Value(Value),
    Node(Node),
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            Child::Value(_) => None,
        }
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        Child::Value(value)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

#[derive(Debug)]
enum Children {
    Unordered(HashMap<String, Child>),
    Ordered(IndexMap<String, Child>),
}

impl Children {
    fn new(ordered: bool) -> Self {
        if ordered {
            Children::Ordered(IndexMap::new())
        } else {
            Children::Unordered(HashMap::new())
        }
    }

    fn is_ordered(&self) -> bool {
        matches!(self, Children::Ordered(_))
    }

    fn len(&self) -> usize {
        match self {
            Children::Unordered(map) => map.len(),
            Children::Ordered(map) => map.len(),
        }
    }

    fn get(&self, key: &str) -> Option<&Child> {
        match self {
            Children::Unordered(map) => map.get(key),
            Children::Ordered(map) => map.get(key),
        }
    }

    fn insert(&mut self, key: String, child: Child) -> Option<Child> {
        match self {
            Children::Unordered(map) => map.insert(key, child),
            Children::Ordered(map) => map.insert(key, child),
        }
    }

    fn remove(&mut self, key: &str) -> Option<Child> {
        match self {
            Children::Unordered(map) => map.remove(key),
            Children::Ordered(map) => map.shift_remove(key),
        }
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&String, &Child)> + '_> {
        match self {
            Children::Unordered(map) => Box::new(map.iter()),
            Children::Ordered(map) => Box::new(map.iter()),
        }
    }
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    children: Children,
    value: Option<Value>,
}

/// Shared handle to a tree node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    fn with_kind(kind: NodeKind, ordered: bool) -> Self {
        Node(Rc::new(RefCell::new(NodeData {
            kind,
            children: Children::new(ordered),
            value: None,
        })))
    }

    /// Creates an empty node with unordered children.
    pub fn plain() -> Self {
        Self::with_kind(NodeKind::Plain, false)
    }

    /// Creates an empty node whose children keep insertion order.
    pub fn ordered() -> Self {
        Self::with_kind(NodeKind::Ordered, true)
    }

    /// Creates an empty value-carrying node with no value set.
    pub fn value_pair(ordered: bool) -> Self {
        Self::with_kind(NodeKind::ValuePair, ordered)
    }

    pub fn kind(&self) -> NodeKind {
        self.0.borrow().kind
    }

    pub fn is_ordered(&self) -> bool {
        self.0.borrow().children.is_ordered()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().children.get(key).is_some()
    }

    /// Returns the child under `key`. Node children come back as aliasing handles.
    pub fn get(&self, key: &str) -> Option<Child> {
        self.0.borrow().children.get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, child: impl Into<Child>) -> Option<Child> {
        self.0.borrow_mut().children.insert(key.into(), child.into())
    }

    pub fn remove(&self, key: &str) -> Option<Child> {
        self.0.borrow_mut().children.remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().children.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(String, Child)> {
        self.0
            .borrow()
            .children
            .iter()
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect()
    }

    /// The scalar carried by a value-pair node, if any.
    pub fn value(&self) -> Option<Value> {
        self.0.borrow().value.clone()
    }

    /// Replaces the scalar slot and returns the previous value.
    pub fn set_value(&self, value: Option<Value>) -> Option<Value> {
        std::mem::replace(&mut self.0.borrow_mut().value, value)
    }

    /// Returns true if both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns true if `target` is this node or lies anywhere below it.
    pub fn reaches(&self, target: &Node) -> bool {
        self.ptr_eq(target)
            || self
                .0
                .borrow()
                .children
                .iter()
                .any(|(_, child)| matches!(child, Child::Node(node) if node.reaches(target)))
    }

    /// Copies the whole subtree into fresh storage.
    pub fn deep_clone(&self) -> Node {
        let data = self.0.borrow();
        let copy = Self::with_kind(data.kind, data.children.is_ordered());
        for (key, child) in data.children.iter() {
            let child = match child {
                Child::Node(node) => Child::Node(node.deep_clone()),
                Child::Value(value) => Child::Value(value.clone()),
            };
            copy.insert(key.clone(), child);
        }
        copy.set_value(data.value.clone());
        copy
    }

    /// Projects the subtree onto plain values.
    ///
    /// A value-pair node without children becomes its value (or `null`).
    /// One with children becomes a map and its own value is not represented.
    pub fn to_value(&self) -> Value {
        let data = self.0.borrow();
        if data.kind == NodeKind::ValuePair && data.children.len() == 0 {
            return data.value.clone().unwrap_or(Value::Null);
        }

        let map: Mapping = data
            .children
            .iter()
            .map(|(key, child)| {
                let value = match child {
                    Child::Node(node) => node.to_value(),
                    Child::Value(value) => value.clone(),
                };
                (key.clone(), value)
            })
            .collect();
        Value::Map(map)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }

        let (a, b) = (self.0.borrow(), other.0.borrow());
        a.value == b.value
            && a.children.len() == b.children.len()
            && a
                .children
                .iter()
                .all(|(key, child)| b.children.get(key) == Some(child))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        if data.kind == NodeKind::ValuePair {
            match &data.value {
                Some(value) => write!(f, "({value}, ")?,
                None => f.write_str("(null, ")?,
            }
        }

        f.write_str("{")?;
        for (i, (key, child)) in data.children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match child {
                Child::Node(node) => write!(f, "{key:?}: {node}")?,
                Child::Value(value) => write!(f, "{key:?}: {value}")?,
            }
        }
        f.write_str("}")?;

        if data.kind == NodeKind::ValuePair {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({self})")
    }
}
