//! Node factories.
//!
//! A factory decides which flavor of [`Node`] a tree is built from and how a
//! value is stored under a key. Every node of a folded tree comes from the
//! same factory.

use std::fmt;

use super::node::{Child, Node, NodeKind};

pub trait NodeFactory: fmt::Debug {
    /// The kind of node this factory produces.
    fn node_kind(&self) -> NodeKind;

    /// Creates a fresh, empty node.
    fn make_node(&self) -> Node;

    /// Stores `child` under `key` in `node`.
    fn assign_value(&self, node: &Node, key: &str, child: Child);

    /// Returns true if `node` was made by a factory of this kind.
    fn is_node(&self, node: &Node) -> bool {
        node.kind() == self.node_kind()
    }
}

/// Builds plain nodes with unspecified child order. The default factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictNodeFactory;

impl NodeFactory for DictNodeFactory {
    fn node_kind(&self) -> NodeKind {
        NodeKind::Plain
    }

    fn make_node(&self) -> Node {
        Node::plain()
    }

    fn assign_value(&self, node: &Node, key: &str, child: Child) {
        node.insert(key, child);
    }
}

/// Builds nodes that iterate their children in insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedDictNodeFactory;

impl NodeFactory for OrderedDictNodeFactory {
    fn node_kind(&self) -> NodeKind {
        NodeKind::Ordered
    }

    fn make_node(&self) -> Node {
        Node::ordered()
    }

    fn assign_value(&self, node: &Node, key: &str, child: Child) {
        node.insert(key, child);
    }
}

/// Builds value-carrying nodes, so a path can hold a scalar and children at once.
///
/// Scalars never sit directly in the child map: assigning one stores it in
/// the value slot of the node under `key`, creating that node first when it
/// is missing. Existing children of that node are kept.
#[derive(Debug, Clone, Copy)]
pub struct ValueNodeFactory {
    ordered: bool,
}

impl ValueNodeFactory {
    pub fn new(ordered: bool) -> Self {
        Self { ordered }
    }

    /// Value-pair nodes whose children keep insertion order.
    pub fn ordered() -> Self {
        Self::new(true)
    }

    /// Value-pair nodes with unspecified child order.
    pub fn unordered() -> Self {
        Self::new(false)
    }
}

impl Default for ValueNodeFactory {
    fn default() -> Self {
        Self::unordered()
    }
}

impl NodeFactory for ValueNodeFactory {
    fn node_kind(&self) -> NodeKind {
        NodeKind::ValuePair
    }

    fn make_node(&self) -> Node {
        Node::value_pair(self.ordered)
    }

    fn assign_value(&self, node: &Node, key: &str, child: Child) {
        let value = match child {
            Child::Node(child) if self.is_node(&child) => {
                node.insert(key, child);
                return;
            }
            Child::Node(child) => child.to_value(),
            Child::Value(value) => value,
        };

        match node.get(key) {
            Some(Child::Node(existing)) if self.is_node(&existing) => {
                existing.set_value(Some(value));
            }
            _ => {
                let fresh = self.make_node();
                fresh.set_value(Some(value));
                node.insert(key, fresh);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Value;

    #[test]
    fn test_plain_factories_store_directly() {
        for factory in [
            &DictNodeFactory as &dyn NodeFactory,
            &OrderedDictNodeFactory as &dyn NodeFactory,
        ] {
            let node = factory.make_node();
            assert!(factory.is_node(&node));

            factory.assign_value(&node, "one", Child::Value(Value::from(1)));
            assert_eq!(node.get("one"), Some(Child::Value(Value::from(1))));
        }
    }

    #[test]
    fn test_ordered_factory_node_kind() {
        let node = OrderedDictNodeFactory.make_node();
        assert_eq!(node.kind(), NodeKind::Ordered);
        assert!(node.is_ordered());
        assert!(!DictNodeFactory.is_node(&node));
    }

    #[test]
    fn test_value_factory_wraps_scalars() {
        let factory = ValueNodeFactory::ordered();
        let root = factory.make_node();

        factory.assign_value(&root, "one", Child::Value(Value::from(1)));

        let one = root.get("one").unwrap();
        let one = one.as_node().unwrap();
        assert_eq!(one.kind(), NodeKind::ValuePair);
        assert_eq!(one.value(), Some(Value::from(1)));
        assert!(one.is_empty());
    }

    #[test]
    fn test_value_factory_keeps_children() {
        let factory = ValueNodeFactory::ordered();
        let root = factory.make_node();
        let two = factory.make_node();
        factory.assign_value(&two, "text", Child::Value(Value::from("two")));
        factory.assign_value(&root, "two", Child::Node(two.clone()));

        factory.assign_value(&root, "two", Child::Value(Value::from(2)));

        assert_eq!(two.value(), Some(Value::from(2)));
        assert!(two.contains_key("text"));
        assert!(root.get("two").unwrap().as_node().unwrap().ptr_eq(&two));
    }
}
