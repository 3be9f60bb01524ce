//! Dotted-path trees and layered stacks of them.

mod error;
mod factory;
mod folded;
mod node;
pub mod path;
mod stack;
mod value;

pub use error::TreeError;
pub use factory::{DictNodeFactory, NodeFactory, OrderedDictNodeFactory, ValueNodeFactory};
pub use folded::{Entry, FoldedDict};
pub use node::{Child, Node, NodeKind};
pub use stack::DictStack;
pub use value::{Mapping, Value};
