//! Dotted-path access to hierarchical configuration data.
//!
//! Documents are folded into [`FoldedDict`] trees, where a key such as
//! `server.http.port` addresses a nested node. Several trees can be layered
//! with a [`DictStack`], which resolves lookups by precedence and sends
//! writes to a single overlay.

pub mod config;
mod error;
pub mod tree;

pub use config::{Config, ConfigError, Document, Layers, Record};
pub use error::Error;
pub use tree::{DictStack, Entry, FoldedDict, Mapping, TreeError, Value};
