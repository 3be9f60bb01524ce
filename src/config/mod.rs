//! Loading documents into layered configuration.

mod builder;
mod document;
mod error;
mod extract;
mod layers;
mod record;

pub use builder::Config;
pub use document::{Document, Format};
pub use error::ConfigError;
pub use layers::Layers;
pub use record::{Field, Record};
