use crate::config::ConfigError;
use crate::tree::TreeError;
use thiserror::Error;

/// Top-level error type for the foldcfg library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("lookup error: {0}")]
    Tree(#[from] TreeError),
}
