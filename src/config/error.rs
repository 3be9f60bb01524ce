use std::path::PathBuf;
use thiserror::Error;

use crate::tree::TreeError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    YamlError {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },

    #[error("config file expected to be a dictionary, but it is not: '{path}' ({reason})")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] serde_yaml_ng::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),
}
