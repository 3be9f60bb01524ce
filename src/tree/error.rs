use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeError {
    #[error("key not found: `{0}`")]
    KeyNotFound(String),

    #[error("key not indexable: `{key}` in `{path}`")]
    NotIndexable { key: String, path: String },

    #[error("invalid path: `{0}`")]
    InvalidPath(String),

    #[error("attribute not found: `{0}`")]
    AttributeNotFound(String),

    #[error("cannot place a dictionary inside itself at `{0}`")]
    Cycle(String),

    #[error("layer {layer} holds a value at `{path}` but a higher layer holds a subtree")]
    LayerConflict { path: String, layer: usize },
}
