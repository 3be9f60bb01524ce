//! Deserializing trees into user types.

use serde::de::DeserializeOwned;

use super::ConfigError;
use crate::tree::{Entry, FoldedDict};

impl FoldedDict {
    /// Deserializes the plain projection of this tree into `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let value = serde_yaml_ng::to_value(self)?;
        Ok(serde_yaml_ng::from_value(value)?)
    }
}

impl Entry {
    /// Deserializes a leaf value or subtree into `T`.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let value = serde_yaml_ng::to_value(self.to_value())?;
        Ok(serde_yaml_ng::from_value(value)?)
    }
}
