use serde::de::DeserializeOwned;

use super::ConfigError;
use crate::tree::{DictStack, Entry, FoldedDict, TreeError, Value};

/// The folded layers of a built configuration plus its writable overlay.
///
/// Layers are stored highest precedence first. The overlay persists across
/// calls: every [`stack`](Self::stack) writes into the same overlay, and
/// no write ever reaches a loaded layer.
#[derive(Debug)]
pub struct Layers {
    layers: Vec<FoldedDict>,
    overlay: FoldedDict,
}

impl Layers {
    pub fn new(layers: Vec<FoldedDict>, overlay: FoldedDict) -> Self {
        Self { layers, overlay }
    }

    /// A lookup stack borrowing these layers.
    pub fn stack(&self) -> DictStack<'_> {
        DictStack::with_writable(&self.layers, self.overlay.clone())
    }

    pub fn get(&self, path: &str) -> Result<Entry, TreeError> {
        self.stack().get(path)
    }

    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        self.overlay.set(path, value)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.stack().contains(path)
    }

    /// Number of loaded layers, not counting the overlay.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Loaded layers, highest precedence first.
    pub fn iter(&self) -> std::slice::Iter<'_, FoldedDict> {
        self.layers.iter()
    }

    pub fn overlay(&self) -> &FoldedDict {
        &self.overlay
    }

    /// Deserializes the merged entry at `path` into `T`.
    pub fn extract<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        self.get(path)?.extract()
    }
}

impl<'a> IntoIterator for &'a Layers {
    type Item = &'a FoldedDict;
    type IntoIter = std::slice::Iter<'a, FoldedDict>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::{mapping, test_dict};
    use serde::Deserialize;

    fn layers() -> Layers {
        let extra = FoldedDict::from_mapping(mapping([
            ("lang.russian.counting.raz", 1.into()),
            ("lang.english.counting.one", 100.into()),
        ]))
        .unwrap();
        Layers::new(vec![test_dict(), extra], FoldedDict::new())
    }

    #[test]
    fn test_precedence_and_merge() {
        let layers = layers();

        assert_eq!(layers.get("lang.english.counting.one").unwrap(), Value::from(1));
        assert_eq!(layers.get("lang.russian.counting.raz").unwrap(), Value::from(1));
        assert_eq!(layers.get("lang").unwrap().into_dict().unwrap().len(), 3);
    }

    #[test]
    fn test_overlay_persists() {
        let mut layers = layers();
        layers.set("lang.english.counting.three", 3).unwrap();

        assert_eq!(layers.get("lang.english.counting.three").unwrap(), Value::from(3));
        assert!(layers.contains("lang.english.counting.three"));
        assert!(!layers.iter().any(|l| l.contains("lang.english.counting.three")));

        let mut stack = layers.stack();
        stack.set("k", 5).unwrap();
        assert_eq!(layers.overlay().get("k").unwrap(), Value::from(5));
    }

    #[test]
    fn test_extract() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Counting {
            one: i64,
            two: i64,
        }

        let layers = layers();
        let counting: Counting = layers.extract("lang.english.counting").unwrap();
        assert_eq!(counting, Counting { one: 1, two: 2 });

        let one: i64 = layers.extract("lang.english.counting.one").unwrap();
        assert_eq!(one, 1);

        let missing = layers.extract::<Counting>("lang.klingon");
        assert!(matches!(
            missing,
            Err(ConfigError::Tree(TreeError::KeyNotFound(_)))
        ));

        let mismatch = layers.extract::<Counting>("lang.bahasa.counting");
        assert!(matches!(mismatch, Err(ConfigError::DeserializeError(_))));
    }
}
