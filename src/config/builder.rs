use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use super::document::load_document;
use super::layers::Layers;
use super::ConfigError;
use crate::tree::{FoldedDict, Mapping, NodeFactory, OrderedDictNodeFactory};

/// A configuration source in the loading pipeline.
#[derive(Debug)]
enum ConfigSource {
    File { path: PathBuf, required: bool },
    Mapping(Mapping),
}

/// Builder for layered configuration.
///
/// Every source is folded into its own [`FoldedDict`] layer. Sources are
/// applied in registration order, so later sources override earlier ones.
/// Nested subtrees are merged one level deep at lookup time; see
/// [`DictStack`](crate::tree::DictStack).
///
/// Layers are built from [`OrderedDictNodeFactory`] nodes unless
/// [`with_factory`](Self::with_factory) says otherwise.
///
/// ## Example
///
/// ```no_run
/// use foldcfg::Config;
///
/// let layers = Config::builder()
///     .with_file("config/default.yaml", true)
///     .with_file("config/local.yaml", false)
///     .build()?;
///
/// let port = layers.get("server.port")?;
/// # Ok::<(), foldcfg::Error>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<ConfigSource>,
    factory: Rc<dyn NodeFactory>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            factory: Rc::new(OrderedDictNodeFactory),
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML or YAML document to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(ConfigSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds an in-memory mapping as a layer. Keys may be dotted.
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.sources.push(ConfigSource::Mapping(mapping));
        self
    }

    /// Sets the factory every layer and the writable overlay are built with.
    pub fn with_factory(mut self, factory: impl NodeFactory + 'static) -> Self {
        self.factory = Rc::new(factory);
        self
    }

    /// Loads and folds every source.
    pub fn build(self) -> Result<Layers, ConfigError> {
        let mut layers = Vec::with_capacity(self.sources.len());

        for source in self.sources {
            let mapping = match source {
                ConfigSource::File { path, required } => {
                    trace!(path = %path.display(), required, "loading config layer");
                    match load_document(&path, required)? {
                        Some(document) => document.into_mapping(),
                        None => continue,
                    }
                }
                ConfigSource::Mapping(mapping) => mapping,
            };
            layers.push(FoldedDict::fold(mapping, Rc::clone(&self.factory))?);
        }

        // Highest precedence first
        layers.reverse();
        debug!(layers = layers.len(), "built configuration layers");

        Ok(Layers::new(
            layers,
            FoldedDict::with_shared_factory(self.factory),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::mapping;
    use crate::tree::{Entry, TreeError, Value, ValueNodeFactory};
    use std::io::Write;
    use tempfile::Builder;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_later_sources_override() {
        let dir = Builder::new().tempdir().unwrap();
        let default = write_file(
            dir.path(),
            "default.toml",
            "[server]\nhost = \"localhost\"\nport = 8080\n",
        );
        let local = write_file(dir.path(), "local.yaml", "server.port: 9090\n");

        let layers = Config::builder()
            .with_file(&default, true)
            .with_file(&local, true)
            .build()
            .unwrap();

        assert_eq!(layers.len(), 2);
        assert_eq!(layers.get("server.port").unwrap(), Value::from(9090));
        assert_eq!(layers.get("server.host").unwrap(), Value::from("localhost"));

        let server = layers.get("server").unwrap().into_dict().unwrap();
        assert_eq!(server.keys(), vec!["port", "host"]);
    }

    #[test]
    fn test_optional_missing_file_skipped() {
        let layers = Config::builder()
            .with_mapping(mapping([("name", "app".into())]))
            .with_file("/nonexistent/path/local.yaml", false)
            .build()
            .unwrap();

        assert_eq!(layers.len(), 1);
        assert_eq!(layers.get("name").unwrap(), Value::from("app"));
    }

    #[test]
    fn test_required_missing_file() {
        let result = Config::builder()
            .with_file("/nonexistent/path/config.toml", true)
            .build();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_path_in_source() {
        let result = Config::builder()
            .with_mapping(mapping([("a..b", 1.into())]))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::Tree(TreeError::InvalidPath(_)))
        ));
    }

    #[test]
    fn test_custom_factory() {
        let layers = Config::builder()
            .with_factory(ValueNodeFactory::ordered())
            .with_mapping(mapping([("feature", true.into()), ("feature.level", 3.into())]))
            .build()
            .unwrap();

        let feature = layers.get("feature").unwrap();
        assert_eq!(feature, Value::from(true));
        assert!(matches!(feature, Entry::Dict(ref d) if d.contains("level")));
    }
}
