//! Loading structured documents from disk.
//!
//! A document is parsed into an order-preserving [`Mapping`] of raw keys.
//! Keys are not folded here; see [`Document::into_dict`].

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use super::record::Record;
use super::ConfigError;
use crate::tree::{FoldedDict, Mapping, NodeFactory, OrderedDictNodeFactory, Value};

/// Supported document syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
}

impl Format {
    /// Picks the format from a file extension (`toml`, `yaml` or `yml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("toml") {
            Some(Format::Toml)
        } else if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Some(Format::Yaml)
        } else {
            None
        }
    }
}

/// A parsed document: its origin plus the raw top-level mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    path: PathBuf,
    data: Mapping,
}

impl Document {
    /// Loads and parses a document, picking the format from its extension.
    ///
    /// An empty document yields an empty mapping.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        load_document(path, true)?.ok_or_else(|| ConfigError::FileNotFound(path.to_path_buf()))
    }

    /// Parses in-memory `contents`. `origin` names the source in errors.
    pub fn parse(
        contents: &str,
        format: Format,
        origin: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let path = origin.as_ref().to_path_buf();
        let data = match format {
            Format::Toml => parse_toml(contents, &path)?,
            Format::Yaml => parse_yaml(contents, &path)?,
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &Mapping {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Looks up a raw top-level key. Dots are not interpreted.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Attribute-style projection over the raw data.
    pub fn record(&self) -> Record<'_> {
        Record::new(&self.data)
    }

    pub fn into_mapping(self) -> Mapping {
        self.data
    }

    /// Folds the document into a dictionary that keeps document order.
    pub fn into_dict(self) -> Result<FoldedDict, ConfigError> {
        self.into_dict_with(Rc::new(OrderedDictNodeFactory))
    }

    pub fn into_dict_with(self, factory: Rc<dyn NodeFactory>) -> Result<FoldedDict, ConfigError> {
        Ok(FoldedDict::fold(self.data, factory)?)
    }
}

/// Loads and parses a document.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
pub(crate) fn load_document(path: &Path, required: bool) -> Result<Option<Document>, ConfigError> {
    let format =
        Format::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let document = Document::parse(&contents, format, path)?;
            debug!(
                path = %path.display(),
                ?format,
                keys = document.len(),
                "loaded config document"
            );
            Ok(Some(document))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                debug!(path = %path.display(), "skipping missing optional config document");
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn parse_toml(contents: &str, path: &Path) -> Result<Mapping, ConfigError> {
    let table: toml::Table = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(table
        .into_iter()
        .map(|(key, value)| (key, from_toml(value)))
        .collect())
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}

fn parse_yaml(contents: &str, path: &Path) -> Result<Mapping, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let yaml_error = |e| ConfigError::YamlError {
        path: path.to_path_buf(),
        source: e,
    };
    let mut root: serde_yaml_ng::Value = serde_yaml_ng::from_str(contents).map_err(yaml_error)?;
    root.apply_merge().map_err(yaml_error)?;

    match root {
        serde_yaml_ng::Value::Null => Ok(Mapping::new()),
        serde_yaml_ng::Value::Mapping(mapping) => from_yaml_mapping(mapping, path),
        other => Err(ConfigError::InvalidDocument {
            path: path.to_path_buf(),
            reason: format!("top level is {}", yaml_kind(&other)),
        }),
    }
}

fn from_yaml_mapping(mapping: serde_yaml_ng::Mapping, path: &Path) -> Result<Mapping, ConfigError> {
    mapping
        .into_iter()
        .map(|(key, value)| match key {
            serde_yaml_ng::Value::String(key) => Ok((key, from_yaml(value, path)?)),
            other => Err(ConfigError::InvalidDocument {
                path: path.to_path_buf(),
                reason: format!("found a {} key", yaml_kind(&other)),
            }),
        })
        .collect()
}

fn from_yaml(value: serde_yaml_ng::Value, path: &Path) -> Result<Value, ConfigError> {
    Ok(match value {
        serde_yaml_ng::Value::Null => Value::Null,
        serde_yaml_ng::Value::Bool(b) => Value::Bool(b),
        serde_yaml_ng::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            _ if n.is_u64() => {
                return Err(ConfigError::InvalidDocument {
                    path: path.to_path_buf(),
                    reason: format!("integer {n} is out of range"),
                })
            }
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::String(n.to_string()),
        },
        serde_yaml_ng::Value::String(s) => Value::String(s),
        serde_yaml_ng::Value::Sequence(items) => Value::List(
            items
                .into_iter()
                .map(|item| from_yaml(item, path))
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml_ng::Value::Mapping(mapping) => Value::Map(from_yaml_mapping(mapping, path)?),
        serde_yaml_ng::Value::Tagged(tagged) => from_yaml(tagged.value, path)?,
    })
}

fn yaml_kind(value: &serde_yaml_ng::Value) -> &'static str {
    match value {
        serde_yaml_ng::Value::Null => "null",
        serde_yaml_ng::Value::Bool(_) => "boolean",
        serde_yaml_ng::Value::Number(_) => "number",
        serde_yaml_ng::Value::String(_) => "string",
        serde_yaml_ng::Value::Sequence(_) => "sequence",
        serde_yaml_ng::Value::Mapping(_) => "mapping",
        serde_yaml_ng::Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.toml")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("a.yaml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.json")), None);
        assert_eq!(Format::from_path(Path::new("config")), None);
    }

    #[test]
    fn test_load_toml() {
        let file = temp_file(".toml", "key = \"value\"\n[server]\nport = 8080\n");
        let document = Document::load(file.path()).unwrap();

        assert_eq!(document.len(), 2);
        assert_eq!(document.get("key"), Some(&Value::from("value")));
        assert_eq!(
            document.get("server").and_then(|s| s.as_map()).and_then(|s| s.get("port")),
            Some(&Value::from(8080))
        );
    }

    #[test]
    fn test_empty_documents() {
        for (suffix, contents) in [(".yaml", ""), (".yaml", "\n  \n"), (".yml", "~\n"), (".toml", "")] {
            let file = temp_file(suffix, contents);
            let document = Document::load(file.path()).unwrap();
            assert!(document.is_empty(), "{suffix} {contents:?}");
        }
    }

    #[test]
    fn test_not_a_mapping() {
        let file = temp_file(".yaml", "- one\n- two\n");
        let err = Document::load(file.path()).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidDocument { ref path, .. } if path == file.path()));
        assert!(err
            .to_string()
            .starts_with("config file expected to be a dictionary, but it is not: '"));
    }

    #[test]
    fn test_non_string_keys() {
        let file = temp_file(".yaml", "1: one\n");
        let err = Document::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDocument { .. }));

        let nested = Document::parse("outer:\n  2: two\n", Format::Yaml, "nested.yaml").unwrap_err();
        assert!(matches!(nested, ConfigError::InvalidDocument { .. }));
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = Document::parse("big: 18446744073709551615\n", Format::Yaml, "big.yaml").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDocument { ref reason, .. } if reason.contains("18446744073709551615")
        ));

        let document = Document::parse("max: 9223372036854775807\n", Format::Yaml, "max.yaml").unwrap();
        assert_eq!(document.get("max"), Some(&Value::from(i64::MAX)));
    }

    #[test]
    fn test_yaml_keeps_order() {
        let document = Document::parse(
            "zero: 0\nuno: 1\ndos: 2\ntres: 3\ncuatro: 4\n",
            Format::Yaml,
            "ordering.yaml",
        )
        .unwrap();

        let keys: Vec<&str> = document.data().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zero", "uno", "dos", "tres", "cuatro"]);
        assert_eq!(document.get("zero"), Some(&Value::from(0)));
        assert_eq!(document.get("uno"), Some(&Value::from(1)));
    }

    #[test]
    fn test_yaml_merge_keys() {
        let document = Document::parse(
            "base: &base\n  host: localhost\nprod:\n  <<: *base\n  port: 443\n",
            Format::Yaml,
            "merge.yaml",
        )
        .unwrap();

        let prod = document.get("prod").and_then(Value::as_map).unwrap();
        assert_eq!(prod.get("host"), Some(&Value::from("localhost")));
        assert_eq!(prod.get("port"), Some(&Value::from(443)));
    }

    #[test]
    fn test_yaml_scalars() {
        let document = Document::parse(
            "n: ~\nb: true\ni: -3\nf: 2.5\ns: text\nl: [1, two]\n",
            Format::Yaml,
            "scalars.yaml",
        )
        .unwrap();

        assert_eq!(document.get("n"), Some(&Value::Null));
        assert_eq!(document.get("b"), Some(&Value::from(true)));
        assert_eq!(document.get("i"), Some(&Value::from(-3)));
        assert_eq!(document.get("f"), Some(&Value::from(2.5)));
        assert_eq!(document.get("s"), Some(&Value::from("text")));
        assert_eq!(
            document.get("l"),
            Some(&Value::from(vec![Value::from(1), Value::from("two")]))
        );
    }

    #[test]
    fn test_into_dict_folds_keys() {
        let document = Document::parse(
            "lang.english.counting.one: 1\nlang.english.counting.two: 2\n",
            Format::Yaml,
            "lang.yaml",
        )
        .unwrap();

        let dict = document.into_dict().unwrap();
        assert_eq!(dict.get("lang.english.counting.one").unwrap(), Value::from(1));
        assert!(dict.contains("lang.english"));
        assert_eq!(dict.get("lang").unwrap().into_dict().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let result = Document::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

        let optional = load_document(Path::new("/nonexistent/path/config.toml"), false).unwrap();
        assert!(optional.is_none());
    }

    #[test]
    fn test_unsupported_format() {
        let result = Document::load("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parse_errors() {
        let toml = Document::parse("key = ", Format::Toml, "broken.toml");
        assert!(matches!(toml, Err(ConfigError::ParseError { .. })));

        let yaml = Document::parse("key: [unclosed", Format::Yaml, "broken.yaml");
        assert!(matches!(yaml, Err(ConfigError::YamlError { .. })));
    }
}
