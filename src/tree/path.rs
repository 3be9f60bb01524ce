//! Dotted path handling.
//!
//! Paths are plain strings whose segments are separated by `.`. There is no
//! escaping, so a segment can never contain a dot.

use super::TreeError;

pub const SEPARATOR: char = '.';

/// Splits a dotted path into its segments.
///
/// Empty paths and empty segments (leading, trailing or doubled dots) are rejected.
pub fn split(path: &str) -> Result<Vec<&str>, TreeError> {
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(TreeError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// Splits a path into its parent segments and the final segment.
pub fn split_last(path: &str) -> Result<(Vec<&str>, &str), TreeError> {
    let mut segments = split(path)?;
    // split() never yields an empty vector
    let leaf = segments
        .pop()
        .ok_or_else(|| TreeError::InvalidPath(path.to_string()))?;
    Ok((segments, leaf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(split("lang").unwrap(), vec!["lang"]);
        assert_eq!(
            split("lang.english.counting").unwrap(),
            vec!["lang", "english", "counting"]
        );
    }

    #[test]
    fn test_split_rejects_empty_segments() {
        for path in ["", ".lang", "lang.", "lang..english", "."] {
            assert_eq!(
                split(path),
                Err(TreeError::InvalidPath(path.to_string())),
                "path {path:?}"
            );
        }
    }

    #[test]
    fn test_split_last() {
        let (parents, leaf) = split_last("a.b.c").unwrap();
        assert_eq!(parents, vec!["a", "b"]);
        assert_eq!(leaf, "c");

        let (parents, leaf) = split_last("a").unwrap();
        assert!(parents.is_empty());
        assert_eq!(leaf, "a");
    }
}
