//! YAML document loading and serialization.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::config::InjectConfig;
use crate::error::{DocumentError, PostProcessError};
use crate::injector::InjectOperator;
use crate::node::{child_path, index_path, is_supported_key, NodeKind};
use crate::walker::{post_process_document, WalkReport};

/// A parsed document whose root is a mapping with admissible keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Mapping,
}

impl Document {
    /// Wrap an existing mapping, enforcing the key policy.
    pub fn new(root: Mapping) -> Result<Self, DocumentError> {
        for (key, value) in &root {
            check_key(key, "")?;
            check_keys(value, &child_path("", key))?;
        }
        Ok(Self { root })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_yaml::from_str(content).map_err(DocumentError::Parse)?;
        match value {
            Value::Mapping(root) => Self::new(root),
            // An empty file parses to null.
            Value::Null => Ok(Self {
                root: Mapping::new(),
            }),
            other => Err(DocumentError::NotAMapping {
                kind: NodeKind::of(&other),
            }),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        info!("Loading document from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn into_root(self) -> Mapping {
        self.root
    }

    /// Expand every `(( inject ... ))` marker in place.
    pub fn post_process(&mut self, config: &InjectConfig) -> Result<WalkReport, PostProcessError> {
        post_process_document(&mut self.root, &InjectOperator::new(*config))
    }

    pub fn to_yaml_string(&self) -> Result<String, DocumentError> {
        serde_yaml::to_string(&self.root).map_err(DocumentError::Serialize)
    }
}

fn check_key(key: &Value, parent: &str) -> Result<(), DocumentError> {
    if is_supported_key(key) {
        Ok(())
    } else {
        Err(DocumentError::UnsupportedKey {
            path: if parent.is_empty() {
                "$".to_string()
            } else {
                parent.to_string()
            },
            kind: NodeKind::of(key),
        })
    }
}

fn check_keys(value: &Value, path: &str) -> Result<(), DocumentError> {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                check_key(key, path)?;
                check_keys(child, &child_path(path, key))?;
            }
            Ok(())
        }
        Value::Sequence(seq) => seq
            .iter()
            .enumerate()
            .try_for_each(|(index, child)| check_keys(child, &index_path(path, index))),
        Value::Tagged(tagged) => check_keys(&tagged.value, path),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let doc = Document::from_yaml_str("").unwrap();
        assert!(doc.root().is_empty());
    }

    #[test]
    fn test_rejects_non_mapping_root() {
        let err = Document::from_yaml_str("[1, 2]").unwrap_err();
        assert!(matches!(
            err,
            DocumentError::NotAMapping {
                kind: NodeKind::Sequence
            }
        ));
    }

    #[test]
    fn test_rejects_unsupported_nested_key() {
        let err = Document::from_yaml_str("a:\n  - {1.5: x}\n").unwrap_err();
        match err {
            DocumentError::UnsupportedKey { path, kind } => {
                assert_eq!(path, "a.[0]");
                assert_eq!(kind, NodeKind::Float);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_null_key_at_root() {
        let err = Document::from_yaml_str("~: x\n").unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedKey { ref path, .. } if path == "$"));
    }

    #[test]
    fn test_accepts_int_and_bool_keys() {
        let doc = Document::from_yaml_str("1: a\ntrue: b\nname: c\n").unwrap();
        assert_eq!(doc.root().len(), 3);
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let doc = Document::from_yaml_str("z: 1\na: 2\n").unwrap();
        assert_eq!(doc.to_yaml_string().unwrap(), "z: 1\na: 2\n");
    }
}
