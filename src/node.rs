//! Node helpers over `serde_yaml::Value`.
//!
//! The document tree is plain `serde_yaml::Value`. This module adds the
//! pieces the resolver needs on top: a closed `NodeKind` classification
//! used in diagnostics, the mapping-key policy, and path-label builders.

use std::fmt;

use serde_yaml::Value;

/// Observed kind of a node, as reported in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Sequence,
    Mapping,
}

impl NodeKind {
    /// Classify a value. Tagged values report the kind of what they wrap.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Bool,
            Value::Number(n) if n.is_f64() => NodeKind::Float,
            Value::Number(_) => NodeKind::Int,
            Value::String(_) => NodeKind::String,
            Value::Sequence(_) => NodeKind::Sequence,
            Value::Mapping(_) => NodeKind::Mapping,
            Value::Tagged(tagged) => NodeKind::of(&tagged.value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "bool",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::String => "string",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "map",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys admitted into documents: strings, integers and booleans.
pub fn is_supported_key(key: &Value) -> bool {
    match key {
        Value::String(_) | Value::Bool(_) => true,
        Value::Number(n) => !n.is_f64(),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => false,
    }
}

/// Render a mapping key as a path segment.
pub fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "~".to_string(),
        other => format!("<{}>", NodeKind::of(other)),
    }
}

/// `parent.key`, or just `key` at the root.
pub fn child_path(parent: &str, key: &Value) -> String {
    if parent.is_empty() {
        key_label(key)
    } else {
        format!("{}.{}", parent, key_label(key))
    }
}

/// `parent.[index]`, or just `[index]` at the root.
pub fn index_path(parent: &str, index: usize) -> String {
    if parent.is_empty() {
        format!("[{}]", index)
    } else {
        format!("{}.[{}]", parent, index)
    }
}
