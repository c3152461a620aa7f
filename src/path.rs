//! Dotted path resolution.
//!
//! Paths are dot-separated segments applied left to right:
//!
//! - `key` looks up a mapping key (string first, then integer, then boolean)
//! - `[N]` indexes a sequence
//! - `name` on a sequence finds the first mapping element whose `name` field
//!   equals the segment
//!
//! ```text
//! meta.jobs.[0].properties
//! jobs.api_server.instances
//! ```

use serde_yaml::{Mapping, Value};

use crate::error::PathError;
use crate::node::NodeKind;

/// Address `path` against `root`.
pub fn resolve_node<'a>(path: &str, root: &'a Mapping) -> Result<&'a Value, PathError> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current: Option<&'a Value> = None;

    for (i, segment) in segments.iter().enumerate() {
        let prefix = || segments[..=i].join(".");

        if segment.is_empty() {
            return Err(PathError::NotFound { prefix: prefix() });
        }

        let next = match (current, parse_index(segment)) {
            (None, Some(_)) => {
                return Err(PathError::NotASequence {
                    prefix: prefix(),
                    kind: NodeKind::Mapping,
                })
            }
            (None, None) => lookup_key(root, segment),
            (Some(Value::Sequence(seq)), Some(index)) => match seq.get(index) {
                Some(v) => Some(v),
                None => {
                    return Err(PathError::IndexOutOfBounds {
                        prefix: prefix(),
                        len: seq.len(),
                    })
                }
            },
            (Some(other), Some(_)) => {
                return Err(PathError::NotASequence {
                    prefix: prefix(),
                    kind: NodeKind::of(other),
                })
            }
            (Some(Value::Mapping(map)), None) => lookup_key(map, segment),
            (Some(Value::Sequence(seq)), None) => lookup_named(seq, segment),
            (Some(Value::Tagged(tagged)), None) => match &tagged.value {
                Value::Mapping(map) => lookup_key(map, segment),
                _ => None,
            },
            (Some(Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)), None) => {
                None
            }
        };

        match next {
            Some(v) => current = Some(v),
            None => return Err(PathError::NotFound { prefix: prefix() }),
        }
    }

    current.ok_or_else(|| PathError::NotFound {
        prefix: path.to_string(),
    })
}

/// `[N]` → `Some(N)`.
fn parse_index(segment: &str) -> Option<usize> {
    segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .and_then(|s| s.parse::<usize>().ok())
}

fn lookup_key<'a>(map: &'a Mapping, segment: &str) -> Option<&'a Value> {
    if let Some(v) = map.get(Value::String(segment.to_string())) {
        return Some(v);
    }
    if let Ok(n) = segment.parse::<i64>() {
        if let Some(v) = map.get(Value::from(n)) {
            return Some(v);
        }
    }
    match segment {
        "true" => map.get(Value::Bool(true)),
        "false" => map.get(Value::Bool(false)),
        _ => None,
    }
}

fn lookup_named<'a>(seq: &'a [Value], segment: &str) -> Option<&'a Value> {
    seq.iter().find(|item| {
        item.as_mapping()
            .and_then(|m| m.get(Value::String("name".into())))
            .and_then(Value::as_str)
            == Some(segment)
    })
}
