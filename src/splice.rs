//! Merge/splice of resolved mappings into a parent container.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::InvariantViolation;
use crate::node::{key_label, NodeKind};

/// Remove `key` from `parent` and merge every mapping in `resolved` into it.
///
/// `parent` must be a mapping; sequences and scalars cannot receive keys.
pub fn inject(
    parent: &mut Value,
    resolved: Vec<Value>,
    key: &Value,
) -> Result<(), InvariantViolation> {
    match parent {
        Value::Mapping(map) => inject_into_mapping(map, resolved, key),
        other => Err(InvariantViolation::NonMappingParent {
            kind: NodeKind::of(other),
        }),
    }
}

/// Splice into a mapping known to be the parent.
///
/// The key is removed even when `resolved` is empty. Later mappings, and
/// later keys within a mapping, overwrite earlier ones. `resolved` is owned,
/// so nothing stored in `parent` aliases the subtree it was resolved from.
pub fn inject_into_mapping(
    parent: &mut Mapping,
    resolved: Vec<Value>,
    key: &Value,
) -> Result<(), InvariantViolation> {
    // Check the whole list first so a bad entry leaves the parent untouched.
    if let Some((index, entry)) = resolved
        .iter()
        .enumerate()
        .find(|(_, entry)| !entry.is_mapping())
    {
        return Err(InvariantViolation::NonMappingEntry {
            index,
            kind: NodeKind::of(entry),
        });
    }

    debug!("DELETING {}", key_label(key));
    parent.shift_remove(key);

    for entry in resolved {
        if let Value::Mapping(entries) = entry {
            for (k, v) in entries {
                debug!("  -> injecting `{:?}` at `{}`", v, key_label(&k));
                parent.insert(k, v);
            }
        }
    }
    Ok(())
}
