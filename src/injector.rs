//! The `(( inject ... ))` operator.
//!
//! Resolution runs in three layers:
//!
//! ```text
//! post_process   marker? → fresh budget → resolve → Action::Inject(list)
//! resolve        split args → resolve_key per target → mapping-or-nil check
//! resolve_key    path lookup → local clone → expand
//! expand         recurse into every child, descending through containers
//! recurse        child is a marker? → spend budget → resolve → refund → splice
//! ```
//!
//! The root document is only read. Nested markers are expanded inside a
//! local clone of each referenced subtree, at any depth, so a resolved
//! mapping never carries a marker. Splicing into the real document is left
//! to the caller (see `walker`).

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::budget::ResolutionBudget;
use crate::config::InjectConfig;
use crate::error::{InjectError, PostProcessError};
use crate::marker::{parse_inject_op, split_targets};
use crate::node::{child_path, index_path, NodeKind};
use crate::path::resolve_node;
use crate::splice;

/// What the document walker should do with a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Not an operator this processor handles.
    Ignore,
    /// Replace the node's key in its parent with the keys of these mappings.
    Inject(Vec<Value>),
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Ignore => "ignore",
            Action::Inject(_) => "inject",
        }
    }
}

/// A post-processing operator invoked once per scalar node.
pub trait PostProcessor {
    fn post_process(
        &self,
        root: &Mapping,
        value: &Value,
        node: &str,
    ) -> Result<Action, PostProcessError>;
}

/// Resolves inject markers against one document root.
#[derive(Debug, Clone, Copy)]
pub struct Injector<'a> {
    root: &'a Mapping,
    budget: i32,
}

impl<'a> Injector<'a> {
    pub fn new(root: &'a Mapping) -> Self {
        Self::with_config(root, &InjectConfig::default())
    }

    pub fn with_config(root: &'a Mapping, config: &InjectConfig) -> Self {
        Self {
            root,
            budget: config.budget,
        }
    }

    /// Entry point for one node.
    ///
    /// Non-markers are ignored. Markers get a fresh budget and resolve to
    /// the list of mappings to splice in place of the node's key. Errors
    /// are prefixed with `node`.
    pub fn post_process(&self, value: &Value, node: &str) -> Result<Action, PostProcessError> {
        let Some(args) = parse_inject_op(value) else {
            return Ok(Action::Ignore);
        };

        let mut budget = ResolutionBudget::new(self.budget);
        self.resolve(node, args, &mut budget)
            .map(Action::Inject)
            .map_err(|source| PostProcessError::new(node, source))
    }

    /// Resolve every target named in `args`, left to right.
    ///
    /// Stops at the first target that fails. Each result is a mapping or
    /// nil; anything else is `InjectError::NotAMap`.
    pub fn resolve(
        &self,
        node: &str,
        args: &str,
        budget: &mut ResolutionBudget,
    ) -> Result<Vec<Value>, InjectError> {
        debug!("{}: injection detected: (( inject {} ))", node, args);

        let targets = split_targets(args);
        let mut resolved = Vec::with_capacity(targets.len());
        for target in targets {
            let value = match self.resolve_key(target, budget)? {
                Value::Tagged(tagged) => tagged.value,
                other => other,
            };
            match value {
                Value::Mapping(_) | Value::Null => resolved.push(value),
                other => {
                    return Err(InjectError::NotAMap {
                        target: target.to_string(),
                        kind: NodeKind::of(&other),
                    })
                }
            }
        }
        Ok(resolved)
    }

    /// Look up one target and expand every marker inside it, at any depth.
    ///
    /// Returns an owned copy; the root is not modified.
    pub fn resolve_key(
        &self,
        target: &str,
        budget: &mut ResolutionBudget,
    ) -> Result<Value, InjectError> {
        debug!("  -> resolving reference to `{}`", target);
        let mut value = resolve_node(target, self.root)
            .map_err(|source| InjectError::Unresolvable {
                target: target.to_string(),
                source,
            })?
            .clone();

        self.expand(&mut value, target, budget)?;
        Ok(value)
    }

    /// Expand markers among the children of `value`, descending into
    /// containers that are not markers themselves.
    fn expand(
        &self,
        value: &mut Value,
        path: &str,
        budget: &mut ResolutionBudget,
    ) -> Result<(), InjectError> {
        if let Value::Tagged(tagged) = &mut *value {
            return self.expand(&mut tagged.value, path, budget);
        }

        // Snapshot keys: splicing reshapes the mapping under iteration.
        let children: Vec<(Value, String)> = match &*value {
            Value::Mapping(map) => map
                .keys()
                .map(|key| (key.clone(), child_path(path, key)))
                .collect(),
            Value::Sequence(seq) => (0..seq.len())
                .map(|index| (Value::from(index), index_path(path, index)))
                .collect(),
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Tagged(_) => Vec::new(),
        };

        for (key, label) in children {
            self.recurse(value, &key, &label, budget)?;
        }
        Ok(())
    }

    /// Expand the child of `parent` at `key` if it is a marker, otherwise
    /// look for markers below it.
    fn recurse(
        &self,
        parent: &mut Value,
        key: &Value,
        path: &str,
        budget: &mut ResolutionBudget,
    ) -> Result<(), InjectError> {
        let marker = child(parent, key)
            .and_then(parse_inject_op)
            .map(str::to_string);
        let Some(args) = marker else {
            // Gone (spliced away by a sibling) or not a marker.
            return match child_mut(parent, key) {
                Some(value) => self.expand(value, path, budget),
                None => Ok(()),
            };
        };

        debug!("RECURSION START: {}", path);
        budget
            .enter()
            .map_err(|err| InjectError::nested(path, err))?;
        let resolved = self
            .resolve(path, &args, budget)
            .map_err(|err| InjectError::nested(path, err))?;
        budget.refund();
        debug!("RECURSION END: {}", path);

        splice::inject(parent, resolved, key).map_err(|err| InjectError::nested(path, err.into()))
    }
}

fn child<'v>(parent: &'v Value, key: &Value) -> Option<&'v Value> {
    match parent {
        Value::Mapping(map) => map.get(key),
        Value::Sequence(seq) => seq.get(usize::try_from(key.as_u64()?).ok()?),
        _ => None,
    }
}

fn child_mut<'v>(parent: &'v mut Value, key: &Value) -> Option<&'v mut Value> {
    match parent {
        Value::Mapping(map) => map.get_mut(key),
        Value::Sequence(seq) => seq.get_mut(usize::try_from(key.as_u64()?).ok()?),
        _ => None,
    }
}

/// `PostProcessor` for inject markers, building an `Injector` per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectOperator {
    config: InjectConfig,
}

impl InjectOperator {
    pub fn new(config: InjectConfig) -> Self {
        Self { config }
    }
}

impl PostProcessor for InjectOperator {
    fn post_process(
        &self,
        root: &Mapping,
        value: &Value,
        node: &str,
    ) -> Result<Action, PostProcessError> {
        Injector::with_config(root, &self.config).post_process(value, node)
    }
}
