//! Error taxonomy for inject resolution.
//!
//! ```text
//! path lookup    → PathError
//! resolution     → InjectError::{Unresolvable, NotAMap, RecursionLimit, Nested}
//! splice         → InjectError::Invariant(InvariantViolation)
//! entry point    → PostProcessError ("<node>: <message>")
//! document I/O   → DocumentError
//! ```
//!
//! ## Rules
//!
//! - `thiserror` for every enum, no manual `Display` impls.
//! - `InvariantViolation` is never folded into the user-facing variants:
//!   it travels as `InjectError::Invariant` so callers can tell a broken
//!   contract apart from a bad document.

use std::path::PathBuf;

use crate::node::NodeKind;

/// Failure to address a path inside a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A key (or named sequence element) along the path does not exist.
    #[error("`{prefix}` could not be found in the YAML datastructure")]
    NotFound { prefix: String },

    /// A `[N]` segment points past the end of a sequence.
    #[error("`{prefix}` is out of bounds: sequence has {len} elements")]
    IndexOutOfBounds { prefix: String, len: usize },

    /// A `[N]` segment was applied to something that is not a sequence.
    #[error("`{prefix}` cannot be indexed: node is type `{kind}` not `sequence`")]
    NotASequence { prefix: String, kind: NodeKind },
}

/// User-facing failures raised while resolving `(( inject ... ))` targets.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InjectError {
    /// The target path could not be addressed against the root.
    #[error("Unable to resolve `{target}`: {source}")]
    Unresolvable {
        target: String,
        #[source]
        source: PathError,
    },

    /// The target resolved to something other than a mapping (or nil).
    #[error("target {target} is type `{kind}` not `map`, cannot inject its keys")]
    NotAMap { target: String, kind: NodeKind },

    /// The resolution budget ran out.
    #[error("possible recursion detected in call to (( inject ))")]
    RecursionLimit,

    /// A nested marker inside a referenced subtree failed.
    #[error("{path}: {source}")]
    Nested {
        path: String,
        #[source]
        source: Box<InjectError>,
    },

    /// A contract between components was broken.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl InjectError {
    /// Wrap with the diagnostic path of the nested expansion that failed.
    pub fn nested(path: impl Into<String>, source: InjectError) -> Self {
        Self::Nested {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, with all `Nested` context peeled off.
    pub fn root_cause(&self) -> &InjectError {
        match self {
            Self::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the innermost error is an assertion failure rather than a
    /// problem with the document.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self.root_cause(), Self::Invariant(_))
    }
}

/// Conditions that upstream components are supposed to make impossible.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// Splice target was a sequence or scalar.
    #[error("UNSUPPORTED FEATURE: injecting into things other than maps is currently unsupported (parent is type `{kind}`)")]
    NonMappingParent { kind: NodeKind },

    /// The resolved list carried something other than a mapping.
    #[error("BUG DETECTED: injector should validate values are maps, and let a `{kind}` by at index {index}")]
    NonMappingEntry { index: usize, kind: NodeKind },

    /// The walker lost track of where a resolved node lives.
    #[error("BUG DETECTED: parent of injected node disappeared before splicing")]
    MissingSpliceSite,
}

/// Error returned by the entry point, prefixed with the node's path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{node}: {source}")]
pub struct PostProcessError {
    pub node: String,
    #[source]
    pub source: InjectError,
}

impl PostProcessError {
    pub fn new(node: impl Into<String>, source: InjectError) -> Self {
        Self {
            node: node.into(),
            source,
        }
    }
}

/// Failures loading, validating, or writing a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("Failed to serialize YAML: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("document root is type `{kind}`, expected `map`")]
    NotAMapping { kind: NodeKind },

    #[error("budget must be a positive integer, got {budget}")]
    InvalidBudget { budget: i32 },

    #[error("unsupported key of type `{kind}` at `{path}`: keys must be strings, integers or booleans")]
    UnsupportedKey { path: String, kind: NodeKind },
}
