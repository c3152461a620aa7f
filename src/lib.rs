//! yaml-inject: the `(( inject ... ))` operator for layered YAML documents
//!
//! A scalar whose whole value is `(( inject a.b other.[0] ))` is replaced,
//! in its parent mapping, by the keys of the mappings found at each target
//! path. Targets may themselves contain inject markers; those are expanded
//! recursively, bounded by a shared resolution budget.
//!
//! - `marker`: recognizes markers and splits their targets
//! - `path`: dotted / `[N]` path lookup against the document root
//! - `injector`: target resolution, nested expansion, the entry point
//! - `splice`: deletes the marker key and merges resolved mappings
//! - `budget`: decrement-on-enter, refund-on-success recursion guard
//! - `walker`: the document-wide post-processing pass
//! - `document` / `config`: loading, key policy, settings
//!
//! # Example
//!
//! ```yaml
//! base:
//!   region: us-east
//!   size: small
//! service:
//!   defaults: (( inject base ))
//!   size: large
//! ```
//!
//! After post-processing, `defaults` is gone and `service` is
//! `{size: small, region: us-east}`: injected keys overwrite same-named
//! siblings of the marker.

pub mod budget;
pub mod config;
pub mod document;
pub mod error;
pub mod injector;
pub mod marker;
pub mod node;
pub mod path;
pub mod splice;
pub mod walker;

// Re-export commonly used types
pub use budget::{ResolutionBudget, DEFAULT_BUDGET, MAX_BUDGET};
pub use config::InjectConfig;
pub use document::Document;
pub use error::{DocumentError, InjectError, InvariantViolation, PathError, PostProcessError};
pub use injector::{Action, InjectOperator, Injector, PostProcessor};
pub use marker::{is_inject_op, parse_inject_op};
pub use node::NodeKind;
pub use path::resolve_node;
pub use splice::{inject, inject_into_mapping};
pub use walker::{post_process_document, WalkReport};
