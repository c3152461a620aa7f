//! Post-processing pass over a whole document.
//!
//! Every scalar node is offered to a `PostProcessor`. Node locations are
//! collected up front, in document order, and re-read before each call so
//! that earlier splices are observed: a node whose key was spliced away is
//! skipped, and keys spliced in are not revisited (resolution expands every
//! marker inside them). Tagged mappings and sequences are walked through;
//! a tagged scalar is offered as-is.

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::error::{InjectError, InvariantViolation, PostProcessError};
use crate::injector::{Action, PostProcessor};
use crate::node::{child_path, index_path};
use crate::splice;

/// One hop from a container to a child.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Key(Value),
    Index(usize),
    /// Into the value wrapped by a tag.
    Untag,
}

#[derive(Debug, Clone)]
struct Site {
    steps: Vec<Step>,
    path: String,
}

/// Summary of a completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Scalar nodes offered to the processor.
    pub visited: usize,
    /// Nodes replaced by injected keys.
    pub injected: usize,
}

/// Run `processor` over every scalar in `root`, splicing as instructed.
///
/// Halts on the first error.
pub fn post_process_document<P: PostProcessor + ?Sized>(
    root: &mut Mapping,
    processor: &P,
) -> Result<WalkReport, PostProcessError> {
    let mut sites = Vec::new();
    for (key, value) in root.iter() {
        collect_sites(value, vec![Step::Key(key.clone())], child_path("", key), &mut sites);
    }

    let mut report = WalkReport::default();
    for site in sites {
        let action = {
            let Some(value) = lookup(root, &site.steps) else {
                debug!("{}: no longer present, skipping", site.path);
                continue;
            };
            report.visited += 1;
            processor.post_process(root, value, &site.path)?
        };

        match action {
            Action::Ignore => {}
            Action::Inject(resolved) => {
                apply(root, &site, resolved)?;
                report.injected += 1;
            }
        }
    }

    info!(
        "Post-processing complete: {} nodes visited, {} injected",
        report.visited, report.injected
    );
    Ok(report)
}

fn collect_sites(value: &Value, steps: Vec<Step>, path: String, out: &mut Vec<Site>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let mut next = steps.clone();
                next.push(Step::Key(key.clone()));
                collect_sites(child, next, child_path(&path, key), out);
            }
        }
        Value::Sequence(seq) => {
            for (index, child) in seq.iter().enumerate() {
                let mut next = steps.clone();
                next.push(Step::Index(index));
                collect_sites(child, next, index_path(&path, index), out);
            }
        }
        Value::Tagged(tagged) if tagged.value.is_mapping() || tagged.value.is_sequence() => {
            let mut next = steps;
            next.push(Step::Untag);
            collect_sites(&tagged.value, next, path, out);
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Tagged(_) => {
            out.push(Site { steps, path })
        }
    }
}

fn lookup<'a>(root: &'a Mapping, steps: &[Step]) -> Option<&'a Value> {
    let (first, rest) = steps.split_first()?;
    let mut current = match first {
        Step::Key(key) => root.get(key)?,
        Step::Index(_) | Step::Untag => return None,
    };
    for step in rest {
        current = match (step, current) {
            (Step::Key(key), Value::Mapping(map)) => map.get(key)?,
            (Step::Index(index), Value::Sequence(seq)) => seq.get(*index)?,
            (Step::Untag, Value::Tagged(tagged)) => &tagged.value,
            _ => return None,
        };
    }
    Some(current)
}

fn lookup_mut<'a>(root: &'a mut Mapping, steps: &[Step]) -> Option<&'a mut Value> {
    let (first, rest) = steps.split_first()?;
    let mut current = match first {
        Step::Key(key) => root.get_mut(key)?,
        Step::Index(_) | Step::Untag => return None,
    };
    for step in rest {
        current = match (step, current) {
            (Step::Key(key), Value::Mapping(map)) => map.get_mut(key)?,
            (Step::Index(index), Value::Sequence(seq)) => seq.get_mut(*index)?,
            (Step::Untag, Value::Tagged(tagged)) => &mut tagged.value,
            _ => return None,
        };
    }
    Some(current)
}

/// Splice `resolved` into the real parent of `site`.
fn apply(root: &mut Mapping, site: &Site, resolved: Vec<Value>) -> Result<(), PostProcessError> {
    let fail = |err: InvariantViolation| {
        PostProcessError::new(site.path.clone(), InjectError::from(err))
    };

    let key = match site.steps.last() {
        Some(Step::Key(key)) => key.clone(),
        Some(Step::Index(index)) => Value::from(*index),
        Some(Step::Untag) | None => return Err(fail(InvariantViolation::MissingSpliceSite)),
    };
    let parent_steps = &site.steps[..site.steps.len() - 1];

    if parent_steps.is_empty() {
        return splice::inject_into_mapping(root, resolved, &key).map_err(fail);
    }
    match lookup_mut(root, parent_steps) {
        Some(parent) => splice::inject(parent, resolved, &key).map_err(fail),
        None => Err(fail(InvariantViolation::MissingSpliceSite)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every node offered and ignores them all.
    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<String>>,
    }

    impl PostProcessor for Recorder {
        fn post_process(
            &self,
            _root: &Mapping,
            _value: &Value,
            node: &str,
        ) -> Result<Action, PostProcessError> {
            self.seen.borrow_mut().push(node.to_string());
            Ok(Action::Ignore)
        }
    }

    #[test]
    fn test_visits_scalars_in_document_order() {
        let mut root: Mapping = serde_yaml::from_str(
            r#"
a: 1
b:
  c: [x, {d: y}]
  e: ~
"#,
        )
        .unwrap();
        let recorder = Recorder::default();
        let report = post_process_document(&mut root, &recorder).unwrap();
        assert_eq!(
            recorder.seen.into_inner(),
            vec!["a", "b.c.[0]", "b.c.[1].d", "b.e"]
        );
        assert_eq!(
            report,
            WalkReport {
                visited: 4,
                injected: 0
            }
        );
    }

    /// Injects a fixed mapping for every string equal to "splice".
    struct Fixed(Value);

    impl PostProcessor for Fixed {
        fn post_process(
            &self,
            _root: &Mapping,
            value: &Value,
            _node: &str,
        ) -> Result<Action, PostProcessError> {
            if value.as_str() == Some("splice") {
                Ok(Action::Inject(vec![self.0.clone()]))
            } else {
                Ok(Action::Ignore)
            }
        }
    }

    #[test]
    fn test_later_sites_observe_earlier_splice() {
        let mut root: Mapping = serde_yaml::from_str("{first: splice, second: splice}").unwrap();
        // Injecting `second: ok` overwrites the second marker before it is visited.
        let fixed = Fixed(serde_yaml::from_str("{second: ok}").unwrap());
        let report = post_process_document(&mut root, &fixed).unwrap();
        assert_eq!(root, serde_yaml::from_str::<Mapping>("{second: ok}").unwrap());
        assert_eq!(
            report,
            WalkReport {
                visited: 2,
                injected: 1
            }
        );
    }

    #[test]
    fn test_skips_sites_removed_by_earlier_splice() {
        let mut root: Mapping =
            serde_yaml::from_str("{first: splice, second: {inner: splice}}").unwrap();
        let fixed = Fixed(serde_yaml::from_str("{second: ok}").unwrap());
        let report = post_process_document(&mut root, &fixed).unwrap();
        assert_eq!(root, serde_yaml::from_str::<Mapping>("{second: ok}").unwrap());
        assert_eq!(report.visited, 1);
    }

    #[test]
    fn test_splice_into_sequence_reports_unsupported() {
        let mut root: Mapping = serde_yaml::from_str("{list: [splice]}").unwrap();
        let fixed = Fixed(serde_yaml::from_str("{a: 1}").unwrap());
        let err = post_process_document(&mut root, &fixed).unwrap_err();
        assert_eq!(err.node, "list.[0]");
        assert!(err.source.is_invariant_violation());
        assert!(err.to_string().contains("UNSUPPORTED FEATURE"));
    }

    #[test]
    fn test_walks_through_tagged_containers() {
        let mut root: Mapping =
            serde_yaml::from_str("{t: !custom {m: x, keep: 1}, s: !plain y}").unwrap();
        let recorder = Recorder::default();
        post_process_document(&mut root, &recorder).unwrap();
        assert_eq!(recorder.seen.into_inner(), vec!["t.m", "t.keep", "s"]);
    }

    #[test]
    fn test_splices_inside_tagged_mapping() {
        let mut root: Mapping =
            serde_yaml::from_str("{t: !custom {m: splice, keep: 1}}").unwrap();
        let fixed = Fixed(serde_yaml::from_str("{a: 1}").unwrap());
        let report = post_process_document(&mut root, &fixed).unwrap();
        assert_eq!(report.injected, 1);
        let Some(Value::Tagged(tagged)) = root.get("t") else {
            panic!("tag on `t` should survive");
        };
        assert_eq!(
            tagged.value,
            serde_yaml::from_str::<Value>("{keep: 1, a: 1}").unwrap()
        );
    }

    #[test]
    fn test_splice_without_a_parent_is_an_invariant_violation() {
        let mut root: Mapping = serde_yaml::from_str("{a: {m: splice}}").unwrap();
        let resolved = vec![serde_yaml::from_str("{x: 1}").unwrap()];

        for steps in [
            vec![],
            vec![Step::Key(Value::from("gone")), Step::Key(Value::from("m"))],
        ] {
            let site = Site {
                steps,
                path: "gone.m".to_string(),
            };
            let err = apply(&mut root, &site, resolved.clone()).unwrap_err();
            assert_eq!(err.node, "gone.m");
            assert_eq!(
                err.source,
                InjectError::Invariant(InvariantViolation::MissingSpliceSite)
            );
        }
        assert_eq!(root, serde_yaml::from_str::<Mapping>("{a: {m: splice}}").unwrap());
    }
}
