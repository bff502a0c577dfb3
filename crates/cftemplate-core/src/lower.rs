//! Lowering engine.
//!
//! [`lower`] resolves a [`Value`] graph into a plain [`Json`] structure by case
//! analysis. Nodes build their partial mapping through [`CfBuild`], append the
//! issues they report, and have every entry lowered recursively; entries that
//! end up absent are dropped. Lowering never fails: anything that does not fit
//! the document is reported as an issue and lowered as well as possible.
//!
//! # Example
//!
//! ```
//! # use cftemplate_core::{diagnostic::IssueCollector, lower::lower, value::{mapping, Value}};
//! # use serde_json::json;
//! let value = Value::Mapping(mapping([("Kept", Value::from(1)), ("Dropped", Value::Absent)]));
//! let mut issues = IssueCollector::new();
//!
//! assert_eq!(lower(&value, &mut issues), Some(json!({"Kept": 1})));
//! assert!(issues.is_empty());
//! ```

use log::trace;

use crate::{
    diagnostic::{ErrorCode, Issue, IssueCollector},
    node::CfBuild,
    value::{Json, Mapping, Value},
};

/// Deepest value nesting lowering descends into; anything below is dropped
/// with an error.
pub const MAX_DEPTH: usize = 128;

/// Lower `value`, appending issues to `issues`.
///
/// Returns `None` for [`Value::Absent`] and for values nested deeper than
/// [`MAX_DEPTH`].
pub fn lower(value: &Value, issues: &mut IssueCollector) -> Option<Json> {
    lower_within(value, issues, 0)
}

/// Lower every entry of `map` in order, dropping absent entries.
pub fn lower_mapping(map: &Mapping, issues: &mut IssueCollector) -> serde_json::Map<String, Json> {
    mapping_within(map, issues, 0)
}

/// Lower a node through its [`CfBuild`] implementation.
pub fn lower_node<N>(node: &N, issues: &mut IssueCollector) -> Json
where
    N: CfBuild + ?Sized,
{
    node_within(node, issues, 0)
}

fn lower_within(value: &Value, issues: &mut IssueCollector, depth: usize) -> Option<Json> {
    if depth > MAX_DEPTH {
        issues.emit(
            Issue::error(format!(
                "value nested deeper than {MAX_DEPTH} levels is dropped"
            ))
            .with_code(ErrorCode::E306),
        );
        return None;
    }

    let json = match value {
        Value::Absent => return None,
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::from(*n),
        Value::Float(n) => match serde_json::Number::from_f64(*n) {
            Some(number) => Json::Number(number),
            None => {
                issues.emit(
                    Issue::warn(format!("number `{n}` has no document form and is emitted as null"))
                        .with_code(ErrorCode::E307),
                );
                Json::Null
            }
        },
        Value::String(s) => Json::String(s.clone()),
        Value::Interval(interval) => {
            issues.emit(
                Issue::warn(format!(
                    "interval `{interval}` has no document form and is emitted as text"
                ))
                .with_code(ErrorCode::E305),
            );
            Json::String(interval.to_string())
        }
        // Absent elements keep their position as null.
        Value::Sequence(items) => Json::Array(
            items
                .iter()
                .map(|item| lower_within(item, issues, depth + 1).unwrap_or(Json::Null))
                .collect(),
        ),
        Value::Mapping(map) => Json::Object(mapping_within(map, issues, depth + 1)),
        Value::Call(call) => call.to_json(),
        Value::Node(node) => node_within(node.as_ref(), issues, depth + 1),
    };
    Some(json)
}

fn mapping_within(
    map: &Mapping,
    issues: &mut IssueCollector,
    depth: usize,
) -> serde_json::Map<String, Json> {
    map.iter()
        .filter_map(|(key, value)| {
            lower_within(value, issues, depth).map(|json| (key.clone(), json))
        })
        .collect()
}

fn node_within<N>(node: &N, issues: &mut IssueCollector, depth: usize) -> Json
where
    N: CfBuild + ?Sized,
{
    let (partial, nested) = node.cf_build();
    trace!(entries = partial.len(), issues = nested.len(); "Built node");
    issues.extend(nested);
    Json::Object(mapping_within(&partial, issues, depth))
}
