//! Attribute values of the template node graph.
//!
//! A [`Value`] is anything a node attribute can hold before lowering: plain
//! scalars, ordered collections, intrinsic [`Call`]s and nested [`Node`]s.
//! [`Value::Absent`] is the marker for "never set" and is dropped from every
//! emitted mapping.

use std::{fmt, ops::RangeInclusive, time::Duration};

use indexmap::IndexMap;

use crate::{intrinsic::Call, node::Node};

/// Insertion-ordered attribute mapping.
pub type Mapping = IndexMap<String, Value>;

/// A canonical, serializable value (the lowering target).
pub type Json = serde_json::Value;

/// Parameter overrides supplied by the operator, threaded into every front end.
pub type ParameterOverrides = IndexMap<String, String>;

/// An inclusive integer interval, written `start..end` in the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    start: i64,
    end: i64,
}

impl Interval {
    /// Create an interval from its inclusive bounds.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Lower bound.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Upper bound.
    pub fn end(&self) -> i64 {
        self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<RangeInclusive<i64>> for Interval {
    fn from(range: RangeInclusive<i64>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

/// A value held by a node attribute before lowering.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The attribute was never set.
    #[default]
    Absent,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Interval(Interval),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    Call(Call),
    Node(Box<Node>),
}

impl Value {
    /// Returns `true` for the absence marker.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Returns `true` for values without nested structure.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Absent => "nothing",
            Value::Null => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Interval(_) => "interval",
            Value::Sequence(_) => "list",
            Value::Mapping(_) => "hash",
            Value::Call(_) => "function call",
            Value::Node(_) => "node",
        }
    }

    /// Build a sequence from variadic input, flattening one level.
    ///
    /// `[a, [b, [c]]]` becomes `[a, b, [c]]`.
    pub fn flat_sequence(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Sequence(flatten_one(items))
    }

    /// Collapse variadic input into a single value or a sequence.
    ///
    /// One item (after flattening one level) is stored as itself; several
    /// become a [`Value::Sequence`]; none is [`Value::Absent`].
    pub fn one_or_many(items: impl IntoIterator<Item = Value>) -> Value {
        let mut items = flatten_one(items);
        match items.len() {
            0 => Value::Absent,
            1 => items.remove(0),
            _ => Value::Sequence(items),
        }
    }
}

/// Flatten one level of nesting: sequence items are spliced in place.
pub fn flatten_one(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut flat = Vec::new();
    for item in items {
        match item {
            Value::Sequence(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat
}

/// Build a [`Mapping`] from key/value pairs, keeping their order.
pub fn mapping<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Mapping
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Merge `incoming` into `target`.
///
/// Existing keys are overwritten in place (keeping their position); new keys
/// are appended.
pub fn merge_mapping(target: &mut Mapping, incoming: Mapping) {
    for (key, value) in incoming {
        target.insert(key, value);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "<absent>"),
            Value::Null => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Interval(i) => write!(f, "{i}"),
            Value::Sequence(items) => write!(f, "[{} items]", items.len()),
            Value::Mapping(map) => write!(f, "{{{} entries}}", map.len()),
            Value::Call(call) => write!(f, "{}(..)", call.function().tag()),
            Value::Node(node) => write!(f, "<{}>", node.kind()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Interval> for Value {
    fn from(interval: Interval) -> Self {
        Value::Interval(interval)
    }
}

impl From<RangeInclusive<i64>> for Value {
    fn from(range: RangeInclusive<i64>) -> Self {
        Value::Interval(range.into())
    }
}

/// Durations are stored as whole seconds.
impl From<Duration> for Value {
    fn from(duration: Duration) -> Self {
        Value::Int(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl From<Call> for Value {
    fn from(call: Call) -> Self {
        Value::Call(call)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(Box::new(node))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Absent, Into::into)
    }
}

/// Already-canonical JSON is carried over structurally.
impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}
