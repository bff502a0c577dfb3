//! Template parameters.

use crate::{
    diagnostic::{ErrorCode, Issue},
    node::{CfBuild, NodeKind},
    value::{Interval, Mapping, Value},
};

/// A declared template parameter.
///
/// The attributes shared by all parameter kinds live here; the kind-specific
/// ones live in [`ParameterKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    kind: ParameterKind,
    description: Value,
    constraint_description: Value,
    no_echo: Option<bool>,
}

/// The concrete kind of a [`Parameter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    String(StringParameter),
    Number(NumberParameter),
    List(ListParameter),
}

impl ParameterKind {
    /// The `Type` emitted for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterKind::String(_) => "String",
            ParameterKind::Number(_) => "Number",
            ParameterKind::List(_) => "CommaDelimitedList",
        }
    }
}

impl Parameter {
    /// Create a parameter of the given kind with every attribute unset.
    pub fn new(kind: ParameterKind) -> Self {
        Self {
            kind,
            description: Value::Absent,
            constraint_description: Value::Absent,
            no_echo: None,
        }
    }

    /// Create a string parameter.
    pub fn string() -> Self {
        Self::new(ParameterKind::String(StringParameter::default()))
    }

    /// Create a number parameter.
    pub fn number() -> Self {
        Self::new(ParameterKind::Number(NumberParameter::default()))
    }

    /// Create a comma delimited list parameter.
    pub fn list() -> Self {
        Self::new(ParameterKind::List(ListParameter::default()))
    }

    /// The node kind matching this parameter's [`ParameterKind`].
    pub fn kind(&self) -> NodeKind {
        match self.kind {
            ParameterKind::String(_) => NodeKind::StringParameter,
            ParameterKind::Number(_) => NodeKind::NumberParameter,
            ParameterKind::List(_) => NodeKind::ListParameter,
        }
    }

    /// The kind-specific attributes.
    pub fn parameter_kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// Borrow the string-specific attributes, if this is a string parameter.
    pub fn as_string_mut(&mut self) -> Option<&mut StringParameter> {
        match &mut self.kind {
            ParameterKind::String(string) => Some(string),
            _ => None,
        }
    }

    /// Borrow the number-specific attributes, if this is a number parameter.
    pub fn as_number_mut(&mut self) -> Option<&mut NumberParameter> {
        match &mut self.kind {
            ParameterKind::Number(number) => Some(number),
            _ => None,
        }
    }

    /// Borrow the list-specific attributes, if this is a list parameter.
    pub fn as_list_mut(&mut self) -> Option<&mut ListParameter> {
        match &mut self.kind {
            ParameterKind::List(list) => Some(list),
            _ => None,
        }
    }

    /// The description, or [`Value::Absent`] when unset.
    pub fn description(&self) -> &Value {
        &self.description
    }

    /// Set the `Description` shown to whoever deploys the stack.
    pub fn set_description(&mut self, description: impl Into<Value>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// Text shown when a supplied value breaks a constraint.
    pub fn constraint_description(&self) -> &Value {
        &self.constraint_description
    }

    /// Set the `ConstraintDescription`.
    pub fn set_constraint_description(&mut self, description: impl Into<Value>) -> &mut Self {
        self.constraint_description = description.into();
        self
    }

    /// The tri-state no-echo flag. Only `Some(true)` is emitted.
    pub fn no_echo(&self) -> Option<bool> {
        self.no_echo
    }

    /// Set the no-echo flag. `false` is recorded and emits nothing.
    pub fn set_no_echo(&mut self, no_echo: bool) -> &mut Self {
        self.no_echo = Some(no_echo);
        self
    }

    /// The default of whichever kind this parameter is.
    pub fn default_value(&self) -> &Value {
        match &self.kind {
            ParameterKind::String(string) => &string.default,
            ParameterKind::Number(number) => &number.default,
            ParameterKind::List(list) => &list.default,
        }
    }

    /// Set the default of whichever kind this parameter is.
    ///
    /// A sequence given to a list parameter is flattened one level.
    pub fn set_default(&mut self, default: impl Into<Value>) -> &mut Self {
        let default = default.into();
        match &mut self.kind {
            ParameterKind::String(string) => string.default = default,
            ParameterKind::Number(number) => number.default = default,
            ParameterKind::List(list) => match default {
                Value::Sequence(items) => {
                    list.set_default(items);
                }
                other => list.default = other,
            },
        }
        self
    }

    /// Replace the default with an operator-supplied override.
    ///
    /// The override text is kept as given for every kind; the document holds
    /// defaults as strings.
    pub fn apply_override(&mut self, raw: &str) -> &mut Self {
        self.set_default(raw)
    }
}

impl CfBuild for Parameter {
    fn cf_build(&self) -> (Mapping, Vec<Issue>) {
        let mut map = Mapping::new();
        let mut issues = Vec::new();

        map.insert("Type".to_string(), Value::from(self.kind.type_name()));
        map.insert("Description".to_string(), self.description.clone());
        let default = match &self.kind {
            ParameterKind::List(list) => list.lowered_default(&mut issues),
            _ => self.default_value().clone(),
        };
        map.insert("Default".to_string(), default);
        if self.no_echo == Some(true) {
            map.insert("NoEcho".to_string(), Value::Bool(true));
        }

        match &self.kind {
            ParameterKind::String(string) => string.build_constraints(&mut map, &mut issues),
            ParameterKind::Number(number) => number.build_constraints(&mut map),
            ParameterKind::List(_) => {}
        }

        map.insert(
            "ConstraintDescription".to_string(),
            self.constraint_description.clone(),
        );
        (map, issues)
    }
}

/// Attributes of a `String` parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringParameter {
    default: Value,
    length: Value,
    allowed_pattern: Value,
    allowed_values: Value,
}

impl StringParameter {
    /// The length constraint as given.
    pub fn length(&self) -> &Value {
        &self.length
    }

    /// Set the length constraint: an integer for an exact length or an
    /// interval for bounds. Other shapes are reported when lowering.
    pub fn set_length(&mut self, length: impl Into<Value>) -> &mut Self {
        self.length = length.into();
        self
    }

    /// The regular expression supplied values must match.
    pub fn allowed_pattern(&self) -> &Value {
        &self.allowed_pattern
    }

    /// Set the `AllowedPattern`.
    pub fn set_allowed_pattern(&mut self, pattern: impl Into<Value>) -> &mut Self {
        self.allowed_pattern = pattern.into();
        self
    }

    /// The permitted values, flattened one level.
    pub fn allowed_values(&self) -> &Value {
        &self.allowed_values
    }

    /// Set the permitted values. Nested sequences are flattened one level.
    pub fn set_allowed_values(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.allowed_values = Value::flat_sequence(values);
        self
    }

    fn build_constraints(&self, map: &mut Mapping, issues: &mut Vec<Issue>) {
        map.insert("AllowedValues".to_string(), self.allowed_values.clone());
        map.insert("AllowedPattern".to_string(), self.allowed_pattern.clone());

        let bounds = match &self.length {
            Value::Absent => None,
            Value::Int(n) if *n >= 0 => Some((*n, *n)),
            Value::Interval(interval)
                if 0 <= interval.start() && interval.start() <= interval.end() =>
            {
                Some((interval.start(), interval.end()))
            }
            other => {
                issues.push(
                    Issue::error(format!(
                        "unsupported length `{other}`: expected a non-negative integer or an ascending interval such as `3..10`"
                    ))
                    .with_code(ErrorCode::E300),
                );
                None
            }
        };
        if let Some((min, max)) = bounds {
            map.insert("MinLength".to_string(), Value::Int(min));
            map.insert("MaxLength".to_string(), Value::Int(max));
        }
    }
}

/// Attributes of a `Number` parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberParameter {
    default: Value,
    min_value: Value,
    max_value: Value,
    allowed_values: Value,
}

impl NumberParameter {
    /// The lower bound, or [`Value::Absent`] when unset.
    pub fn min_value(&self) -> &Value {
        &self.min_value
    }

    /// Set the `MinValue`.
    pub fn set_min_value(&mut self, min: impl Into<Value>) -> &mut Self {
        self.min_value = min.into();
        self
    }

    /// The upper bound, or [`Value::Absent`] when unset.
    pub fn max_value(&self) -> &Value {
        &self.max_value
    }

    /// Set the `MaxValue`.
    pub fn set_max_value(&mut self, max: impl Into<Value>) -> &mut Self {
        self.max_value = max.into();
        self
    }

    /// Set both bounds from `range`, or clear both with `None`.
    pub fn set_range(&mut self, range: Option<Interval>) -> &mut Self {
        match range {
            Some(interval) => {
                self.min_value = Value::Int(interval.start());
                self.max_value = Value::Int(interval.end());
            }
            None => {
                self.min_value = Value::Absent;
                self.max_value = Value::Absent;
            }
        }
        self
    }

    /// The permitted values, flattened one level.
    pub fn allowed_values(&self) -> &Value {
        &self.allowed_values
    }

    /// Set the permitted values. Nested sequences are flattened one level.
    pub fn set_allowed_values(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.allowed_values = Value::flat_sequence(values);
        self
    }

    fn build_constraints(&self, map: &mut Mapping) {
        map.insert("AllowedValues".to_string(), self.allowed_values.clone());
        map.insert("MinValue".to_string(), self.min_value.clone());
        map.insert("MaxValue".to_string(), self.max_value.clone());
    }
}

/// Attributes of a `CommaDelimitedList` parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListParameter {
    default: Value,
}

impl ListParameter {
    /// Set the default items. Nested sequences are flattened one level.
    pub fn set_default(&mut self, items: impl IntoIterator<Item = Value>) -> &mut Self {
        self.default = Value::flat_sequence(items);
        self
    }

    /// The document wants the default as one comma-joined string.
    fn lowered_default(&self, issues: &mut Vec<Issue>) -> Value {
        let items = match &self.default {
            Value::Sequence(items) => items.as_slice(),
            Value::Absent => return Value::Absent,
            single => std::slice::from_ref(single),
        };

        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            match scalar_text(item) {
                Some(text) => parts.push(text),
                None => {
                    issues.push(
                        Issue::error(format!(
                            "list default element `{item}` is a {}, expected a scalar",
                            item.shape()
                        ))
                        .with_code(ErrorCode::E303),
                    );
                    return Value::Absent;
                }
            }
        }
        Value::String(parts.join(","))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Float(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(parameter: &Parameter) -> (Mapping, Vec<Issue>) {
        parameter.cf_build()
    }

    #[test]
    fn test_scalar_length_sets_both_bounds() {
        let mut parameter = Parameter::string();
        parameter.as_string_mut().unwrap().set_length(5);

        let (map, issues) = build(&parameter);

        assert!(issues.is_empty());
        assert_eq!(map["MinLength"], Value::Int(5));
        assert_eq!(map["MaxLength"], Value::Int(5));
    }

    #[test]
    fn test_interval_length_sets_bounds() {
        let mut parameter = Parameter::string();
        parameter.as_string_mut().unwrap().set_length(3_i64..=10);

        let (map, issues) = build(&parameter);

        assert!(issues.is_empty());
        assert_eq!(map["MinLength"], Value::Int(3));
        assert_eq!(map["MaxLength"], Value::Int(10));
    }

    #[test]
    fn test_unsupported_length_is_an_error() {
        let mut parameter = Parameter::string();
        parameter.as_string_mut().unwrap().set_length("abc");

        let (map, issues) = build(&parameter);

        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_failure());
        assert_eq!(issues[0].code(), Some(ErrorCode::E300));
        assert!(!map.contains_key("MinLength"));
        assert!(!map.contains_key("MaxLength"));
    }

    #[test]
    fn test_descending_length_is_an_error() {
        let mut parameter = Parameter::string();
        parameter.as_string_mut().unwrap().set_length(Interval::new(9, 2));

        let (map, issues) = build(&parameter);

        assert_eq!(issues.len(), 1);
        assert!(!map.contains_key("MinLength"));
    }

    #[test]
    fn test_no_echo_emitted_only_when_true() {
        let mut parameter = Parameter::string();
        let (map, _) = build(&parameter);
        assert!(!map.contains_key("NoEcho"));

        parameter.set_no_echo(false);
        let (map, _) = build(&parameter);
        assert!(!map.contains_key("NoEcho"));

        parameter.set_no_echo(true);
        let (map, _) = build(&parameter);
        assert_eq!(map["NoEcho"], Value::Bool(true));
    }

    #[test]
    fn test_key_order() {
        let mut parameter = Parameter::number();
        parameter
            .set_constraint_description("must be a port")
            .set_description("Port")
            .set_default(8080);
        parameter
            .as_number_mut()
            .unwrap()
            .set_range(Some(Interval::new(1, 65535)));

        let (map, _) = build(&parameter);
        let keys: Vec<_> = map
            .iter()
            .filter(|(_, value)| !value.is_absent())
            .map(|(key, _)| key.as_str())
            .collect();

        assert_eq!(
            keys,
            vec![
                "Type",
                "Description",
                "Default",
                "MinValue",
                "MaxValue",
                "ConstraintDescription"
            ]
        );
        assert_eq!(map["Type"], Value::from("Number"));
    }

    #[test]
    fn test_range_clears_both_bounds() {
        let mut parameter = Parameter::number();
        let number = parameter.as_number_mut().unwrap();
        number.set_range(Some(Interval::new(1, 10)));
        number.set_range(None);

        assert!(number.min_value().is_absent());
        assert!(number.max_value().is_absent());
    }

    #[test]
    fn test_list_default_is_comma_joined() {
        let mut parameter = Parameter::list();
        parameter.set_default(vec![
            Value::from("a"),
            Value::Sequence(vec![Value::from("b"), Value::Int(3)]),
        ]);

        let (map, issues) = build(&parameter);

        assert!(issues.is_empty());
        assert_eq!(map["Type"], Value::from("CommaDelimitedList"));
        assert_eq!(map["Default"], Value::from("a,b,3"));
    }

    #[test]
    fn test_list_default_rejects_non_scalars() {
        let mut parameter = Parameter::list();
        parameter.set_default(vec![
            Value::from("a"),
            Value::Call(crate::intrinsic::ref_("Other")),
        ]);

        let (map, issues) = build(&parameter);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code(), Some(ErrorCode::E303));
        assert!(map["Default"].is_absent());
    }

    #[test]
    fn test_apply_override_keeps_text() {
        let mut number = Parameter::number();
        number.set_default(8).apply_override("08");
        assert_eq!(number.default_value(), &Value::from("08"));

        let mut list = Parameter::list();
        list.apply_override("a, b,c");
        assert_eq!(list.default_value(), &Value::from("a, b,c"));
        let (map, issues) = list.cf_build();
        assert!(issues.is_empty());
        assert_eq!(map["Default"], Value::from("a, b,c"));

        let mut string = Parameter::string();
        string.set_default("old").apply_override("new");
        assert_eq!(string.default_value(), &Value::from("new"));
    }
}
