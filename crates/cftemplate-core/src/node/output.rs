//! Template outputs.
//!
//! An output exports one value from the stack, typically an attribute or a
//! reference that other stacks import.

use crate::{
    diagnostic::{ErrorCode, Issue},
    node::CfBuild,
    value::{Mapping, Value},
};

/// A declared template output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Output {
    description: Value,
    value: Value,
}

impl Output {
    /// Create an output with no description and no value.
    pub fn new() -> Self {
        Self::default()
    }

    /// The description, or [`Value::Absent`] when unset.
    pub fn description(&self) -> &Value {
        &self.description
    }

    /// Set the `Description` shown alongside the output.
    pub fn set_description(&mut self, description: impl Into<Value>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// The exported value, usually an intrinsic call.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Set the exported value.
    ///
    /// An output without a value is still emitted but reported when lowering.
    pub fn set_value(&mut self, value: impl Into<Value>) -> &mut Self {
        self.value = value.into();
        self
    }
}

impl CfBuild for Output {
    fn cf_build(&self) -> (Mapping, Vec<Issue>) {
        let mut issues = Vec::new();
        if self.value.is_absent() {
            issues.push(Issue::error("output has no value").with_code(ErrorCode::E302));
        }

        let mut map = Mapping::new();
        map.insert("Description".to_string(), self.description.clone());
        map.insert("Value".to_string(), self.value.clone());
        (map, issues)
    }
}
