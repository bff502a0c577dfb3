//! Typed template nodes.
//!
//! Every node has a fixed [`NodeKind`] and lowers itself through
//! [`CfBuild::cf_build`], which returns the node's partial mapping (values not
//! yet lowered) together with the issues found while building it. The kinds
//! form a closed set: a node is always one concrete parameter, resource or
//! output.
//!
//! Setters come in three flavours:
//! - plain attributes keep the last value set
//! - mapping attributes merge successive sets
//! - sequence attributes flatten one level of variadic input, then replace

mod output;
mod parameter;
mod resource;

use std::fmt;

pub use output::Output;
pub use parameter::{ListParameter, NumberParameter, Parameter, ParameterKind, StringParameter};
pub use resource::{
    DeletionPolicy, GenericResource, Resource, ResourceKind, StackReference, WaitCondition,
};

use crate::{diagnostic::Issue, value::Mapping};

/// Lowering contract implemented by every node.
pub trait CfBuild {
    /// Build the node's partial mapping.
    ///
    /// Unset attributes are left as [`Value::Absent`](crate::value::Value::Absent);
    /// the lowering engine drops them after lowering the remaining entries.
    fn cf_build(&self) -> (Mapping, Vec<Issue>);
}

/// Discriminator of a node's concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    StringParameter,
    NumberParameter,
    ListParameter,
    WaitConditionHandle,
    WaitCondition,
    Stack,
    GenericResource,
    Output,
}

impl NodeKind {
    /// Returns `true` for the parameter kinds.
    pub fn is_parameter(&self) -> bool {
        matches!(
            self,
            NodeKind::StringParameter | NodeKind::NumberParameter | NodeKind::ListParameter
        )
    }

    /// Returns `true` for the resource kinds.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            NodeKind::WaitConditionHandle
                | NodeKind::WaitCondition
                | NodeKind::Stack
                | NodeKind::GenericResource
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::StringParameter => "string parameter",
            NodeKind::NumberParameter => "number parameter",
            NodeKind::ListParameter => "list parameter",
            NodeKind::WaitConditionHandle => "wait condition handle",
            NodeKind::WaitCondition => "wait condition",
            NodeKind::Stack => "stack",
            NodeKind::GenericResource => "resource",
            NodeKind::Output => "output",
        };
        f.write_str(name)
    }
}

/// Any template node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Parameter(Parameter),
    Resource(Resource),
    Output(Output),
}

impl Node {
    /// The node's concrete kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Parameter(parameter) => parameter.kind(),
            Node::Resource(resource) => resource.kind(),
            Node::Output(_) => NodeKind::Output,
        }
    }
}

impl CfBuild for Node {
    fn cf_build(&self) -> (Mapping, Vec<Issue>) {
        match self {
            Node::Parameter(parameter) => parameter.cf_build(),
            Node::Resource(resource) => resource.cf_build(),
            Node::Output(output) => output.cf_build(),
        }
    }
}

impl From<Parameter> for Node {
    fn from(parameter: Parameter) -> Self {
        Node::Parameter(parameter)
    }
}

impl From<Resource> for Node {
    fn from(resource: Resource) -> Self {
        Node::Resource(resource)
    }
}

impl From<Output> for Node {
    fn from(output: Output) -> Self {
        Node::Output(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind() {
        assert_eq!(
            Node::from(Parameter::number()).kind(),
            NodeKind::NumberParameter
        );
        assert_eq!(
            Node::from(Resource::wait_condition_handle()).kind(),
            NodeKind::WaitConditionHandle
        );
        assert_eq!(Node::from(Output::new()).kind(), NodeKind::Output);
    }

    #[test]
    fn test_node_kind_groups() {
        assert!(NodeKind::ListParameter.is_parameter());
        assert!(!NodeKind::ListParameter.is_resource());
        assert!(NodeKind::Stack.is_resource());
        assert!(!NodeKind::Output.is_parameter());
    }

    #[test]
    fn test_node_kind_display() {
        assert_eq!(NodeKind::WaitCondition.to_string(), "wait condition");
        assert_eq!(NodeKind::GenericResource.to_string(), "resource");
    }
}
