//! The template: ordered, named collections of nodes.
//!
//! Nodes can be added directly ([`Template::add_resource`] and friends) or
//! through the nested-block builders, which hand the new node and a read-only
//! [`Scope`] of the enclosing template to a configuration closure:
//!
//! ```
//! # use cftemplate_core::{node::{Parameter, Resource}, template::Template};
//! # use serde_json::json;
//! let mut template = Template::new();
//! template.declare_parameter("BucketName", Parameter::string(), |parameter, _| {
//!     parameter.set_default("assets");
//! });
//! template.declare_resource("Bucket", Resource::generic("AWS::S3::Bucket"), |resource, scope| {
//!     if let Some(name) = scope.resource_ref("BucketName") {
//!         resource.as_generic_mut().unwrap().set_property("BucketName", name);
//!     }
//! });
//!
//! let result = template.lower();
//! assert!(!result.has_failures());
//! assert_eq!(
//!     result.output().unwrap()["Resources"]["Bucket"]["Properties"],
//!     json!({"BucketName": {"Ref": "BucketName"}})
//! );
//! ```

use indexmap::IndexMap;
use log::debug;
use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};

use crate::{
    diagnostic::{ErrorCode, Issue, IssueCollector},
    intrinsic::{self, Call},
    lower::{lower, lower_mapping, lower_node},
    node::{CfBuild, Output, Parameter, Resource},
    result::CompileResult,
    value::{Json, Mapping, ParameterOverrides, Value, merge_mapping},
};

/// The only template format version the document knows.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// A template under construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    description: Value,
    parameters: IndexMap<String, Parameter>,
    mappings: IndexMap<String, Mapping>,
    resources: IndexMap<String, Resource>,
    outputs: IndexMap<String, Output>,
}

impl Template {
    /// Create an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// The template description, or [`Value::Absent`] when unset.
    pub fn description(&self) -> &Value {
        &self.description
    }

    /// Set the top-level `Description`, replacing any earlier one.
    pub fn set_description(&mut self, description: impl Into<Value>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// Look up a declared parameter.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    /// Declared parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.parameters.iter().map(|(name, p)| (name.as_str(), p))
    }

    /// Look up a declared resource.
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Declared resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// Look up a declared output.
    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    /// Declared outputs in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.outputs.iter().map(|(name, o)| (name.as_str(), o))
    }

    /// Look up a mapping by name.
    pub fn mapping(&self, name: &str) -> Option<&Mapping> {
        self.mappings.get(name)
    }

    /// Merge `entries` into the mapping called `name`.
    pub fn add_mapping(&mut self, name: impl Into<String>, entries: Mapping) -> &mut Self {
        merge_mapping(self.mappings.entry(name.into()).or_default(), entries);
        self
    }

    /// Add a parameter, returning the one it replaces.
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        parameter: Parameter,
    ) -> Option<Parameter> {
        self.parameters.insert(name.into(), parameter)
    }

    /// Add a resource, returning the one it replaces.
    ///
    /// A wait condition without a handle gets one: a `<name>Handle` wait
    /// condition handle is created in front of it unless a resource of that
    /// name already exists, and the condition references it.
    pub fn add_resource(
        &mut self,
        name: impl Into<String>,
        mut resource: Resource,
    ) -> Option<Resource> {
        let name = name.into();
        if let Some(wait) = resource.as_wait_condition_mut() {
            if !wait.has_handle() {
                let handle_name = format!("{name}Handle");
                if !self.resources.contains_key(&handle_name) {
                    debug!(name = handle_name.as_str(); "Creating wait condition handle");
                    self.resources
                        .insert(handle_name.clone(), Resource::wait_condition_handle());
                }
                wait.set_handle(intrinsic::ref_(handle_name));
            }
        }
        self.resources.insert(name, resource)
    }

    /// Add an output, returning the one it replaces.
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Option<Output> {
        self.outputs.insert(name.into(), output)
    }

    /// Configure `parameter` against this template, then add it.
    pub fn declare_parameter<F>(
        &mut self,
        name: impl Into<String>,
        mut parameter: Parameter,
        configure: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut Parameter, &Scope<'_>),
    {
        configure(&mut parameter, &self.scope());
        self.add_parameter(name, parameter);
        self
    }

    /// Configure `resource` against this template, then add it.
    pub fn declare_resource<F>(
        &mut self,
        name: impl Into<String>,
        mut resource: Resource,
        configure: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut Resource, &Scope<'_>),
    {
        configure(&mut resource, &self.scope());
        self.add_resource(name, resource);
        self
    }

    /// Configure `output` against this template, then add it.
    pub fn declare_output<F>(
        &mut self,
        name: impl Into<String>,
        mut output: Output,
        configure: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut Output, &Scope<'_>),
    {
        configure(&mut output, &self.scope());
        self.add_output(name, output);
        self
    }

    /// A read-only view of this template for nested builders.
    pub fn scope(&self) -> Scope<'_> {
        Scope { template: self }
    }

    /// Replace the defaults of declared parameters with `overrides`.
    ///
    /// Overrides that match no parameter are reported at debug level.
    pub fn apply_overrides(&mut self, overrides: &ParameterOverrides) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (name, raw) in overrides {
            match self.parameters.get_mut(name) {
                Some(parameter) => {
                    debug!(parameter = name.as_str(); "Applying parameter override");
                    parameter.apply_override(raw);
                }
                None => issues.push(
                    Issue::debug(format!("parameter override `{name}` matches no parameter"))
                        .with_code(ErrorCode::E403),
                ),
            }
        }
        issues
    }

    /// Lower the whole template into its canonical document.
    ///
    /// The document is always produced; problems are reported as issues.
    pub fn lower(&self) -> CompileResult {
        debug!(
            parameters = self.parameters.len(),
            resources = self.resources.len(),
            outputs = self.outputs.len();
            "Lowering template"
        );
        let mut issues = IssueCollector::new();
        let mut document = serde_json::Map::new();

        document.insert(
            "AWSTemplateFormatVersion".to_string(),
            Json::from(FORMAT_VERSION),
        );
        if let Some(description) = lower(&self.description, &mut issues) {
            document.insert("Description".to_string(), description);
        }
        insert_section(&mut document, "Parameters", &self.parameters, &mut issues);
        if !self.mappings.is_empty() {
            let mut mappings = serde_json::Map::new();
            for (name, entries) in &self.mappings {
                let mut local = IssueCollector::new();
                mappings.insert(name.clone(), Json::Object(lower_mapping(entries, &mut local)));
                issues.extend_located(local.into_issues(), &format!("Mappings.{name}"));
            }
            document.insert("Mappings".to_string(), Json::Object(mappings));
        }
        insert_section(&mut document, "Resources", &self.resources, &mut issues);
        insert_section(&mut document, "Outputs", &self.outputs, &mut issues);

        self.check_resources(&mut issues);

        CompileResult::new(issues.into_issues(), Some(Json::Object(document)))
    }

    fn check_resources(&self, issues: &mut IssueCollector) {
        if self.resources.is_empty() {
            issues.emit(
                Issue::error("template defines no resources")
                    .with_code(ErrorCode::E400)
                    .with_location("Resources"),
            );
            return;
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.resources.keys() {
            graph.add_node(name.as_str());
        }
        for (name, resource) in &self.resources {
            for dependency in resource.dependency_names() {
                if let Some((known, _)) = self.resources.get_key_value(dependency) {
                    graph.add_edge(name.as_str(), known.as_str(), ());
                } else {
                    issues.emit(
                        Issue::error(format!(
                            "`DependsOn` names unknown resource `{dependency}`"
                        ))
                        .with_code(ErrorCode::E401)
                        .with_location(format!("Resources.{name}")),
                    );
                }
            }
        }

        let mut cycles: Vec<Vec<&str>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || graph.contains_edge(component[0], component[0])
            })
            .collect();
        for cycle in &mut cycles {
            cycle.sort_by_key(|name| self.resources.get_index_of(*name));
        }
        cycles.sort_by_key(|cycle| self.resources.get_index_of(cycle[0]));

        for cycle in cycles {
            let message = match cycle.as_slice() {
                [single] => format!("resource `{single}` depends on itself"),
                names => format!(
                    "resources {} depend on each other in a cycle",
                    names
                        .iter()
                        .map(|name| format!("`{name}`"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            };
            issues.emit(
                Issue::error(message)
                    .with_code(ErrorCode::E402)
                    .with_location(format!("Resources.{}", cycle[0])),
            );
        }
    }
}

fn insert_section<N: CfBuild>(
    document: &mut serde_json::Map<String, Json>,
    section: &str,
    nodes: &IndexMap<String, N>,
    issues: &mut IssueCollector,
) {
    if nodes.is_empty() {
        return;
    }

    let mut object = serde_json::Map::new();
    for (name, node) in nodes {
        let mut local = IssueCollector::new();
        object.insert(name.clone(), lower_node(node, &mut local));
        issues.extend_located(local.into_issues(), &format!("{section}.{name}"));
    }
    document.insert(section.to_string(), Json::Object(object));
}

/// Read-only view of the enclosing template, handed to nested builders.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    template: &'a Template,
}

impl<'a> Scope<'a> {
    /// The template this scope views.
    pub fn template(&self) -> &'a Template {
        self.template
    }

    /// Look up a parameter declared before the current builder ran.
    pub fn parameter(&self, name: &str) -> Option<&'a Parameter> {
        self.template.parameter(name)
    }

    /// Look up a resource declared before the current builder ran.
    pub fn resource(&self, name: &str) -> Option<&'a Resource> {
        self.template.resource(name)
    }

    /// Look up a mapping declared before the current builder ran.
    pub fn mapping(&self, name: &str) -> Option<&'a Mapping> {
        self.template.mapping(name)
    }

    /// `Ref` to `name` if it is a declared parameter or resource.
    pub fn resource_ref(&self, name: &str) -> Option<Call> {
        let declared = self.template.parameters.contains_key(name)
            || self.template.resources.contains_key(name);
        declared.then(|| intrinsic::ref_(name))
    }

    /// Build a `Ref` to `name`, declared or not.
    pub fn ref_(&self, name: impl Into<String>) -> Call {
        intrinsic::ref_(name)
    }

    /// Build an `Fn::GetAtt`.
    pub fn get_att(&self, resource: impl Into<Json>, attribute: impl Into<Json>) -> Call {
        intrinsic::get_att(resource, attribute)
    }

    /// Build an `Fn::Join`.
    pub fn join(&self, separator: impl Into<Json>, items: Vec<Json>) -> Call {
        intrinsic::join(separator, items)
    }

    /// Build an `Fn::Select`.
    pub fn select(&self, index: impl Into<Json>, items: Vec<Json>) -> Call {
        intrinsic::select(index, items)
    }

    /// Build an `Fn::GetAZs` for the current region.
    pub fn get_azs(&self) -> Call {
        intrinsic::get_azs()
    }

    /// Build an `Fn::FindInMap`.
    pub fn find_in_map(
        &self,
        map: impl Into<Json>,
        key: impl Into<Json>,
        value: impl Into<Json>,
    ) -> Call {
        intrinsic::find_in_map(map, key, value)
    }

    /// Build an `Fn::Base64`.
    pub fn base64(&self, content: impl Into<Json>) -> Call {
        intrinsic::base64(content)
    }
}
