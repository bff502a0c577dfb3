//! Template resources.
//!
//! Three resource kinds are modelled explicitly (wait condition handles, wait
//! conditions and nested stacks); everything else is a [`GenericResource`]
//! carrying its type string and free-form properties.

use std::fmt;

use crate::{
    diagnostic::{ErrorCode, Issue},
    node::{CfBuild, NodeKind},
    value::{Mapping, Value, merge_mapping},
};

const WAIT_CONDITION_HANDLE_TYPE: &str = "AWS::CloudFormation::WaitConditionHandle";
const WAIT_CONDITION_TYPE: &str = "AWS::CloudFormation::WaitCondition";
const STACK_TYPE: &str = "AWS::CloudFormation::Stack";

/// What happens to a resource when its stack is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
    /// Any other policy, emitted exactly as given.
    Other(String),
}

impl DeletionPolicy {
    /// The policy as it appears in the document.
    pub fn as_str(&self) -> &str {
        match self {
            DeletionPolicy::Delete => "Delete",
            DeletionPolicy::Retain => "Retain",
            DeletionPolicy::Snapshot => "Snapshot",
            DeletionPolicy::Other(policy) => policy,
        }
    }
}

/// Maps the lowercase symbols `delete`, `retain` and `snapshot`; anything
/// else passes through unchanged.
impl From<&str> for DeletionPolicy {
    fn from(policy: &str) -> Self {
        match policy {
            "delete" => DeletionPolicy::Delete,
            "retain" => DeletionPolicy::Retain,
            "snapshot" => DeletionPolicy::Snapshot,
            other => DeletionPolicy::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared template resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    kind: ResourceKind,
    metadata: Mapping,
    depends_on: Value,
    deletion_policy: Option<DeletionPolicy>,
}

/// The concrete kind of a [`Resource`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    WaitConditionHandle,
    WaitCondition(WaitCondition),
    Stack(StackReference),
    Generic(GenericResource),
}

impl Resource {
    /// Create a resource of `kind` with no metadata, dependencies or policy.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            metadata: Mapping::new(),
            depends_on: Value::Absent,
            deletion_policy: None,
        }
    }

    /// Create an `AWS::CloudFormation::WaitConditionHandle`.
    pub fn wait_condition_handle() -> Self {
        Self::new(ResourceKind::WaitConditionHandle)
    }

    /// Create an `AWS::CloudFormation::WaitCondition` with no handle yet.
    pub fn wait_condition() -> Self {
        Self::new(ResourceKind::WaitCondition(WaitCondition::default()))
    }

    /// Create a nested `AWS::CloudFormation::Stack`.
    pub fn stack() -> Self {
        Self::new(ResourceKind::Stack(StackReference::default()))
    }

    /// Create a generic resource of `resource_type`.
    pub fn generic(resource_type: impl Into<String>) -> Self {
        Self::new(ResourceKind::Generic(GenericResource {
            resource_type: Some(resource_type.into()),
            properties: Mapping::new(),
        }))
    }

    /// Create a generic resource whose type is set later.
    pub fn untyped() -> Self {
        Self::new(ResourceKind::Generic(GenericResource::default()))
    }

    /// The node kind matching this resource's [`ResourceKind`].
    pub fn kind(&self) -> NodeKind {
        match self.kind {
            ResourceKind::WaitConditionHandle => NodeKind::WaitConditionHandle,
            ResourceKind::WaitCondition(_) => NodeKind::WaitCondition,
            ResourceKind::Stack(_) => NodeKind::Stack,
            ResourceKind::Generic(_) => NodeKind::GenericResource,
        }
    }

    /// The kind-specific attributes.
    pub fn resource_kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// The `Type` emitted for this resource, if known.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::WaitConditionHandle => Some(WAIT_CONDITION_HANDLE_TYPE),
            ResourceKind::WaitCondition(_) => Some(WAIT_CONDITION_TYPE),
            ResourceKind::Stack(_) => Some(STACK_TYPE),
            ResourceKind::Generic(generic) => generic.resource_type.as_deref(),
        }
    }

    /// The wait condition attributes, if this is a wait condition.
    pub fn as_wait_condition(&self) -> Option<&WaitCondition> {
        match &self.kind {
            ResourceKind::WaitCondition(wait) => Some(wait),
            _ => None,
        }
    }

    /// Mutable wait condition attributes, if this is a wait condition.
    pub fn as_wait_condition_mut(&mut self) -> Option<&mut WaitCondition> {
        match &mut self.kind {
            ResourceKind::WaitCondition(wait) => Some(wait),
            _ => None,
        }
    }

    /// Mutable nested stack attributes, if this is a nested stack.
    pub fn as_stack_mut(&mut self) -> Option<&mut StackReference> {
        match &mut self.kind {
            ResourceKind::Stack(stack) => Some(stack),
            _ => None,
        }
    }

    /// Mutable generic attributes, if this resource has no dedicated kind.
    pub fn as_generic_mut(&mut self) -> Option<&mut GenericResource> {
        match &mut self.kind {
            ResourceKind::Generic(generic) => Some(generic),
            _ => None,
        }
    }

    /// The `Metadata` entries in insertion order.
    pub fn metadata(&self) -> &Mapping {
        &self.metadata
    }

    /// Merge `metadata` into the existing metadata.
    pub fn set_metadata(&mut self, metadata: Mapping) -> &mut Self {
        merge_mapping(&mut self.metadata, metadata);
        self
    }

    /// Set one metadata entry, replacing any entry with the same key.
    pub fn set_metadata_entry(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The dependencies: a single name, a sequence of names or absent.
    pub fn depends_on(&self) -> &Value {
        &self.depends_on
    }

    /// Set the dependencies. A single name is stored as itself.
    pub fn set_depends_on<I, V>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.depends_on = Value::one_or_many(names.into_iter().map(Into::into));
        self
    }

    /// Names of the resources this one depends on.
    ///
    /// Entries that are not plain strings are skipped.
    pub fn dependency_names(&self) -> Vec<&str> {
        match &self.depends_on {
            Value::String(name) => vec![name.as_str()],
            Value::Sequence(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The deletion policy, if one was set.
    pub fn deletion_policy(&self) -> Option<&DeletionPolicy> {
        self.deletion_policy.as_ref()
    }

    /// Set the `DeletionPolicy`. Lowercase symbols map to the known policies.
    pub fn set_deletion_policy(&mut self, policy: impl Into<DeletionPolicy>) -> &mut Self {
        self.deletion_policy = Some(policy.into());
        self
    }
}

impl CfBuild for Resource {
    fn cf_build(&self) -> (Mapping, Vec<Issue>) {
        let mut map = Mapping::new();
        let mut issues = Vec::new();

        match self.type_name() {
            Some(type_name) => {
                map.insert("Type".to_string(), Value::from(type_name));
            }
            None => issues.push(
                Issue::warn("resource has no type, `Type` is omitted")
                    .with_code(ErrorCode::E301),
            ),
        }

        let properties = match &self.kind {
            ResourceKind::WaitConditionHandle => Mapping::new(),
            ResourceKind::WaitCondition(wait) => wait.properties(&mut issues),
            ResourceKind::Stack(stack) => stack.properties(),
            ResourceKind::Generic(generic) => present(&generic.properties),
        };
        if !properties.is_empty() {
            map.insert("Properties".to_string(), Value::Mapping(properties));
        }
        let metadata = present(&self.metadata);
        if !metadata.is_empty() {
            map.insert("Metadata".to_string(), Value::Mapping(metadata));
        }
        map.insert("DependsOn".to_string(), self.depends_on.clone());
        if let Some(policy) = &self.deletion_policy {
            map.insert("DeletionPolicy".to_string(), Value::from(policy.as_str()));
        }
        (map, issues)
    }
}

/// Attributes of an `AWS::CloudFormation::WaitCondition`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaitCondition {
    handle: Value,
    timeout: Value,
    count: Value,
}

impl WaitCondition {
    /// The handle reference, or [`Value::Absent`] when unset.
    pub fn handle(&self) -> &Value {
        &self.handle
    }

    /// Whether a handle has been set.
    pub fn has_handle(&self) -> bool {
        !self.handle.is_absent()
    }

    /// Set the `Handle`, usually a `Ref` to a wait condition handle.
    pub fn set_handle(&mut self, handle: impl Into<Value>) -> &mut Self {
        self.handle = handle.into();
        self
    }

    /// The timeout as given.
    pub fn timeout(&self) -> &Value {
        &self.timeout
    }

    /// Set the timeout. Integers and durations are seconds.
    pub fn set_timeout(&mut self, timeout: impl Into<Value>) -> &mut Self {
        self.timeout = timeout.into();
        self
    }

    /// The number of success signals to wait for.
    pub fn count(&self) -> &Value {
        &self.count
    }

    /// Set the `Count`.
    pub fn set_count(&mut self, count: impl Into<Value>) -> &mut Self {
        self.count = count.into();
        self
    }

    fn properties(&self, issues: &mut Vec<Issue>) -> Mapping {
        if !self.has_handle() {
            issues.push(
                Issue::warn("wait condition has no handle")
                    .with_code(ErrorCode::E304),
            );
        }

        // The document types `Timeout` as a string of seconds.
        let timeout = match &self.timeout {
            Value::Int(seconds) => Value::String(seconds.to_string()),
            other => other.clone(),
        };

        let mut map = Mapping::new();
        map.insert("Handle".to_string(), self.handle.clone());
        map.insert("Timeout".to_string(), timeout);
        map.insert("Count".to_string(), self.count.clone());
        map.retain(|_, value| !value.is_absent());
        map
    }
}

/// Attributes of a nested `AWS::CloudFormation::Stack`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StackReference {
    template_url: Value,
    timeout_minutes: Value,
    parameters: Mapping,
}

impl StackReference {
    /// The nested template location.
    pub fn template_url(&self) -> &Value {
        &self.template_url
    }

    /// Set the `TemplateURL`.
    pub fn set_template_url(&mut self, url: impl Into<Value>) -> &mut Self {
        self.template_url = url.into();
        self
    }

    /// The timeout in minutes, or [`Value::Absent`] when unset.
    pub fn timeout_minutes(&self) -> &Value {
        &self.timeout_minutes
    }

    /// Set the `TimeoutInMinutes`.
    pub fn set_timeout_minutes(&mut self, minutes: impl Into<Value>) -> &mut Self {
        self.timeout_minutes = minutes.into();
        self
    }

    /// Parameters passed to the nested stack.
    pub fn parameters(&self) -> &Mapping {
        &self.parameters
    }

    /// Merge `parameters` into the stack parameters.
    pub fn set_parameters(&mut self, parameters: Mapping) -> &mut Self {
        merge_mapping(&mut self.parameters, parameters);
        self
    }

    /// Set one nested stack parameter, replacing any with the same name.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    fn properties(&self) -> Mapping {
        let mut map = Mapping::new();
        map.insert("TemplateURL".to_string(), self.template_url.clone());
        map.insert("TimeoutInMinutes".to_string(), self.timeout_minutes.clone());
        let parameters = present(&self.parameters);
        if !parameters.is_empty() {
            map.insert("Parameters".to_string(), Value::Mapping(parameters));
        }
        map.retain(|_, value| !value.is_absent());
        map
    }
}

/// The entries of `map` that lowering keeps.
fn present(map: &Mapping) -> Mapping {
    map.iter()
        .filter(|(_, value)| !value.is_absent())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Any resource type without a dedicated kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericResource {
    resource_type: Option<String>,
    properties: Mapping,
}

impl GenericResource {
    /// The resource type, or `None` until one is set.
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// Set the `Type`.
    pub fn set_resource_type(&mut self, resource_type: impl Into<String>) -> &mut Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// The `Properties` entries in insertion order.
    pub fn properties(&self) -> &Mapping {
        &self.properties
    }

    /// Merge `properties` into the existing properties.
    pub fn set_properties(&mut self, properties: Mapping) -> &mut Self {
        merge_mapping(&mut self.properties, properties);
        self
    }

    /// Set one property, replacing any property with the same name.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{intrinsic::ref_, value::mapping};

    #[test]
    fn test_deletion_policy_from_symbol() {
        assert_eq!(DeletionPolicy::from("delete"), DeletionPolicy::Delete);
        assert_eq!(DeletionPolicy::from("retain"), DeletionPolicy::Retain);
        assert_eq!(DeletionPolicy::from("snapshot"), DeletionPolicy::Snapshot);
        assert_eq!(
            DeletionPolicy::from("Retain"),
            DeletionPolicy::Other("Retain".to_string())
        );
        assert_eq!(DeletionPolicy::from("RetainExceptOnCreate").as_str(), "RetainExceptOnCreate");
    }

    #[test]
    fn test_generic_resource_build() {
        let mut resource = Resource::generic("AWS::S3::Bucket");
        resource
            .set_depends_on(["otherResource"])
            .as_generic_mut()
            .unwrap()
            .set_property("BucketName", ref_("myBucketParam"));

        let (map, issues) = resource.cf_build();

        assert!(issues.is_empty());
        assert_eq!(map["Type"], Value::from("AWS::S3::Bucket"));
        assert_eq!(map["DependsOn"], Value::from("otherResource"));
        let Value::Mapping(properties) = &map["Properties"] else {
            panic!("Expected properties mapping");
        };
        assert_eq!(properties["BucketName"], Value::Call(ref_("myBucketParam")));
        assert!(!map.contains_key("Metadata"));
        assert!(!map.contains_key("DeletionPolicy"));
    }

    #[test]
    fn test_untyped_resource_warns() {
        let (map, issues) = Resource::untyped().cf_build();

        assert!(!map.contains_key("Type"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code(), Some(ErrorCode::E301));
        assert!(!issues[0].is_failure());
    }

    #[test]
    fn test_metadata_merges() {
        let mut resource = Resource::wait_condition_handle();
        resource.set_metadata(mapping([("Owner", "ops"), ("Tier", "web")]));
        resource.set_metadata(mapping([("Owner", "dev")]));

        assert_eq!(resource.metadata().len(), 2);
        assert_eq!(resource.metadata()["Owner"], Value::from("dev"));
    }

    #[test]
    fn test_depends_on_many() {
        let mut resource = Resource::wait_condition_handle();
        resource.set_depends_on(vec![
            Value::from("A"),
            Value::Sequence(vec![Value::from("B"), Value::from("C")]),
        ]);

        assert_eq!(resource.dependency_names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_wait_condition_properties() {
        let mut resource = Resource::wait_condition();
        resource
            .as_wait_condition_mut()
            .unwrap()
            .set_handle(ref_("ReadyHandle"))
            .set_timeout(std::time::Duration::from_secs(600))
            .set_count(2);

        let (map, issues) = resource.cf_build();

        assert!(issues.is_empty());
        assert_eq!(map["Type"], Value::from("AWS::CloudFormation::WaitCondition"));
        let Value::Mapping(properties) = &map["Properties"] else {
            panic!("Expected properties mapping");
        };
        let keys: Vec<_> = properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Handle", "Timeout", "Count"]);
        assert_eq!(properties["Timeout"], Value::from("600"));
    }

    #[test]
    fn test_wait_condition_without_handle_warns() {
        let (_, issues) = Resource::wait_condition().cf_build();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code(), Some(ErrorCode::E304));
    }

    #[test]
    fn test_stack_properties() {
        let mut resource = Resource::stack();
        resource
            .set_deletion_policy("retain")
            .as_stack_mut()
            .unwrap()
            .set_template_url("https://example.com/net.json")
            .set_parameters(mapping([("Cidr", "10.0.0.0/16")]));

        let (map, issues) = resource.cf_build();

        assert!(issues.is_empty());
        assert_eq!(map["DeletionPolicy"], Value::from("Retain"));
        let Value::Mapping(properties) = &map["Properties"] else {
            panic!("Expected properties mapping");
        };
        assert!(!properties.contains_key("TimeoutInMinutes"));
        assert_eq!(
            properties["TemplateURL"],
            Value::from("https://example.com/net.json")
        );
    }

    #[test]
    fn test_absent_only_properties_are_omitted() {
        let mut resource = Resource::generic("AWS::SNS::Topic");
        resource
            .set_metadata_entry("Owner", Value::Absent)
            .as_generic_mut()
            .unwrap()
            .set_property("TopicName", Value::Absent);

        let (map, issues) = resource.cf_build();

        assert!(issues.is_empty());
        assert!(!map.contains_key("Properties"));
        assert!(!map.contains_key("Metadata"));
    }

    #[test]
    fn test_stack_with_absent_parameters() {
        let mut resource = Resource::stack();
        resource
            .as_stack_mut()
            .unwrap()
            .set_template_url("https://example.com/net.json")
            .set_parameter("Cidr", Value::Absent);

        let (map, _) = resource.cf_build();

        let Value::Mapping(properties) = &map["Properties"] else {
            panic!("Expected properties mapping");
        };
        assert!(!properties.contains_key("Parameters"));
    }

    #[test]
    fn test_handle_has_no_properties() {
        let (map, _) = Resource::wait_condition_handle().cf_build();
        assert!(!map.contains_key("Properties"));
    }
}
