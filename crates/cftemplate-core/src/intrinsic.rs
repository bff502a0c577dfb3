//! Intrinsic function builders.
//!
//! Each builder is a pure constructor over already-resolved JSON values and
//! returns a tagged [`Call`]. Calls are opaque leaves of the node graph: they
//! never hold unlowered nodes, so lowering a call is just emitting its tag.
//!
//! ```
//! # use cftemplate_core::intrinsic::{join, ref_};
//! # use serde_json::json;
//! let call = join("-", vec![json!("app"), ref_("AWS::StackName").into()]);
//! assert_eq!(
//!     call.to_json(),
//!     json!({"Fn::Join": ["-", ["app", {"Ref": "AWS::StackName"}]]})
//! );
//! ```

use std::fmt;

use serde_json::json;

use crate::value::Json;

/// Names of the supported intrinsic functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Ref,
    Select,
    GetAzs,
    FindInMap,
    GetAtt,
    Base64,
    Join,
}

impl Intrinsic {
    /// The key this function is tagged with in the document.
    pub fn tag(&self) -> &'static str {
        match self {
            Intrinsic::Ref => "Ref",
            Intrinsic::Select => "Fn::Select",
            Intrinsic::GetAzs => "Fn::GetAZs",
            Intrinsic::FindInMap => "Fn::FindInMap",
            Intrinsic::GetAtt => "Fn::GetAtt",
            Intrinsic::Base64 => "Fn::Base64",
            Intrinsic::Join => "Fn::Join",
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A tagged intrinsic function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    function: Intrinsic,
    argument: Json,
}

impl Call {
    fn new(function: Intrinsic, argument: Json) -> Self {
        Self { function, argument }
    }

    /// The function this call invokes.
    pub fn function(&self) -> Intrinsic {
        self.function
    }

    /// The resolved argument of the call.
    pub fn argument(&self) -> &Json {
        &self.argument
    }

    /// The canonical `{tag: argument}` form.
    pub fn to_json(&self) -> Json {
        let mut map = serde_json::Map::new();
        map.insert(self.function.tag().to_string(), self.argument.clone());
        Json::Object(map)
    }
}

impl From<Call> for Json {
    fn from(call: Call) -> Self {
        call.to_json()
    }
}

/// Apply the variadic flatten-or-wrap rule.
///
/// A single sequence argument is unwrapped first; the result is then
/// flattened one level, so `[[a, b]]`, `[a, b]` and `a, b` all give `[a, b]`.
fn flatten_variadic(mut items: Vec<Json>) -> Vec<Json> {
    if items.len() == 1 && items[0].is_array() {
        if let Some(Json::Array(inner)) = items.pop() {
            items = inner;
        }
    }

    let mut flat = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Json::Array(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat
}

/// `Fn::Select` of `index` from `items`.
pub fn select(index: impl Into<Json>, items: Vec<Json>) -> Call {
    Call::new(
        Intrinsic::Select,
        json!([index.into(), flatten_variadic(items)]),
    )
}

/// `Fn::Join` of `items` with `separator`.
pub fn join(separator: impl Into<Json>, items: Vec<Json>) -> Call {
    Call::new(
        Intrinsic::Join,
        json!([separator.into(), flatten_variadic(items)]),
    )
}

/// `Fn::GetAZs` for the current region.
pub fn get_azs() -> Call {
    get_azs_in(ref_("AWS::Region"))
}

/// `Fn::GetAZs` for an explicit region.
pub fn get_azs_in(region: impl Into<Json>) -> Call {
    Call::new(Intrinsic::GetAzs, region.into())
}

/// `Ref` to a parameter, resource or pseudo parameter.
///
/// Named with a trailing underscore because `ref` is a keyword.
pub fn ref_(name: impl Into<String>) -> Call {
    Call::new(Intrinsic::Ref, Json::String(name.into()))
}

/// `Fn::FindInMap` lookup.
pub fn find_in_map(map: impl Into<Json>, key: impl Into<Json>, value: impl Into<Json>) -> Call {
    Call::new(
        Intrinsic::FindInMap,
        json!([map.into(), key.into(), value.into()]),
    )
}

/// `Fn::GetAtt` of a resource attribute.
pub fn get_att(resource: impl Into<Json>, attribute: impl Into<Json>) -> Call {
    Call::new(Intrinsic::GetAtt, json!([resource.into(), attribute.into()]))
}

/// `Fn::Base64` encoding of `content`.
pub fn base64(content: impl Into<Json>) -> Call {
    Call::new(Intrinsic::Base64, content.into())
}
