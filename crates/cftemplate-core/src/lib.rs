//! cftemplate Core Types and Lowering
//!
//! This crate provides the node graph that every template front end builds and
//! the engine that lowers it into a canonical CloudFormation document. It
//! includes:
//!
//! - **Values**: Attribute values before lowering ([`value::Value`])
//! - **Intrinsics**: Builders for intrinsic function calls ([`intrinsic`] module)
//! - **Diagnostics**: Severity-ordered issues and their collector ([`diagnostic`] module)
//! - **Nodes**: Parameters, resources and outputs ([`node`] module)
//! - **Templates**: Named node collections and their builders ([`template::Template`])
//! - **Lowering**: The recursive lowering engine ([`lower`] module)

pub mod diagnostic;
pub mod intrinsic;
pub mod lower;
pub mod node;
pub mod result;
pub mod template;
pub mod value;

pub use result::CompileResult;
pub use template::{Scope, Template};
