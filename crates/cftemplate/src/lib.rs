//! cftemplate - compile CloudFormation template sources into canonical documents
//!
//! This library ties the front ends to the filesystem. It finds `*.stack.rb`
//! and `*.stack.json` sources below an input directory, compiles each one
//! with the matching front end, writes the documents to a mirrored tree
//! under an output directory and reports every issue at its own log level.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cftemplate::{compile_all, config::AppConfig};
//!
//! let mut config = AppConfig::default();
//! config.compile.input_dir = "templates".into();
//! config.compile.output_dir = "target/cloudformation".into();
//!
//! match compile_all(config) {
//!     Ok(summary) => println!("compiled {} templates", summary.compiled),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

pub mod batch;
pub mod compiler;
pub mod config;
pub mod discover;
pub mod document;
pub mod paths;

mod error;
mod report;

pub use cftemplate_core::{CompileResult, Template, diagnostic, intrinsic, node, value};

pub use batch::{BatchCompiler, BatchSummary, SourceKind};
pub use error::CftemplateError;

use config::AppConfig;

/// Compile every template selected by `config`.
///
/// # Errors
///
/// Returns [`CftemplateError::BatchFailed`] when any template reported an
/// error, or the error that aborted the batch.
pub fn compile_all(config: AppConfig) -> Result<BatchSummary, CftemplateError> {
    BatchCompiler::new(config).run()?.into_result()
}
