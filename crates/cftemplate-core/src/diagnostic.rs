//! Diagnostic model shared by every compile phase.
//!
//! This module provides:
//! - A totally ordered [`Severity`] taxonomy
//! - The [`Issue`] record with optional code and location
//! - Error codes for documentation and searchability
//! - An [`IssueCollector`] for accumulating issues without aborting
//!
//! # Example
//!
//! ```
//! # use cftemplate_core::diagnostic::{ErrorCode, Issue, IssueCollector};
//! let mut collector = IssueCollector::new();
//! collector.emit(
//!     Issue::error("`DependsOn` names unknown resource `Queue`")
//!         .with_code(ErrorCode::E401)
//!         .with_location("Resources.Worker"),
//! );
//! assert!(collector.has_failures());
//! ```

mod collector;
mod error_code;
mod issue;
mod severity;

pub use collector::IssueCollector;
pub use error_code::ErrorCode;
pub use issue::Issue;
pub use severity::Severity;
