//! The issue record shared by every compile phase.

use std::fmt;

use crate::diagnostic::{ErrorCode, Severity};

/// A severity-tagged compile message, optionally located.
///
/// Issues are built once and then only read:
///
/// ```
/// # use cftemplate_core::diagnostic::{ErrorCode, Issue, Severity};
/// let issue = Issue::error("unsupported length `\"abc\"`")
///     .with_code(ErrorCode::E300)
///     .with_location("Parameters.Name");
///
/// assert_eq!(issue.severity(), Severity::Error);
/// assert_eq!(issue.to_string(), "Parameters.Name\nunsupported length `\"abc\"`");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    location: Option<String>,
}

impl Issue {
    /// Create an issue with the given severity and message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            location: None,
        }
    }

    /// Create a debug issue.
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, message)
    }

    /// Create an info issue.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Create a warning issue.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    /// Create an error issue.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Get the severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the location, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns `true` if this issue fails compilation.
    pub fn is_failure(&self) -> bool {
        self.severity.is_failure()
    }

    /// Returns the report channel this issue is routed to.
    pub fn classify(&self) -> log::Level {
        self.severity.log_level()
    }

    /// Set the location only if the issue has none yet.
    pub(crate) fn or_location(mut self, location: &str) -> Self {
        if self.location.is_none() {
            self.location = Some(location.to_string());
        }
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}\n{}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_new() {
        let issue = Issue::new(Severity::Warn, "unused mapping");

        assert_eq!(issue.severity(), Severity::Warn);
        assert_eq!(issue.message(), "unused mapping");
        assert!(issue.code().is_none());
        assert!(issue.location().is_none());
        assert!(!issue.is_failure());
    }

    #[test]
    fn test_issue_display_without_location() {
        let issue = Issue::info("compiled 3 resources");
        assert_eq!(issue.to_string(), "compiled 3 resources");
    }

    #[test]
    fn test_issue_display_with_location() {
        let issue = Issue::error("no value").with_location("Outputs.Url");
        assert_eq!(issue.to_string(), "Outputs.Url\nno value");
    }

    #[test]
    fn test_issue_classify() {
        assert_eq!(Issue::debug("d").classify(), log::Level::Debug);
        assert_eq!(Issue::info("i").classify(), log::Level::Info);
        assert_eq!(Issue::warn("w").classify(), log::Level::Warn);
        assert_eq!(Issue::error("e").classify(), log::Level::Error);
    }

    #[test]
    fn test_or_location_keeps_existing() {
        let issue = Issue::error("bad").with_location("a.rb:1:1");
        let issue = issue.or_location("Resources.Bucket");
        assert_eq!(issue.location(), Some("a.rb:1:1"));

        let issue = Issue::error("bad").or_location("Resources.Bucket");
        assert_eq!(issue.location(), Some("Resources.Bucket"));
    }
}
