//! Collector for accumulating issues during a compile phase.
//!
//! The [`IssueCollector`] lets every phase report as many issues as it finds
//! instead of stopping at the first one.

use crate::diagnostic::Issue;

/// An ordered accumulator of [`Issue`]s.
///
/// # Example
///
/// ```
/// # use cftemplate_core::diagnostic::{Issue, IssueCollector};
/// let mut collector = IssueCollector::new();
///
/// collector.emit(Issue::warn("parameter `Env` is never referenced"));
/// collector.emit(Issue::error("resource `Bucket` has no type"));
///
/// assert_eq!(collector.failure_count(), 1);
/// assert_eq!(collector.into_issues().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<Issue>,
    failures: usize,
}

impl IssueCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an issue to this collector.
    pub fn emit(&mut self, issue: Issue) {
        if issue.is_failure() {
            self.failures += 1;
        }
        self.issues.push(issue);
    }

    /// Emit every issue of `issues`, keeping their order.
    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.emit(issue);
        }
    }

    /// Emit `issues`, stamping `location` onto those that have none.
    pub fn extend_located(&mut self, issues: impl IntoIterator<Item = Issue>, location: &str) {
        for issue in issues {
            self.emit(issue.or_location(location));
        }
    }

    /// Number of issues at error severity or above.
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Returns `true` if any failure was emitted.
    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }

    /// Returns `true` if nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Borrow the collected issues.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Finish collection and return the issues in emission order.
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_new_is_empty() {
        let collector = IssueCollector::new();
        assert!(collector.is_empty());
        assert!(!collector.has_failures());
    }

    #[test]
    fn test_collector_warnings_are_not_failures() {
        let mut collector = IssueCollector::new();

        collector.emit(Issue::warn("warning 1"));
        collector.emit(Issue::info("info 1"));
        collector.emit(Issue::debug("debug 1"));

        assert_eq!(collector.failure_count(), 0);
        assert_eq!(collector.issues().len(), 3);
    }

    #[test]
    fn test_collector_counts_each_error() {
        let mut collector = IssueCollector::new();

        collector.emit(Issue::error("error 1"));
        collector.emit(Issue::warn("warning 1"));
        collector.emit(Issue::error("error 2"));

        assert_eq!(collector.failure_count(), 2);
        let issues = collector.into_issues();
        assert_eq!(issues[0].message(), "error 1");
        assert_eq!(issues[2].message(), "error 2");
    }

    #[test]
    fn test_extend_located() {
        let mut collector = IssueCollector::new();

        collector.extend_located(
            vec![
                Issue::error("no type"),
                Issue::warn("odd").with_location("stack.rb:3:1"),
            ],
            "Resources.Bucket",
        );

        let issues = collector.into_issues();
        assert_eq!(issues[0].location(), Some("Resources.Bucket"));
        assert_eq!(issues[1].location(), Some("stack.rb:3:1"));
    }
}
