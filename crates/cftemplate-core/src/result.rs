use crate::{diagnostic::Issue, value::Json};

/// Issues and canonical output of compiling one source.
///
/// The output is best-effort: it is present even when errors were reported,
/// unless the front end could not build any structure at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompileResult {
    issues: Vec<Issue>,
    output: Option<Json>,
}

impl CompileResult {
    /// Bundle `issues` with the output built for them.
    pub fn new(issues: Vec<Issue>, output: Option<Json>) -> Self {
        Self { issues, output }
    }

    /// A result with issues and no output.
    pub fn failed(issues: Vec<Issue>) -> Self {
        Self::new(issues, None)
    }

    /// Issues in the order they were reported.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// The canonical document, when one could be built.
    pub fn output(&self) -> Option<&Json> {
        self.output.as_ref()
    }

    /// Number of issues at error severity or above.
    pub fn failure_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_failure()).count()
    }

    /// Whether any issue is at error severity or above.
    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(Issue::is_failure)
    }

    /// Split into issues and output.
    pub fn into_parts(self) -> (Vec<Issue>, Option<Json>) {
        (self.issues, self.output)
    }
}
