use std::path::Path;

use log::log;

use cftemplate_core::diagnostic::Issue;

/// Log every issue of `source` at the level of its severity.
///
/// Returns the number of issues at error severity or above.
pub fn report_issues(source: &Path, issues: &[Issue]) -> usize {
    let mut failures = 0;
    for issue in issues {
        if issue.is_failure() {
            failures += 1;
        }
        log!(issue.classify(), source:% = source.display(); "{issue}");
    }
    failures
}
