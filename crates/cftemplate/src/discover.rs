//! Discovery of template sources below an input directory.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::{debug, trace};
use walkdir::WalkDir;

use crate::error::CftemplateError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Include and exclude patterns matched against file names.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl SourceFilter {
    /// Compile the include and exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns [`CftemplateError::Pattern`] for the first invalid pattern.
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self, CftemplateError> {
        Ok(Self {
            includes: compile_patterns(includes)?,
            excludes: compile_patterns(excludes)?,
        })
    }

    /// Returns `true` if `file_name` matches an include and no exclude.
    pub fn matches(&self, file_name: &str) -> bool {
        let matches_any = |patterns: &[Pattern]| {
            patterns
                .iter()
                .any(|p| p.matches_with(file_name, MATCH_OPTIONS))
        };
        matches_any(&self.includes) && !matches_any(&self.excludes)
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, CftemplateError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| CftemplateError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Find every file below `root` whose name passes `filter`.
///
/// Entries are visited sorted by file name, so the result is the same on
/// every run.
///
/// # Errors
///
/// Returns [`CftemplateError::Walk`] if a directory cannot be read.
pub fn discover(root: &Path, filter: &SourceFilter) -> Result<Vec<PathBuf>, CftemplateError> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if filter.matches(&file_name) {
            trace!(path:% = entry.path().display(); "Discovered source");
            sources.push(entry.into_path());
        }
    }

    debug!(root:% = root.display(), count = sources.len(); "Discovered sources");
    Ok(sources)
}
