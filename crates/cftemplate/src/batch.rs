//! Batch compilation of every template below an input directory.
//!
//! A batch discovers sources, classifies them by extension, compiles them one
//! at a time in discovery order and counts the errors they report. An I/O
//! failure ends the batch at once; template errors only count against it.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use cftemplate_core::value::ParameterOverrides;

use crate::{
    compiler::{DocumentTemplateCompiler, DslTemplateCompiler, TemplateCompiler},
    config::{AppConfig, CompileConfig},
    discover::{SourceFilter, discover},
    error::CftemplateError,
    paths::{ResourceRoots, output_path},
    report::report_issues,
};

/// Which front end compiles a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.rb` sources, compiled with the template DSL
    Dsl,
    /// `.json` sources, checked and passed through
    Document,
}

impl SourceKind {
    /// Classify `path` by its extension.
    pub fn classify(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "rb" => Some(SourceKind::Dsl),
            "json" => Some(SourceKind::Document),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Dsl => write!(f, "dsl"),
            SourceKind::Document => write!(f, "document"),
        }
    }
}

/// Counts from a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Sources that were compiled
    pub compiled: usize,
    /// Sources matched by the patterns but with no front end
    pub skipped: usize,
    /// Issues at error severity or above, across all sources
    pub failures: usize,
}

impl BatchSummary {
    pub fn succeeded(&self) -> bool {
        self.failures == 0
    }

    /// Turn a summary with failures into [`CftemplateError::BatchFailed`].
    pub fn into_result(self) -> Result<Self, CftemplateError> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(CftemplateError::BatchFailed {
                count: self.failures,
            })
        }
    }
}

/// Compiles all templates selected by a [`CompileConfig`].
pub struct BatchCompiler {
    config: CompileConfig,
    overrides: ParameterOverrides,
    dsl: Box<dyn TemplateCompiler>,
    document: Box<dyn TemplateCompiler>,
    roots: ResourceRoots,
}

impl BatchCompiler {
    /// Create a batch compiler with the built-in front ends.
    pub fn new(config: AppConfig) -> Self {
        let policy = config.compile.write_policy;
        Self::with_compilers(
            config,
            Box::new(DslTemplateCompiler::new(policy)),
            Box::new(DocumentTemplateCompiler::new(policy)),
        )
    }

    /// Create a batch compiler with the given front ends.
    pub fn with_compilers(
        config: AppConfig,
        dsl: Box<dyn TemplateCompiler>,
        document: Box<dyn TemplateCompiler>,
    ) -> Self {
        Self {
            config: config.compile,
            overrides: config.parameters,
            dsl,
            document,
            roots: ResourceRoots::new(),
        }
    }

    /// Output directories registered so far.
    pub fn roots(&self) -> &ResourceRoots {
        &self.roots
    }

    /// Create the output directory and register it.
    fn prepare_output_dir(&mut self) -> Result<&Path, CftemplateError> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|err| CftemplateError::io(output_dir, err))?;
        if self.roots.register(output_dir.clone()) {
            debug!(path:% = output_dir.display(); "Registered output directory");
        }
        Ok(output_dir)
    }

    /// Select the sources to compile, skipping those without a front end.
    fn work_list(
        &self,
        summary: &mut BatchSummary,
    ) -> Result<Vec<(PathBuf, SourceKind)>, CftemplateError> {
        let filter = SourceFilter::new(&self.config.includes, &self.config.excludes)?;

        let mut work = Vec::new();
        for path in discover(&self.config.input_dir, &filter)? {
            match SourceKind::classify(&path) {
                Some(kind) => work.push((path, kind)),
                None => {
                    warn!(path:% = path.display(); "Skipping file with unsupported extension");
                    summary.skipped += 1;
                }
            }
        }
        Ok(work)
    }

    /// Compile every selected source.
    ///
    /// The returned summary may contain failures; see
    /// [`BatchSummary::into_result`].
    ///
    /// # Errors
    ///
    /// Returns an error when a source cannot be read, a document cannot be
    /// written, a pattern is invalid or the input directory cannot be walked.
    pub fn run(&mut self) -> Result<BatchSummary, CftemplateError> {
        let mut summary = BatchSummary::default();

        if !self.config.input_dir.is_dir() {
            info!(
                path:% = self.config.input_dir.display();
                "Input directory does not exist, nothing to compile"
            );
            return Ok(summary);
        }

        // The output directory exists before the walk starts.
        let output_dir = self.prepare_output_dir()?.to_path_buf();
        let work = self.work_list(&mut summary)?;

        if work.is_empty() {
            info!(path:% = self.config.input_dir.display(); "No templates to compile");
            return Ok(summary);
        }

        info!(
            count = work.len(),
            output:% = output_dir.display();
            "Compiling CloudFormation templates"
        );

        for (source, kind) in work {
            let target = output_path(&self.config.input_dir, &output_dir, &source);
            info!(
                source:% = source.display(),
                target:% = target.display(),
                kind:% = kind;
                "Compiling template"
            );

            let compiler = match kind {
                SourceKind::Dsl => &self.dsl,
                SourceKind::Document => &self.document,
            };
            let result = compiler.compile(&source, &target, &self.overrides)?;

            summary.failures += report_issues(&source, result.issues());
            summary.compiled += 1;
        }

        debug!(
            compiled = summary.compiled,
            skipped = summary.skipped,
            failures = summary.failures;
            "Batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(SourceKind::classify(Path::new("a/web.stack.rb")), Some(SourceKind::Dsl));
        assert_eq!(
            SourceKind::classify(Path::new("db.stack.json")),
            Some(SourceKind::Document)
        );
        assert_eq!(SourceKind::classify(Path::new("notes.txt")), None);
        assert_eq!(SourceKind::classify(Path::new("Makefile")), None);
    }

    #[test]
    fn test_summary_decides() {
        let summary = BatchSummary {
            compiled: 2,
            skipped: 0,
            failures: 0,
        };
        assert!(summary.into_result().is_ok());

        let failed = BatchSummary {
            failures: 3,
            ..summary
        };
        assert!(matches!(
            failed.into_result(),
            Err(CftemplateError::BatchFailed { count: 3 })
        ));
    }
}
