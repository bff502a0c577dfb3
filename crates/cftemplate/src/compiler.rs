//! Front-end compilers.
//!
//! A [`TemplateCompiler`] reads one source, compiles it and writes the
//! resulting document. Template problems come back as issues on the
//! [`CompileResult`]; only reading and writing fail with an error.

use std::{fs, io::ErrorKind, path::Path};

use log::{debug, info, warn};

use cftemplate_core::{
    CompileResult,
    diagnostic::{ErrorCode, Issue},
    value::ParameterOverrides,
};

use crate::{config::WritePolicy, document, error::CftemplateError};

/// Compiles a single source file into a document on disk.
pub trait TemplateCompiler {
    /// Compile `source` and write the document to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error only when `source` cannot be read or `target` cannot
    /// be written.
    fn compile(
        &self,
        source: &Path,
        target: &Path,
        overrides: &ParameterOverrides,
    ) -> Result<CompileResult, CftemplateError>;
}

/// Compiles `*.stack.rb` sources with the template DSL.
#[derive(Debug, Clone, Copy, Default)]
pub struct DslTemplateCompiler {
    write_policy: WritePolicy,
}

impl DslTemplateCompiler {
    pub fn new(write_policy: WritePolicy) -> Self {
        Self { write_policy }
    }
}

impl TemplateCompiler for DslTemplateCompiler {
    fn compile(
        &self,
        source: &Path,
        target: &Path,
        overrides: &ParameterOverrides,
    ) -> Result<CompileResult, CftemplateError> {
        let result = compile_source(source, |text, name| {
            cftemplate_dsl::compile(text, name, overrides)
        })?;
        write_output(target, &result, self.write_policy)?;
        Ok(result)
    }
}

/// Checks `*.stack.json` sources that are already documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTemplateCompiler {
    write_policy: WritePolicy,
}

impl DocumentTemplateCompiler {
    pub fn new(write_policy: WritePolicy) -> Self {
        Self { write_policy }
    }
}

impl TemplateCompiler for DocumentTemplateCompiler {
    fn compile(
        &self,
        source: &Path,
        target: &Path,
        overrides: &ParameterOverrides,
    ) -> Result<CompileResult, CftemplateError> {
        let result = compile_source(source, |text, name| {
            document::check_document(text, name, overrides)
        })?;
        write_output(target, &result, self.write_policy)?;
        Ok(result)
    }
}

/// Read `source` and hand its text to `compile`.
///
/// A source that is not UTF-8 fails as a template, not as the batch.
fn compile_source(
    source: &Path,
    compile: impl FnOnce(&str, &str) -> CompileResult,
) -> Result<CompileResult, CftemplateError> {
    debug!(path:% = source.display(); "Reading source");
    let name = source.display().to_string();
    match fs::read_to_string(source) {
        Ok(text) => Ok(compile(&text, &name)),
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            warn!(path:% = source.display(); "Source is not valid UTF-8");
            let issue = Issue::error("source is not valid UTF-8")
                .with_code(ErrorCode::E006)
                .with_location(name);
            Ok(CompileResult::failed(vec![issue]))
        }
        Err(err) => Err(CftemplateError::io(source, err)),
    }
}

/// Write the document of `result` to `target` as pretty JSON.
///
/// Returns `false` when nothing was written: the result has no document, or
/// `policy` suppresses a result with errors. Missing parent directories of
/// `target` are created.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized or written.
pub fn write_output(
    target: &Path,
    result: &CompileResult,
    policy: WritePolicy,
) -> Result<bool, CftemplateError> {
    let Some(document) = result.output() else {
        debug!(path:% = target.display(); "No document to write");
        return Ok(false);
    };
    if !policy.should_write(result.has_failures()) {
        info!(path:% = target.display(); "Skipping output for template with errors");
        return Ok(false);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| CftemplateError::io(parent, err))?;
    }

    let mut text =
        serde_json::to_string_pretty(document).map_err(|source| CftemplateError::Serialize {
            path: target.to_path_buf(),
            source,
        })?;
    text.push('\n');
    fs::write(target, text).map_err(|err| CftemplateError::io(target, err))?;

    debug!(path:% = target.display(); "Wrote document");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_write_output_pretty_with_newline() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/app.stack.json");
        let result = CompileResult::new(Vec::new(), Some(json!({"Resources": {}})));

        assert!(write_output(&target, &result, WritePolicy::Always).unwrap());
        let text = fs::read_to_string(&target).unwrap();
        assert_eq!(text, "{\n  \"Resources\": {}\n}\n");
    }

    #[test]
    fn test_write_output_skip_on_error() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("app.stack.json");
        let result = CompileResult::new(vec![Issue::error("broken")], Some(json!({})));

        assert!(!write_output(&target, &result, WritePolicy::SkipOnError).unwrap());
        assert!(!target.exists());
        assert!(write_output(&target, &result, WritePolicy::Always).unwrap());
        assert!(target.exists());
    }

    #[test]
    fn test_nothing_written_without_document() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("app.stack.json");
        let result = CompileResult::failed(vec![Issue::error("syntax")]);

        assert!(!write_output(&target, &result, WritePolicy::Always).unwrap());
        assert!(!target.exists());
    }

    #[test]
    fn test_non_utf8_source_fails_as_template() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("latin1.stack.rb");
        let target = dir.path().join("latin1.stack.json");
        fs::write(&source, b"description \"caf\xe9\"\n").unwrap();

        let result = DslTemplateCompiler::default()
            .compile(&source, &target, &ParameterOverrides::new())
            .unwrap();

        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.issues()[0].code(), Some(ErrorCode::E006));
        assert!(result.output().is_none());
        assert!(!target.exists());
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("missing.stack.rb");
        let target = dir.path().join("missing.stack.json");

        let error = DslTemplateCompiler::default()
            .compile(&source, &target, &ParameterOverrides::new())
            .unwrap_err();
        assert!(matches!(error, CftemplateError::Io { path, .. } if path == source));
    }
}
