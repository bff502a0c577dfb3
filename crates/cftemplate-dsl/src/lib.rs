//! Template DSL front end.
//!
//! This crate turns `*.stack.rb` sources into a [`Template`] and, through
//! [`compile`], into a canonical CloudFormation document. Sources go through
//! three stages:
//!
//! 1. **Lexing**: source text into positioned tokens
//! 2. **Parsing**: tokens into statements with optional `do ... end` blocks
//! 3. **Elaboration**: statements into typed template nodes
//!
//! A lexing or parsing failure stops the front end with a single error issue.
//! Elaboration problems are reported per statement and do not stop it.
//!
//! # Example
//!
//! ```
//! use cftemplate_core::value::ParameterOverrides;
//!
//! let source = r#"
//! resource "Bucket", "AWS::S3::Bucket"
//! output "BucketName", ref("Bucket")
//! "#;
//! let result = cftemplate_dsl::compile(source, "web.stack.rb", &ParameterOverrides::new());
//! assert!(!result.has_failures());
//! assert_eq!(result.output().unwrap()["Outputs"]["BucketName"]["Value"]["Ref"], "Bucket");
//! ```

mod elaborate;
mod error;
mod lexer;
mod parser;
mod parser_types;
mod span;
mod tokens;

use log::{debug, info, trace};

use cftemplate_core::{
    CompileResult, Template,
    diagnostic::{Issue, IssueCollector},
    value::ParameterOverrides,
};

pub use error::SyntaxError;
pub use span::{LineIndex, Span};

/// A template evaluated from DSL source, before lowering.
#[derive(Debug, Clone)]
pub struct Evaluation {
    template: Option<Template>,
    issues: Vec<Issue>,
}

impl Evaluation {
    /// The template, unless the source failed to lex or parse.
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_parts(self) -> (Option<Template>, Vec<Issue>) {
        (self.template, self.issues)
    }
}

/// Evaluate DSL `source` into a template and apply `overrides`.
///
/// `source_name` is used in issue locations.
pub fn evaluate(source: &str, source_name: &str, overrides: &ParameterOverrides) -> Evaluation {
    info!(source = source_name; "Evaluating template source");
    trace!(source; "Source content");

    let index = LineIndex::new(source);
    let raw = match lexer::tokenize(source) {
        Ok(raw) => raw,
        Err(error) => {
            return Evaluation {
                template: None,
                issues: vec![error.into_issue(source_name, &index)],
            };
        }
    };
    let tokens = parser::significant_tokens(&raw);
    debug!(tokens = tokens.len(); "Tokenized source");

    let statements = match parser::build_program(&tokens, source.len()) {
        Ok(statements) => statements,
        Err(error) => {
            return Evaluation {
                template: None,
                issues: vec![error.into_issue(source_name, &index)],
            };
        }
    };
    debug!(statements = statements.len(); "Parsed source");

    let (mut template, mut issues) =
        elaborate::Elaborator::new(source, source_name).run(&statements);
    let override_issues = template.apply_overrides(overrides);
    issues.extend_located(override_issues, source_name);

    Evaluation {
        template: Some(template),
        issues: issues.into_issues(),
    }
}

/// Evaluate and lower DSL `source`.
///
/// The result has no output only when the source failed to lex or parse.
pub fn compile(source: &str, source_name: &str, overrides: &ParameterOverrides) -> CompileResult {
    let (template, issues) = evaluate(source, source_name, overrides).into_parts();
    let Some(template) = template else {
        return CompileResult::failed(issues);
    };

    let (lower_issues, output) = template.lower().into_parts();
    let mut collector = IssueCollector::new();
    collector.extend(issues);
    collector.extend(lower_issues);
    CompileResult::new(collector.into_issues(), output)
}
