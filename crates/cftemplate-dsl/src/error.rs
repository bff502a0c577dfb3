use thiserror::Error;

use cftemplate_core::diagnostic::{ErrorCode, Issue};

use crate::span::{LineIndex, Span};

/// A lexer or parser failure.
///
/// Syntax errors stop the front end: the source yields exactly one of these
/// and no template.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    code: ErrorCode,
    message: String,
    span: Span,
    help: Option<&'static str>,
}

impl SyntaxError {
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn help(&self) -> Option<&'static str> {
        self.help
    }

    /// Convert into an error issue located at `source_name:line:column`.
    pub fn into_issue(self, source_name: &str, index: &LineIndex) -> Issue {
        let (line, column) = index.line_col(self.span.start());
        let message = match self.help {
            Some(help) => format!("{} ({help})", self.message),
            None => self.message,
        };
        Issue::error(message)
            .with_code(self.code)
            .with_location(format!("{source_name}:{line}:{column}"))
    }
}
