//! Error adapter for converting CftemplateError to miette diagnostics.
//!
//! Template issues are logged as they are found, so the only thing left to
//! render when a run fails is the error that ended it.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use cftemplate::CftemplateError;

/// Adapter for a [`CftemplateError`].
pub struct ErrorAdapter<'a>(pub &'a CftemplateError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CftemplateError::Io { .. } => "cftemplate::io",
            CftemplateError::Walk(_) => "cftemplate::walk",
            CftemplateError::Pattern { .. } => "cftemplate::pattern",
            CftemplateError::Serialize { .. } => "cftemplate::serialize",
            CftemplateError::Config(_) => "cftemplate::config",
            CftemplateError::BatchFailed { .. } => "cftemplate::batch_failed",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CftemplateError::Pattern { .. } => "patterns use glob syntax, e.g. `*stack.rb`",
            CftemplateError::Config(_) => "check the [compile] and [parameters] tables",
            CftemplateError::BatchFailed { .. } => {
                "the errors are logged above, next to the template that raised them"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
