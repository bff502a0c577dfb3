//! Error codes for compile issues.
//!
//! Codes are organized by the phase that raises them:
//! - `E0xx` - DSL lexer
//! - `E1xx` - DSL parser
//! - `E2xx` - DSL elaboration
//! - `E3xx` - Node lowering
//! - `E4xx` - Template checks
//! - `E5xx` - Document passthrough checks

use std::fmt;

/// Error codes for categorizing compile issues.
///
/// A code never changes the severity of the issue carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    E001,

    /// Unexpected character.
    E002,

    /// Invalid escape sequence in a double-quoted string.
    E003,

    /// Integer literal does not fit in 64 bits.
    E004,

    /// Float literal is not a finite number.
    E005,

    /// Source file is not valid UTF-8.
    E006,

    // =========================================================================
    // Parser (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Block opened with `do` is never closed with `end`.
    E101,

    /// Brackets or blocks nested deeper than the parser accepts.
    E102,

    // =========================================================================
    // Elaboration (E2xx)
    // =========================================================================
    /// Statement not understood by the node or the enclosing template.
    E200,

    /// Invalid argument count or argument shape.
    ///
    /// The statement exists but was called with arguments it cannot accept.
    E201,

    /// A node with this name has already been defined.
    E202,

    /// Unknown intrinsic function in an expression.
    E203,

    /// Unknown parameter type.
    ///
    /// Parameter types are `:string`, `:number` and `:list`.
    E204,

    /// Template attribute set again from inside a node block.
    ///
    /// The nested statement replaces the value the template already had.
    E205,

    // =========================================================================
    // Lowering (E3xx)
    // =========================================================================
    /// Unsupported `length` shape on a string parameter.
    E300,

    /// Resource has no type.
    E301,

    /// Output has no value.
    E302,

    /// List parameter default contains a non-scalar element.
    E303,

    /// Wait condition has no handle.
    E304,

    /// Interval used where the document has no interval form.
    E305,

    /// Value nested deeper than lowering descends.
    E306,

    /// A number with no JSON form, such as infinity, was lowered to null.
    E307,

    // =========================================================================
    // Template checks (E4xx)
    // =========================================================================
    /// Template defines no resources.
    E400,

    /// `DependsOn` names a resource that does not exist.
    E401,

    /// Resources depend on each other in a cycle.
    E402,

    /// Parameter override matches no declared parameter.
    E403,

    // =========================================================================
    // Document checks (E5xx)
    // =========================================================================
    /// Document is not valid JSON or not an object.
    E500,

    /// Unknown top-level section.
    E501,

    /// Resource or parameter entry is missing its `Type`.
    E502,

    /// `Resources` section missing or empty.
    E503,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E402 => "E402",
            ErrorCode::E403 => "E403",
            ErrorCode::E500 => "E500",
            ErrorCode::E501 => "E501",
            ErrorCode::E502 => "E502",
            ErrorCode::E503 => "E503",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "integer out of range",
            ErrorCode::E005 => "float out of range",
            ErrorCode::E006 => "invalid source encoding",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unclosed block",
            ErrorCode::E102 => "nesting too deep",
            ErrorCode::E200 => "undefined statement",
            ErrorCode::E201 => "invalid argument",
            ErrorCode::E202 => "duplicate definition",
            ErrorCode::E203 => "undefined function",
            ErrorCode::E204 => "unknown parameter type",
            ErrorCode::E205 => "template attribute reassigned",
            ErrorCode::E300 => "unsupported length",
            ErrorCode::E301 => "missing resource type",
            ErrorCode::E302 => "missing output value",
            ErrorCode::E303 => "non-scalar list default",
            ErrorCode::E304 => "missing wait condition handle",
            ErrorCode::E305 => "interval without document form",
            ErrorCode::E306 => "value nested too deep",
            ErrorCode::E307 => "non-finite number",
            ErrorCode::E400 => "no resources",
            ErrorCode::E401 => "unknown dependency",
            ErrorCode::E402 => "dependency cycle",
            ErrorCode::E403 => "unused parameter override",
            ErrorCode::E500 => "malformed document",
            ErrorCode::E501 => "unknown section",
            ErrorCode::E502 => "missing type",
            ErrorCode::E503 => "missing resources",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E300.to_string(), "E300");
        assert_eq!(ErrorCode::E503.to_string(), "E503");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E300.description(), "unsupported length");
        assert_eq!(ErrorCode::E402.description(), "dependency cycle");
    }
}
