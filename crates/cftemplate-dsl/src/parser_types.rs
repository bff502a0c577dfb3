//! Syntax tree produced by the parser.

use crate::span::{Span, Spanned};

/// A statement: a name, its arguments and an optional `do ... end` block.
///
/// Both `resource "Bucket", "AWS::S3::Bucket" do ... end` and `length 3..10`
/// are statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<'src> {
    pub name: Spanned<&'src str>,
    pub arguments: Vec<Spanned<Expr<'src>>>,
    pub block: Option<Vec<Statement<'src>>>,
    pub span: Span,
}

/// An argument or nested expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'src> {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Symbol(&'src str),
    /// `start..end` with integer bounds.
    Range(i64, i64),
    Array(Vec<Spanned<Expr<'src>>>),
    /// `{ key => value, ... }` or trailing `key => value` arguments.
    Hash(Vec<(Spanned<Expr<'src>>, Spanned<Expr<'src>>)>),
    /// A function call such as `ref("Bucket")` or a bare `get_azs`.
    Call {
        name: Spanned<&'src str>,
        arguments: Vec<Spanned<Expr<'src>>>,
    },
}
