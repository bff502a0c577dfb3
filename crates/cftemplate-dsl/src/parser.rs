//! Parser for template DSL tokens.
//!
//! This module transforms the token stream from the [`lexer`](super::lexer)
//! into the statements defined in [`parser_types`](super::parser_types). The
//! public entry point is [`build_program`], which expects the output of
//! [`significant_tokens`].
//!
//! Newlines end statements. [`significant_tokens`] drops the ones that do
//! not: newlines inside brackets, after `,`, `=>`, `..`, and repeated blank
//! lines. Semicolons are turned into newlines.

use winnow::{
    Parser as _,
    combinator::{
        alt, cut_err, delimited, eof, opt, peek, preceded, repeat, separated, terminated,
    },
    error::{AddContext, ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use cftemplate_core::diagnostic::ErrorCode;

use crate::{
    error::SyntaxError,
    parser_types::{Expr, Statement},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Deepest nesting of brackets, braces, parentheses and `do` blocks accepted
pub const MAX_NESTING: usize = 64;

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected
    Label(&'static str),
    /// A `do` block that reaches the end of input
    Unclosed(Span),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Drop trivia and the newlines that do not end a statement.
pub fn significant_tokens<'src>(tokens: &[PositionedToken<'src>]) -> Vec<PositionedToken<'src>> {
    let mut significant: Vec<PositionedToken<'src>> = Vec::with_capacity(tokens.len());
    let mut depth = 0usize;

    for token in tokens {
        match &token.token {
            t if t.is_trivia() => {}
            Token::Newline | Token::Semicolon => {
                let continues = significant
                    .last()
                    .is_none_or(|last| last.token == Token::Newline || last.token.continues_line());
                if depth == 0 && !continues {
                    significant.push(PositionedToken::new(Token::Newline, token.span));
                }
            }
            Token::LeftParen | Token::LeftBracket | Token::LeftBrace => {
                depth += 1;
                significant.push(token.clone());
            }
            Token::RightParen | Token::RightBracket | Token::RightBrace => {
                depth = depth.saturating_sub(1);
                significant.push(token.clone());
            }
            _ => significant.push(token.clone()),
        }
    }

    significant
}

/// Reject input nested deeper than [`MAX_NESTING`] before the grammar
/// recurses into it.
fn check_nesting(tokens: &[PositionedToken<'_>]) -> Result<(), SyntaxError> {
    let mut depth = 0usize;

    for token in tokens {
        match token.token {
            Token::LeftParen | Token::LeftBracket | Token::LeftBrace | Token::Do => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(SyntaxError::new(
                        ErrorCode::E102,
                        format!("nesting deeper than {MAX_NESTING} levels"),
                        token.span,
                    )
                    .with_help("move inner values into parameters or mappings"));
                }
            }
            Token::RightParen | Token::RightBracket | Token::RightBrace | Token::End => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    Ok(())
}

/// Parse one token matching `pred`, returning its span
fn exact<'src>(pred: fn(&Token<'_>) -> bool) -> impl FnMut(&mut Input<'src>) -> IResult<Span> {
    move |input: &mut Input<'src>| {
        any.verify_map(|token: &PositionedToken<'src>| pred(&token.token).then_some(token.span))
            .parse_next(input)
    }
}

fn is_newline(token: &Token<'_>) -> bool {
    matches!(token, Token::Newline)
}

fn is_end(token: &Token<'_>) -> bool {
    matches!(token, Token::End)
}

/// Parse a comma separator
fn comma<'src>(input: &mut Input<'src>) -> IResult<()> {
    exact(|t| matches!(t, Token::Comma)).void().parse_next(input)
}

/// Parse a `=>` between a key and its value
fn fat_arrow<'src>(input: &mut Input<'src>) -> IResult<()> {
    exact(|t| matches!(t, Token::FatArrow)).void().parse_next(input)
}

/// Parse zero or more statement separators
fn newlines0<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(0.., exact(is_newline).void()).parse_next(input)
}

/// Parse one or more statement separators
fn newlines1<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(1.., exact(is_newline).void()).parse_next(input)
}

/// Parse an identifier with span preservation
fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(*name, token.span)),
        _ => None,
    })
    .parse_next(input)
}

/// Parse an integer literal
fn integer<'src>(input: &mut Input<'src>) -> IResult<Spanned<i64>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::IntegerLiteral(n) => Some(Spanned::new(*n, token.span)),
        _ => None,
    })
    .context(Context::Label("integer"))
    .parse_next(input)
}

/// Parse a scalar literal other than an integer
fn literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<Expr<'src>>> {
    any.verify_map(|token: &PositionedToken<'src>| {
        let expr = match &token.token {
            Token::Nil => Expr::Nil,
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::StringLiteral(s) => Expr::String(s.clone()),
            Token::FloatLiteral(n) => Expr::Float(*n),
            Token::Symbol(name) => Expr::Symbol(*name),
            _ => return None,
        };
        Some(Spanned::new(expr, token.span))
    })
    .parse_next(input)
}

/// Parse an integer, or an inclusive `start..end` range of integers
fn integer_or_range<'src>(input: &mut Input<'src>) -> IResult<Spanned<Expr<'src>>> {
    let start = integer.parse_next(input)?;
    let end = opt(preceded(
        exact(|t| matches!(t, Token::DotDot)),
        cut_err(integer).context(Context::Label("integer after `..`")),
    ))
    .parse_next(input)?;

    Ok(match end {
        Some(end) => Spanned::new(
            Expr::Range(*start.inner(), *end.inner()),
            start.span().union(end.span()),
        ),
        None => Spanned::new(Expr::Int(*start.inner()), start.span()),
    })
}

/// An argument before `key => value` pairs are gathered
enum Argument<'src> {
    Item(Spanned<Expr<'src>>),
    Pair(Spanned<Expr<'src>>, Spanned<Expr<'src>>),
}

/// Parse an expression, or a `key => value` pair when an arrow follows
fn argument<'src>(input: &mut Input<'src>) -> IResult<Argument<'src>> {
    (expression, opt(preceded(fat_arrow, cut_err(expression))))
        .map(|(item, value)| match value {
            Some(value) => Argument::Pair(item, value),
            None => Argument::Item(item),
        })
        .parse_next(input)
}

/// Parse comma-separated arguments.
///
/// `key => value` pairs are gathered into a single hash argument placed where
/// the first pair appeared, so `"A", "k" => 1, "j" => 2` is two arguments.
fn argument_list<'src>(input: &mut Input<'src>) -> IResult<Vec<Spanned<Expr<'src>>>> {
    separated(1.., argument, comma)
        .map(gather_pairs)
        .parse_next(input)
}

fn gather_pairs(items: Vec<Argument<'_>>) -> Vec<Spanned<Expr<'_>>> {
    let mut arguments = Vec::with_capacity(items.len());
    let mut pairs = Vec::new();
    let mut hash: Option<(usize, Span)> = None;

    for item in items {
        match item {
            Argument::Item(item) => arguments.push(item),
            Argument::Pair(key, value) => {
                let span = key.span().union(value.span());
                hash = Some(match hash {
                    Some((index, hash_span)) => (index, hash_span.union(span)),
                    None => (arguments.len(), span),
                });
                pairs.push((key, value));
            }
        }
    }

    if let Some((index, span)) = hash {
        arguments.insert(index, Spanned::new(Expr::Hash(pairs), span));
    }
    arguments
}

/// Parse `(arguments)`, returning the arguments and the span of `)`.
///
/// A trailing comma before `)` is allowed.
fn parenthesized_arguments<'src>(
    input: &mut Input<'src>,
) -> IResult<(Vec<Spanned<Expr<'src>>>, Span)> {
    preceded(
        exact(|t| matches!(t, Token::LeftParen)),
        (
            terminated(opt(argument_list), opt(comma)),
            cut_err(exact(|t| matches!(t, Token::RightParen)))
                .context(Context::Label("`,` or `)`")),
        ),
    )
    .map(|(arguments, close)| (arguments.unwrap_or_default(), close))
    .parse_next(input)
}

/// Parse a function call; `get_azs` without parentheses has no arguments
fn call<'src>(input: &mut Input<'src>) -> IResult<Spanned<Expr<'src>>> {
    (identifier, opt(parenthesized_arguments))
        .map(|(name, arguments)| {
            let (arguments, span) = match arguments {
                Some((arguments, close)) => (arguments, name.span().union(close)),
                None => (Vec::new(), name.span()),
            };
            Spanned::new(Expr::Call { name, arguments }, span)
        })
        .parse_next(input)
}

/// Parse `[a, b, ...]`, allowing a trailing comma
fn array<'src>(input: &mut Input<'src>) -> IResult<Spanned<Expr<'src>>> {
    (
        exact(|t| matches!(t, Token::LeftBracket)),
        terminated(separated(0.., expression, comma), opt(comma)),
        cut_err(exact(|t| matches!(t, Token::RightBracket)))
            .context(Context::Label("`,` or `]`")),
    )
        .map(|(open, items, close): (Span, Vec<_>, Span)| {
            Spanned::new(Expr::Array(items), open.union(close))
        })
        .parse_next(input)
}

/// Parse `key => value` inside braces
fn pair<'src>(input: &mut Input<'src>) -> IResult<(Spanned<Expr<'src>>, Spanned<Expr<'src>>)> {
    (
        expression,
        preceded(
            cut_err(fat_arrow).context(Context::Label("`=>`")),
            cut_err(expression),
        ),
    )
        .parse_next(input)
}

/// Parse `{ key => value, ... }`, allowing a trailing comma
fn hash<'src>(input: &mut Input<'src>) -> IResult<Spanned<Expr<'src>>> {
    (
        exact(|t| matches!(t, Token::LeftBrace)),
        terminated(separated(0.., pair, comma), opt(comma)),
        cut_err(exact(|t| matches!(t, Token::RightBrace)))
            .context(Context::Label("`,` or `}`")),
    )
        .map(|(open, pairs, close): (Span, Vec<_>, Span)| {
            Spanned::new(Expr::Hash(pairs), open.union(close))
        })
        .parse_next(input)
}

/// Parse a single expression
fn expression<'src>(input: &mut Input<'src>) -> IResult<Spanned<Expr<'src>>> {
    alt((array, hash, integer_or_range, literal, call))
        .context(Context::Label("expression"))
        .parse_next(input)
}

/// Parse `do statements end`, returning the statements and the span of `end`
fn block<'src>(input: &mut Input<'src>) -> IResult<(Vec<Statement<'src>>, Span)> {
    let open = exact(|t| matches!(t, Token::Do)).parse_next(input)?;
    let statements = statements.parse_next(input)?;

    let end = cut_err(alt((exact(is_end).map(Some), eof.value(None))))
        .context(Context::Label("statement or `end`"))
        .parse_next(input)?;

    match end {
        Some(end) => Ok((statements, end)),
        None => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            Context::Unclosed(open),
        ))),
    }
}

/// Parse one statement: a name, optional arguments and an optional block.
///
/// A statement ends at a newline, at the `end` of its enclosing block or at
/// the end of input.
fn statement<'src>(input: &mut Input<'src>) -> IResult<Statement<'src>> {
    let name = identifier
        .context(Context::Label("statement"))
        .parse_next(input)?;

    let (arguments, close) = alt((
        parenthesized_arguments.map(|(arguments, close)| (arguments, Some(close))),
        opt(argument_list).map(|arguments| (arguments.unwrap_or_default(), None)),
    ))
    .parse_next(input)?;
    let block = opt(block).parse_next(input)?;

    cut_err(peek(alt((
        exact(is_newline),
        exact(is_end),
        eof.value(Span::default()),
    ))))
    .context(Context::Label("end of statement"))
    .parse_next(input)?;

    let mut span = name.span();
    if let Some(close) = close {
        span = span.union(close);
    }
    if let Some(last) = arguments.last() {
        span = span.union(last.span());
    }
    let block = block.map(|(statements, end)| {
        span = span.union(end);
        statements
    });

    Ok(Statement {
        name,
        arguments,
        block,
        span,
    })
}

/// Parse statements until `end` or the end of input
fn statements<'src>(input: &mut Input<'src>) -> IResult<Vec<Statement<'src>>> {
    delimited(newlines0, separated(0.., statement, newlines1), newlines0).parse_next(input)
}

/// Parse a whole program; leftover tokens (such as a stray `end`) are errors
fn program<'src>(input: &mut Input<'src>) -> IResult<Vec<Statement<'src>>> {
    terminated(statements, cut_err(eof).context(Context::Label("statement"))).parse_next(input)
}

/// Convert a winnow error into a [`SyntaxError`].
///
/// The position is the token the parser stopped at.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
    source_len: usize,
) -> SyntaxError {
    let context_error = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(open) = context_error.context().find_map(|ctx| match ctx {
        Context::Unclosed(span) => Some(*span),
        Context::Label(_) => None,
    }) {
        return SyntaxError::new(
            ErrorCode::E101,
            "block opened with `do` is never closed",
            open,
        )
        .with_help("add a matching `end`");
    }

    // The innermost label names what was expected at the failing token.
    let expected = context_error.context().find_map(|ctx| match ctx {
        Context::Label(label) => Some(*label),
        Context::Unclosed(_) => None,
    });

    let position = tokens.len().saturating_sub(current_remaining);
    let (found, span) = match tokens.get(position) {
        Some(token) if is_newline(&token.token) => ("end of line".to_string(), token.span),
        Some(token) => (format!("`{}`", token.token), token.span),
        None => ("end of input".to_string(), Span::new(source_len..source_len)),
    };

    let message = match expected {
        Some(label) => format!("unexpected {found}, expected {label}"),
        None => format!("unexpected {found}"),
    };
    SyntaxError::new(ErrorCode::E100, message, span)
}

/// Build the statements of a program from its significant tokens
pub fn build_program<'src>(
    tokens: &'src [PositionedToken<'src>],
    source_len: usize,
) -> Result<Vec<Statement<'src>>, SyntaxError> {
    check_nesting(tokens)?;
    let mut token_slice = TokenSlice::new(tokens);

    match program(&mut token_slice) {
        Ok(statements) => Ok(statements),
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, tokens, current_remaining, source_len))
        }
    }
}
