//! Lexical analyzer for template DSL source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! It handles whitespace, `#` comments, symbols, single- and double-quoted
//! strings, integer and float literals and all punctuation.
//!
//! The public entry point is [`tokenize`], which stops at the first error.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, not, opt, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use cftemplate_core::diagnostic::ErrorCode;

use crate::{
    error::SyntaxError,
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a standard escape character in a double-quoted string after the backslash.
fn string_escape_char<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    one_of(['n', 'r', 't', 's', 'e', '0', '\\', '"', '\'', '#'])
        .map(|c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            's' => ' ',
            'e' => '\u{1B}',
            '0' => '\0',
            other => other,
        })
        .parse_next(input)
}

/// Parse an escape sequence in a double-quoted string starting with backslash.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    let escape_start = input.current_token_start();

    '\\'.parse_next(input)?;

    if let Ok(ch) = string_escape_char(input) {
        return Ok(ch);
    }

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some("valid escapes: `\\n`, `\\r`, `\\t`, `\\s`, `\\e`, `\\0`, `\\\\`, `\\\"`, `\\'`, `\\#`"),
            start: escape_start,
        },
    )))
}

/// Parse a double-quoted string literal with escapes.
fn double_quoted<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let string_char = none_of(['"', '\\', '\n']);
    let string_content =
        repeat(0.., alt((string_escape, string_char))).fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        });

    let start_pos = input.current_token_start();
    '"'.parse_next(input)?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parse a single-quoted string literal.
///
/// Only `\\` and `\'` are escapes; every other character is taken as is.
fn single_quoted<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let string_content = repeat(
        0..,
        alt((preceded('\\', one_of(['\\', '\''])), none_of(['\'', '\n']))),
    )
    .fold(String::new, |mut acc, ch| {
        acc.push(ch);
        acc
    });

    let start_pos = input.current_token_start();
    '\''.parse_next(input)?;

    cut_err(terminated(string_content, '\''))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `'`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parse an integer or float literal.
///
/// `1..5` lexes as an integer, `..` and another integer: a dot only starts a
/// fraction when a digit follows it.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start = input.current_token_start();
    let text: &str = terminated(
        (
            opt('-'),
            digit1,
            opt(('.', digit1)),
            opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
        )
            .take(),
        peek(not(one_of(is_identifier_char))),
    )
    .parse_next(input)?;

    let diagnostic = if text.contains(['.', 'e', 'E']) {
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => return Ok(Token::FloatLiteral(n)),
            _ => LexerDiagnostic {
                code: ErrorCode::E005,
                message: "float literal out of range",
                help: Some("floats must be finite 64-bit numbers"),
                start,
            },
        }
    } else {
        match text.parse::<i64>() {
            Ok(n) => return Ok(Token::IntegerLiteral(n)),
            Err(_) => LexerDiagnostic {
                code: ErrorCode::E004,
                message: "number literal out of range",
                help: Some("integers must fit in 64 bits"),
                start,
            },
        }
    };

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        diagnostic,
    )))
}

/// Parse `#` line comments
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded('#', take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// A backslash right before a line break joins the two lines.
fn line_continuation<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    ('\\', opt('\r'), '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse keywords with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    terminated(
        alt((
            literal("do").value(Token::Do),
            literal("end").value(Token::End),
            literal("true").value(Token::True),
            literal("false").value(Token::False),
            literal("nil").value(Token::Nil),
        )),
        // Ensure keyword is not followed by identifier character (word boundary)
        peek(not(one_of(is_identifier_char))),
    )
    .parse_next(input)
}

fn identifier_text<'a>(input: &mut Input<'a>) -> IResult<'a, &'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_identifier_char),
    )
        .take()
        .parse_next(input)
}

/// Parse identifiers
fn identifier<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    identifier_text.map(Token::Identifier).parse_next(input)
}

/// Parse `:name` symbols
fn symbol<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded(':', identifier_text)
        .map(Token::Symbol)
        .parse_next(input)
}

/// Parse multi-character operators
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal("..").value(Token::DotDot),
        literal("=>").value(Token::FatArrow),
    ))
    .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        ','.value(Token::Comma),
        ';'.value(Token::Semicolon),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        line_continuation,
        double_quoted,
        single_quoted,
        multi_char_operator, // Must come before number literals
        keyword,             // Must come before identifier
        number_literal,
        symbol,
        identifier,
        single_char_token,
        newline, // Must come before whitespace
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Convert an ErrMode into a [`SyntaxError`].
///
/// Falls back to E002 (unexpected character) when no diagnostic context is
/// attached.
fn convert_err_mode(
    err: ErrMode<ContextError<LexerDiagnostic>>,
    token_start: usize,
    error_pos: usize,
    source: &str,
) -> SyntaxError {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(LexerDiagnostic {
        code,
        message,
        help,
        start,
    }) = context_error.context().next()
    {
        let span = Span::new(*start..error_pos.max(*start));
        let error = SyntaxError::new(*code, *message, span);
        return match help {
            Some(help) => error.with_help(help),
            None => error,
        };
    }

    let found = source[token_start..].chars().next().unwrap_or(' ');
    let span = Span::new(token_start..token_start + found.len_utf8());
    SyntaxError::new(
        ErrorCode::E002,
        format!("unexpected character `{found}`"),
        span,
    )
}

/// Tokenize `source`, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<PositionedToken<'_>>, SyntaxError> {
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();

    while !input.is_empty() {
        let token_start = input.current_token_start();
        match positioned_token(&mut input) {
            Ok(token) => tokens.push(token),
            Err(e) => {
                let error_pos = input.current_token_start();
                return Err(convert_err_mode(e, token_start, error_pos, source));
            }
        }
    }

    Ok(tokens)
}
