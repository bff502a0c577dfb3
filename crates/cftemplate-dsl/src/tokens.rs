use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// Token types for the template DSL
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Do,
    End,
    True,
    False,
    Nil,

    // Literals
    StringLiteral(String),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    Symbol(&'src str),
    Identifier(&'src str),

    // Operators
    DotDot,   // ..
    FatArrow, // =>

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    LeftBrace,    // {
    RightBrace,   // }
    Comma,        // ,
    Semicolon,    // ;

    // Comments
    LineComment(&'src str), // # comment

    // Whitespace
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Returns `true` for tokens that never reach the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::LineComment(_))
    }

    /// Returns `true` for tokens after which a newline does not end a statement.
    pub fn continues_line(&self) -> bool {
        matches!(
            self,
            Token::Comma
                | Token::FatArrow
                | Token::DotDot
                | Token::LeftParen
                | Token::LeftBracket
                | Token::LeftBrace
        )
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> fmt::Display for PositionedToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl<'src> Location for PositionedToken<'src> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Do => write!(f, "do"),
            Token::End => write!(f, "end"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Nil => write!(f, "nil"),

            Token::StringLiteral(s) => write!(f, "{s:?}"),
            Token::IntegerLiteral(n) => write!(f, "{n}"),
            Token::FloatLiteral(n) => write!(f, "{n}"),
            Token::Symbol(name) => write!(f, ":{name}"),
            Token::Identifier(name) => write!(f, "{name}"),

            Token::DotDot => write!(f, ".."),
            Token::FatArrow => write!(f, "=>"),

            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),

            Token::LineComment(text) => write!(f, "#{text}"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
        }
    }
}
