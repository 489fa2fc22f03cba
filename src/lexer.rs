use log::trace;
use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

// Patterns recognised by logos. `Lexer` lifts these into `TokenKind`,
// which additionally carries the end-of-input marker.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(skip r";[^\n\r]*")] // Skip comments
#[logos(error = LexerErrorKind)]
enum RawToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(".")]
    Dot,
    #[token("'")]
    Quote,
    // `-` only joins a symbol that started with a letter (`list-ref`).
    #[regex(r"[A-Za-z][A-Za-z0-9?!-]*|[?!][A-Za-z0-9?!]*|[+*/-]", |lex| lex.slice().to_string())]
    Symbol(String),
    #[regex(r"-?[0-9][A-Za-z0-9?!]*", parse_integer)]
    Integer(i64),
}

fn parse_integer(lex: &mut logos::Lexer<RawToken>) -> LexerResult<i64> {
    let slice = lex.slice();
    let digits = slice.strip_prefix('-').unwrap_or(slice);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LexerErrorKind::InvalidInteger(slice.to_string()));
    }
    slice
        .parse::<i64>()
        .map_err(|_| LexerErrorKind::InvalidInteger(slice.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Dot,
    Quote,
    Symbol(String),
    Integer(i64),
    EndOfInput,
}

impl From<RawToken> for TokenKind {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Quote => TokenKind::Quote,
            RawToken::Symbol(s) => TokenKind::Symbol(s),
            RawToken::Integer(n) => TokenKind::Integer(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Symbol(s) => write!(f, "{}", s),
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

#[derive(Error, Default, Debug, Clone, PartialEq)]
pub enum LexerErrorKind {
    #[error("Invalid character encountered: '{0}'")]
    InvalidCharacter(char),
    #[error("Invalid integer literal: '{0}'")]
    InvalidInteger(String),
    #[default]
    #[error("Invalid token")]
    InvalidToken,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

type LexerResult<T> = Result<T, LexerErrorKind>;

type LexerRangedResult<T> = Result<T, LexerError>;

/// A lazy, one-token-lookahead scanner.
///
/// The lexer always holds exactly one current token. `advance` replaces it
/// with the next token from the input; once the input is exhausted the
/// current token stays `EndOfInput`.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, RawToken>,
    current: Token,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned on the first token of `input`.
    pub fn new(input: &'a str) -> LexerRangedResult<Self> {
        let mut lexer = Lexer {
            inner: RawToken::lexer(input),
            current: Token {
                kind: TokenKind::EndOfInput,
                span: Span::default(),
            },
        };
        lexer.advance()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn at_end(&self) -> bool {
        self.current.kind == TokenKind::EndOfInput
    }

    pub fn advance(&mut self) -> LexerRangedResult<()> {
        self.current = match self.inner.next() {
            Some(Ok(raw)) => Token {
                kind: raw.into(),
                span: self.inner.span().into(),
            },
            Some(Err(error)) => {
                let span: Span = self.inner.span().into();
                let error = match error {
                    LexerErrorKind::InvalidToken => self
                        .inner
                        .slice()
                        .chars()
                        .next()
                        .map_or(LexerErrorKind::InvalidToken, LexerErrorKind::InvalidCharacter),
                    other => other,
                };
                return Err(LexerError { error, span });
            }
            None => {
                let end = self.inner.source().len();
                Token {
                    kind: TokenKind::EndOfInput,
                    span: Span::new(end, end),
                }
            }
        };
        trace!("token {:?} at {}", self.current.kind, self.current.span);
        Ok(())
    }
}

/// Collects every token of `input`, excluding the trailing `EndOfInput`.
pub fn tokenize(input: &str) -> LexerRangedResult<Vec<Token>> {
    let mut lexer = Lexer::new(input)?;
    let mut tokens = Vec::new();
    while !lexer.at_end() {
        tokens.push(lexer.current().clone());
        lexer.advance()?;
    }
    Ok(tokens)
}
