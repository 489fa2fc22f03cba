use crate::Span;
use crate::lexer::{Lexer, LexerError, Token, TokenKind};
use crate::types::Node;
use log::debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse Error [at {0}]: unexpected dot")]
    UnexpectedDot(Span),
    #[error("Parse Error [at {0}]: unexpected close paren")]
    UnexpectedCloseParen(Span),
    #[error("Parse Error [at {0}]: improper list syntax")]
    ImproperList(Span),
    #[error("Parse Error [at {0}]: unmatched opening parenthesis")]
    UnmatchedOpenParen(Span), // Span of the '(' left open
    #[error("Parse Error: Unexpected end of input. Expected {0}")]
    UnexpectedEof(String),
    #[error("Parse Error [at {}]: Unexpected token '{}', expected {expected}", .found.span, .found.kind)]
    UnexpectedToken { found: Token, expected: String },
    #[error("Lexer Error during parse: {0}")]
    LexerError(#[from] LexerError),
}

type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent reader over a lazy token stream.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> ParseResult<Self> {
        Ok(Parser {
            lexer: Lexer::new(input)?,
        })
    }

    fn current(&self) -> &Token {
        self.lexer.current()
    }

    fn advance(&mut self) -> ParseResult<()> {
        Ok(self.lexer.advance()?)
    }

    /// Reads the next top-level expression, or `None` once the input is
    /// exhausted.
    pub fn read(&mut self) -> ParseResult<Option<Node>> {
        if self.lexer.at_end() {
            Ok(None)
        } else {
            self.read_expr().map(Some)
        }
    }

    /// Reads every remaining top-level expression.
    pub fn read_all(&mut self) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(node) = self.read()? {
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Parses a single S-expression starting at the current token.
    pub fn read_expr(&mut self) -> ParseResult<Node> {
        let Token { kind, span } = self.current().clone();
        match kind {
            TokenKind::Symbol(name) => {
                self.advance()?;
                Ok(Node::new_symbol(name, span))
            }
            TokenKind::Integer(n) => {
                self.advance()?;
                Ok(Node::new_integer(n, span))
            }
            TokenKind::Quote => {
                self.advance()?;
                if self.lexer.at_end() {
                    return Err(ParseError::UnexpectedEof(
                        "an expression after '''".to_string(),
                    ));
                }
                let quoted = self.read_expr()?;
                Ok(Node::new_quote(quoted, span))
            }
            TokenKind::Dot => Err(ParseError::UnexpectedDot(span)),
            TokenKind::RParen => Err(ParseError::UnexpectedCloseParen(span)),
            TokenKind::LParen => {
                self.advance()?;
                self.read_list(span)
            }
            TokenKind::EndOfInput => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    /// Parses the rest of a list; the opening paren at `open` has already
    /// been consumed.
    pub fn read_list(&mut self, open: Span) -> ParseResult<Node> {
        let mut items: Vec<Node> = Vec::new();
        loop {
            let Token { kind, span } = self.current().clone();
            match kind {
                TokenKind::RParen => {
                    self.advance()?;
                    let list_span = open.merge(span);
                    debug!("read list of {} elements at {}", items.len(), list_span);
                    return Ok(if items.is_empty() {
                        Node::new_nil(list_span)
                    } else {
                        Node::list_from(items, list_span)
                    });
                }
                TokenKind::Dot => {
                    if items.is_empty() {
                        return Err(ParseError::ImproperList(span));
                    }
                    self.advance()?;
                    if self.lexer.at_end() {
                        return Err(ParseError::ImproperList(span));
                    }
                    let tail = self.read_expr()?;
                    let close = self.current().clone();
                    if close.kind != TokenKind::RParen {
                        return Err(ParseError::ImproperList(close.span));
                    }
                    self.advance()?;
                    return Ok(Node::chain(items, tail, open.merge(close.span)));
                }
                TokenKind::EndOfInput => return Err(ParseError::UnmatchedOpenParen(open)),
                _ => items.push(self.read_expr()?),
            }
        }
    }
}

/// Lexes and reads exactly one expression from `input`. Anything left over
/// is reported as an unexpected token at its first token, so `"1 2)"` points
/// at `2`. Use [`Parser::read`] to locate a stray `)` instead.
pub fn parse_str(input: &str) -> ParseResult<Node> {
    let mut parser = Parser::new(input)?;
    let expr = parser.read()?.ok_or_else(|| {
        ParseError::UnexpectedEof("an expression".to_string())
    })?;

    if parser.lexer.at_end() {
        Ok(expr)
    } else {
        Err(ParseError::UnexpectedToken {
            found: parser.current().clone(),
            expected: "end of input".to_string(),
        })
    }
}
