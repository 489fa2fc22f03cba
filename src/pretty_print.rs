use crate::{EnvError, EvalError, ParseError};
use ariadne::{Label, Report, ReportKind, Source};

impl EvalError {
    pub fn pretty_print(&self, source_name: &str, input: &str) -> std::io::Result<()> {
        let span = self.span().to_range();
        let report = match self {
            EvalError::Name(EnvError::UnboundVariable(symbol, _)) => {
                Report::build(ReportKind::Error, (source_name, span.clone()))
                    .with_message(format!("Unbound symbol `{}`", symbol))
                    .with_label(
                        Label::new((source_name, span))
                            .with_message("This symbol is not defined in the current scope"),
                    )
            }
            EvalError::Syntax(message, _) => {
                Report::build(ReportKind::Error, (source_name, span.clone()))
                    .with_message("Malformed expression")
                    .with_label(Label::new((source_name, span)).with_message(message))
            }
            EvalError::Type(message, _) => {
                Report::build(ReportKind::Error, (source_name, span.clone()))
                    .with_message("Type mismatch")
                    .with_label(Label::new((source_name, span)).with_message(message))
            }
            EvalError::Argument(message, _) => {
                Report::build(ReportKind::Error, (source_name, span.clone()))
                    .with_message("Invalid arguments")
                    .with_label(Label::new((source_name, span)).with_message(message))
            }
            EvalError::Domain(message, _) => {
                Report::build(ReportKind::Error, (source_name, span.clone()))
                    .with_message("Arithmetic error")
                    .with_label(Label::new((source_name, span)).with_message(message))
            }
        };
        report.finish().eprint((source_name, Source::from(input)))
    }
}

impl ParseError {
    pub fn pretty_print(&self, source_name: &str, input: &str) -> std::io::Result<()> {
        let report = match self {
            ParseError::UnexpectedDot(span) => {
                Report::build(ReportKind::Error, (source_name, span.to_range()))
                    .with_message("Unexpected dot")
                    .with_label(
                        Label::new((source_name, span.to_range()))
                            .with_message("A dot may only appear inside a list, before its last element"),
                    )
            }
            ParseError::UnexpectedCloseParen(span) => {
                Report::build(ReportKind::Error, (source_name, span.to_range()))
                    .with_message("Unexpected close paren")
                    .with_label(
                        Label::new((source_name, span.to_range()))
                            .with_message("This ')' has no matching '('"),
                    )
            }
            ParseError::ImproperList(span) => {
                Report::build(ReportKind::Error, (source_name, span.to_range()))
                    .with_message("Improper list syntax")
                    .with_label(
                        Label::new((source_name, span.to_range()))
                            .with_message("Expected exactly one expression and ')' after the dot"),
                    )
            }
            ParseError::UnmatchedOpenParen(span) => {
                Report::build(ReportKind::Error, (source_name, span.to_range()))
                    .with_message("Unmatched opening parenthesis")
                    .with_label(
                        Label::new((source_name, span.to_range()))
                            .with_message("This '(' is never closed"),
                    )
            }
            ParseError::UnexpectedEof(expected) => {
                let idx = input.len();
                Report::build(ReportKind::Error, (source_name, idx..idx))
                    .with_message("Unexpected end of input")
                    .with_label(
                        Label::new((source_name, idx..idx))
                            .with_message(format!("Expected {}", expected)),
                    )
            }
            ParseError::UnexpectedToken { found, expected } => {
                Report::build(ReportKind::Error, (source_name, found.span.to_range()))
                    .with_message(format!("Unexpected token: {}", found.kind))
                    .with_label(
                        Label::new((source_name, found.span.to_range()))
                            .with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::LexerError(lex_err) => {
                Report::build(ReportKind::Error, (source_name, lex_err.span.to_range()))
                    .with_message("Lexer Error")
                    .with_label(
                        Label::new((source_name, lex_err.span.to_range()))
                            .with_message(lex_err.error.to_string()),
                    )
            }
        };
        report.finish().eprint((source_name, Source::from(input)))
    }
}
