pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod types;

pub use environment::{EnvError, Environment};
pub use evaluator::{ErrorKind, EvalError, EvalResult, evaluate};
pub use lexer::{Lexer, LexerError, LexerErrorKind, Token, TokenKind, tokenize};
pub use parser::{ParseError, Parser, parse_str};
pub use source::Span;
pub use types::{Callable, Node, Sexpr};

use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    /// Writes an annotated report for this error against `input` to stderr.
    pub fn pretty_print(&self, source_name: &str, input: &str) -> std::io::Result<()> {
        match self {
            Error::Parse(err) => err.pretty_print(source_name, input),
            Error::Eval(err) => err.pretty_print(source_name, input),
        }
    }
}

/// A read-eval session holding one global environment.
///
/// Failed evaluations leave the environment untouched, so a session can keep
/// going after an error.
pub struct Interpreter {
    env: Rc<RefCell<Environment>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new_global_populated(),
        }
    }

    pub fn environment(&self) -> Rc<RefCell<Environment>> {
        self.env.clone()
    }

    /// Evaluates one already-read expression.
    pub fn eval(&self, node: Node) -> EvalResult {
        evaluate(node, self.env.clone())
    }

    /// Reads and evaluates every expression in `input`, returning the value
    /// of the last one, or `None` if the input held no expressions.
    pub fn eval_str(&self, input: &str) -> Result<Option<Node>, Error> {
        let mut last = None;
        self.eval_each(input, |node| last = Some(node))?;
        Ok(last)
    }

    /// Reads and evaluates the expressions in `input` one at a time, handing
    /// each result to `on_result`. Stops at the first error.
    pub fn eval_each<F: FnMut(Node)>(&self, input: &str, mut on_result: F) -> Result<(), Error> {
        let mut parser = Parser::new(input)?;
        while let Some(node) = parser.read()? {
            debug!("evaluating {}", node);
            on_result(self.eval(node)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_to_string(interpreter: &Interpreter, input: &str) -> String {
        match interpreter.eval_str(input) {
            Ok(Some(node)) => node.to_string(),
            Ok(None) => panic!("No value for input '{}'", input),
            Err(e) => panic!("Evaluation failed for input '{}': {}", input, e),
        }
    }

    #[test]
    fn test_eval_str_returns_last_value() {
        let interpreter = Interpreter::new();
        assert_eq!(eval_to_string(&interpreter, "1 2 (+ 1 2)"), "3");
        assert_eq!(eval_to_string(&interpreter, "'(a . b)"), "(a . b)");
    }

    #[test]
    fn test_eval_str_empty_input() {
        let interpreter = Interpreter::new();
        assert_eq!(interpreter.eval_str(""), Ok(None));
        assert_eq!(interpreter.eval_str("  ; just a comment"), Ok(None));
    }

    #[test]
    fn test_eval_each_collects_results() {
        let interpreter = Interpreter::new();
        let mut results = Vec::new();
        interpreter
            .eval_each("(* 2 3) 'x (- 9 4)", |node| results.push(node.to_string()))
            .unwrap();
        assert_eq!(results, vec!["6", "x", "5"]);
    }

    #[test]
    fn test_errors_are_distinct() {
        let interpreter = Interpreter::new();
        assert!(matches!(interpreter.eval_str("(1 2"), Err(Error::Parse(_))));
        assert!(matches!(
            interpreter.eval_str("(/ 1 0)"),
            Err(Error::Eval(e)) if e.kind() == ErrorKind::Domain
        ));
    }

    #[test]
    fn test_session_survives_errors() {
        let interpreter = Interpreter::new();
        assert!(interpreter.eval_str("(foo 1)").is_err());
        assert_eq!(eval_to_string(&interpreter, "(+ 1 1)"), "2");
        assert_eq!(interpreter.environment().borrow().get_identifiers().len(), 6);
    }
}
