use crate::environment::{EnvError, Environment};
use crate::source::Span;
use crate::types::{Callable, Node, Sexpr};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

// --- Evaluation Error ---
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Syntax Error: {0}")]
    Syntax(String, Span), // Malformed form, e.g. (if x) or ()
    #[error(transparent)]
    Name(#[from] EnvError), // Unbound symbol
    #[error("Type Error: {0}")]
    Type(String, Span), // Wrong kind of value, e.g. (+ 'a 1) or (1 2)
    #[error("Argument Error: {0}")]
    Argument(String, Span), // Wrong arity or improper operand list
    #[error("Domain Error: {0}")]
    Domain(String, Span), // Division by zero, overflow
}

/// The category of an `EvalError`, for callers that only care which kind of
/// failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Name,
    Type,
    Argument,
    Domain,
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Syntax(..) => ErrorKind::Syntax,
            EvalError::Name(_) => ErrorKind::Name,
            EvalError::Type(..) => ErrorKind::Type,
            EvalError::Argument(..) => ErrorKind::Argument,
            EvalError::Domain(..) => ErrorKind::Domain,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            EvalError::Syntax(_, span)
            | EvalError::Type(_, span)
            | EvalError::Argument(_, span)
            | EvalError::Domain(_, span) => *span,
            EvalError::Name(EnvError::UnboundVariable(_, span)) => *span,
        }
    }
}

pub type EvalResult<T = Node> = Result<T, EvalError>;

// --- Evaluate Function ---

/// Evaluates a given AST Node within the specified environment.
///
/// Integers and procedures evaluate to themselves, symbols are looked up,
/// and a pair is a call whose head must evaluate to a `Callable`. Special
/// forms get their operands unevaluated; functions get them evaluated left
/// to right.
pub fn evaluate(node: Node, env: Rc<RefCell<Environment>>) -> EvalResult {
    match &*node.kind {
        Sexpr::Integer(_) | Sexpr::Procedure(_) => Ok(node.clone()),
        Sexpr::Symbol(name) => {
            let value = env.borrow().get(name, node.span)?;
            Ok(value)
        }
        Sexpr::Pair(operator, operands) => evaluate_call(operator, operands, env, node.span),
        Sexpr::Nil => Err(EvalError::Syntax(
            "cannot evaluate empty list".to_string(),
            node.span,
        )),
    }
}

fn evaluate_call(
    operator: &Node,
    operands: &Node,
    env: Rc<RefCell<Environment>>,
    span: Span,
) -> EvalResult {
    let operator_result_node = evaluate(operator.clone(), env.clone())?;
    let callable = match &*operator_result_node.kind {
        Sexpr::Procedure(callable) => *callable,
        _ => {
            return Err(EvalError::Type(
                "first element of a list must be callable".to_string(),
                operator.span,
            ));
        }
    };

    let operands = list_to_vec(operands, span)?;

    match callable {
        Callable::SpecialForm(form, _) => {
            debug!("special form '{}' with {} operands", callable.name(), operands.len());
            form(&operands, env, span)
        }
        Callable::Function(func, _) => {
            let mut evaluated_args: Vec<Node> = Vec::with_capacity(operands.len());
            for operand_node in operands {
                evaluated_args.push(evaluate(operand_node, env.clone())?);
            }
            debug!("function '{}' with {} arguments", callable.name(), evaluated_args.len());
            func(evaluated_args, span)
        }
    }
}

/// Flattens a proper list into its elements. `span` is reported when the
/// list turns out to be improper.
pub fn list_to_vec(list: &Node, span: Span) -> EvalResult<Vec<Node>> {
    let mut elements = Vec::new();
    let mut current = list.clone();
    loop {
        let next = match &*current.kind {
            Sexpr::Nil => return Ok(elements),
            Sexpr::Pair(car, cdr) => {
                elements.push(car.clone());
                cdr.clone()
            }
            _ => {
                return Err(EvalError::Argument(
                    "improper argument list".to_string(),
                    span,
                ));
            }
        };
        current = next;
    }
}

/// `(quote datum)`: returns the operand itself, unevaluated and uncopied.
pub fn evaluate_quote(operands: &[Node], _env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    if let [node] = operands {
        Ok(node.clone())
    } else {
        Err(EvalError::Syntax(
            "quote requires 1 operand".to_string(),
            span,
        ))
    }
}

/// `(if test consequent alternate)`: only the selected branch is evaluated.
pub fn evaluate_if(operands: &[Node], env: Rc<RefCell<Environment>>, span: Span) -> EvalResult {
    if let [condition, consequent, alternate] = operands {
        let condition_result = evaluate(condition.clone(), env.clone())?;
        if !condition_result.kind.is_false() {
            evaluate(consequent.clone(), env)
        } else {
            evaluate(alternate.clone(), env)
        }
    } else {
        Err(EvalError::Syntax("if requires 3 operands".to_string(), span))
    }
}
