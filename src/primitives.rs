use crate::{EvalError, EvalResult, Node, Sexpr, Span};

// Checks the number of arguments
macro_rules! check_arity {
    ($args:expr, min $expected:expr, $span:expr, $name:expr) => {
        if $args.len() < $expected {
            return Err(EvalError::Argument(
                format!(
                    "wrong number of arguments: '{}' expects at least {}, got {}",
                    $name,
                    $expected,
                    $args.len()
                ),
                $span,
            ));
        }
    };
}

fn expect_integer(node: &Node, operator: &str) -> EvalResult<i64> {
    match *node.kind {
        Sexpr::Integer(n) => Ok(n),
        ref other => Err(EvalError::Type(
            format!(
                "arguments must be numbers: '{}' got {}",
                operator,
                other.type_name()
            ),
            node.span,
        )),
    }
}

fn overflow(operator: &str, span: Span) -> EvalError {
    EvalError::Domain(format!("integer overflow in '{}'", operator), span)
}

fn fold_integers<F: Fn(i64, i64) -> Option<i64>>(
    args: &[Node],
    span: Span,
    start: i64,
    func: F,
    operator: &str,
) -> EvalResult<i64> {
    let mut acc = start;
    for node in args {
        let num = expect_integer(node, operator)?;
        acc = func(acc, num).ok_or_else(|| overflow(operator, span))?;
    }
    Ok(acc)
}

pub fn prim_add(args: Vec<Node>, span: Span) -> EvalResult {
    // (+) -> 0
    // (+ 1 2 3) -> 6
    let sum = fold_integers(&args, span, 0, i64::checked_add, "+")?;
    Ok(Node::new_integer(sum, span))
}

pub fn prim_sub(args: Vec<Node>, span: Span) -> EvalResult {
    // (- x) -> x
    // (- x y z) -> x - y - z
    check_arity!(args, min 1, span, "-");
    let first = expect_integer(&args[0], "-")?;
    let result = fold_integers(&args[1..], span, first, i64::checked_sub, "-")?;
    Ok(Node::new_integer(result, span))
}

pub fn prim_mul(args: Vec<Node>, span: Span) -> EvalResult {
    // (*) -> 1
    // (* 1 2 3) -> 6
    let product = fold_integers(&args, span, 1, i64::checked_mul, "*")?;
    Ok(Node::new_integer(product, span))
}

pub fn prim_div(args: Vec<Node>, span: Span) -> EvalResult {
    // (/ x) -> x
    // (/ x y z) -> x / y / z, truncating
    check_arity!(args, min 1, span, "/");
    let mut result = expect_integer(&args[0], "/")?;
    for node in &args[1..] {
        let divisor = expect_integer(node, "/")?;
        if divisor == 0 {
            return Err(EvalError::Domain("division by zero".to_string(), node.span));
        }
        result = result
            .checked_div(divisor)
            .ok_or_else(|| overflow("/", span))?;
    }
    Ok(Node::new_integer(result, span))
}
