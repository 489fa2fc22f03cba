use cellisp::{
    EnvError, Environment, Error, ErrorKind, EvalError, Interpreter, Node, ParseError, Parser,
    Sexpr, Span, evaluate, parse_str,
};

fn read(input: &str) -> Node {
    match parse_str(input) {
        Ok(node) => node,
        Err(e) => panic!("Parsing failed for input '{}': {}", input, e),
    }
}

fn eval(input: &str) -> Result<Node, EvalError> {
    evaluate(read(input), Environment::new_global_populated())
}

fn eval_int(input: &str) -> i64 {
    match eval(input) {
        Ok(node) => match *node.kind {
            Sexpr::Integer(n) => n,
            ref other => panic!("Expected an integer for '{}', got {}", input, other),
        },
        Err(e) => panic!("Evaluation failed for input '{}': {}", input, e),
    }
}

#[test]
fn render_round_trips_normalized_text() {
    for input in [
        "42",
        "-17",
        "foo",
        "()",
        "(1 2 3)",
        "(a (b (c)) d)",
        "(1 . 2)",
        "(1 2 . 3)",
        "(list-ref x 0)",
    ] {
        assert_eq!(read(input).to_string(), input);
    }
    assert_eq!(read("  (  1\n  2 )  ").to_string(), "(1 2)");
}

#[test]
fn quote_shorthand_matches_quote_form() {
    assert_eq!(read("(quote (1 2 3))"), read("'(1 2 3)"));
}

#[test]
fn arithmetic_folds() {
    assert_eq!(eval_int("(+ 1 2 3)"), 6);
    assert_eq!(eval_int("(* )"), 1);
    assert_eq!(eval_int("(+ )"), 0);
    assert_eq!(eval_int("(- 10 3 2)"), 5);
    assert_eq!(eval_int("(/ 20 2 5)"), 2);
}

#[test]
fn division_by_zero_is_a_domain_error() {
    let err = eval("(/ 1 0)").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
}

#[test]
fn zero_is_truthy() {
    assert_eq!(eval_int("(if 0 1 2)"), 1);
}

#[test]
fn unmatched_parens_are_syntax_errors() {
    assert!(matches!(
        parse_str("(1 2"),
        Err(ParseError::UnmatchedOpenParen(_))
    ));

    let mut parser = Parser::new("1 2)").unwrap();
    parser.read().unwrap();
    parser.read().unwrap();
    assert!(matches!(
        parser.read(),
        Err(ParseError::UnexpectedCloseParen(_))
    ));
}

#[test]
fn dotted_pair_keeps_atom_tail() {
    let node = read("(1 . 2)");
    match &*node.kind {
        Sexpr::Pair(first, second) => {
            assert_eq!(*first.kind, Sexpr::Integer(1));
            assert_eq!(*second.kind, Sexpr::Integer(2));
        }
        other => panic!("Expected a pair, got {:?}", other),
    }
    assert_eq!(node.to_string(), "(1 . 2)");
}

#[test]
fn unbound_symbol_is_a_name_error() {
    match eval("(foo 1)") {
        Err(EvalError::Name(EnvError::UnboundVariable(name, span))) => {
            assert_eq!(name, "foo");
            assert_eq!(span, Span::new(1, 4));
        }
        other => panic!("Expected a name error, got {:?}", other),
    }
}

#[test]
fn interpreter_reports_parse_and_eval_errors_separately() {
    let interpreter = Interpreter::new();
    assert!(matches!(
        interpreter.eval_str("(+ 1 2"),
        Err(Error::Parse(ParseError::UnmatchedOpenParen(_)))
    ));
    assert!(matches!(
        interpreter.eval_str("(1 2)"),
        Err(Error::Eval(EvalError::Type(..)))
    ));
    let value = interpreter.eval_str("'(if 0 1 2) (- 3)").unwrap().unwrap();
    assert_eq!(value.to_string(), "3");
}

#[test]
fn long_flat_lists_read_evaluate_and_drop() {
    let operands = " 1".repeat(100_000);

    let sum = format!("(+{})", operands);
    assert_eq!(eval_int(&sum), 100_000);

    let quoted = read(&format!("'({})", operands));
    let spelled_out = read(&format!("(quote ({}))", operands));
    assert_eq!(quoted, spelled_out);
    drop(quoted);
    drop(spelled_out);

    let interpreter = Interpreter::new();
    let value = interpreter.eval_str(&sum).unwrap().unwrap();
    assert_eq!(value.to_string(), "100000");
}
