use crate::environment::Environment;
use crate::{evaluator::EvalResult, source::Span};
use std::cell::RefCell;
use std::fmt; // For custom display formatting
use std::mem;
use std::rc::Rc;

/// An S-expression together with the source span it was read from.
///
/// Nodes are immutable once built. Cloning a node is cheap and shares the
/// underlying tree, which is how `quote` hands back its operand.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Rc<Sexpr>,
    pub span: Span,
}

impl Node {
    pub fn new(kind: Sexpr, span: Span) -> Self {
        Node {
            kind: Rc::new(kind),
            span,
        }
    }

    pub fn new_integer(n: i64, span: Span) -> Self {
        Node::new(Sexpr::Integer(n), span)
    }

    pub fn new_symbol(name: impl Into<String>, span: Span) -> Self {
        Node::new(Sexpr::Symbol(name.into()), span)
    }

    pub fn new_nil(span: Span) -> Self {
        Node::new(Sexpr::Nil, span)
    }

    pub fn new_pair(car: Node, cdr: Node, span: Span) -> Self {
        Node::new(Sexpr::Pair(car, cdr), span)
    }

    /// Builds `(quote expr)`. `quote_span` covers the `'` mark.
    pub fn new_quote(expr: Node, quote_span: Span) -> Self {
        let span = quote_span.merge(expr.span);
        let tail = Node::new_pair(expr, Node::new_nil(span), span);
        Node::new_pair(Node::new_symbol("quote", quote_span), tail, span)
    }

    pub fn new_special_form(func: SpecialFormFn, name: &'static str) -> Self {
        Node::new(
            Sexpr::Procedure(Callable::SpecialForm(func, name)),
            Span::default(),
        )
    }

    pub fn new_primitive(func: PrimitiveFunc, name: &'static str) -> Self {
        Node::new(
            Sexpr::Procedure(Callable::Function(func, name)),
            Span::default(),
        )
    }

    /// Builds a proper list from `items`, keeping their order.
    pub fn list_from(items: Vec<Node>, span: Span) -> Self {
        Node::chain(items, Node::new_nil(span), span)
    }

    /// Links `items` in order, ending the chain with `tail`.
    pub fn chain(items: Vec<Node>, tail: Node, span: Span) -> Self {
        items.into_iter().rev().fold(tail, |cdr, car| {
            let pair_span = Span::new(car.span.start, span.end);
            Node::new_pair(car, cdr, pair_span)
        })
    }

    /// True when both nodes point at the same shared tree.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.kind, &other.kind)
    }
}

// Structural equality; spans are ignored.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Represents an S-expression: code and data alike.
#[derive(Debug, Clone)]
pub enum Sexpr {
    Integer(i64),
    Symbol(String),
    Pair(Node, Node), // (car . cdr)
    Nil,              // The empty list '()
    Procedure(Callable),
}

impl Sexpr {
    pub fn type_name(&self) -> &'static str {
        match self {
            Sexpr::Integer(_) => "integer",
            Sexpr::Symbol(_) => "symbol",
            Sexpr::Pair(_, _) => "pair",
            Sexpr::Nil => "nil",
            Sexpr::Procedure(Callable::SpecialForm(..)) => "special form",
            Sexpr::Procedure(Callable::Function(..)) => "function",
        }
    }

    /// The distinguished false value. Nothing in this language is false yet,
    /// so every value selects the consequent branch of `if`.
    pub fn is_false(&self) -> bool {
        false
    }
}

// Walks the cdr chain in a loop so long flat lists compare in constant stack.
impl PartialEq for Sexpr {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            match (left, right) {
                (Sexpr::Pair(car_l, cdr_l), Sexpr::Pair(car_r, cdr_r)) => {
                    if car_l != car_r {
                        return false;
                    }
                    left = &*cdr_l.kind;
                    right = &*cdr_r.kind;
                }
                (Sexpr::Integer(a), Sexpr::Integer(b)) => return a == b,
                (Sexpr::Symbol(a), Sexpr::Symbol(b)) => return a == b,
                (Sexpr::Nil, Sexpr::Nil) => return true,
                (Sexpr::Procedure(a), Sexpr::Procedure(b)) => return a == b,
                _ => return false,
            }
        }
    }
}

// The default drop recurses once per cell down the cdr chain. Unlink the tail
// of every uniquely owned cell first so a list of any length drops iteratively.
impl Drop for Sexpr {
    fn drop(&mut self) {
        let Sexpr::Pair(_, cdr) = self else {
            return;
        };
        let placeholder = Rc::new(Sexpr::Nil);
        let mut tail = mem::replace(&mut cdr.kind, placeholder.clone());
        loop {
            let Ok(mut cell) = Rc::try_unwrap(tail) else {
                break;
            };
            let Sexpr::Pair(_, cdr) = &mut cell else {
                break;
            };
            tail = mem::replace(&mut cdr.kind, placeholder.clone());
        }
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Integer(n) => write!(f, "{}", n),
            Sexpr::Symbol(s) => write!(f, "{}", s),
            Sexpr::Nil => write!(f, "()"),
            Sexpr::Pair(car, cdr) => {
                write!(f, "({}", car)?;
                let mut rest = cdr.clone();
                loop {
                    let next = match &*rest.kind {
                        Sexpr::Nil => break,
                        Sexpr::Pair(car, cdr) => {
                            write!(f, " {}", car)?;
                            cdr.clone()
                        }
                        tail => {
                            write!(f, " . {}", tail)?;
                            break;
                        }
                    };
                    rest = next;
                }
                write!(f, ")")
            }
            Sexpr::Procedure(Callable::SpecialForm(_, name)) => {
                write!(f, "#<special-form:{}>", name)
            }
            Sexpr::Procedure(Callable::Function(_, name)) => write!(f, "#<function:{}>", name),
        }
    }
}

/// Receives the unevaluated operands and decides what to evaluate itself.
pub type SpecialFormFn = fn(&[Node], Rc<RefCell<Environment>>, Span) -> EvalResult;

/// Receives operands that have already been evaluated, left to right.
pub type PrimitiveFunc = fn(Vec<Node>, Span) -> EvalResult;

#[derive(Clone, Copy)]
pub enum Callable {
    SpecialForm(SpecialFormFn, &'static str),
    Function(PrimitiveFunc, &'static str),
}

impl Callable {
    pub fn name(&self) -> &'static str {
        match self {
            Callable::SpecialForm(_, name) | Callable::Function(_, name) => *name,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::SpecialForm(_, name) => write!(f, "SpecialForm({})", name),
            Callable::Function(_, name) => write!(f, "Function({})", name),
        }
    }
}

// Function pointers don't compare reliably, so callables compare by kind and name.
impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::SpecialForm(_, n1), Callable::SpecialForm(_, n2)) => n1 == n2,
            (Callable::Function(_, n1), Callable::Function(_, n2)) => n1 == n2,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Node {
        Node::new_integer(n, Span::default())
    }

    #[test]
    fn test_display_atoms() {
        assert_eq!(int(-42).to_string(), "-42");
        assert_eq!(Node::new_symbol("list-ref", Span::default()).to_string(), "list-ref");
        assert_eq!(Node::new_nil(Span::default()).to_string(), "()");
    }

    #[test]
    fn test_display_lists() {
        let proper = Node::list_from(vec![int(1), int(2), int(3)], Span::default());
        assert_eq!(proper.to_string(), "(1 2 3)");

        let dotted = Node::new_pair(int(1), int(2), Span::default());
        assert_eq!(dotted.to_string(), "(1 . 2)");

        let long_dotted = Node::chain(vec![int(1), int(2)], int(3), Span::default());
        assert_eq!(long_dotted.to_string(), "(1 2 . 3)");

        let nested = Node::list_from(
            vec![
                Node::new_nil(Span::default()),
                Node::list_from(vec![int(4)], Span::default()),
            ],
            Span::default(),
        );
        assert_eq!(nested.to_string(), "(() (4))");
    }

    fn long_list(len: usize) -> Node {
        Node::list_from((0..len as i64).map(int).collect(), Span::default())
    }

    #[test]
    fn test_long_list_compares_and_drops() {
        let a = long_list(100_000);
        let b = long_list(100_000);
        assert_eq!(a, b);
        assert_ne!(a, long_list(99_999));
        drop(a);
        drop(b);
    }

    #[test]
    fn test_shared_tail_survives_drop() {
        let tail = long_list(3);
        let head = Node::new_pair(int(0), tail.clone(), Span::default());
        drop(head);
        assert_eq!(tail.to_string(), "(0 1 2)");
    }

    #[test]
    fn test_quote_construction() {
        let quoted = Node::new_quote(int(7), Span::new(0, 1));
        assert_eq!(quoted.to_string(), "(quote 7)");
    }

    #[test]
    fn test_equality_ignores_spans() {
        assert_eq!(int(1), Node::new_integer(1, Span::new(5, 6)));
        assert_ne!(int(1), int(2));
    }

    #[test]
    fn test_clone_shares_tree() {
        let list = Node::list_from(vec![int(1)], Span::default());
        let copy = list.clone();
        assert!(list.ptr_eq(&copy));
    }

    #[test]
    fn test_nothing_is_false() {
        assert!(!Sexpr::Integer(0).is_false());
        assert!(!Sexpr::Nil.is_false());
    }
}
