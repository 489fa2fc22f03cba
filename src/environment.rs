use log::trace;
use thiserror::Error;

use crate::source::Span;
use crate::types::{Node, PrimitiveFunc, SpecialFormFn};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("Unbound variable: '{0}'")]
    UnboundVariable(String, Span), // Symbol name, span where lookup happened
}

// --- Environment Definition ---

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    // The global environment has no outer frame. Nothing creates nested
    // frames yet, but lookups already walk the chain.
    outer: Option<Rc<RefCell<Environment>>>,
    bindings: HashMap<String, Node>,
}

impl Environment {
    /// Creates a new, empty top-level environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: None,
            bindings: HashMap::new(),
        }))
    }

    /// Creates the global environment with every builtin installed.
    pub fn new_global_populated() -> Rc<RefCell<Environment>> {
        let env_ptr = Environment::new();
        {
            let mut env = env_ptr.borrow_mut();
            env.add_special_form("quote", crate::evaluator::evaluate_quote);
            env.add_special_form("if", crate::evaluator::evaluate_if);

            env.add_primitive("+", crate::primitives::prim_add);
            env.add_primitive("-", crate::primitives::prim_sub);
            env.add_primitive("*", crate::primitives::prim_mul);
            env.add_primitive("/", crate::primitives::prim_div);
        }
        env_ptr
    }

    /// Creates a new environment enclosed within an outer one.
    pub fn new_enclosed(outer_env: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings: HashMap::new(),
        }))
    }

    /// Binds `name` in this frame, replacing any previous binding here.
    pub fn define(&mut self, name: String, value_node: Node) {
        self.bindings.insert(name, value_node);
    }

    /// Looks up a variable's value, walking outward through enclosing frames.
    /// `lookup_span` is where the variable was referenced.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<Node, EnvError> {
        if let Some(value_node) = self.bindings.get(name) {
            trace!("lookup '{}' -> {}", name, value_node);
            Ok(value_node.clone())
        } else {
            match &self.outer {
                Some(outer_env_ptr) => outer_env_ptr.borrow().get(name, lookup_span),
                None => Err(EnvError::UnboundVariable(name.to_string(), lookup_span)),
            }
        }
    }

    fn add_special_form(&mut self, name: &'static str, func: SpecialFormFn) {
        self.define(name.to_string(), Node::new_special_form(func, name));
    }

    fn add_primitive(&mut self, name: &'static str, func: PrimitiveFunc) {
        self.define(name.to_string(), Node::new_primitive(func, name));
    }

    /// Every name visible from this environment, outer frames included.
    pub fn get_identifiers(&self) -> HashSet<String> {
        let mut identifiers: HashSet<String> = self.bindings.keys().cloned().collect();
        if let Some(outer_env_ptr) = &self.outer {
            identifiers.extend(outer_env_ptr.borrow().get_identifiers());
        }
        identifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Callable, Sexpr};

    fn num_node(n: i64) -> Node {
        Node::new_integer(n, Span::default())
    }

    #[test]
    fn test_define_and_get_global() {
        let env = Environment::new();
        env.borrow_mut().define("x".to_string(), num_node(10));

        let result = env.borrow().get("x", Span::default());
        assert_eq!(result, Ok(num_node(10)));
    }

    #[test]
    fn test_get_unbound_global() {
        let env = Environment::new();
        let span = Span::new(11, 12);
        let result = env.borrow().get("y", span);
        assert_eq!(
            result,
            Err(EnvError::UnboundVariable("y".to_string(), span))
        );
    }

    #[test]
    fn test_populated_has_exactly_the_builtins() {
        let env = Environment::new_global_populated();
        let mut names: Vec<String> = env.borrow().get_identifiers().into_iter().collect();
        names.sort();
        assert_eq!(names, vec!["*", "+", "-", "/", "if", "quote"]);

        let quote = env.borrow().get("quote", Span::default()).unwrap();
        assert!(matches!(
            &*quote.kind,
            Sexpr::Procedure(Callable::SpecialForm(_, "quote"))
        ));
        let plus = env.borrow().get("+", Span::default()).unwrap();
        assert!(matches!(
            &*plus.kind,
            Sexpr::Procedure(Callable::Function(_, "+"))
        ));
    }

    #[test]
    fn test_enclosed_lookup_and_shadowing() {
        let global_env = Environment::new();
        global_env.borrow_mut().define("x".to_string(), num_node(10));

        let local_env = Environment::new_enclosed(global_env.clone());
        local_env.borrow_mut().define("y".to_string(), num_node(20));

        assert_eq!(local_env.borrow().get("y", Span::default()), Ok(num_node(20)));
        assert_eq!(local_env.borrow().get("x", Span::default()), Ok(num_node(10)));

        local_env.borrow_mut().define("x".to_string(), num_node(50));
        assert_eq!(local_env.borrow().get("x", Span::default()), Ok(num_node(50)));
        assert_eq!(global_env.borrow().get("x", Span::default()), Ok(num_node(10)));
        assert!(global_env.borrow().get("y", Span::default()).is_err());
    }

    #[test]
    fn test_identifiers_include_outer_frames() {
        let global_env = Environment::new_global_populated();
        let local_env = Environment::new_enclosed(global_env);
        local_env.borrow_mut().define("local".to_string(), num_node(1));

        let ids = local_env.borrow().get_identifiers();
        assert!(ids.contains("local"));
        assert!(ids.contains("if"));
        assert_eq!(ids.len(), 7);
    }
}
