use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::runtime::ErrorKind;
use super::value::Value;

/// One scope's bindings plus the scope it is lexically nested in.
///
/// Environments are handed around as `Rc<Environment>`: a block holds its scope for as long
/// as it runs, and every function value declared inside it holds the same scope as its
/// closure. The enclosing link only ever points outward toward the globals, so the chain
/// cannot form a cycle.
#[derive(Default)]
pub struct Environment {
    values: RefCell<HashMap<String, Value>>,
    enclosing: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new_global() -> Rc<Environment> {
        Rc::new(Environment::default())
    }

    pub fn new_enclosed(enclosing: &Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            values: RefCell::new(HashMap::new()),
            enclosing: Some(enclosing.clone()),
        })
    }

    pub fn enclosing(&self) -> Option<&Rc<Environment>> {
        self.enclosing.as_ref()
    }

    /// Bind in this scope only, replacing an existing binding of the same name here
    pub fn define(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value, ErrorKind> {
        let mut env = self;
        loop {
            if let Some(value) = env.values.borrow().get(name) {
                return Ok(value.clone());
            }
            match &env.enclosing {
                Some(enclosing) => env = enclosing.as_ref(),
                None => return Err(ErrorKind::UndefinedVariable(name.to_string())),
            }
        }
    }

    /// Overwrite the nearest existing binding of `name`. Never creates one.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), ErrorKind> {
        let mut env = self;
        loop {
            if let Some(slot) = env.values.borrow_mut().get_mut(name) {
                *slot = value;
                return Ok(());
            }
            match &env.enclosing {
                Some(enclosing) => env = enclosing.as_ref(),
                None => return Err(ErrorKind::UndefinedVariable(name.to_string())),
            }
        }
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }
}
