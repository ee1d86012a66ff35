use std::rc::Rc;

use super::environment::Environment;
use super::runtime::{Completion, ErrorKind, Interpreter, RuntimeError};
use super::value::Value;
use crate::ast::{Pos, Stmt};

pub trait Func {
    fn name(&self) -> &str;
    fn arity(&self) -> usize;

    /// Text used when the function value is printed
    fn descriptor(&self) -> String;

    /// Run the body. `args` already has exactly `arity()` entries.
    fn invoke(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        site: Pos,
    ) -> Result<Value, RuntimeError>;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        site: Pos,
    ) -> Result<Value, RuntimeError> {
        if args.len() != self.arity() {
            return Err(RuntimeError::new(
                site,
                ErrorKind::ArityMismatch {
                    name: self.name().to_string(),
                    expected: self.arity(),
                    got: args.len(),
                },
            ));
        }
        self.invoke(interpreter, args, site)
    }
}

pub type NativeFn = fn(&mut Interpreter, Vec<Value>) -> Result<Value, ErrorKind>;

#[derive(Debug, Clone)]
pub struct NativeFunc {
    pub name: &'static str,
    pub arity: usize,
    pub call: NativeFn,
}

impl Func for NativeFunc {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn descriptor(&self) -> String {
        format!("<native fn {}>", self.name)
    }

    fn invoke(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        site: Pos,
    ) -> Result<Value, RuntimeError> {
        (self.call)(interpreter, args).map_err(|kind| RuntimeError::new(site, kind))
    }
}

/// A user declared function, closed over the scope it was declared in
#[derive(Clone)]
pub struct LoxFunc {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Rc<[Stmt]>,
    pub closure: Rc<Environment>,
}

impl Func for LoxFunc {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.parameters.len()
    }

    fn descriptor(&self) -> String {
        format!("<fn {}>", self.name)
    }

    fn invoke(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        site: Pos,
    ) -> Result<Value, RuntimeError> {
        // Parameters live in a fresh scope under the closure, not under the caller's scope
        let env = Environment::new_enclosed(&self.closure);
        for (parameter, value) in self.parameters.iter().zip(args) {
            env.define(parameter, value);
        }

        interpreter.enter_call(&self.name, site)?;
        let result = interpreter.execute_block(&self.body, &env);
        interpreter.exit_call();

        match result? {
            Completion::Return(value) => Ok(value),
            Completion::Normal => Ok(Value::Nil),
        }
    }
}
