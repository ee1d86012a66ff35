use std::{
    io::{self, Write},
    rc::Rc,
};

use thiserror::Error;
use tracing::{debug, trace, warn};

use super::builtin::populate_builtin;
use super::callable::{LoxFunc, NativeFn, NativeFunc};
use super::config::Config;
use super::environment::Environment;
use super::stack::ensure_sufficient_stack;
use super::value::Value;
use crate::ast::{
    BinaryOp, Expr, ExprInner, FunDecl, Literal, LogicalOp, Pos, Program, Stmt, StmtInner,
    UnaryOp,
};

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("type error: {0}")]
    TypeMismatch(&'static str),
    #[error("arity mismatch: {name} expects {expected} arguments but got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("not callable: {0}")]
    NotCallable(String),
    #[error("divide by zero")]
    DivideByZero,
    #[error("return outside of a function")]
    InvalidReturn,
    #[error("stack overflow: more than {0} nested calls")]
    StackOverflow(usize),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// An error raised while running a program, tagged with the node that raised it
#[derive(Error, Debug)]
#[error("runtime error at {pos}: {kind}")]
pub struct RuntimeError {
    pub pos: Pos,
    #[source]
    pub kind: ErrorKind,
}

impl RuntimeError {
    pub fn new(pos: Pos, kind: ErrorKind) -> RuntimeError {
        RuntimeError { pos, kind }
    }
}

/// How a statement finished. A `Return` is passed up through enclosing statements
/// until a function call consumes it.
#[derive(Debug, PartialEq)]
pub enum Completion {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<Environment>,
    out: Box<dyn Write>,
    config: Config,
    depth: usize,
}

impl Interpreter {
    pub fn new(config: Config, out: Box<dyn Write>) -> Interpreter {
        let mut interpreter = Interpreter {
            globals: Environment::new_global(),
            out,
            config,
            depth: 0,
        };
        if interpreter.config.natives {
            populate_builtin(&mut interpreter);
        }
        interpreter
    }

    pub fn globals(&self) -> &Rc<Environment> {
        &self.globals
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn define_native(&mut self, name: &'static str, arity: usize, call: NativeFn) {
        self.globals.define(
            name,
            Value::Callable(Rc::new(NativeFunc { name, arity, call })),
        );
    }

    /// Run a program against the persistent globals. Declarations stay visible to later calls.
    pub fn interpret(&mut self, program: &Program) -> Result<(), RuntimeError> {
        debug!(statements = program.0.len(), "interpreting program");
        let result = self.run_program(program);
        // Output written before a failure still reaches the sink
        let flushed = self.out.flush();
        result?;
        flushed.map_err(|e| RuntimeError::new(Pos::default(), e.into()))?;
        debug!("program finished");
        Ok(())
    }

    fn run_program(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let globals = self.globals.clone();
        for stmt in program.0.iter() {
            if let Completion::Return(_) = self.execute(stmt, &globals)? {
                return Err(RuntimeError::new(stmt.pos, ErrorKind::InvalidReturn));
            }
        }
        Ok(())
    }

    pub fn execute(
        &mut self,
        stmt: &Stmt,
        env: &Rc<Environment>,
    ) -> Result<Completion, RuntimeError> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt, env))
    }

    fn execute_stmt(
        &mut self,
        stmt: &Stmt,
        env: &Rc<Environment>,
    ) -> Result<Completion, RuntimeError> {
        match &stmt.inner {
            StmtInner::Expr(expr) => {
                self.evaluate(expr, env)?;
                Ok(Completion::Normal)
            }
            StmtInner::Print(expr) => {
                let value = self.evaluate(expr, env)?;
                writeln!(self.out, "{}", value)
                    .map_err(|e| RuntimeError::new(stmt.pos, e.into()))?;
                Ok(Completion::Normal)
            }
            StmtInner::VarDecl { name, init } => {
                let value = match init {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                env.define(name, value);
                Ok(Completion::Normal)
            }
            StmtInner::Block(stmts) => {
                let scope = Environment::new_enclosed(env);
                self.execute_block(stmts, &scope)
            }
            StmtInner::If {
                expr,
                then,
                or_else,
            } => {
                if self.evaluate(expr, env)?.to_bool() {
                    self.execute(then, env)
                } else if let Some(or_else) = or_else {
                    self.execute(or_else, env)
                } else {
                    Ok(Completion::Normal)
                }
            }
            StmtInner::Loop { expr, body } => {
                while self.evaluate(expr, env)?.to_bool() {
                    if let Completion::Return(value) = self.execute(body, env)? {
                        return Ok(Completion::Return(value));
                    }
                }
                Ok(Completion::Normal)
            }
            StmtInner::FunDecl(decl) => {
                self.declare_function(decl, env);
                Ok(Completion::Normal)
            }
            StmtInner::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Completion::Return(value))
            }
        }
    }

    /// Run `stmts` in order inside `env`, stopping at the first `Return`
    pub fn execute_block(
        &mut self,
        stmts: &[Stmt],
        env: &Rc<Environment>,
    ) -> Result<Completion, RuntimeError> {
        for stmt in stmts {
            if let Completion::Return(value) = self.execute(stmt, env)? {
                return Ok(Completion::Return(value));
            }
        }
        Ok(Completion::Normal)
    }

    fn declare_function(&mut self, decl: &FunDecl, env: &Rc<Environment>) {
        debug!(name = %decl.name, arity = decl.parameters.len(), "declaring function");
        let func = LoxFunc {
            name: decl.name.clone(),
            parameters: decl.parameters.clone(),
            body: decl.body.clone(),
            closure: env.clone(),
        };
        env.define(&decl.name, Value::Callable(Rc::new(func)));
    }

    pub fn evaluate(&mut self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr, env))
    }

    fn evaluate_expr(&mut self, expr: &Expr, env: &Rc<Environment>) -> Result<Value, RuntimeError> {
        let pos = expr.pos;
        match &expr.inner {
            ExprInner::Literal(Literal::Number(n)) => Ok(Value::Number(n.into_inner())),
            ExprInner::Literal(Literal::String(s)) => Ok(Value::from(s.as_str())),
            ExprInner::Literal(Literal::Boolean(b)) => Ok(Value::Bool(*b)),
            ExprInner::Literal(Literal::Nil) => Ok(Value::Nil),
            ExprInner::Group(expr) => self.evaluate(expr, env),
            ExprInner::Unary { op, expr } => {
                let value = self.evaluate(expr, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.to_bool())),
                    UnaryOp::Negative => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new(
                            pos,
                            ErrorKind::TypeMismatch("operand must be a number"),
                        )),
                    },
                }
            }
            ExprInner::Binary { left, op, right } => {
                let lhs = self.evaluate(left, env)?;
                let rhs = self.evaluate(right, env)?;
                binary(*op, lhs, rhs).map_err(|kind| RuntimeError::new(pos, kind))
            }
            ExprInner::Logical { left, op, right } => {
                let left = self.evaluate(left, env)?;
                match op {
                    LogicalOp::And if !left.to_bool() => Ok(left),
                    LogicalOp::Or if left.to_bool() => Ok(left),
                    _ => self.evaluate(right, env),
                }
            }
            ExprInner::Variable(name) => {
                env.get(name).map_err(|kind| RuntimeError::new(pos, kind))
            }
            ExprInner::Assignment { target, expr } => {
                let value = self.evaluate(expr, env)?;
                env.assign(target, value.clone())
                    .map_err(|kind| RuntimeError::new(pos, kind))?;
                Ok(value)
            }
            ExprInner::Call { callee, arguments } => {
                let callee = self.evaluate(callee, env)?;
                let args = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;
                match callee.to_callable() {
                    Some(func) => func.call(self, args, pos),
                    None => Err(RuntimeError::new(
                        pos,
                        ErrorKind::NotCallable(callee.type_name().to_string()),
                    )),
                }
            }
        }
    }

    pub(super) fn enter_call(&mut self, name: &str, site: Pos) -> Result<(), RuntimeError> {
        if self.depth >= self.config.max_call_depth {
            warn!(name, limit = self.config.max_call_depth, "call depth exceeded");
            return Err(RuntimeError::new(
                site,
                ErrorKind::StackOverflow(self.config.max_call_depth),
            ));
        }
        self.depth += 1;
        trace!(name, depth = self.depth, "call");
        Ok(())
    }

    pub(super) fn exit_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ErrorKind> {
    let (l, r) = match (op, lhs, rhs) {
        (BinaryOp::Equal, lhs, rhs) => return Ok(Value::Bool(lhs == rhs)),
        (BinaryOp::NotEqual, lhs, rhs) => return Ok(Value::Bool(lhs != rhs)),
        (BinaryOp::Add, Value::String(l), Value::String(r)) => {
            let mut joined = String::with_capacity(l.len() + r.len());
            joined.push_str(&l);
            joined.push_str(&r);
            return Ok(Value::from(joined));
        }
        (_, Value::Number(l), Value::Number(r)) => (l, r),
        (BinaryOp::Add, _, _) => {
            return Err(ErrorKind::TypeMismatch(
                "operands must be two numbers or two strings",
            ))
        }
        _ => return Err(ErrorKind::TypeMismatch("operands must be numbers")),
    };

    match op {
        BinaryOp::Equal => Ok(Value::Bool(l == r)),
        BinaryOp::NotEqual => Ok(Value::Bool(l != r)),
        BinaryOp::Add => Ok(Value::Number(l + r)),
        BinaryOp::Subtract => Ok(Value::Number(l - r)),
        BinaryOp::Multiply => Ok(Value::Number(l * r)),
        BinaryOp::Divide if r == 0f64 => Err(ErrorKind::DivideByZero),
        BinaryOp::Divide => Ok(Value::Number(l / r)),
        BinaryOp::LessThan => Ok(Value::Bool(l < r)),
        BinaryOp::LessThanEqual => Ok(Value::Bool(l <= r)),
        BinaryOp::GreaterThan => Ok(Value::Bool(l > r)),
        BinaryOp::GreaterThanEqual => Ok(Value::Bool(l >= r)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_requires_numbers() {
        assert_eq!(
            Value::Number(3f64),
            binary(BinaryOp::Add, Value::Number(1f64), Value::Number(2f64)).unwrap()
        );
        assert!(matches!(
            binary(BinaryOp::Subtract, Value::from("a"), Value::Number(1f64)),
            Err(ErrorKind::TypeMismatch(_))
        ));
        assert!(matches!(
            binary(BinaryOp::Multiply, Value::Nil, Value::Nil),
            Err(ErrorKind::TypeMismatch(_))
        ));
    }

    #[test]
    fn add_concatenates_strings_only() {
        assert_eq!(
            Value::from("foobar"),
            binary(BinaryOp::Add, Value::from("foo"), Value::from("bar")).unwrap()
        );
        assert!(matches!(
            binary(BinaryOp::Add, Value::from("foo"), Value::Number(1f64)),
            Err(ErrorKind::TypeMismatch(_))
        ));
        assert!(matches!(
            binary(BinaryOp::Add, Value::Bool(true), Value::from("x")),
            Err(ErrorKind::TypeMismatch(_))
        ));
    }

    #[test]
    fn comparisons() {
        let cases = [
            (BinaryOp::LessThan, 1f64, 2f64, true),
            (BinaryOp::LessThan, 2f64, 2f64, false),
            (BinaryOp::LessThanEqual, 2f64, 2f64, true),
            (BinaryOp::GreaterThan, 3f64, 2f64, true),
            (BinaryOp::GreaterThanEqual, 1f64, 2f64, false),
        ];
        for (op, l, r, expected) in cases {
            assert_eq!(
                Value::Bool(expected),
                binary(op, Value::Number(l), Value::Number(r)).unwrap(),
                "{} {} {}",
                l,
                op,
                r
            );
        }
        assert!(matches!(
            binary(BinaryOp::LessThan, Value::from("a"), Value::from("b")),
            Err(ErrorKind::TypeMismatch(_))
        ));
    }

    #[test]
    fn equality_never_fails() {
        assert_eq!(
            Value::Bool(true),
            binary(BinaryOp::Equal, Value::Nil, Value::Nil).unwrap()
        );
        assert_eq!(
            Value::Bool(false),
            binary(BinaryOp::Equal, Value::from("1"), Value::Number(1f64)).unwrap()
        );
        assert_eq!(
            Value::Bool(true),
            binary(BinaryOp::NotEqual, Value::Bool(false), Value::Nil).unwrap()
        );
    }

    #[test]
    fn divide_by_zero() {
        assert!(matches!(
            binary(BinaryOp::Divide, Value::Number(1f64), Value::Number(0f64)),
            Err(ErrorKind::DivideByZero)
        ));
        assert_eq!(
            Value::Number(2.5),
            binary(BinaryOp::Divide, Value::Number(5f64), Value::Number(2f64)).unwrap()
        );
    }

    #[test]
    fn error_display_carries_position() {
        let error = RuntimeError::new(
            Pos::new(4, 2),
            ErrorKind::UndefinedVariable("a".to_string()),
        );
        assert_eq!("runtime error at 4:2: undefined variable: a", error.to_string());
    }
}
