#![allow(dead_code)]

use std::{cell::RefCell, io, io::Write, rc::Rc};

use loxwalk::ast::*;
use loxwalk::{Config, Interpreter, RuntimeError};
use ordered_float::OrderedFloat;

/// Output sink that keeps everything printed so tests can inspect it
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.borrow())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn interpreter() -> (Interpreter, Capture) {
    interpreter_with(Config::default())
}

pub fn interpreter_with(config: Config) -> (Interpreter, Capture) {
    let capture = Capture::default();
    (Interpreter::new(config, Box::new(capture.clone())), capture)
}

/// Run `stmts` in a fresh interpreter and return the printed lines
pub fn run(stmts: Vec<Stmt>) -> Result<Vec<String>, RuntimeError> {
    let (mut interpreter, capture) = interpreter();
    interpreter.interpret(&Program(stmts))?;
    Ok(capture.lines())
}

pub fn at(line: usize) -> Pos {
    Pos::new(line, 0)
}

fn expr(inner: ExprInner) -> Expr {
    Expr {
        pos: Pos::default(),
        inner,
    }
}

fn stmt(inner: StmtInner) -> Stmt {
    Stmt {
        pos: Pos::default(),
        inner,
    }
}

pub fn located(line: usize, mut stmt: Stmt) -> Stmt {
    stmt.pos = at(line);
    stmt
}

pub fn located_expr(line: usize, mut expr: Expr) -> Expr {
    expr.pos = at(line);
    expr
}

pub fn num(n: f64) -> Expr {
    expr(ExprInner::Literal(Literal::Number(OrderedFloat(n))))
}

pub fn string(s: &str) -> Expr {
    expr(ExprInner::Literal(Literal::String(s.to_string())))
}

pub fn boolean(b: bool) -> Expr {
    expr(ExprInner::Literal(Literal::Boolean(b)))
}

pub fn nil() -> Expr {
    expr(ExprInner::Literal(Literal::Nil))
}

pub fn var(name: &str) -> Expr {
    expr(ExprInner::Variable(name.to_string()))
}

pub fn group(inner: Expr) -> Expr {
    expr(ExprInner::Group(Box::new(inner)))
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    expr(ExprInner::Unary {
        op,
        expr: Box::new(operand),
    })
}

pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    expr(ExprInner::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
    expr(ExprInner::Logical {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn assign(target: &str, value: Expr) -> Expr {
    expr(ExprInner::Assignment {
        target: target.to_string(),
        expr: Box::new(value),
    })
}

pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    expr(ExprInner::Call {
        callee: Box::new(callee),
        arguments,
    })
}

pub fn expr_stmt(e: Expr) -> Stmt {
    stmt(StmtInner::Expr(e))
}

pub fn print(e: Expr) -> Stmt {
    stmt(StmtInner::Print(e))
}

pub fn var_decl(name: &str, init: Option<Expr>) -> Stmt {
    stmt(StmtInner::VarDecl {
        name: name.to_string(),
        init,
    })
}

pub fn block(stmts: Vec<Stmt>) -> Stmt {
    stmt(StmtInner::Block(stmts))
}

pub fn if_else(cond: Expr, then: Stmt, or_else: Option<Stmt>) -> Stmt {
    stmt(StmtInner::If {
        expr: cond,
        then: Box::new(then),
        or_else: or_else.map(Box::new),
    })
}

pub fn while_loop(cond: Expr, body: Stmt) -> Stmt {
    stmt(StmtInner::Loop {
        expr: cond,
        body: Box::new(body),
    })
}

pub fn fun(name: &str, parameters: &[&str], body: Vec<Stmt>) -> Stmt {
    stmt(StmtInner::FunDecl(FunDecl {
        name: name.to_string(),
        parameters: parameters.iter().map(|p| p.to_string()).collect(),
        body: body.into(),
    }))
}

pub fn ret(value: Option<Expr>) -> Stmt {
    stmt(StmtInner::Return(value))
}
