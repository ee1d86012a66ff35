//! A tree-walking evaluator for a small Lox-like scripting language.
//!
//! The crate consumes an already parsed [`ast::Program`] and runs it directly, with
//! lexically scoped environments and first class closures.

pub mod ast;
pub mod interpreter;

pub use interpreter::{stock_interpreter, Config, Interpreter, RuntimeError, Value};
