mod builtin;
mod callable;
mod config;
mod environment;
mod runtime;
mod stack;
mod value;

use std::io::Write;

pub use builtin::populate_builtin;
pub use callable::{Func, LoxFunc, NativeFn, NativeFunc};
pub use config::{Config, MAX_CALL_DEPTH_VAR, NO_NATIVES_VAR};
pub use environment::Environment;
pub use runtime::{Completion, ErrorKind, Interpreter, RuntimeError};
pub use value::Value;

/// An interpreter with the default configuration and the native functions installed
pub fn stock_interpreter(out: Box<dyn Write>) -> Interpreter {
    Interpreter::new(Config::default(), out)
}
