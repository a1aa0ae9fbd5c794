use diagnostic::DiagnosticEngine;

use crate::{
  interpreter::Interpreter,
  lox_value::{InterpreterError, LoxValue},
};

pub mod native;
pub mod normal;

/// The calling convention shared by user functions and natives. Arity is
/// checked by the interpreter before `call` runs, so implementations may
/// assume `arguments.len() == self.arity()`.
pub trait LoxCallable {
  fn arity(&self) -> usize;
  fn call(
    &self,
    interpreter: &mut Interpreter,
    arguments: Vec<LoxValue>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError>;
}
