use std::{cell::RefCell, rc::Rc};

use chrono::Utc;
use diagnostic::DiagnosticEngine;

use crate::{
  env::Env,
  function::LoxCallable,
  interpreter::Interpreter,
  lox_value::{InterpreterError, LoxValue},
};

/// The one built-in: wall time in fractional seconds since the Unix epoch.
pub struct ClockFunction;

impl ClockFunction {
  pub fn install(globals: &Rc<RefCell<Env>>) {
    globals.borrow_mut().define(
      "clock".to_string(),
      LoxValue::NativeFunction(Rc::new(ClockFunction)),
    );
  }
}

impl LoxCallable for ClockFunction {
  fn arity(&self) -> usize {
    0
  }

  fn call(
    &self,
    _interpreter: &mut Interpreter,
    _arguments: Vec<LoxValue>,
    _engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let now = Utc::now();
    Ok(LoxValue::Number(now.timestamp_micros() as f64 / 1e6))
  }
}
