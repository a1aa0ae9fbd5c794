use std::{cell::RefCell, rc::Rc};

use diagnostic::DiagnosticEngine;
use parser::stmt::Stmt;
use scanner::token::Token;

use crate::{
  class::LoxInstance,
  env::Env,
  function::LoxCallable,
  interpreter::Interpreter,
  lox_value::{InterpreterError, LoxValue},
};

/// A user-declared function or method: the declaration's parameter list and
/// body plus the environment chain captured where the declaration ran.
#[derive(Debug)]
pub struct LoxFunction {
  pub name: String,
  pub params: Vec<Token>,
  pub body: Rc<Vec<Stmt>>,
  pub closure: Rc<RefCell<Env>>,
  pub is_initializer: bool,
}

impl LoxCallable for LoxFunction {
  fn arity(&self) -> usize {
    self.params.len()
  }

  fn call(
    &self,
    interpreter: &mut Interpreter,
    arguments: Vec<LoxValue>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    // Parameters live in a fresh frame directly inside the closure, one
    // frame per call so recursion works.
    let env = Rc::new(RefCell::new(Env::with_enclosing(Rc::clone(&self.closure))));
    for (param, argument) in self.params.iter().zip(arguments) {
      env.borrow_mut().define(param.lexeme.clone(), argument);
    }

    match interpreter.execute_block(&self.body, &env, engine) {
      Ok(()) => {
        if self.is_initializer {
          return Ok(self.this_value());
        }
        Ok(LoxValue::Nil)
      },
      Err(InterpreterError::Return(value)) => {
        // An initializer returns the instance even on a bare `return;`.
        if self.is_initializer {
          return Ok(self.this_value());
        }
        Ok(value)
      },
      Err(error) => Err(error),
    }
  }
}

impl LoxFunction {
  /// A copy of this method whose closure has `this` bound to `instance`,
  /// one frame inside the original closure.
  pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> Rc<LoxFunction> {
    let env = Rc::new(RefCell::new(Env::with_enclosing(Rc::clone(&self.closure))));
    env
      .borrow_mut()
      .define("this".to_string(), LoxValue::Instance(instance));

    Rc::new(LoxFunction {
      name: self.name.clone(),
      params: self.params.clone(),
      body: Rc::clone(&self.body),
      closure: env,
      is_initializer: self.is_initializer,
    })
  }

  /// For an initializer the closure's innermost frame is the `this` frame
  /// installed by `bind`.
  fn this_value(&self) -> LoxValue {
    self
      .closure
      .borrow()
      .get_at(0, "this")
      .unwrap_or(LoxValue::Nil)
  }
}
