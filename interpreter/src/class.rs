use std::{cell::RefCell, collections::HashMap, rc::Rc};

use diagnostic::DiagnosticEngine;

use crate::{
  function::{normal::LoxFunction, LoxCallable},
  interpreter::Interpreter,
  lox_value::{InterpreterError, LoxValue},
};

#[derive(Debug)]
pub struct LoxClass {
  pub name: String,
  pub superclass: Option<Rc<LoxClass>>,
  pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
  /// Method lookup: own map first, then up the superclass chain.
  pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
    if let Some(method) = self.methods.get(name) {
      return Some(Rc::clone(method));
    }
    self
      .superclass
      .as_ref()
      .and_then(|superclass| superclass.find_method(name))
  }

  /// Calling a class builds an instance; an `init` method, when present,
  /// runs bound to it with the call's arguments.
  pub fn instantiate(
    class: &Rc<LoxClass>,
    interpreter: &mut Interpreter,
    arguments: Vec<LoxValue>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

    if let Some(initializer) = class.find_method("init") {
      initializer
        .bind(Rc::clone(&instance))
        .call(interpreter, arguments, engine)?;
    }

    Ok(LoxValue::Instance(instance))
  }

  /// A class's arity is its initializer's, or zero without one.
  pub fn arity(&self) -> usize {
    self
      .find_method("init")
      .map(|initializer| initializer.arity())
      .unwrap_or(0)
  }
}

/// A bag of fields plus the class it dispatches methods through.
#[derive(Debug)]
pub struct LoxInstance {
  pub class: Rc<LoxClass>,
  pub fields: HashMap<String, LoxValue>,
}

impl LoxInstance {
  pub fn new(class: Rc<LoxClass>) -> Self {
    Self {
      class,
      fields: HashMap::new(),
    }
  }
}
