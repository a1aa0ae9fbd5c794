use std::{
  cell::RefCell,
  collections::HashMap,
  io::{self, Write},
  rc::Rc,
};

use diagnostic::{
  diagnostic::{Diagnostic, Label},
  diagnostic_code::DiagnosticCode,
  DiagnosticEngine,
};
use parser::{expr::Expr, stmt::Stmt};
use scanner::token::{
  types::{Literal, TokenType},
  Token,
};
use uuid::Uuid;

use crate::{
  class::LoxClass,
  env::Env,
  function::{native::clock::ClockFunction, normal::LoxFunction, LoxCallable},
  lox_value::{InterpreterError, LoxValue},
};

pub struct Interpreter {
  pub globals: Rc<RefCell<Env>>,
  /// The resolver's depth map: reference node id to scope hops. Extended
  /// per resolved program, never replaced, so closures created by earlier
  /// REPL lines keep their bindings.
  locals: HashMap<Uuid, usize>,
  output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
  pub fn new() -> Self {
    Self::with_output(Rc::new(RefCell::new(io::stdout())))
  }

  pub fn with_output(output: Rc<RefCell<dyn Write>>) -> Self {
    let globals = Rc::new(RefCell::new(Env::new()));
    ClockFunction::install(&globals);

    Self {
      globals,
      locals: HashMap::new(),
      output,
    }
  }

  /// Executes a resolved program. The first runtime error stops execution;
  /// its diagnostic is already in the engine when this returns.
  pub fn run(
    &mut self,
    statements: &[Stmt],
    locals: HashMap<Uuid, usize>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    self.locals.extend(locals);

    let globals = Rc::clone(&self.globals);
    for statement in statements {
      match self.eval_stmt(statement, &globals, engine) {
        Ok(()) => {},
        // The resolver rejects top-level `return`, so an escaping Return
        // cannot happen; it is still not an error, so don't report one.
        Err(InterpreterError::Return(_)) => {},
        Err(error) => return Err(error),
      }
    }

    Ok(())
  }

  /// Runs the statements of a block or function body in `env`.
  pub fn execute_block(
    &mut self,
    statements: &[Stmt],
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    for statement in statements {
      self.eval_stmt(statement, env, engine)?;
    }
    Ok(())
  }

  fn eval_stmt(
    &mut self,
    statement: &Stmt,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    match statement {
      Stmt::Block(statements) => {
        // The block's frame exists only for this execution of the block.
        let block_env = Rc::new(RefCell::new(Env::with_enclosing(Rc::clone(env))));
        self.execute_block(statements, &block_env, engine)
      },
      Stmt::Class {
        name,
        superclass,
        methods,
      } => self.eval_class(name, superclass.as_ref(), methods, env, engine),
      Stmt::Expression(expr) => {
        self.eval_expr(expr, env, engine)?;
        Ok(())
      },
      Stmt::Function { name, params, body } => {
        let function = LoxFunction {
          name: name.lexeme.clone(),
          params: params.clone(),
          body: Rc::clone(body),
          closure: Rc::clone(env),
          is_initializer: false,
        };
        env
          .borrow_mut()
          .define(name.lexeme.clone(), LoxValue::Function(Rc::new(function)));
        Ok(())
      },
      Stmt::If {
        condition,
        then_branch,
        else_branch,
      } => {
        if self.eval_expr(condition, env, engine)?.is_truthy() {
          self.eval_stmt(then_branch, env, engine)
        } else if let Some(else_branch) = else_branch {
          self.eval_stmt(else_branch, env, engine)
        } else {
          Ok(())
        }
      },
      Stmt::Print(expr) => {
        let value = self.eval_expr(expr, env, engine)?;
        let _ = writeln!(self.output.borrow_mut(), "{}", value);
        Ok(())
      },
      Stmt::Return { value, .. } => {
        let value = match value {
          Some(value) => self.eval_expr(value, env, engine)?,
          None => LoxValue::Nil,
        };
        Err(InterpreterError::Return(value))
      },
      Stmt::Var { name, initializer } => {
        let value = match initializer {
          Some(initializer) => self.eval_expr(initializer, env, engine)?,
          None => LoxValue::Nil,
        };
        env.borrow_mut().define(name.lexeme.clone(), value);
        Ok(())
      },
      Stmt::While { condition, body } => {
        while self.eval_expr(condition, env, engine)?.is_truthy() {
          self.eval_stmt(body, env, engine)?;
        }
        Ok(())
      },
    }
  }

  fn eval_class(
    &mut self,
    name: &Token,
    superclass: Option<&Expr>,
    methods: &[Stmt],
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    let superclass_value = match superclass {
      Some(superclass_expr) => match self.eval_expr(superclass_expr, env, engine)? {
        LoxValue::Class(class) => Some(class),
        _ => {
          let token = match superclass_expr {
            Expr::Variable { name, .. } => name,
            _ => name,
          };
          return Err(self.runtime_error(
            DiagnosticCode::SuperclassMustBeClass,
            "Superclass must be a class.".to_string(),
            token,
            engine,
          ));
        },
      },
      None => None,
    };

    env.borrow_mut().define(name.lexeme.clone(), LoxValue::Nil);

    // Methods of a subclass close over an extra frame holding 'super',
    // mirroring the implicit scope the resolver put around them.
    let class_env = match &superclass_value {
      Some(superclass) => {
        let super_env = Rc::new(RefCell::new(Env::with_enclosing(Rc::clone(env))));
        super_env
          .borrow_mut()
          .define("super".to_string(), LoxValue::Class(Rc::clone(superclass)));
        super_env
      },
      None => Rc::clone(env),
    };

    let mut method_map = HashMap::new();
    for method in methods {
      if let Stmt::Function {
        name: method_name,
        params,
        body,
      } = method
      {
        let function = LoxFunction {
          name: method_name.lexeme.clone(),
          params: params.clone(),
          body: Rc::clone(body),
          closure: Rc::clone(&class_env),
          is_initializer: method_name.lexeme == "init",
        };
        method_map.insert(method_name.lexeme.clone(), Rc::new(function));
      }
    }

    let class = Rc::new(LoxClass {
      name: name.lexeme.clone(),
      superclass: superclass_value,
      methods: method_map,
    });

    env.borrow_mut().assign(&name.lexeme, LoxValue::Class(class));
    Ok(())
  }

  fn eval_expr(
    &mut self,
    expr: &Expr,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    match expr {
      Expr::Assign { id, name, value } => self.eval_assign(*id, name, value, env, engine),
      Expr::Binary { lhs, operator, rhs } => self.eval_binary(lhs, operator, rhs, env, engine),
      Expr::Call {
        callee,
        paren,
        arguments,
      } => self.eval_call(callee, paren, arguments, env, engine),
      Expr::Get { object, name } => self.eval_get(object, name, env, engine),
      Expr::Grouping(inner) => self.eval_expr(inner, env, engine),
      Expr::Literal(token) => Ok(self.eval_literal(token)),
      Expr::Logical { lhs, operator, rhs } => self.eval_logical(lhs, operator, rhs, env, engine),
      Expr::Set {
        object,
        name,
        value,
      } => self.eval_set(object, name, value, env, engine),
      Expr::Super { id, keyword, method } => self.eval_super(*id, keyword, method, env, engine),
      Expr::This { id, keyword } => self.look_up_variable(*id, keyword, env, engine),
      Expr::Unary { operator, rhs } => self.eval_unary(operator, rhs, env, engine),
      Expr::Variable { id, name } => self.look_up_variable(*id, name, env, engine),
    }
  }

  fn eval_literal(&self, token: &Token) -> LoxValue {
    match &token.literal {
      Literal::Number(n) => LoxValue::Number(*n),
      Literal::Str(s) => LoxValue::String(s.clone()),
      Literal::Bool(b) => LoxValue::Bool(*b),
      Literal::Nil => LoxValue::Nil,
    }
  }

  fn eval_unary(
    &mut self,
    operator: &Token,
    rhs: &Expr,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let rhs = self.eval_expr(rhs, env, engine)?;

    match operator.token_type {
      TokenType::Bang => Ok(LoxValue::Bool(!rhs.is_truthy())),
      TokenType::Minus => match rhs {
        LoxValue::Number(n) => Ok(LoxValue::Number(-n)),
        _ => Err(self.runtime_error(
          DiagnosticCode::OperandMustBeNumber,
          "Operand must be a number.".to_string(),
          operator,
          engine,
        )),
      },
      _ => unreachable!("parser only builds unary nodes for ! and -"),
    }
  }

  fn eval_binary(
    &mut self,
    lhs: &Expr,
    operator: &Token,
    rhs: &Expr,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    // Both operands evaluate before the operator's type check, so an
    // error on the right side still reflects a fully evaluated left side.
    let lhs = self.eval_expr(lhs, env, engine)?;
    let rhs = self.eval_expr(rhs, env, engine)?;

    match operator.token_type {
      TokenType::Plus => match (lhs, rhs) {
        (LoxValue::Number(a), LoxValue::Number(b)) => Ok(LoxValue::Number(a + b)),
        (LoxValue::String(a), LoxValue::String(b)) => Ok(LoxValue::String(a + &b)),
        _ => Err(self.runtime_error(
          DiagnosticCode::OperandsMustBeNumbersOrStrings,
          "Operands must be two numbers or two strings.".to_string(),
          operator,
          engine,
        )),
      },
      TokenType::Minus => {
        let (a, b) = self.number_operands(lhs, rhs, operator, engine)?;
        Ok(LoxValue::Number(a - b))
      },
      TokenType::Star => {
        let (a, b) = self.number_operands(lhs, rhs, operator, engine)?;
        Ok(LoxValue::Number(a * b))
      },
      TokenType::Slash => {
        let (a, b) = self.number_operands(lhs, rhs, operator, engine)?;
        if b == 0.0 {
          return Err(self.runtime_error(
            DiagnosticCode::DivisionByZero,
            "Division by zero.".to_string(),
            operator,
            engine,
          ));
        }
        Ok(LoxValue::Number(a / b))
      },
      TokenType::Greater => {
        let (a, b) = self.number_operands(lhs, rhs, operator, engine)?;
        Ok(LoxValue::Bool(a > b))
      },
      TokenType::GreaterEqual => {
        let (a, b) = self.number_operands(lhs, rhs, operator, engine)?;
        Ok(LoxValue::Bool(a >= b))
      },
      TokenType::Less => {
        let (a, b) = self.number_operands(lhs, rhs, operator, engine)?;
        Ok(LoxValue::Bool(a < b))
      },
      TokenType::LessEqual => {
        let (a, b) = self.number_operands(lhs, rhs, operator, engine)?;
        Ok(LoxValue::Bool(a <= b))
      },
      TokenType::EqualEqual => Ok(LoxValue::Bool(lhs.equals(&rhs))),
      TokenType::BangEqual => Ok(LoxValue::Bool(!lhs.equals(&rhs))),
      _ => unreachable!("parser only builds binary nodes for binary operators"),
    }
  }

  fn number_operands(
    &self,
    lhs: LoxValue,
    rhs: LoxValue,
    operator: &Token,
    engine: &mut DiagnosticEngine,
  ) -> Result<(f64, f64), InterpreterError> {
    match (lhs, rhs) {
      (LoxValue::Number(a), LoxValue::Number(b)) => Ok((a, b)),
      _ => Err(self.runtime_error(
        DiagnosticCode::OperandsMustBeNumbers,
        "Operands must be numbers.".to_string(),
        operator,
        engine,
      )),
    }
  }

  /// `and`/`or` short-circuit and yield the deciding operand's value, not
  /// a coerced boolean.
  fn eval_logical(
    &mut self,
    lhs: &Expr,
    operator: &Token,
    rhs: &Expr,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let lhs = self.eval_expr(lhs, env, engine)?;

    match operator.token_type {
      TokenType::Or if lhs.is_truthy() => Ok(lhs),
      TokenType::And if !lhs.is_truthy() => Ok(lhs),
      _ => self.eval_expr(rhs, env, engine),
    }
  }

  fn eval_assign(
    &mut self,
    id: Uuid,
    name: &Token,
    value: &Expr,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let value = self.eval_expr(value, env, engine)?;

    let assigned = match self.locals.get(&id) {
      Some(&distance) => env
        .borrow_mut()
        .assign_at(distance, &name.lexeme, value.clone()),
      None => self.globals.borrow_mut().assign(&name.lexeme, value.clone()),
    };

    if !assigned {
      return Err(self.runtime_error(
        DiagnosticCode::UndefinedVariable,
        format!("Undefined variable '{}'.", name.lexeme),
        name,
        engine,
      ));
    }

    Ok(value)
  }

  fn look_up_variable(
    &mut self,
    id: Uuid,
    name: &Token,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let value = match self.locals.get(&id) {
      Some(&distance) => env.borrow().get_at(distance, &name.lexeme),
      // Unresolved references live in globals or nowhere.
      None => self.globals.borrow().get(&name.lexeme),
    };

    value.ok_or_else(|| {
      self.runtime_error(
        DiagnosticCode::UndefinedVariable,
        format!("Undefined variable '{}'.", name.lexeme),
        name,
        engine,
      )
    })
  }

  fn eval_call(
    &mut self,
    callee: &Expr,
    paren: &Token,
    arguments: &[Expr],
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let callee = self.eval_expr(callee, env, engine)?;

    let mut argument_values = Vec::with_capacity(arguments.len());
    for argument in arguments {
      argument_values.push(self.eval_expr(argument, env, engine)?);
    }

    match callee {
      LoxValue::Function(function) => {
        self.check_arity(function.arity(), argument_values.len(), paren, engine)?;
        function.call(self, argument_values, engine)
      },
      LoxValue::NativeFunction(function) => {
        self.check_arity(function.arity(), argument_values.len(), paren, engine)?;
        function.call(self, argument_values, engine)
      },
      LoxValue::Class(class) => {
        self.check_arity(class.arity(), argument_values.len(), paren, engine)?;
        LoxClass::instantiate(&class, self, argument_values, engine)
      },
      _ => Err(self.runtime_error(
        DiagnosticCode::NotCallable,
        "Can only call functions and classes.".to_string(),
        paren,
        engine,
      )),
    }
  }

  fn check_arity(
    &self,
    expected: usize,
    got: usize,
    paren: &Token,
    engine: &mut DiagnosticEngine,
  ) -> Result<(), InterpreterError> {
    if expected == got {
      return Ok(());
    }
    Err(self.runtime_error(
      DiagnosticCode::WrongNumberOfArguments,
      format!("Expected {} arguments but got {}.", expected, got),
      paren,
      engine,
    ))
  }

  fn eval_get(
    &mut self,
    object: &Expr,
    name: &Token,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let object = self.eval_expr(object, env, engine)?;

    let LoxValue::Instance(instance) = object else {
      return Err(self.runtime_error(
        DiagnosticCode::OnlyInstancesHaveProperties,
        "Only instances have properties.".to_string(),
        name,
        engine,
      ));
    };

    // Fields shadow methods.
    if let Some(field) = instance.borrow().fields.get(&name.lexeme) {
      return Ok(field.clone());
    }

    if let Some(method) = instance.borrow().class.find_method(&name.lexeme) {
      return Ok(LoxValue::Function(method.bind(Rc::clone(&instance))));
    }

    Err(self.runtime_error(
      DiagnosticCode::UndefinedProperty,
      format!("Undefined property '{}'.", name.lexeme),
      name,
      engine,
    ))
  }

  fn eval_set(
    &mut self,
    object: &Expr,
    name: &Token,
    value: &Expr,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let object = self.eval_expr(object, env, engine)?;

    let LoxValue::Instance(instance) = object else {
      return Err(self.runtime_error(
        DiagnosticCode::OnlyInstancesHaveFields,
        "Only instances have fields.".to_string(),
        name,
        engine,
      ));
    };

    let value = self.eval_expr(value, env, engine)?;
    instance
      .borrow_mut()
      .fields
      .insert(name.lexeme.clone(), value.clone());

    Ok(value)
  }

  fn eval_super(
    &mut self,
    id: Uuid,
    keyword: &Token,
    method: &Token,
    env: &Rc<RefCell<Env>>,
    engine: &mut DiagnosticEngine,
  ) -> Result<LoxValue, InterpreterError> {
    let Some(&distance) = self.locals.get(&id) else {
      return Err(self.runtime_error(
        DiagnosticCode::UndefinedVariable,
        "Undefined variable 'super'.".to_string(),
        keyword,
        engine,
      ));
    };

    // The resolver pinned 'super' at `distance`; the receiver's 'this'
    // frame sits one hop closer by construction.
    let superclass = env.borrow().get_at(distance, "super");
    let receiver = env.borrow().get_at(distance - 1, "this");

    let (Some(LoxValue::Class(superclass)), Some(LoxValue::Instance(receiver))) =
      (superclass, receiver)
    else {
      return Err(self.runtime_error(
        DiagnosticCode::UndefinedVariable,
        "Undefined variable 'super'.".to_string(),
        keyword,
        engine,
      ));
    };

    match superclass.find_method(&method.lexeme) {
      Some(found) => Ok(LoxValue::Function(found.bind(receiver))),
      None => Err(self.runtime_error(
        DiagnosticCode::UndefinedProperty,
        format!("Undefined property '{}'.", method.lexeme),
        method,
        engine,
      )),
    }
  }

  fn runtime_error(
    &self,
    code: DiagnosticCode,
    message: String,
    token: &Token,
    engine: &mut DiagnosticEngine,
  ) -> InterpreterError {
    let diagnostic =
      Diagnostic::new(code, message).with_label(Label::primary(token.to_span(), None));
    engine.emit(diagnostic);
    InterpreterError::Runtime
  }
}

impl Default for Interpreter {
  fn default() -> Self {
    Self::new()
  }
}
