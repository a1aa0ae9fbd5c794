use std::collections::HashMap;

use diagnostic::{
  diagnostic::{Diagnostic, Label, Locus, Span},
  diagnostic_code::DiagnosticCode,
  DiagnosticEngine,
};
use parser::{expr::Expr, stmt::Stmt};
use scanner::token::Token;
use uuid::Uuid;

/// Static pass between the parser and the interpreter. Walks the tree once,
/// records how many scope hops away each binding reference lives, and flags
/// the misuses (`return`/`this`/`super`/redeclaration) that are detectable
/// without running the program.
///
/// Global scope is not represented on the stack; a reference that matches
/// no scope is left out of the map and the interpreter treats it as global.
pub struct Resolver {
  scopes: Vec<HashMap<String, VariableState>>,
  locals: HashMap<Uuid, usize>,
  current_function: FunctionType,
  current_class: ClassType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionType {
  None,
  Function,
  Initializer,
  Method,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClassType {
  None,
  Class,
  Subclass,
}

#[derive(Debug, Clone)]
struct VariableState {
  defined: bool,
  used: bool,
  span: Span,
}

impl Resolver {
  pub fn new() -> Self {
    Self {
      scopes: vec![],
      locals: HashMap::new(),
      current_function: FunctionType::None,
      current_class: ClassType::None,
    }
  }

  pub fn run(&mut self, statements: &[Stmt], engine: &mut DiagnosticEngine) {
    self.resolve_statements(statements, engine);
  }

  /// The depth map, keyed by node id. Written here, read by the
  /// interpreter, never mutated afterwards.
  pub fn into_locals(self) -> HashMap<Uuid, usize> {
    self.locals
  }

  fn resolve_statements(&mut self, statements: &[Stmt], engine: &mut DiagnosticEngine) {
    for statement in statements {
      self.resolve_stmt(statement, engine);
    }
  }

  fn resolve_stmt(&mut self, statement: &Stmt, engine: &mut DiagnosticEngine) {
    match statement {
      Stmt::Block(statements) => {
        self.begin_scope();
        self.resolve_statements(statements, engine);
        self.end_scope(engine);
      },
      Stmt::Class {
        name,
        superclass,
        methods,
      } => self.resolve_class(name, superclass.as_ref(), methods, engine),
      Stmt::Expression(expr) => self.resolve_expr(expr, engine),
      Stmt::Function { name, params, body } => {
        // Defined before the body resolves, so the function can recurse.
        self.declare(name, engine);
        self.define(name);
        self.resolve_function(params, body, FunctionType::Function, engine);
      },
      Stmt::If {
        condition,
        then_branch,
        else_branch,
      } => {
        self.resolve_expr(condition, engine);
        self.resolve_stmt(then_branch, engine);
        if let Some(else_branch) = else_branch {
          self.resolve_stmt(else_branch, engine);
        }
      },
      Stmt::Print(expr) => self.resolve_expr(expr, engine),
      Stmt::Return { keyword, value } => {
        if self.current_function == FunctionType::None {
          self.error(
            DiagnosticCode::ReturnOutsideFunction,
            "Can't return from top-level code.",
            keyword,
            engine,
          );
        }

        if let Some(value) = value {
          if self.current_function == FunctionType::Initializer {
            self.error(
              DiagnosticCode::ReturnValueFromInitializer,
              "Can't return a value from an initializer.",
              keyword,
              engine,
            );
          }
          self.resolve_expr(value, engine);
        }
      },
      Stmt::Var { name, initializer } => {
        self.declare(name, engine);
        if let Some(initializer) = initializer {
          self.resolve_expr(initializer, engine);
        }
        self.define(name);
      },
      Stmt::While { condition, body } => {
        self.resolve_expr(condition, engine);
        self.resolve_stmt(body, engine);
      },
    }
  }

  fn resolve_class(
    &mut self,
    name: &Token,
    superclass: Option<&Expr>,
    methods: &[Stmt],
    engine: &mut DiagnosticEngine,
  ) {
    let enclosing_class = self.current_class;
    self.current_class = ClassType::Class;

    self.declare(name, engine);
    self.define(name);

    if let Some(superclass) = superclass {
      if let Expr::Variable {
        name: superclass_name,
        ..
      } = superclass
      {
        if superclass_name.lexeme == name.lexeme {
          self.error(
            DiagnosticCode::InheritFromSelf,
            "A class can't inherit from itself.",
            superclass_name,
            engine,
          );
        }
      }

      self.current_class = ClassType::Subclass;
      self.resolve_expr(superclass, engine);

      // Methods of a subclass close over an extra scope holding 'super'.
      self.begin_scope();
      self.define_implicit("super", name);
    }

    // Every method body resolves 'this' against this implicit scope.
    self.begin_scope();
    self.define_implicit("this", name);

    for method in methods {
      if let Stmt::Function {
        name: method_name,
        params,
        body,
      } = method
      {
        let function_type = if method_name.lexeme == "init" {
          FunctionType::Initializer
        } else {
          FunctionType::Method
        };
        self.resolve_function(params, body, function_type, engine);
      }
    }

    self.end_scope(engine);
    if superclass.is_some() {
      self.end_scope(engine);
    }

    self.current_class = enclosing_class;
  }

  fn resolve_function(
    &mut self,
    params: &[Token],
    body: &[Stmt],
    function_type: FunctionType,
    engine: &mut DiagnosticEngine,
  ) {
    let enclosing_function = self.current_function;
    self.current_function = function_type;

    self.begin_scope();
    for param in params {
      self.declare(param, engine);
      self.define(param);
    }
    self.resolve_statements(body, engine);
    self.end_scope(engine);

    self.current_function = enclosing_function;
  }

  fn resolve_expr(&mut self, expr: &Expr, engine: &mut DiagnosticEngine) {
    match expr {
      Expr::Assign { id, name, value } => {
        self.resolve_expr(value, engine);
        self.resolve_local(*id, &name.lexeme);
      },
      Expr::Binary { lhs, rhs, .. } | Expr::Logical { lhs, rhs, .. } => {
        self.resolve_expr(lhs, engine);
        self.resolve_expr(rhs, engine);
      },
      Expr::Call {
        callee, arguments, ..
      } => {
        self.resolve_expr(callee, engine);
        for argument in arguments {
          self.resolve_expr(argument, engine);
        }
      },
      // Property names are looked up at runtime; only the object resolves.
      Expr::Get { object, .. } => self.resolve_expr(object, engine),
      Expr::Grouping(expr) => self.resolve_expr(expr, engine),
      Expr::Literal(_) => {},
      Expr::Set { object, value, .. } => {
        self.resolve_expr(value, engine);
        self.resolve_expr(object, engine);
      },
      Expr::Super { id, keyword, .. } => {
        match self.current_class {
          ClassType::None => self.error(
            DiagnosticCode::SuperOutsideClass,
            "Can't use 'super' outside of a class.",
            keyword,
            engine,
          ),
          ClassType::Class => self.error(
            DiagnosticCode::SuperWithoutSuperclass,
            "Can't use 'super' in a class with no superclass.",
            keyword,
            engine,
          ),
          ClassType::Subclass => {},
        }
        self.resolve_local(*id, &keyword.lexeme);
      },
      Expr::This { id, keyword } => {
        if self.current_class == ClassType::None {
          self.error(
            DiagnosticCode::ThisOutsideClass,
            "Can't use 'this' outside of a class.",
            keyword,
            engine,
          );
          return;
        }
        self.resolve_local(*id, &keyword.lexeme);
      },
      Expr::Unary { rhs, .. } => self.resolve_expr(rhs, engine),
      Expr::Variable { id, name } => {
        if let Some(scope) = self.scopes.last() {
          if let Some(state) = scope.get(&name.lexeme) {
            if !state.defined {
              self.error(
                DiagnosticCode::SelfReferencingInitializer,
                "Can't read local variable in its own initializer.",
                name,
                engine,
              );
            }
          }
        }
        self.resolve_local(*id, &name.lexeme);
      },
    }
  }

  /// Walk the scope stack from innermost to outermost; the first hit fixes
  /// the reference's hop distance. No hit means global.
  fn resolve_local(&mut self, id: Uuid, name: &str) {
    for (distance, scope) in self.scopes.iter_mut().rev().enumerate() {
      if let Some(state) = scope.get_mut(name) {
        state.used = true;
        self.locals.insert(id, distance);
        return;
      }
    }
  }

  fn begin_scope(&mut self) {
    self.scopes.push(HashMap::new());
  }

  fn end_scope(&mut self, engine: &mut DiagnosticEngine) {
    let Some(scope) = self.scopes.pop() else {
      return;
    };

    for (name, state) in scope {
      if state.defined && !state.used {
        let diagnostic = Diagnostic::new(
          DiagnosticCode::UnusedVariable,
          format!("Variable '{}' is never used.", name),
        )
        .with_label(Label::primary(
          state.span.clone(),
          Some("declared here".to_string()),
        ))
        .with_help("Did you forget to use it?".to_string());

        engine.emit(diagnostic);
      }
    }
  }

  /// Mark the name as existing in the innermost scope, but poisoned until
  /// `define` runs; reading it in between is the own-initializer error.
  fn declare(&mut self, name: &Token, engine: &mut DiagnosticEngine) {
    let Some(scope) = self.scopes.last() else {
      return;
    };

    // Local redeclaration is an error; global redeclaration is not.
    if scope.contains_key(&name.lexeme) {
      self.error(
        DiagnosticCode::VariableAlreadyDeclared,
        "Already a variable with this name in this scope.",
        name,
        engine,
      );
      return;
    }

    let state = VariableState {
      defined: false,
      used: false,
      span: name.to_span(),
    };
    if let Some(scope) = self.scopes.last_mut() {
      scope.insert(name.lexeme.clone(), state);
    }
  }

  /// Mark the variable as defined / ready to use.
  fn define(&mut self, name: &Token) {
    let Some(scope) = self.scopes.last_mut() else {
      return;
    };
    if let Some(state) = scope.get_mut(&name.lexeme) {
      state.defined = true;
    }
  }

  /// Insert a binding the language itself provides ('this'/'super');
  /// pre-marked used so it never trips the unused-variable warning.
  fn define_implicit(&mut self, name: &str, class_name: &Token) {
    if let Some(scope) = self.scopes.last_mut() {
      scope.insert(
        name.to_string(),
        VariableState {
          defined: true,
          used: true,
          span: class_name.to_span(),
        },
      );
    }
  }

  fn error(
    &self,
    code: DiagnosticCode,
    message: &str,
    token: &Token,
    engine: &mut DiagnosticEngine,
  ) {
    let diagnostic = Diagnostic::new(code, message.to_string())
      .with_locus(Locus::Lexeme(token.lexeme.clone()))
      .with_label(Label::primary(token.to_span(), None));

    engine.emit(diagnostic);
  }
}

impl Default for Resolver {
  fn default() -> Self {
    Self::new()
  }
}
