use std::fmt;
use std::rc::Rc;

use scanner::token::Token;

use crate::expr::Expr;

/// Statement node. Function bodies sit behind an `Rc` so that evaluating a
/// declaration (which happens once per enclosing call for nested functions)
/// shares the body instead of deep-copying it into every closure.
#[derive(Debug, Clone)]
pub enum Stmt {
  Block(Vec<Stmt>),
  Class {
    name: Token,
    /// Always an `Expr::Variable` when present.
    superclass: Option<Expr>,
    /// Always `Stmt::Function` entries.
    methods: Vec<Stmt>,
  },
  Expression(Expr),
  Function {
    name: Token,
    params: Vec<Token>,
    body: Rc<Vec<Stmt>>,
  },
  If {
    condition: Expr,
    then_branch: Box<Stmt>,
    else_branch: Option<Box<Stmt>>,
  },
  Print(Expr),
  Return {
    keyword: Token,
    value: Option<Expr>,
  },
  Var {
    name: Token,
    initializer: Option<Expr>,
  },
  While {
    condition: Expr,
    body: Box<Stmt>,
  },
}

impl fmt::Display for Stmt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Stmt::Block(stmts) => {
        write!(f, "{{ ")?;
        for stmt in stmts {
          write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
      },
      Stmt::Class { name, .. } => write!(f, "class {} {{...}}", name.lexeme),
      Stmt::Expression(expr) => write!(f, "{};", expr),
      Stmt::Function { name, params, .. } => {
        let params = params
          .iter()
          .map(|p| p.lexeme.clone())
          .collect::<Vec<_>>()
          .join(", ");
        write!(f, "fun {}({}) {{...}}", name.lexeme, params)
      },
      Stmt::If {
        condition,
        then_branch,
        else_branch,
      } => match else_branch {
        Some(else_branch) => {
          write!(f, "if {} {} else {}", condition, then_branch, else_branch)
        },
        None => write!(f, "if {} {}", condition, then_branch),
      },
      Stmt::Print(expr) => write!(f, "print {};", expr),
      Stmt::Return { value, .. } => match value {
        Some(value) => write!(f, "return {};", value),
        None => write!(f, "return;"),
      },
      Stmt::Var { name, initializer } => match initializer {
        Some(init) => write!(f, "var {} = {};", name.lexeme, init),
        None => write!(f, "var {};", name.lexeme),
      },
      Stmt::While { condition, body } => write!(f, "while {} {}", condition, body),
    }
  }
}
