use std::fmt;

use scanner::token::Token;
use uuid::Uuid;

/// Expression node. The variants that name a binding (`Variable`, `Assign`,
/// `This`, `Super`) carry an id assigned at parse time; the resolver keys
/// its depth map on that id, so a node keeps its resolution even when a
/// closure body is cloned.
#[derive(Debug, Clone)]
pub enum Expr {
  Assign {
    id: Uuid,
    name: Token,
    value: Box<Expr>,
  },
  Binary {
    lhs: Box<Expr>,
    operator: Token,
    rhs: Box<Expr>,
  },
  Call {
    callee: Box<Expr>,
    paren: Token,
    arguments: Vec<Expr>,
  },
  Get {
    object: Box<Expr>,
    name: Token,
  },
  Grouping(Box<Expr>),
  Literal(Token),
  Logical {
    lhs: Box<Expr>,
    operator: Token,
    rhs: Box<Expr>,
  },
  Set {
    object: Box<Expr>,
    name: Token,
    value: Box<Expr>,
  },
  Super {
    id: Uuid,
    keyword: Token,
    method: Token,
  },
  This {
    id: Uuid,
    keyword: Token,
  },
  Unary {
    operator: Token,
    rhs: Box<Expr>,
  },
  Variable {
    id: Uuid,
    name: Token,
  },
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Assign { name, value, .. } => write!(f, "({} = {})", name.lexeme, value),
      Expr::Binary { lhs, operator, rhs } => write!(f, "({} {} {})", lhs, operator.lexeme, rhs),
      Expr::Call {
        callee, arguments, ..
      } => {
        let args = arguments
          .iter()
          .map(|a| a.to_string())
          .collect::<Vec<_>>()
          .join(", ");
        write!(f, "{}({})", callee, args)
      },
      Expr::Get { object, name } => write!(f, "{}.{}", object, name.lexeme),
      Expr::Grouping(expr) => write!(f, "(group {})", expr),
      Expr::Literal(token) => write!(f, "{}", token.lexeme),
      Expr::Logical { lhs, operator, rhs } => write!(f, "({} {} {})", lhs, operator.lexeme, rhs),
      Expr::Set {
        object,
        name,
        value,
      } => write!(f, "({}.{} = {})", object, name.lexeme, value),
      Expr::Super { method, .. } => write!(f, "super.{}", method.lexeme),
      Expr::This { .. } => write!(f, "this"),
      Expr::Unary { operator, rhs } => write!(f, "({} {})", operator.lexeme, rhs),
      Expr::Variable { name, .. } => write!(f, "{}", name.lexeme),
    }
  }
}
