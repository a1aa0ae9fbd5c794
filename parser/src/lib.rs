/*
*
*  The grammar, lowest precedence first:
*
*  program    -> declaration* EOF ;
*  declaration-> classDecl | funDecl | varDecl | statement ;
*  classDecl  -> "class" IDENTIFIER ( "<" IDENTIFIER )? "{" function* "}" ;
*  funDecl    -> "fun" function ;
*  function   -> IDENTIFIER "(" parameters? ")" block ;
*  varDecl    -> "var" IDENTIFIER ( "=" expression )? ";" ;
*  statement  -> exprStmt | forStmt | ifStmt | printStmt | returnStmt
*              | whileStmt | block ;
*
*  expression -> assignment ;
*  assignment -> ( call "." )? IDENTIFIER "=" assignment | logic_or ;
*  logic_or   -> logic_and ( "or" logic_and )* ;
*  logic_and  -> equality ( "and" equality )* ;
*  equality   -> comparison ( ( "!=" | "==" ) comparison )* ;
*  comparison -> term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
*  term       -> factor ( ( "-" | "+" ) factor )* ;
*  factor     -> unary ( ( "/" | "*" ) unary )* ;
*  unary      -> ( "!" | "-" ) unary | call ;
*  call       -> primary ( "(" arguments? ")" | "." IDENTIFIER )* ;
*  primary    -> "true" | "false" | "nil" | "this" | NUMBER | STRING
*              | IDENTIFIER | "(" expression ")" | "super" "." IDENTIFIER ;
*
*/

use std::rc::Rc;

use diagnostic::{
  diagnostic::{Diagnostic, Label, Locus},
  diagnostic_code::DiagnosticCode,
  DiagnosticEngine,
};
use scanner::token::{
  types::{Literal, TokenType},
  Token,
};
use uuid::Uuid;

use crate::{expr::Expr, stmt::Stmt};

pub mod expr;
pub mod stmt;

/// Sentinel for a syntax error. The diagnostic has already been emitted
/// into the engine by the time this is returned; the value only exists to
/// unwind the current production so `declaration` can synchronize.
#[derive(Debug, Clone, Copy)]
pub struct ParseError;

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
  /// The tokens produced by the scanner
  tokens: Vec<Token>,
  /// The pointer to the current token we are looking at
  current: usize,
}

impl Parser {
  pub fn new(tokens: Vec<Token>) -> Self {
    Self { tokens, current: 0 }
  }

  /// Function that takes the tokens produced by the scanner and returns the
  /// statement list. Syntax errors are emitted into `engine` and parsing
  /// resumes at the next statement boundary, so the list may be partial;
  /// the caller checks the engine before running it.
  pub fn parse(&mut self, engine: &mut DiagnosticEngine) -> Vec<Stmt> {
    let mut statements = vec![];
    while !self.is_at_end() {
      if let Some(stmt) = self.declaration(engine) {
        statements.push(stmt);
      }
    }
    statements
  }

  fn declaration(&mut self, engine: &mut DiagnosticEngine) -> Option<Stmt> {
    let result = if self.match_token(TokenType::Class) {
      self.class_declaration(engine)
    } else if self.match_token(TokenType::Fun) {
      self.function(engine, "function")
    } else if self.match_token(TokenType::Var) {
      self.var_declaration(engine)
    } else {
      self.statement(engine)
    };

    match result {
      Ok(stmt) => Some(stmt),
      Err(_) => {
        self.synchronize();
        None
      },
    }
  }

  fn class_declaration(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let name = self.consume(TokenType::Identifier, "Expect class name.", engine)?;

    let superclass = if self.match_token(TokenType::Less) {
      let name = self.consume(TokenType::Identifier, "Expect superclass name.", engine)?;
      Some(Expr::Variable {
        id: Uuid::now_v7(),
        name,
      })
    } else {
      None
    };

    self.consume(TokenType::LeftBrace, "Expect '{' before class body.", engine)?;

    let mut methods = vec![];
    while !self.check(TokenType::RightBrace) && !self.is_at_end() {
      methods.push(self.function(engine, "method")?);
    }

    self.consume(TokenType::RightBrace, "Expect '}' after class body.", engine)?;

    Ok(Stmt::Class {
      name,
      superclass,
      methods,
    })
  }

  /// Function that parses a free function or a method; `kind` only changes
  /// the diagnostic wording.
  fn function(&mut self, engine: &mut DiagnosticEngine, kind: &str) -> ParseResult<Stmt> {
    let name = self.consume(
      TokenType::Identifier,
      &format!("Expect {} name.", kind),
      engine,
    )?;
    self.consume(
      TokenType::LeftParen,
      &format!("Expect '(' after {} name.", kind),
      engine,
    )?;

    let mut params = vec![];
    if !self.check(TokenType::RightParen) {
      loop {
        if params.len() >= 255 {
          // Reported but not fatal: the parser is still in a sane state.
          self.error(
            self.peek().clone(),
            DiagnosticCode::TooManyParameters,
            "Can't have more than 255 parameters.",
            engine,
          );
        }
        params.push(self.consume(TokenType::Identifier, "Expect parameter name.", engine)?);
        if !self.match_token(TokenType::Comma) {
          break;
        }
      }
    }

    self.consume(TokenType::RightParen, "Expect ')' after parameters.", engine)?;
    self.consume(
      TokenType::LeftBrace,
      &format!("Expect '{{' before {} body.", kind),
      engine,
    )?;
    let body = self.block(engine)?;

    Ok(Stmt::Function {
      name,
      params,
      body: Rc::new(body),
    })
  }

  fn var_declaration(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let name = self.consume(TokenType::Identifier, "Expect variable name.", engine)?;

    let initializer = if self.match_token(TokenType::Equal) {
      Some(self.expression(engine)?)
    } else {
      None
    };

    self.consume(
      TokenType::SemiColon,
      "Expect ';' after variable declaration.",
      engine,
    )?;

    Ok(Stmt::Var { name, initializer })
  }

  fn statement(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    if self.match_token(TokenType::For) {
      return self.for_statement(engine);
    }
    if self.match_token(TokenType::If) {
      return self.if_statement(engine);
    }
    if self.match_token(TokenType::Print) {
      return self.print_statement(engine);
    }
    if self.match_token(TokenType::Return) {
      return self.return_statement(engine);
    }
    if self.match_token(TokenType::While) {
      return self.while_statement(engine);
    }
    if self.match_token(TokenType::LeftBrace) {
      return Ok(Stmt::Block(self.block(engine)?));
    }

    self.expression_statement(engine)
  }

  /// `for` is pure sugar: the parser rewrites it into the equivalent
  /// `{ init; while (cond) { body; incr; } }` and the later stages never
  /// see a for loop.
  fn for_statement(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let keyword = self.previous().clone();
    self.consume(TokenType::LeftParen, "Expect '(' after 'for'.", engine)?;

    let initializer = if self.match_token(TokenType::SemiColon) {
      None
    } else if self.match_token(TokenType::Var) {
      Some(self.var_declaration(engine)?)
    } else {
      Some(self.expression_statement(engine)?)
    };

    let condition = if !self.check(TokenType::SemiColon) {
      Some(self.expression(engine)?)
    } else {
      None
    };
    self.consume(TokenType::SemiColon, "Expect ';' after loop condition.", engine)?;

    let increment = if !self.check(TokenType::RightParen) {
      Some(self.expression(engine)?)
    } else {
      None
    };
    self.consume(TokenType::RightParen, "Expect ')' after for clauses.", engine)?;

    let mut body = self.statement(engine)?;

    if let Some(increment) = increment {
      body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
    }

    // An absent condition loops forever.
    let condition = condition.unwrap_or_else(|| {
      Expr::Literal(Token::new(
        TokenType::True,
        "true".to_string(),
        Literal::Bool(true),
        keyword.position,
      ))
    });
    body = Stmt::While {
      condition,
      body: Box::new(body),
    };

    if let Some(initializer) = initializer {
      body = Stmt::Block(vec![initializer, body]);
    }

    Ok(body)
  }

  fn if_statement(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    self.consume(TokenType::LeftParen, "Expect '(' after 'if'.", engine)?;
    let condition = self.expression(engine)?;
    self.consume(TokenType::RightParen, "Expect ')' after if condition.", engine)?;

    let then_branch = Box::new(self.statement(engine)?);
    let else_branch = if self.match_token(TokenType::Else) {
      Some(Box::new(self.statement(engine)?))
    } else {
      None
    };

    Ok(Stmt::If {
      condition,
      then_branch,
      else_branch,
    })
  }

  fn print_statement(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let value = self.expression(engine)?;
    self.consume(TokenType::SemiColon, "Expect ';' after value.", engine)?;
    Ok(Stmt::Print(value))
  }

  fn return_statement(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let keyword = self.previous().clone();
    let value = if !self.check(TokenType::SemiColon) {
      Some(self.expression(engine)?)
    } else {
      None
    };

    self.consume(TokenType::SemiColon, "Expect ';' after return value.", engine)?;
    Ok(Stmt::Return { keyword, value })
  }

  fn while_statement(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    self.consume(TokenType::LeftParen, "Expect '(' after 'while'.", engine)?;
    let condition = self.expression(engine)?;
    self.consume(TokenType::RightParen, "Expect ')' after condition.", engine)?;
    let body = Box::new(self.statement(engine)?);

    Ok(Stmt::While { condition, body })
  }

  fn block(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Vec<Stmt>> {
    let mut statements = vec![];

    while !self.check(TokenType::RightBrace) && !self.is_at_end() {
      if let Some(stmt) = self.declaration(engine) {
        statements.push(stmt);
      }
    }

    self.consume(TokenType::RightBrace, "Expect '}' after block.", engine)?;
    Ok(statements)
  }

  fn expression_statement(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Stmt> {
    let expr = self.expression(engine)?;
    self.consume(TokenType::SemiColon, "Expect ';' after expression.", engine)?;
    Ok(Stmt::Expression(expr))
  }

  fn expression(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    self.assignment(engine)
  }

  fn assignment(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let expr = self.logic_or(engine)?;

    if self.match_token(TokenType::Equal) {
      let equals = self.previous().clone();
      let value = self.assignment(engine)?;

      return Ok(match expr {
        Expr::Variable { name, .. } => Expr::Assign {
          id: Uuid::now_v7(),
          name,
          value: Box::new(value),
        },
        Expr::Get { object, name } => Expr::Set {
          object,
          name,
          value: Box::new(value),
        },
        // Not a place one can assign to. Reported, but the expression is
        // kept as parsed so the statement around it survives.
        _ => {
          self.error(
            equals,
            DiagnosticCode::InvalidAssignmentTarget,
            "Invalid assignment target.",
            engine,
          );
          expr
        },
      });
    }

    Ok(expr)
  }

  fn logic_or(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.logic_and(engine)?;

    while self.match_token(TokenType::Or) {
      let operator = self.previous().clone();
      let rhs = self.logic_and(engine)?;
      expr = Expr::Logical {
        lhs: Box::new(expr),
        operator,
        rhs: Box::new(rhs),
      };
    }

    Ok(expr)
  }

  fn logic_and(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.equality(engine)?;

    while self.match_token(TokenType::And) {
      let operator = self.previous().clone();
      let rhs = self.equality(engine)?;
      expr = Expr::Logical {
        lhs: Box::new(expr),
        operator,
        rhs: Box::new(rhs),
      };
    }

    Ok(expr)
  }

  fn equality(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.comparison(engine)?;

    while self.match_tokens(&[TokenType::BangEqual, TokenType::EqualEqual]) {
      let operator = self.previous().clone();
      let rhs = self.comparison(engine)?;
      expr = Expr::Binary {
        lhs: Box::new(expr),
        operator,
        rhs: Box::new(rhs),
      };
    }

    Ok(expr)
  }

  fn comparison(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.term(engine)?;

    while self.match_tokens(&[
      TokenType::Greater,
      TokenType::GreaterEqual,
      TokenType::Less,
      TokenType::LessEqual,
    ]) {
      let operator = self.previous().clone();
      let rhs = self.term(engine)?;
      expr = Expr::Binary {
        lhs: Box::new(expr),
        operator,
        rhs: Box::new(rhs),
      };
    }

    Ok(expr)
  }

  fn term(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.factor(engine)?;

    while self.match_tokens(&[TokenType::Minus, TokenType::Plus]) {
      let operator = self.previous().clone();
      let rhs = self.factor(engine)?;
      expr = Expr::Binary {
        lhs: Box::new(expr),
        operator,
        rhs: Box::new(rhs),
      };
    }

    Ok(expr)
  }

  fn factor(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.unary(engine)?;

    while self.match_tokens(&[TokenType::Slash, TokenType::Star]) {
      let operator = self.previous().clone();
      let rhs = self.unary(engine)?;
      expr = Expr::Binary {
        lhs: Box::new(expr),
        operator,
        rhs: Box::new(rhs),
      };
    }

    Ok(expr)
  }

  fn unary(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    if self.match_tokens(&[TokenType::Bang, TokenType::Minus]) {
      let operator = self.previous().clone();
      let rhs = self.unary(engine)?;
      return Ok(Expr::Unary {
        operator,
        rhs: Box::new(rhs),
      });
    }

    self.call(engine)
  }

  fn call(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut expr = self.primary(engine)?;

    loop {
      if self.match_token(TokenType::LeftParen) {
        expr = self.finish_call(expr, engine)?;
      } else if self.match_token(TokenType::Dot) {
        let name = self.consume(
          TokenType::Identifier,
          "Expect property name after '.'.",
          engine,
        )?;
        expr = Expr::Get {
          object: Box::new(expr),
          name,
        };
      } else {
        break;
      }
    }

    Ok(expr)
  }

  fn finish_call(&mut self, callee: Expr, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    let mut arguments = vec![];

    if !self.check(TokenType::RightParen) {
      loop {
        if arguments.len() >= 255 {
          self.error(
            self.peek().clone(),
            DiagnosticCode::TooManyArguments,
            "Can't have more than 255 arguments.",
            engine,
          );
        }
        arguments.push(self.expression(engine)?);
        if !self.match_token(TokenType::Comma) {
          break;
        }
      }
    }

    let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.", engine)?;

    Ok(Expr::Call {
      callee: Box::new(callee),
      paren,
      arguments,
    })
  }

  fn primary(&mut self, engine: &mut DiagnosticEngine) -> ParseResult<Expr> {
    if self.match_tokens(&[
      TokenType::False,
      TokenType::True,
      TokenType::Nil,
      TokenType::Number,
      TokenType::String,
    ]) {
      return Ok(Expr::Literal(self.previous().clone()));
    }

    if self.match_token(TokenType::Super) {
      let keyword = self.previous().clone();
      self.consume(TokenType::Dot, "Expect '.' after 'super'.", engine)?;
      let method = self.consume(
        TokenType::Identifier,
        "Expect superclass method name.",
        engine,
      )?;
      return Ok(Expr::Super {
        id: Uuid::now_v7(),
        keyword,
        method,
      });
    }

    if self.match_token(TokenType::This) {
      return Ok(Expr::This {
        id: Uuid::now_v7(),
        keyword: self.previous().clone(),
      });
    }

    if self.match_token(TokenType::Identifier) {
      return Ok(Expr::Variable {
        id: Uuid::now_v7(),
        name: self.previous().clone(),
      });
    }

    if self.match_token(TokenType::LeftParen) {
      let expr = self.expression(engine)?;
      self.consume(TokenType::RightParen, "Expect ')' after expression.", engine)?;
      return Ok(Expr::Grouping(Box::new(expr)));
    }

    Err(self.error(
      self.peek().clone(),
      DiagnosticCode::ExpectedExpression,
      "Expect expression.",
      engine,
    ))
  }

  /// Function that discards tokens until a statement boundary, so one syntax
  /// error does not cascade into a pile of bogus ones.
  fn synchronize(&mut self) {
    self.advance();

    while !self.is_at_end() {
      if self.previous().token_type == TokenType::SemiColon {
        return;
      }

      match self.peek().token_type {
        TokenType::Class
        | TokenType::Fun
        | TokenType::Var
        | TokenType::For
        | TokenType::If
        | TokenType::While
        | TokenType::Print
        | TokenType::Return => return,
        _ => {},
      }

      self.advance();
    }
  }

  fn error(
    &self,
    token: Token,
    code: DiagnosticCode,
    message: &str,
    engine: &mut DiagnosticEngine,
  ) -> ParseError {
    let locus = if token.token_type == TokenType::Eof {
      Locus::Eof
    } else {
      Locus::Lexeme(token.lexeme.clone())
    };

    let diagnostic = Diagnostic::new(code, message.to_string())
      .with_locus(locus)
      .with_label(Label::primary(token.to_span(), None));

    engine.emit(diagnostic);
    ParseError
  }

  fn consume(
    &mut self,
    token_type: TokenType,
    message: &str,
    engine: &mut DiagnosticEngine,
  ) -> ParseResult<Token> {
    if self.check(token_type) {
      return Ok(self.advance().clone());
    }

    Err(self.error(
      self.peek().clone(),
      DiagnosticCode::UnexpectedToken,
      message,
      engine,
    ))
  }

  /// Function that consumes the current token if it has the given type.
  fn match_token(&mut self, token_type: TokenType) -> bool {
    self.match_tokens(&[token_type])
  }

  fn match_tokens(&mut self, token_types: &[TokenType]) -> bool {
    for &token_type in token_types {
      if self.check(token_type) {
        self.advance();
        return true;
      }
    }
    false
  }

  fn check(&self, token_type: TokenType) -> bool {
    if self.is_at_end() {
      return false;
    }
    self.peek().token_type == token_type
  }

  /// Function that shifts the pointer one token and returns the consumed one.
  fn advance(&mut self) -> &Token {
    if !self.is_at_end() {
      self.current += 1;
    }
    self.previous()
  }

  fn peek(&self) -> &Token {
    &self.tokens[self.current]
  }

  fn previous(&self) -> &Token {
    &self.tokens[self.current - 1]
  }

  fn is_at_end(&self) -> bool {
    self.peek().token_type == TokenType::Eof
  }
}
