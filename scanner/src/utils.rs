use diagnostic::{
  diagnostic::{Diagnostic, Label, Span},
  diagnostic_code::DiagnosticCode,
  DiagnosticEngine,
};

use crate::{
  token::{
    types::{Literal, TokenType},
    Token,
  },
  Scanner,
};

impl Scanner {
  /// Function that maps over the source and fills the `Vec<Token>`.
  pub(crate) fn get_tokens(&mut self, engine: &mut DiagnosticEngine) {
    while !self.is_at_end() {
      self.start = self.current;
      self.start_line = self.line;
      self.start_column = self.column;
      let c = self.advance();

      match c {
        '(' => self.add_token(TokenType::LeftParen),
        ')' => self.add_token(TokenType::RightParen),
        '{' => self.add_token(TokenType::LeftBrace),
        '}' => self.add_token(TokenType::RightBrace),
        ',' => self.add_token(TokenType::Comma),
        '.' => self.add_token(TokenType::Dot),
        '-' => self.add_token(TokenType::Minus),
        '+' => self.add_token(TokenType::Plus),
        ';' => self.add_token(TokenType::SemiColon),
        '*' => self.add_token(TokenType::Star),

        // Two-character operators are tried before their one-character
        // prefixes (maximal munch).
        '!' => {
          if self.match_char('=') {
            self.add_token(TokenType::BangEqual)
          } else {
            self.add_token(TokenType::Bang)
          }
        },
        '=' => {
          if self.match_char('=') {
            self.add_token(TokenType::EqualEqual)
          } else {
            self.add_token(TokenType::Equal)
          }
        },
        '<' => {
          if self.match_char('=') {
            self.add_token(TokenType::LessEqual)
          } else {
            self.add_token(TokenType::Less)
          }
        },
        '>' => {
          if self.match_char('=') {
            self.add_token(TokenType::GreaterEqual)
          } else {
            self.add_token(TokenType::Greater)
          }
        },

        // Comment or division
        '/' => {
          if self.match_char('/') {
            // A line comment runs to the end of the line; the newline
            // itself is left for the main loop so it can count it.
            while let Some(char) = self.peek() {
              if char == '\n' {
                break;
              }
              self.advance();
            }
          } else {
            self.add_token(TokenType::Slash);
          }
        },

        // Whitespace
        ' ' | '\r' | '\t' => {},

        '\n' => {
          self.line += 1;
          self.column = 0;
        },

        '"' => self.tokenize_string(engine),

        '0'..='9' => self.tokenize_number(),

        'a'..='z' | 'A'..='Z' | '_' => self.tokenize_identifier(),

        _ => {
          let diagnostic = Diagnostic::new(
            DiagnosticCode::UnexpectedCharacter,
            "Unexpected character.".to_string(),
          )
          .with_label(Label::primary(
            Span {
              line: self.start_line,
              column: self.start_column,
              length: 1,
            },
            Some(format!("character {:?} is not part of the language", c)),
          ));

          engine.emit(diagnostic);
        },
      };
    }

    self.tokens.push(Token::new(
      TokenType::Eof,
      String::new(),
      Literal::Nil,
      (self.line, self.column),
    ));
  }

  /// Function that tokenizes a double-quoted string literal.
  ///
  /// Strings may span lines and have no escape processing; the literal
  /// value is the raw text between the quotes.
  fn tokenize_string(&mut self, engine: &mut DiagnosticEngine) {
    while let Some(char) = self.peek() {
      if char == '"' {
        break;
      }
      if char == '\n' {
        self.line += 1;
        self.column = 0;
        self.current += 1;
        continue;
      }
      self.advance();
    }

    if self.is_at_end() {
      let diagnostic = Diagnostic::new(
        DiagnosticCode::UnterminatedString,
        "Unterminated string.".to_string(),
      )
      .with_label(Label::primary(
        Span {
          line: self.start_line,
          column: self.start_column,
          length: self.current - self.start,
        },
        Some("string opened here is never closed".to_string()),
      ));

      engine.emit(diagnostic);
      return;
    }

    // The closing quote.
    self.advance();

    let value: String = self.source[self.start + 1..self.current - 1].iter().collect();
    self.add_token_literal(TokenType::String, Literal::Str(value));
  }

  /// Function that tokenizes a number literal: `DIGIT+ ('.' DIGIT+)?`.
  fn tokenize_number(&mut self) {
    while let Some(char) = self.peek() {
      if !char.is_ascii_digit() {
        break;
      }
      self.advance();
    }

    // A fractional part only counts when a digit follows the dot, so
    // `5.` scans as the number 5 and then a Dot token.
    if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
      self.advance();
      while let Some(char) = self.peek() {
        if !char.is_ascii_digit() {
          break;
        }
        self.advance();
      }
    }

    let lexeme: String = self.source[self.start..self.current].iter().collect();
    let value: f64 = lexeme.parse().unwrap_or_default();
    self.add_token_literal(TokenType::Number, Literal::Number(value));
  }

  /// Function that tokenizes an identifier or keyword.
  fn tokenize_identifier(&mut self) {
    while let Some(char) = self.peek() {
      if !char.is_ascii_alphanumeric() && char != '_' {
        break;
      }
      self.advance();
    }

    let lexeme: String = self.source[self.start..self.current].iter().collect();
    match lexeme.as_str() {
      "and" => self.add_token(TokenType::And),
      "class" => self.add_token(TokenType::Class),
      "else" => self.add_token(TokenType::Else),
      "false" => self.add_token_literal(TokenType::False, Literal::Bool(false)),
      "fun" => self.add_token(TokenType::Fun),
      "for" => self.add_token(TokenType::For),
      "if" => self.add_token(TokenType::If),
      "nil" => self.add_token(TokenType::Nil),
      "or" => self.add_token(TokenType::Or),
      "print" => self.add_token(TokenType::Print),
      "return" => self.add_token(TokenType::Return),
      "super" => self.add_token(TokenType::Super),
      "this" => self.add_token(TokenType::This),
      "true" => self.add_token_literal(TokenType::True, Literal::Bool(true)),
      "var" => self.add_token(TokenType::Var),
      "while" => self.add_token(TokenType::While),
      _ => self.add_token(TokenType::Identifier),
    }
  }

  /// Function that pushes a token without a literal value.
  fn add_token(&mut self, token_type: TokenType) {
    self.add_token_literal(token_type, Literal::Nil);
  }

  /// Function that pushes a token spanning `start..current`.
  fn add_token_literal(&mut self, token_type: TokenType, literal: Literal) {
    let lexeme: String = self.source[self.start..self.current].iter().collect();
    self.tokens.push(Token::new(
      token_type,
      lexeme,
      literal,
      (self.start_line, self.start_column),
    ));
  }

  pub(crate) fn is_at_end(&self) -> bool {
    self.current >= self.source.len()
  }

  /// Function that consumes the current char and returns it.
  fn advance(&mut self) -> char {
    let char = self.source[self.current];
    self.current += 1;
    self.column += 1;
    char
  }

  /// Function that returns the current char without consuming it.
  fn peek(&self) -> Option<char> {
    self.source.get(self.current).copied()
  }

  fn peek_next(&self) -> Option<char> {
    self.source.get(self.current + 1).copied()
  }

  /// Function that consumes the current char only if it matches `expected`.
  fn match_char(&mut self, expected: char) -> bool {
    if self.peek() != Some(expected) {
      return false;
    }
    self.current += 1;
    self.column += 1;
    true
  }
}
