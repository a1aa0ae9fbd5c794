use std::{
  fs,
  io::{self, Write},
  process,
};

use colored::*;
use diagnostic::{diagnostic::Diagnostic, diagnostic_code::DiagnosticCode, DiagnosticEngine};
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

use crate::interpreter::Interpreter;

/// Which phase, if any, a run died in. The driver maps this to an exit
/// code: static errors are 65, runtime errors 70.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  Ok,
  StaticError,
  RuntimeError,
}

pub struct Runner {
  interpreter: Interpreter,
}

impl Runner {
  pub fn new() -> Self {
    Self {
      interpreter: Interpreter::new(),
    }
  }

  /// A runner over a pre-built interpreter; tests use this to capture the
  /// program's output.
  pub fn with_interpreter(interpreter: Interpreter) -> Self {
    Self { interpreter }
  }

  /// Function that runs the interactive prompt: one line, one pipeline run,
  /// diagnostics reset in between. Errors never end the session; `exit` or
  /// end-of-input does.
  pub fn run_interactive_mode(&mut self, engine: &mut DiagnosticEngine) {
    println!("{}", "Lox interactive mode".cyan().bold());
    println!("Type `exit` to quit.\n");

    loop {
      engine.clear();

      print!("> ");
      let _ = io::stdout().flush();

      let mut line = String::new();
      let Ok(bytes_read) = io::stdin().read_line(&mut line) else {
        break;
      };
      if bytes_read == 0 {
        println!();
        break;
      }

      let input = line.trim();
      if input.is_empty() {
        continue;
      }
      if input == "exit" {
        break;
      }

      self.run_source(input, engine);
    }
  }

  /// Function that runs a script file. An unreadable path exits 66
  /// directly; everything else is reported through the returned outcome.
  pub fn run_file(&mut self, path: &str, engine: &mut DiagnosticEngine) -> RunOutcome {
    let source = match fs::read_to_string(path) {
      Ok(source) => source,
      Err(err) => {
        let diagnostic = Diagnostic::new(
          DiagnosticCode::FileNotFound,
          format!("could not read file: {}", path),
        )
        .with_help(format!("reason: {}", err));

        engine.emit(diagnostic);
        engine.print_all("");
        process::exit(66);
      },
    };

    self.run_source(&source, engine)
  }

  /// The pipeline: scan, parse, resolve, interpret. Each static phase
  /// gates the next; diagnostics print as soon as a phase fails.
  pub fn run_source(&mut self, source: &str, engine: &mut DiagnosticEngine) -> RunOutcome {
    let mut scanner = Scanner::new(source.to_string());
    scanner.scan_tokens(engine);
    if engine.has_errors() {
      engine.print_all(source);
      return RunOutcome::StaticError;
    }

    let mut parser = Parser::new(scanner.tokens);
    let statements = parser.parse(engine);
    if engine.has_errors() {
      engine.print_all(source);
      return RunOutcome::StaticError;
    }

    let mut resolver = Resolver::new();
    resolver.run(&statements, engine);
    if engine.has_errors() {
      engine.print_all(source);
      return RunOutcome::StaticError;
    }

    // Warnings survive a clean resolve; surface them once and move on.
    if engine.warning_count() > 0 {
      engine.print_all(source);
      engine.clear();
    }

    match self
      .interpreter
      .run(&statements, resolver.into_locals(), engine)
    {
      Ok(()) => RunOutcome::Ok,
      Err(_) => {
        engine.print_all(source);
        RunOutcome::RuntimeError
      },
    }
  }
}

impl Default for Runner {
  fn default() -> Self {
    Self::new()
  }
}
