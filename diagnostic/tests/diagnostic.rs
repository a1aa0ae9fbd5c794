use diagnostic::{
  diagnostic::{Diagnostic, Label, Locus, Span},
  diagnostic_code::{DiagnosticCode, Severity},
  DiagnosticEngine,
};

#[test]
fn static_error_header_carries_line_and_locus() {
  let source = "var x = (1 + 2;";

  let mut engine = DiagnosticEngine::new();
  engine.emit(
    Diagnostic::new(
      DiagnosticCode::UnexpectedToken,
      "Expect ')' after expression.".to_string(),
    )
    .with_locus(Locus::Lexeme(";".to_string()))
    .with_label(Label::primary(
      Span {
        line: 1,
        column: 14,
        length: 1,
      },
      Some("expected ')' here".to_string()),
    )),
  );

  let rendered = engine.render_all_plain(source);
  assert!(rendered.starts_with("[line 1] Error at ';': Expect ')' after expression.\n"));
  assert!(rendered.contains("var x = (1 + 2;"));
  assert!(rendered.contains("^ expected ')' here"));
}

#[test]
fn runtime_error_renders_message_then_line() {
  let source = "print -\"muffin\";";

  let mut engine = DiagnosticEngine::new();
  engine.emit(
    Diagnostic::new(
      DiagnosticCode::OperandMustBeNumber,
      "Operand must be a number.".to_string(),
    )
    .with_label(Label::primary(
      Span {
        line: 1,
        column: 6,
        length: 1,
      },
      None,
    )),
  );

  let rendered = engine.render_all_plain(source);
  assert!(rendered.starts_with("Operand must be a number.\n[line 1]\n"));
}

#[test]
fn at_end_locus() {
  let diagnostic = Diagnostic::new(
    DiagnosticCode::ExpectedExpression,
    "Expect expression.".to_string(),
  )
  .with_locus(Locus::Eof)
  .with_label(Label::primary(
    Span {
      line: 3,
      column: 0,
      length: 1,
    },
    None,
  ));

  let mut engine = DiagnosticEngine::new();
  engine.emit(diagnostic);

  let rendered = engine.render_all_plain("1 +\n2 +\n");
  assert!(rendered.starts_with("[line 3] Error at end: Expect expression.\n"));
}

#[test]
fn warnings_do_not_count_as_errors() {
  let mut engine = DiagnosticEngine::new();
  engine.emit(Diagnostic::new(
    DiagnosticCode::UnusedVariable,
    "Variable 'x' is never used.".to_string(),
  ));

  assert_eq!(engine.get_diagnostics()[0].severity, Severity::Warning);
  assert!(!engine.has_errors());
  assert_eq!(engine.warning_count(), 1);

  engine.clear();
  assert_eq!(engine.warning_count(), 0);
  assert!(engine.get_diagnostics().is_empty());
}

#[test]
fn driver_diagnostics_render_without_a_line() {
  let mut engine = DiagnosticEngine::new();
  engine.emit(
    Diagnostic::new(
      DiagnosticCode::InvalidArguments,
      "invalid number of arguments".to_string(),
    )
    .with_help("Usage: lox [script]".to_string()),
  );

  let rendered = engine.render_all_plain("");
  assert!(rendered.starts_with("Error: invalid number of arguments\n"));
  assert!(rendered.contains("= help: Usage: lox [script]"));
}
