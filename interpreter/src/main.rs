use diagnostic::{diagnostic::Diagnostic, diagnostic_code::DiagnosticCode, DiagnosticEngine};
use interpreter::runner::{RunOutcome, Runner};

fn main() {
  let args: Vec<String> = std::env::args().collect();

  let mut engine = DiagnosticEngine::new();
  let mut runner = Runner::new();

  match args.len() {
    1 => runner.run_interactive_mode(&mut engine),
    2 => match runner.run_file(&args[1], &mut engine) {
      RunOutcome::Ok => {},
      RunOutcome::StaticError => std::process::exit(65),
      RunOutcome::RuntimeError => std::process::exit(70),
    },
    _ => {
      let error = Diagnostic::new(
        DiagnosticCode::InvalidArguments,
        "invalid number of arguments".to_string(),
      )
      .with_help("Usage: lox [script]".to_string());

      engine.emit(error);
      engine.print_all("");
      std::process::exit(64);
    },
  }
}
