use std::{cell::RefCell, rc::Rc};

use diagnostic::DiagnosticEngine;
use interpreter::{
  interpreter::Interpreter,
  runner::{RunOutcome, Runner},
};

/// Runs a whole program through scan -> parse -> resolve -> interpret with
/// the program's output captured.
fn run(source: &str) -> (String, RunOutcome, DiagnosticEngine) {
  let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
  let mut runner = Runner::with_interpreter(Interpreter::with_output(sink.clone()));
  let mut engine = DiagnosticEngine::new();

  let outcome = runner.run_source(source, &mut engine);
  let output = String::from_utf8(sink.borrow().clone()).expect("program output is utf-8");
  (output, outcome, engine)
}

fn run_ok(source: &str) -> String {
  let (output, outcome, engine) = run(source);
  assert_eq!(
    outcome,
    RunOutcome::Ok,
    "expected a clean run, diagnostics:\n{}",
    engine.render_all_plain(source)
  );
  output
}

fn run_err(source: &str) -> (String, RunOutcome, String) {
  let (output, outcome, engine) = run(source);
  assert_ne!(outcome, RunOutcome::Ok, "expected the run to fail");
  let messages = engine
    .get_diagnostics()
    .iter()
    .map(|d| d.message.clone())
    .collect::<Vec<_>>()
    .join("\n");
  (output, outcome, messages)
}

// -- the bread-and-butter scenarios ------------------------------------

#[test]
fn arithmetic_prints_a_sum() {
  assert_eq!(run_ok("print 1 + 2;"), "3\n");
}

#[test]
fn closures_capture_the_scope_at_declaration() {
  let source = r#"
    var a = "g";
    {
      fun f() { print a; }
      f();
      var a = "l";
      f();
    }
  "#;
  // f closed over the block scope before the local `a` existed, and its
  // body resolved `a` to the global; the later shadow changes nothing.
  assert_eq!(run_ok(source), "g\ng\n");
}

#[test]
fn recursive_fibonacci() {
  let source = r#"
    fun fib(n) {
      if (n < 2) return n;
      return fib(n - 2) + fib(n - 1);
    }
    print fib(7);
  "#;
  assert_eq!(run_ok(source), "13\n");
}

#[test]
fn for_loop_accumulates() {
  assert_eq!(
    run_ok("var s = 0; for (var i = 1; i <= 5; i = i + 1) s = s + i; print s;"),
    "15\n"
  );
}

#[test]
fn super_calls_the_parent_method_on_the_child_receiver() {
  let source = r#"
    class A { greet() { print "hi"; } }
    class B < A { greet() { super.greet(); print "hey"; } }
    B().greet();
  "#;
  assert_eq!(run_ok(source), "hi\nhey\n");
}

#[test]
fn initializers_set_up_instance_fields() {
  let source = r#"
    class Bagel { init() { this.n = 0; } }
    var b = Bagel();
    b.n = b.n + 1;
    print b.n;
  "#;
  assert_eq!(run_ok(source), "1\n");
}

// -- value semantics ---------------------------------------------------

#[test]
fn truthiness_laws() {
  assert_eq!(run_ok("print !!0;"), "true\n");
  assert_eq!(run_ok("print !!\"\";"), "true\n");
  assert_eq!(run_ok("print !!nil;"), "false\n");
  assert_eq!(run_ok("print !!false;"), "false\n");
}

#[test]
fn equality_laws() {
  assert_eq!(run_ok("print nil == nil;"), "true\n");
  assert_eq!(run_ok("print nil == 0;"), "false\n");
  assert_eq!(run_ok("print nil == false;"), "false\n");
  assert_eq!(run_ok("print nil == \"\";"), "false\n");
  assert_eq!(run_ok("print 1 == 1;"), "true\n");
  assert_eq!(run_ok("print 1 == \"1\";"), "false\n");
  assert_eq!(run_ok("print \"a\" == \"a\";"), "true\n");
  assert_eq!(run_ok("print 1 != 2;"), "true\n");
}

#[test]
fn numbers_print_in_integer_form_when_whole() {
  assert_eq!(run_ok("print 5.0;"), "5\n");
  assert_eq!(run_ok("print 2.5 + 2.5;"), "5\n");
  assert_eq!(run_ok("print 5.5;"), "5.5\n");
  assert_eq!(run_ok("print 10 / 4;"), "2.5\n");
}

#[test]
fn string_concatenation() {
  assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
}

#[test]
fn logical_operators_return_the_deciding_operand() {
  assert_eq!(run_ok("print \"yes\" or 2;"), "yes\n");
  assert_eq!(run_ok("print nil or \"fallback\";"), "fallback\n");
  assert_eq!(run_ok("print nil and 2;"), "nil\n");
  assert_eq!(run_ok("print 1 and 2;"), "2\n");
}

#[test]
fn short_circuit_skips_the_right_side() {
  let source = r#"
    fun boom() { print "evaluated"; return true; }
    var x = false and boom();
    var y = true or boom();
    print x;
    print y;
  "#;
  assert_eq!(run_ok(source), "false\ntrue\n");
}

#[test]
fn callables_stringify() {
  assert_eq!(run_ok("fun f() {} print f;"), "<fn f>\n");
  assert_eq!(run_ok("print clock;"), "<native fn>\n");
  assert_eq!(run_ok("class A {} print A;"), "A\n");
  assert_eq!(run_ok("class A {} print A();"), "A instance\n");
}

// -- functions and closures --------------------------------------------

#[test]
fn counter_closures_keep_private_state() {
  let source = r#"
    fun makeCounter() {
      var i = 0;
      fun count() {
        i = i + 1;
        print i;
      }
      return count;
    }
    var counter = makeCounter();
    counter();
    counter();
  "#;
  assert_eq!(run_ok(source), "1\n2\n");
}

#[test]
fn sibling_closures_share_their_captured_frame() {
  let source = r#"
    var get; var set;
    {
      var value = 1;
      fun read() { print value; }
      fun write(v) { value = v; }
      get = read;
      set = write;
    }
    get();
    set(42);
    get();
  "#;
  assert_eq!(run_ok(source), "1\n42\n");
}

#[test]
fn functions_without_a_return_yield_nil() {
  assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
}

#[test]
fn while_loops_run_their_condition_each_pass() {
  assert_eq!(run_ok("var i = 0; while (i < 3) i = i + 1; print i;"), "3\n");
}

#[test]
fn for_matches_its_while_desugaring() {
  let for_form = "var s = 0; for (var i = 0; i < 4; i = i + 1) { s = s + i; print s; }";
  let while_form = "var s = 0; { var i = 0; while (i < 4) { { s = s + i; print s; } i = i + 1; } }";
  assert_eq!(run_ok(for_form), run_ok(while_form));
}

#[test]
fn clock_returns_a_positive_number_of_seconds() {
  assert_eq!(run_ok("print clock() > 0;"), "true\n");
  // Sampled twice, time never runs backwards.
  assert_eq!(run_ok("var a = clock(); var b = clock(); print b >= a;"), "true\n");
}

// -- classes -----------------------------------------------------------

#[test]
fn methods_bind_their_receiver() {
  let source = r#"
    class Box {
      init(n) { this.n = n; }
      get() { return this.n; }
    }
    var box = Box(5);
    var method = box.get;
    print method();
  "#;
  assert_eq!(run_ok(source), "5\n");
}

#[test]
fn fields_shadow_methods() {
  let source = r#"
    class A { m() { return "method"; } }
    var a = A();
    a.m = "field";
    print a.m;
  "#;
  assert_eq!(run_ok(source), "field\n");
}

#[test]
fn initializers_return_the_instance_even_on_bare_return() {
  let source = r#"
    class Thing { init() { return; } }
    print Thing();
  "#;
  assert_eq!(run_ok(source), "Thing instance\n");
}

#[test]
fn methods_are_inherited() {
  let source = r#"
    class A { m() { print "a"; } }
    class B < A {}
    B().m();
  "#;
  assert_eq!(run_ok(source), "a\n");
}

#[test]
fn subclass_methods_override() {
  let source = r#"
    class A { m() { print "a"; } }
    class B < A { m() { print "b"; } }
    B().m();
  "#;
  assert_eq!(run_ok(source), "b\n");
}

#[test]
fn inherited_initializers_run_with_the_subclass_receiver() {
  let source = r#"
    class A { init(n) { this.n = n; } }
    class B < A {}
    print B(7).n;
  "#;
  assert_eq!(run_ok(source), "7\n");
}

// -- runtime errors ----------------------------------------------------

#[test]
fn adding_a_string_and_a_number_is_an_error() {
  let (_, outcome, messages) = run_err("print \"a\" + 1;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Operands must be two numbers or two strings."));
}

#[test]
fn division_by_zero_is_an_error() {
  let (_, outcome, messages) = run_err("print 1 / 0;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Division by zero."));
}

#[test]
fn negating_a_string_is_an_error() {
  let (_, outcome, messages) = run_err("print -\"muffin\";");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Operand must be a number."));
}

#[test]
fn comparing_mixed_types_is_an_error() {
  let (_, outcome, messages) = run_err("print 1 < \"2\";");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Operands must be numbers."));
}

#[test]
fn reading_an_undefined_global() {
  let (_, outcome, messages) = run_err("print missing;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Undefined variable 'missing'."));
}

#[test]
fn assigning_an_undefined_global() {
  let (_, outcome, messages) = run_err("missing = 1;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Undefined variable 'missing'."));
}

#[test]
fn calling_a_non_callable() {
  let (_, outcome, messages) = run_err("\"not a function\"();");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Can only call functions and classes."));
}

#[test]
fn arity_is_checked_exactly() {
  let (_, outcome, messages) = run_err("fun f(a, b) {} f(1);");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Expected 2 arguments but got 1."));
}

#[test]
fn property_access_requires_an_instance() {
  let (_, outcome, messages) = run_err("var x = 1; print x.y;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Only instances have properties."));
}

#[test]
fn field_writes_require_an_instance() {
  let (_, outcome, messages) = run_err("var x = 1; x.y = 2;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Only instances have fields."));
}

#[test]
fn missing_properties_are_errors() {
  let (_, outcome, messages) = run_err("class A {} print A().missing;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Undefined property 'missing'."));
}

#[test]
fn inheriting_from_a_non_class_is_a_runtime_error() {
  let (_, outcome, messages) = run_err("var NotAClass = \"so sad\"; class B < NotAClass {}");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  assert!(messages.contains("Superclass must be a class."));
}

#[test]
fn a_runtime_error_stops_the_program() {
  let (output, outcome, _) = run_err("print 1; print \"a\" + 1; print 2;");
  assert_eq!(outcome, RunOutcome::RuntimeError);
  // Statements before the error ran; statements after it did not.
  assert_eq!(output, "1\n");
}

// -- static errors -----------------------------------------------------

#[test]
fn top_level_return_is_a_static_error() {
  let (output, outcome, messages) = run_err("return 1;");
  assert_eq!(outcome, RunOutcome::StaticError);
  assert!(messages.contains("Can't return from top-level code."));
  assert_eq!(output, "");
}

#[test]
fn self_referencing_initializer_is_a_static_error() {
  let (_, outcome, messages) = run_err("{ var a = a; }");
  assert_eq!(outcome, RunOutcome::StaticError);
  assert!(messages.contains("Can't read local variable in its own initializer."));
}

#[test]
fn self_inheritance_is_a_static_error() {
  let (_, outcome, messages) = run_err("class A < A {}");
  assert_eq!(outcome, RunOutcome::StaticError);
  assert!(messages.contains("A class can't inherit from itself."));
}

#[test]
fn scan_errors_block_interpretation() {
  let (output, outcome, messages) = run_err("print @;");
  assert_eq!(outcome, RunOutcome::StaticError);
  assert!(messages.contains("Unexpected character."));
  assert_eq!(output, "");
}

#[test]
fn parse_errors_block_interpretation() {
  let (output, outcome, messages) = run_err("print (1 + 2;");
  assert_eq!(outcome, RunOutcome::StaticError);
  assert!(messages.contains("Expect ')' after expression."));
  assert_eq!(output, "");
}

// -- session behavior --------------------------------------------------

#[test]
fn state_persists_across_runs_like_a_repl_session() {
  let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
  let mut runner = Runner::with_interpreter(Interpreter::with_output(sink.clone()));
  let mut engine = DiagnosticEngine::new();

  assert_eq!(runner.run_source("var x = 1;", &mut engine), RunOutcome::Ok);
  engine.clear();
  assert_eq!(
    runner.run_source("fun show() { print x; }", &mut engine),
    RunOutcome::Ok
  );
  engine.clear();
  assert_eq!(runner.run_source("show();", &mut engine), RunOutcome::Ok);
  engine.clear();
  assert_eq!(runner.run_source("x = 2; show();", &mut engine), RunOutcome::Ok);

  let output = String::from_utf8(sink.borrow().clone()).unwrap();
  assert_eq!(output, "1\n2\n");
}

#[test]
fn an_error_does_not_poison_the_next_line() {
  let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
  let mut runner = Runner::with_interpreter(Interpreter::with_output(sink.clone()));
  let mut engine = DiagnosticEngine::new();

  assert_eq!(
    runner.run_source("print boom;", &mut engine),
    RunOutcome::RuntimeError
  );
  engine.clear();
  assert_eq!(runner.run_source("print 7;", &mut engine), RunOutcome::Ok);

  let output = String::from_utf8(sink.borrow().clone()).unwrap();
  assert_eq!(output, "7\n");
}
