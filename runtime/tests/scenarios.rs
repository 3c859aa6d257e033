//! End-to-end tests driving whole programs through the interpreter with a
//! capturing host.

use finch_runtime::prelude::*;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// A host that records everything the program writes and every error the
/// runtime reports.
#[derive(Clone, Default)]
struct TestHost {
    output: Rc<RefCell<String>>,
    errors: Rc<RefCell<Vec<String>>>,
    modules: Rc<RefCell<Vec<(String, String)>>>,
}

impl TestHost {
    fn new() -> Self {
        Self::default()
    }

    fn with_module(self, name: &str, source: &str) -> Self {
        self.modules
            .borrow_mut()
            .push((name.to_string(), source.to_string()));
        self
    }

    fn output(&self) -> String {
        self.output.borrow().clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl InterpreterHost for TestHost {
    fn output(&mut self, text: &str) {
        self.output.borrow_mut().push_str(text);
    }

    fn error(&mut self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn load_module(&mut self, path: &str) -> io::Result<String> {
        self.modules
            .borrow()
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, source)| source.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "module not found"))
    }
}

fn run(source: &str) -> (Value, TestHost, Interpreter) {
    let host = TestHost::new();
    let mut interpreter = Interpreter::new(host.clone());
    let value = interpreter.interpret(source).expect("program failed");
    (value, host, interpreter)
}

fn run_output(source: &str) -> String {
    let (_, host, _) = run(source);
    assert_eq!(host.errors(), Vec::<String>::new());
    host.output()
}

#[test]
fn arithmetic_is_left_to_right() {
    // Message sends are strictly left to right: (1 + 2) * 3.
    assert_eq!(run_output("write-line: 1 + 2 * 3"), "9\n");
    assert_eq!(run_output("write-line: 1 + (2 * 3)"), "7\n");
    assert_eq!(run_output("write-line: 2 + 3 * 4"), "20\n");
}

#[test]
fn conditionals_take_the_right_branch() {
    assert_eq!(
        run_output(r#"if: 1 < 2 then: { write-line: "yes" } else: { write-line: "no" }"#),
        "yes\n"
    );
    assert_eq!(
        run_output(r#"if: 2 < 1 then: { write-line: "yes" } else: { write-line: "no" }"#),
        "no\n"
    );
    // Without an else branch a false condition answers Nil quietly.
    assert_eq!(
        run_output(r#"if: 2 < 1 then: { write-line: "yes" }"#),
        ""
    );
}

#[test]
fn while_loops_count() {
    let output = run_output(
        "i <- 0. while: { i < 3 } do: { write-line: i. i <-- i + 1 }",
    );
    assert_eq!(output, "0\n1\n2\n");
}

#[test]
fn while_answers_nil() {
    let (value, _, interpreter) = run("while: { 1 < 0 } do: { 1 }");
    assert!(interpreter.environment().is_nil(&value));
}

#[test]
fn prototype_copy_and_fields() {
    let output = run_output(
        r#"p <- Object copy. p add-field: "name" value: "Finch". write-line: p name"#,
    );
    assert_eq!(output, "Finch\n");
}

#[test]
fn copies_inherit_and_shadow() {
    let output = run_output(
        r#"
        base <- Object copy
        base add-field: "kind" value: "base"
        child <- base copy
        write-line: child kind
        child add-field: "kind" value: "child"
        write-line: child kind
        write-line: base kind
        "#,
    );
    assert_eq!(output, "base\nchild\nbase\n");
}

#[test]
fn closures_capture_their_scope() {
    let output = run_output(
        "make <- { |x| { |y| x + y } }. add3 <- make value: 3. write-line: (add3 value: 4)",
    );
    assert_eq!(output, "7\n");
}

#[test]
fn methods_see_self_and_fields() {
    let output = run_output(
        r#"
        counter <- Object copy
        counter add-method: "start" body: { _count <- 0. self }
        counter add-method: "bump" body: { _count <- _count + 1. self }
        counter add-method: "count" body: { _count }
        counter start bump bump
        write-line: counter count
        "#,
    );
    assert_eq!(output, "2\n");
}

#[test]
fn tail_recursion_runs_in_constant_stack() {
    // 100,000 recursions in tail position; without the tail-call fold the
    // call stack would hold every frame at once.
    let output = run_output(
        r#"
        counter <- Object copy
        counter add-method: "count-down:" body: {
            |n|
            if: n > 0 then: { self count-down: n - 1 } else: { write-line: n }
        }
        counter count-down: 100000
        "#,
    );
    assert_eq!(output, "0\n");
}

#[test]
fn fibers_interleave_on_yield() {
    let output = run_output(
        r#"
        worker <- Fiber spawn: { write-line: "b". Fiber yield. write-line: "d" }
        write-line: "a"
        Fiber yield
        write-line: "c"
        Fiber yield
        write-line: "e"
        "#,
    );
    assert_eq!(output, "a\nb\nc\nd\ne\n");
}

#[test]
fn spawned_fibers_report_done() {
    let output = run_output(
        r#"
        worker <- Fiber spawn: { 1 }
        write-line: worker is-done
        Fiber yield
        write-line: worker is-done
        "#,
    );
    assert_eq!(output, "False\nTrue\n");
}

#[test]
fn strings_and_arrays() {
    assert_eq!(run_output(r#"write-line: "fin" + "ch""#), "finch\n");
    assert_eq!(run_output(r#"write-line: "finch" length"#), "5\n");
    assert_eq!(run_output("write-line: [1, 2, 3] count"), "3\n");
    assert_eq!(run_output("a <- [1, 2, 3]. write-line: (a at: 1)"), "2\n");
    assert_eq!(
        run_output("a <- [1, 2]. a at: 0 put: 9. write-line: a"),
        "[9, 2]\n"
    );
    assert_eq!(run_output("a <- []. a add: 5. write-line: a count"), "1\n");
}

#[test]
fn booleans_are_the_singletons() {
    let (value, _, interpreter) = run("1 < 2");
    assert!(interpreter
        .environment()
        .is_true(&value));

    let (value, _, interpreter) = run("2 < 1");
    assert!(Value::ptr_eq(
        &value,
        &interpreter.environment().boolean(false)
    ));
}

#[test]
fn writes_without_newline_concatenate() {
    assert_eq!(run_output(r#"write: "a". write: "b""#), "ab");
}

#[test]
fn undef_removes_bindings() {
    let output = run_output("x <- 1. undef x. write-line: x");
    assert_eq!(output, "Nil\n");
}

#[test]
fn globals_are_visible_everywhere() {
    let output = run_output(
        r#"
        Greeting <- "hello"
        show <- { write-line: Greeting }
        show value
        "#,
    );
    assert_eq!(output, "hello\n");
}

#[test]
fn unknown_messages_report_and_continue() {
    let host = TestHost::new();
    let mut interpreter = Interpreter::new(host.clone());

    let value = interpreter
        .interpret(r#"3 frobnicate. write-line: "after""#)
        .unwrap();

    assert_eq!(host.errors().len(), 1);
    assert!(host.errors()[0].contains("frobnicate"));
    // Execution continued past the error.
    assert_eq!(host.output(), "after\n");
    assert!(interpreter.environment().is_nil(&value));
}

#[test]
fn primitive_type_mismatches_answer_nil() {
    let host = TestHost::new();
    let mut interpreter = Interpreter::new(host.clone());

    let value = interpreter.interpret(r#"1 + "two""#).unwrap();

    assert_eq!(host.errors().len(), 1);
    assert!(interpreter.environment().is_nil(&value));
}

#[test]
fn assignment_to_undefined_names_is_reported() {
    let host = TestHost::new();
    let mut interpreter = Interpreter::new(host.clone());

    interpreter.interpret("ghost <-- 1").unwrap();

    assert_eq!(host.errors().len(), 1);
    assert!(host.errors()[0].contains("ghost"));
}

#[test]
fn field_definitions_outside_methods_are_reported() {
    let host = TestHost::new();
    let mut interpreter = Interpreter::new(host.clone());

    // At the top level self is Nil, so an object-scope definition has
    // nowhere to go; the expression still answers its value.
    let value = interpreter.interpret("_field <- 3").unwrap();

    assert_eq!(host.errors().len(), 1);
    assert_eq!(value.as_number(), Some(3.0));
}

#[test]
fn parse_errors_fail_the_program() {
    let host = TestHost::new();
    let mut interpreter = Interpreter::new(host.clone());

    assert!(interpreter.interpret("write-line: )").is_err());
}

#[test]
fn load_runs_a_module_in_place() {
    let host = TestHost::new().with_module("greet", r#"write-line: "hi from module". 42"#);
    let mut interpreter = Interpreter::new(host.clone());

    let value = interpreter
        .interpret(r#"result <- load: "greet". write-line: result"#)
        .unwrap();

    assert_eq!(host.output(), "hi from module\n42\n");
    assert_eq!(host.errors(), Vec::<String>::new());
    assert_eq!(value.as_number(), Some(42.0));
}

#[test]
fn missing_modules_are_reported() {
    let host = TestHost::new();
    let mut interpreter = Interpreter::new(host.clone());

    let value = interpreter.interpret(r#"load: "nowhere""#).unwrap();

    assert_eq!(host.errors().len(), 1);
    assert!(interpreter.environment().is_nil(&value));
}

#[test]
fn blocks_invoke_with_arity_variants() {
    assert_eq!(run_output("b <- { 7 }. write-line: b value"), "7\n");
    assert_eq!(
        run_output("b <- { |x y| x - y }. write-line: (b value: 9 value: 2)"),
        "7\n"
    );
}

#[test]
fn extra_arguments_are_discarded() {
    assert_eq!(
        run_output("b <- { |x| x }. write-line: (b value: 1 value: 2)"),
        "1\n"
    );
}

#[test]
fn the_program_result_is_its_last_expression() {
    let (value, _, _) = run("1. 2. 3 + 4");
    assert_eq!(value.as_number(), Some(7.0));
}
