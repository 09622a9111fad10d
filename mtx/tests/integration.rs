//! Integration tests for MTX
//!
//! Runs whole programs through the pipeline:
//! - Lexing and parsing
//! - Static type/shape checking
//! - Interpretation, with printed output captured

use mtx::interp::{ErrorKind, Interpreter, PrintHandler};
use mtx::lexer::tokenize;
use mtx::parser::parse;
use mtx::{Diagnostic, Program, RuntimeError};

/// Helper to tokenize and parse a program
fn program(source: &str) -> Program {
    let tokens = tokenize(source).expect("lexing failed");
    parse(source, tokens).expect("parsing failed")
}

/// Helper to collect the checker's diagnostics as display strings
fn check_errors(source: &str) -> Vec<String> {
    let mut sink: Vec<Diagnostic> = Vec::new();
    mtx::check(&program(source), &mut sink);
    sink.iter().map(ToString::to_string).collect()
}

/// Helper to check, then run, and return captured output
fn run(source: &str) -> String {
    let program = program(source);
    let errors = check_errors(source);
    assert!(errors.is_empty(), "unexpected diagnostics: {errors:?}");
    let mut interp = Interpreter::with_output(PrintHandler::buffer());
    interp.run(&program).expect("runtime error");
    interp.output().trim_end().to_string()
}

/// Helper to run a program that is expected to fail at runtime
fn run_err(source: &str) -> RuntimeError {
    let mut interp = Interpreter::with_output(PrintHandler::Silent);
    interp.run(&program(source)).unwrap_err()
}

// ============================================
// Arithmetic
// ============================================

#[test]
fn test_numeric_promotion() {
    insta::assert_snapshot!(run("a = 1 + 2.5; b = 7 / 2; c = 3 * 4; print a, b, c;"), @"3.5, 3.5, 12");
}

#[test]
fn test_division_always_float() {
    insta::assert_snapshot!(run("print 4 / 2, 1.5 / 0.5;"), @"2.0, 3.0");
}

#[test]
fn test_string_concatenation() {
    insta::assert_snapshot!(run(r#"s = "ab" + "cd"; print s;"#), @"abcd");
}

#[test]
fn test_comparisons_yield_int() {
    insta::assert_snapshot!(run(r#"print 1 < 2, 2.0 == 2, "a" != "a";"#), @"1, 1, 0");
}

// ============================================
// Builtins
// ============================================

#[test]
fn test_square_builtin_matches_rectangular() {
    insta::assert_snapshot!(run("print zeros(2); print zeros(2, 2);"), @r"
    [[0, 0], [0, 0]]
    [[0, 0], [0, 0]]
    ");
}

#[test]
fn test_rectangular_eye() {
    insta::assert_snapshot!(run("print eye(2, 3);"), @"[[1, 0, 0], [0, 1, 0]]");
}

#[test]
fn test_builtin_shapes_combine() {
    assert!(check_errors("a = zeros(3); b = ones(3, 3); c = a + b;").is_empty());
    assert_eq!(
        check_errors("a = zeros(3); b = ones(3, 2); c = a + b;"),
        vec!["Error in line 1: shape mismatch: [3, 3] and [3, 2]"]
    );
}

// ============================================
// Matrices and vectors
// ============================================

#[test]
fn test_matrix_product() {
    insta::assert_snapshot!(run("A = [[1, 2], [3, 4]]; print A * A';"), @"[[5, 11], [11, 25]]");
}

#[test]
fn test_double_transpose_is_identity() {
    insta::assert_snapshot!(run("A = [[1, 2, 3]]; print A'; print A'';"), @r"
    [[1], [2], [3]]
    [[1, 2, 3]]
    ");
}

#[test]
fn test_elementwise_and_broadcast() {
    let source = "A = [[1, 2], [3, 4]];
        print A .* A;
        print A * 2, 2 * A;
        print [2, 4] / 2;";
    insta::assert_snapshot!(run(source), @r"
    [[1, 4], [9, 16]]
    [[2, 4], [6, 8]], [[2, 4], [6, 8]]
    [1.0, 2.0]
    ");
}

#[test]
fn test_vector_dot_product() {
    insta::assert_snapshot!(run("print [1, 2, 3] * [4, 5, 6];"), @"32.0");
}

#[test]
fn test_products_of_matrices_without_rows() {
    insta::assert_snapshot!(run("print zeros(0) * zeros(0); print zeros(2, 0) * zeros(0, 3);"), @r"
    []
    [[], []]
    ");
}

#[test]
fn test_slice_and_element_updates() {
    let source = "m = zeros(2, 3);
        m[0, :] = [1, 2, 3];
        m[1, 2] = 9;
        m[1, 2] += 1;
        print m;
        print m[0], m[1, 2];";
    insta::assert_snapshot!(run(source), @r"
    [[1, 2, 3], [0, 0, 10]]
    [1, 2, 3], 10
    ");
}

// ============================================
// Scoping and control flow
// ============================================

#[test]
fn test_block_scoping() {
    let source = "x = 1;
        {
            x = 2;
            y = 3;
            print x, y;
        }
        print x;";
    insta::assert_snapshot!(run(source), @r"
    2, 3
    1
    ");
}

#[test]
fn test_block_local_is_not_visible_after() {
    assert_eq!(
        check_errors("{ y = 3; }\nprint y;"),
        vec!["Error in line 2: undefined variable y"]
    );
}

#[test]
fn test_for_loop_runs_each_index() {
    insta::assert_snapshot!(run("n = 0; for i = 1:6 { n += 1; print i; } print n;"), @r"
    1
    2
    3
    4
    5
    5
    ");
}

#[test]
fn test_break_and_continue() {
    let source = "for i = 0:10 {
            if (i == 1) continue;
            if (i == 4) break;
            print i;
        }";
    insta::assert_snapshot!(run(source), @r"
    0
    2
    3
    ");
}

#[test]
fn test_nested_loops() {
    let source = "i = 0;
        while (i < 2) {
            for j = 0:3 {
                if (j == 2) break;
                print i, j;
            }
            i += 1;
        }";
    insta::assert_snapshot!(run(source), @r"
    0, 0
    0, 1
    1, 0
    1, 1
    ");
}

#[test]
fn test_return_ends_program() {
    let mut interp = Interpreter::with_output(PrintHandler::buffer());
    let value = interp
        .run(&program("print 1; if (1) return 2 * 3; print 2;"))
        .unwrap();
    assert_eq!(value.map(|v| v.to_string()), Some("6".to_string()));
    insta::assert_snapshot!(interp.output().trim_end(), @"1");
}

// ============================================
// Static errors
// ============================================

#[test]
fn test_slice_size_mismatch_rejected_statically() {
    assert_eq!(
        check_errors("m = zeros(2, 3);\nm[0, :] = [1, 2];"),
        vec!["Error in line 2: vector sized [2] does not match matrix dimensions [3]"]
    );
}

#[test]
fn test_undefined_reported_once() {
    assert_eq!(
        check_errors("x = y;\nz = x + 1;\nprint z * 2;"),
        vec!["Error in line 1: undefined variable y"]
    );
}

#[test]
fn test_flow_keyword_outside_loop() {
    assert_eq!(
        check_errors("break;\nwhile (1) { continue; }"),
        vec!["Error in line 1: flow keyword BREAK must be used inside a loop"]
    );
}

#[test]
fn test_errors_are_collected_across_program() {
    let source = "a = [1, 2] + [1, 2, 3];
        b = \"s\" - 1;
        m = zeros(2); c = m[5, 0];";
    let errors = check_errors(source);
    assert_eq!(errors.len(), 3);
    assert!(errors[0].starts_with("Error in line 1:"));
    assert!(errors[1].starts_with("Error in line 2:"));
    assert!(errors[2].starts_with("Error in line 3:"));
}

// ============================================
// Runtime errors
// ============================================

#[test]
fn test_unbounded_shape_fails_at_runtime() {
    let source = "n = 2;\nm = zeros(n);\nv = m + eye(3);";
    assert!(check_errors(source).is_empty());
    let err = run_err(source);
    assert_eq!(err.kind, ErrorKind::ShapeMismatch);
    insta::assert_snapshot!(err.to_string(), @"Runtime error in line 3: shape mismatch: [2, 2] and [3, 3]");
}

#[test]
fn test_runtime_index_out_of_bounds() {
    let source = "i = 4;\nv = [1, 2, 3];\nprint v[i];";
    assert!(check_errors(source).is_empty());
    let err = run_err(source);
    assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
    assert_eq!(err.line, Some(3));
}

#[test]
fn test_runtime_division_by_zero_inside_loop() {
    let err = run_err("for i = 0:3 {\n  x = 1 / i;\n}");
    assert_eq!(err.kind, ErrorKind::DivisionByZero);
    assert_eq!(err.line, Some(2));
}

// ============================================
// Pipeline
// ============================================

#[test]
fn test_check_then_run() {
    let source = "A = eye(3);\nA[0, 2] = 5;\nB = A' .+ ones(3);\nprint B;";
    let program = program(source);
    let mut sink: Vec<Diagnostic> = Vec::new();
    assert!(mtx::check(&program, &mut sink));
    assert!(mtx::run(&program).is_ok());
}

#[test]
fn test_rejected_program_is_not_run() {
    let source = "print 1;\nx = 1 + \"a\";";
    let mut sink: Vec<Diagnostic> = Vec::new();
    assert!(!mtx::check(&program(source), &mut sink));
    assert_eq!(sink.len(), 1);
    assert_eq!(sink[0].line, 2);
}
