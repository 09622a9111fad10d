//! MTX language library
//!
//! A small matrix scripting language: logos lexer, recursive-descent parser,
//! a static type/shape checker and a tree-walking interpreter.
//!
//! ```no_run
//! let source = "x = eye(2); print x';";
//! let tokens = mtx::lexer::tokenize(source).unwrap();
//! let program = mtx::parser::parse(source, tokens).unwrap();
//!
//! let mut diagnostics = Vec::new();
//! if mtx::check(&program, &mut diagnostics) {
//!     mtx::run(&program).unwrap();
//! }
//! ```

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod types;
pub mod util;

pub use ast::{Program, Span};
pub use error::{CompileError, Diagnostic, DiagnosticSink, Result};
pub use interp::{InterpResult, Interpreter, RuntimeError, Value};
pub use types::TypeChecker;

/// Read a source file from disk.
pub fn read_source(path: impl AsRef<std::path::Path>) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Type-check a program, forwarding every diagnostic to `sink`.
///
/// Returns `true` when the program is free of static errors.
pub fn check(program: &Program, sink: &mut impl DiagnosticSink) -> bool {
    let mut checker = TypeChecker::new();
    let ok = checker.check_program(program);
    for diagnostic in checker.take_diagnostics() {
        sink.report(diagnostic);
    }
    ok
}

/// Execute a program, printing to stdout.
pub fn run(program: &Program) -> InterpResult<()> {
    Interpreter::new().run(program).map(|_| ())
}
