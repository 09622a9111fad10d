//! REPL (Read-Eval-Print Loop) for MTX
//!
//! The checker and interpreter persist across lines, so names bound on one
//! line stay visible to the next.

use crate::interp::{Interpreter, PrintHandler};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::types::TypeChecker;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = ">> ";
const HISTORY_FILE: &str = ".mtx_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    checker: TypeChecker,
    interpreter: Interpreter,
    history_path: Option<PathBuf>,
}

/// What happened to one line of input
#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    /// Ran to completion, possibly returning a value
    Done(Option<String>),
    /// Rejected before execution
    Rejected(Vec<String>),
    /// Failed while running
    Failed(String),
}

impl Repl {
    /// Create a new REPL
    pub fn new() -> RlResult<Self> {
        Self::with_output(PrintHandler::Stdout)
    }

    fn with_output(output: PrintHandler) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            checker: TypeChecker::new(),
            interpreter: Interpreter::with_output(output),
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("MTX REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    match self.eval_input(line) {
                        Outcome::Done(Some(value)) => println!("{value}"),
                        Outcome::Done(None) => {}
                        Outcome::Rejected(errors) => {
                            for error in errors {
                                eprintln!("{error}");
                            }
                        }
                        Outcome::Failed(error) => eprintln!("{error}"),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                print_help();
                false
            }
            ":vars" | ":v" => {
                for line in self.describe_vars() {
                    println!("{line}");
                }
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    /// One `name = value` line per bound variable
    fn describe_vars(&self) -> Vec<String> {
        self.interpreter
            .memory()
            .visible()
            .into_iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect()
    }

    /// Tokenize, parse, check and run one line of input
    fn eval_input(&mut self, input: &str) -> Outcome {
        let program = match tokenize(input).and_then(|tokens| parse(input, tokens)) {
            Ok(program) => program,
            Err(err) => return Outcome::Rejected(vec![format!("Syntax error: {}", err.message())]),
        };

        if !self.checker.check_incremental(&program) {
            let errors = self
                .checker
                .take_diagnostics()
                .into_iter()
                .map(|d| match &d.hint {
                    Some(hint) => format!("{d} ({hint})"),
                    None => d.to_string(),
                })
                .collect();
            return Outcome::Rejected(errors);
        }
        self.checker.take_diagnostics();

        match self.interpreter.run(&program) {
            Ok(value) => Outcome::Done(value.map(|v| v.to_string())),
            Err(err) => Outcome::Failed(err.to_string()),
        }
    }
}

fn print_help() {
    println!("MTX REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :vars, :v       List bound variables");
    println!("  :quit, :q       Exit the REPL");
    println!("  :clear          Clear the screen");
    println!();
    println!("You can enter:");
    println!("  - Assignments: A = eye(3); A[0, 2] += 5;");
    println!("  - Output: print A', A .* A;");
    println!("  - Control flow: for i = 1:3 {{ print i; }}");
    println!();
    println!("Built-in functions:");
    println!("  zeros(n), zeros(r, c)   Matrix of zeros");
    println!("  ones(n), ones(r, c)     Matrix of ones");
    println!("  eye(n), eye(r, c)       Identity matrix");
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        Repl::with_output(PrintHandler::Silent).unwrap()
    }

    #[test]
    fn test_handle_command_quit() {
        let mut repl = repl();
        assert!(repl.handle_command(":quit"));
        assert!(repl.handle_command(":q"));
        assert!(repl.handle_command(":exit"));
    }

    #[test]
    fn test_handle_command_non_quit() {
        let mut repl = repl();
        assert!(!repl.handle_command(":help"));
        assert!(!repl.handle_command(":vars"));
        assert!(!repl.handle_command(":clear"));
        assert!(!repl.handle_command(":unknown"));
    }

    #[test]
    fn test_constants() {
        assert_eq!(PROMPT, ">> ");
        assert_eq!(HISTORY_FILE, ".mtx_history");
    }

    #[test]
    fn test_bindings_persist_across_lines() {
        let mut repl = repl();
        assert_eq!(repl.eval_input("a = 2;"), Outcome::Done(None));
        assert_eq!(repl.eval_input("b = a * 3;"), Outcome::Done(None));
        assert_eq!(repl.describe_vars(), vec!["a = 2", "b = 6"]);
    }

    #[test]
    fn test_return_value_is_shown() {
        let mut repl = repl();
        assert_eq!(
            repl.eval_input("return eye(2);"),
            Outcome::Done(Some("[[1, 0], [0, 1]]".to_string()))
        );
    }

    #[test]
    fn test_checker_rejects_line() {
        let mut repl = repl();
        let Outcome::Rejected(errors) = repl.eval_input("x = y;") else {
            panic!("expected rejection");
        };
        assert_eq!(errors, vec!["Error in line 1: undefined variable y"]);
        // the rejected line did not run
        assert!(repl.describe_vars().is_empty());
    }

    #[test]
    fn test_rejected_line_binds_nothing() {
        let mut repl = repl();
        assert!(matches!(repl.eval_input("a = 1; b = c;"), Outcome::Rejected(_)));
        let Outcome::Rejected(errors) = repl.eval_input("print a;") else {
            panic!("expected rejection");
        };
        assert_eq!(errors, vec!["Error in line 1: undefined variable a"]);
    }

    #[test]
    fn test_rejection_carries_hint() {
        let mut repl = repl();
        repl.eval_input("total = 1;");
        let Outcome::Rejected(errors) = repl.eval_input("print totl;") else {
            panic!("expected rejection");
        };
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("did you mean `total`?"));
    }

    #[test]
    fn test_errors_do_not_leak_into_next_line() {
        let mut repl = repl();
        assert!(matches!(repl.eval_input("x = y;"), Outcome::Rejected(_)));
        assert_eq!(repl.eval_input("z = 1;"), Outcome::Done(None));
    }

    #[test]
    fn test_syntax_error() {
        let mut repl = repl();
        let Outcome::Rejected(errors) = repl.eval_input("x = ;") else {
            panic!("expected rejection");
        };
        assert!(errors[0].starts_with("Syntax error"));
    }

    #[test]
    fn test_runtime_error() {
        let mut repl = repl();
        let Outcome::Failed(error) = repl.eval_input("x = 1 / 0;") else {
            panic!("expected runtime failure");
        };
        assert!(error.starts_with("Runtime error in line 1"));
    }
}
