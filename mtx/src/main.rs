//! MTX command-line interface

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mtx::error::{report_diagnostic, report_error};
use mtx::{CompileError, Diagnostic, Program};

#[derive(Parser)]
#[command(name = "mtx")]
#[command(version, about = "MTX matrix language", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Type-check a source file
    Check {
        /// Input file
        file: PathBuf,
    },
    /// Check and execute a source file
    Run {
        /// Input file
        file: PathBuf,
        /// Skip the static checker
        #[arg(long)]
        no_check: bool,
    },
    /// Parse and dump the AST as JSON
    Parse {
        /// Input file
        file: PathBuf,
    },
    /// Tokenize and dump tokens
    Tokens {
        /// Input file
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl,
}

/// A loaded source file
struct Source {
    name: String,
    text: String,
}

/// A failed command whose errors were already reported
struct Failed;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check { file } => check_file(&file),
        Command::Run { file, no_check } => run_file(&file, !no_check),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
        Command::Repl => start_repl(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failed) => ExitCode::FAILURE,
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "mtx=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn load(path: &Path) -> Result<Source, Failed> {
    let name = path.display().to_string();
    match mtx::read_source(path) {
        Ok(text) => Ok(Source { name, text }),
        Err(err) => {
            report_error(&name, "", &err);
            Err(Failed)
        }
    }
}

fn front_end(source: &Source) -> Result<Program, Failed> {
    let parsed = mtx::lexer::tokenize(&source.text)
        .and_then(|tokens| mtx::parser::parse(&source.text, tokens));
    parsed.map_err(|err: CompileError| {
        report_error(&source.name, &source.text, &err);
        Failed
    })
}

fn static_check(source: &Source, program: &Program) -> Result<(), Failed> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    if mtx::check(program, &mut diagnostics) {
        return Ok(());
    }
    for diagnostic in &diagnostics {
        report_diagnostic(&source.name, &source.text, diagnostic);
    }
    eprintln!("{} error(s) found", diagnostics.len());
    Err(Failed)
}

fn check_file(path: &Path) -> Result<(), Failed> {
    let source = load(path)?;
    let program = front_end(&source)?;
    static_check(&source, &program)?;
    println!("✓ {} type checks successfully", source.name);
    Ok(())
}

fn run_file(path: &Path, check: bool) -> Result<(), Failed> {
    let source = load(path)?;
    let program = front_end(&source)?;
    if check {
        static_check(&source, &program)?;
    }
    mtx::run(&program).map_err(|err| {
        eprintln!("{err}");
        Failed
    })
}

fn parse_file(path: &Path) -> Result<(), Failed> {
    let source = load(path)?;
    let program = front_end(&source)?;
    match serde_json::to_string_pretty(&program) {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Err(Failed)
        }
    }
}

fn tokenize_file(path: &Path) -> Result<(), Failed> {
    let source = load(path)?;
    let tokens = mtx::lexer::tokenize(&source.text).map_err(|err| {
        report_error(&source.name, &source.text, &err);
        Failed
    })?;
    for (token, span) in tokens {
        println!("{:>4}:{:<4} {token:?}", span.line, span.start);
    }
    Ok(())
}

fn start_repl() -> Result<(), Failed> {
    let mut repl = mtx::repl::Repl::new().map_err(|err| {
        eprintln!("Error: {err}");
        Failed
    })?;
    repl.run().map_err(|err| {
        eprintln!("Error: {err}");
        Failed
    })
}
