//! Error types and reporting

use crate::ast::Span;
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// Front-end error: the source could not be turned into an AST
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser { message: String, span: Span },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } | Self::Parser { span, .. } => Some(*span),
            Self::Io { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Lexer { message, .. } => message,
            Self::Parser { message, .. } => message,
            Self::Io { message } => message,
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err.to_string())
    }
}

/// A static error found by the type checker.
///
/// The checker never stops at the first problem; each offending node
/// produces one of these and traversal continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
    pub span: Span,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            line: span.line,
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in line {}: {}", self.line, self.message)
    }
}

/// Receiver of checker diagnostics; rendering is up to the implementor.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Report a front-end error with ariadne
pub fn report_error(filename: &str, source: &str, error: &CompileError) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = match error {
        CompileError::Lexer { .. } => "Lexer",
        CompileError::Parser { .. } => "Parser",
        CompileError::Io { .. } => "IO",
    };

    let report = if let Some(span) = error.span() {
        Report::build(ReportKind::Error, (filename, span.start..span.end))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(error.message())
                    .with_color(Color::Red),
            )
            .finish()
    } else {
        Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {}", error.message()))
            .finish()
    };
    let _ = report.eprint((filename, Source::from(source)));
}

/// Report a checker diagnostic with ariadne
pub fn report_diagnostic(filename: &str, source: &str, diagnostic: &Diagnostic) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let range = diagnostic.span.start..diagnostic.span.end;
    let mut builder = Report::build(ReportKind::Error, (filename, range.clone()))
        .with_message(diagnostic.to_string())
        .with_label(
            Label::new((filename, range))
                .with_message(&diagnostic.message)
                .with_color(Color::Red),
        );
    if let Some(hint) = &diagnostic.hint {
        builder = builder.with_help(hint);
    }
    let _ = builder.finish().eprint((filename, Source::from(source)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new("undefined variable x", Span::new(4, 5, 3));
        assert_eq!(d.to_string(), "Error in line 3: undefined variable x");
        assert_eq!(d.line, 3);
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(Diagnostic::new("a", Span::new(0, 1, 1)));
        sink.report(Diagnostic::new("b", Span::new(2, 3, 2)));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].message, "b");
    }

    #[test]
    fn test_compile_error_span_and_message() {
        let err = CompileError::parser("expected `;`", Span::new(3, 4, 1));
        assert_eq!(err.span(), Some(Span::new(3, 4, 1)));
        assert_eq!(err.message(), "expected `;`");
        assert!(CompileError::io_error("missing").span().is_none());
    }
}
