//! Runtime errors for the interpreter

use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Source line of the statement that failed, once known
    pub line: Option<usize>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Name with no binding in any active frame
    UndefinedVariable,
    /// Operand of the wrong kind
    TypeError,
    /// Aggregates whose sizes do not line up
    ShapeMismatch,
    /// Division by zero
    DivisionByZero,
    /// Index out of bounds
    IndexOutOfBounds,
    /// Builtin given an unusable argument
    InvalidArgument,
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: String) -> Self {
        RuntimeError {
            kind,
            message,
            line: None,
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("variable {name} does not exist"),
        )
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("type error: expected {expected}, got {got}"),
        )
    }

    pub fn unsupported(op: &str, left: &str, right: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("type error: cannot {op} {left} and {right}"),
        )
    }

    pub fn shape_mismatch(left: &[usize], right: &[usize]) -> Self {
        Self::new(
            ErrorKind::ShapeMismatch,
            format!("shape mismatch: {left:?} and {right:?}"),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero".to_string())
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexOutOfBounds,
            format!("index {index} out of bounds for length {len}"),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message.into())
    }

    /// Attach a source line unless a more precise one is already set
    pub fn at_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Runtime error in line {line}: {}", self.message),
            None => write!(f, "Runtime error: {}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_variable() {
        let err = RuntimeError::undefined_variable("foo");
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert!(err.message.contains("foo"));
    }

    #[test]
    fn test_type_error() {
        let err = RuntimeError::type_error("matrix", "vector");
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("matrix"));
        assert!(err.message.contains("vector"));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = RuntimeError::shape_mismatch(&[2, 3], &[3]);
        assert_eq!(err.kind, ErrorKind::ShapeMismatch);
        assert_eq!(err.message, "shape mismatch: [2, 3] and [3]");
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = RuntimeError::index_out_of_bounds(5, 3);
        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds);
        assert!(err.message.contains("5"));
        assert!(err.message.contains("3"));
    }

    #[test]
    fn test_at_line_keeps_innermost() {
        let err = RuntimeError::division_by_zero().at_line(4).at_line(1);
        assert_eq!(err.line, Some(4));
        assert_eq!(err.to_string(), "Runtime error in line 4: division by zero");
    }

    #[test]
    fn test_display_without_line() {
        let err = RuntimeError::invalid_argument("zeros: negative size -1");
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "Runtime error: zeros: negative size -1");
    }
}
