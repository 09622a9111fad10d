//! Destination for `print` output
//!
//! Uses enum dispatch; the handler is owned by one interpreter.

/// Where printed lines go
#[derive(Debug, Clone, Default)]
pub enum PrintHandler {
    /// Writes to stdout (default)
    #[default]
    Stdout,
    /// Captures to a buffer (tests, embedders)
    Buffer(String),
    /// Discards all output
    Silent,
}

impl PrintHandler {
    /// Create an empty capturing handler
    pub fn buffer() -> Self {
        PrintHandler::Buffer(String::new())
    }

    /// Print a line (with newline)
    pub fn println(&mut self, msg: &str) {
        match self {
            PrintHandler::Stdout => println!("{msg}"),
            PrintHandler::Buffer(buf) => {
                buf.push_str(msg);
                buf.push('\n');
            }
            PrintHandler::Silent => {}
        }
    }

    /// Captured output; empty for handlers that don't capture
    pub fn output(&self) -> &str {
        match self {
            PrintHandler::Buffer(buf) => buf,
            PrintHandler::Stdout | PrintHandler::Silent => "",
        }
    }

    /// Clear captured output
    pub fn clear(&mut self) {
        if let PrintHandler::Buffer(buf) = self {
            buf.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_captures_lines() {
        let mut handler = PrintHandler::buffer();
        handler.println("hello");
        handler.println("world");
        assert_eq!(handler.output(), "hello\nworld\n");
    }

    #[test]
    fn test_buffer_clear() {
        let mut handler = PrintHandler::buffer();
        handler.println("hello");
        handler.clear();
        assert_eq!(handler.output(), "");
    }

    #[test]
    fn test_silent_discards() {
        let mut handler = PrintHandler::Silent;
        handler.println("hello");
        assert_eq!(handler.output(), "");
    }
}
