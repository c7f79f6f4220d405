//! The recoverable lex error and the listener chain it is reported to.

use thiserror::Error;

use crate::atn::config::OrderedConfigSet;

/// No lexer rule could match the input at `start_index`.
///
/// Carries the configurations that were alive when the simulator gave up
/// and the offending text (the character at the start index), captured
/// eagerly so the error stays detached from the stream.
#[derive(Debug, Clone, Error)]
#[error("token recognition error at: '{}'", escape_whitespace(.offending_text))]
pub struct LexerNoViableAlt {
    /// Code-point index of the first unmatchable character.
    pub start_index: usize,
    /// The text at `Interval(start_index, start_index)`, or `<EOF>`.
    pub offending_text: String,
    /// The dead-end configuration set.
    pub dead_end_configs: OrderedConfigSet,
}

/// Render control characters visibly for one-line error messages.
pub fn escape_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Receives syntax errors from the driver.
pub trait ErrorListener {
    fn syntax_error(&mut self, line: u32, column: u32, message: &str, error: &LexerNoViableAlt);
}

/// The default listener: one line per error on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleErrorListener;

impl ErrorListener for ConsoleErrorListener {
    fn syntax_error(&mut self, line: u32, column: u32, message: &str, _error: &LexerNoViableAlt) {
        eprintln!("line {line}:{column} {message}");
    }
}

/// A listener that records messages, for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct CollectingErrorListener {
    pub messages: Vec<(u32, u32, String)>,
}

impl ErrorListener for CollectingErrorListener {
    fn syntax_error(&mut self, line: u32, column: u32, message: &str, _error: &LexerNoViableAlt) {
        self.messages.push((line, column, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_whitespace() {
        assert_eq!(escape_whitespace("a\tb\nc"), "a\\tb\\nc");
        assert_eq!(escape_whitespace("plain"), "plain");
    }

    #[test]
    fn test_error_display() {
        let err = LexerNoViableAlt {
            start_index: 3,
            offending_text: "\n".to_string(),
            dead_end_configs: OrderedConfigSet::new(),
        };
        assert_eq!(err.to_string(), "token recognition error at: '\\n'");
    }
}
