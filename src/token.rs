//! Token values and the factory that builds them.

use std::fmt;

use crate::interval::Interval;
use crate::stream::CharStream;

/// Token type of the synthetic end-of-file token.
pub const TOKEN_EOF: i32 = -1;

/// Token type of a token that has not been assigned a type yet.
pub const TOKEN_INVALID_TYPE: i32 = 0;

/// Out-of-band token type directing the driver to discard the current
/// token and start over.
pub const TOKEN_SKIP: i32 = -3;

/// Out-of-band token type directing the driver to keep accumulating
/// characters into the current token.
pub const TOKEN_MORE: i32 = -2;

/// Channel ordinary tokens are emitted on.
pub const DEFAULT_CHANNEL: i32 = 0;

/// Channel for tokens the parser should not see (whitespace, comments).
pub const HIDDEN_CHANNEL: i32 = 1;

/// An emitted token: type, channel, half-open source span, position, and
/// materialized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: i32,
    pub channel: i32,
    /// Code-point index of the first character.
    pub start: usize,
    /// Code-point index one past the last character.
    pub end: usize,
    /// 1-based line of the first character.
    pub line: u32,
    /// 0-based column of the first character.
    pub column: u32,
    pub text: String,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[@{}..{}='{}',<{}>,{}:{}]",
            self.start, self.end, self.text, self.token_type, self.line, self.column
        )
    }
}

/// Builds tokens on behalf of the driver.
///
/// `text` overrides the token text; when `None` the factory extracts it
/// from the stream (EOF tokens render as `<EOF>`).
pub trait TokenFactory {
    #[allow(clippy::too_many_arguments)]
    fn create(
        &self,
        input: &dyn CharStream,
        token_type: i32,
        text: Option<String>,
        channel: i32,
        start: usize,
        end: usize,
        line: u32,
        column: u32,
    ) -> Token;
}

/// The default factory: copies token text out of the stream eagerly.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonTokenFactory;

impl TokenFactory for CommonTokenFactory {
    fn create(
        &self,
        input: &dyn CharStream,
        token_type: i32,
        text: Option<String>,
        channel: i32,
        start: usize,
        end: usize,
        line: u32,
        column: u32,
    ) -> Token {
        let text = text.unwrap_or_else(|| {
            if token_type == TOKEN_EOF {
                "<EOF>".to_string()
            } else if end > start {
                input.text(Interval::of(start as i32, end as i32 - 1))
            } else {
                String::new()
            }
        });
        Token {
            token_type,
            channel,
            start,
            end,
            line,
            column,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::CodePointStream;

    #[test]
    fn test_factory_extracts_text() {
        let input = CodePointStream::new("let x = 1");
        let t = CommonTokenFactory.create(&input, 5, None, DEFAULT_CHANNEL, 4, 5, 1, 4);
        assert_eq!(t.text, "x");
        assert_eq!((t.start, t.end), (4, 5));
    }

    #[test]
    fn test_factory_eof_text() {
        let input = CodePointStream::new("");
        let t = CommonTokenFactory.create(&input, TOKEN_EOF, None, DEFAULT_CHANNEL, 0, 0, 1, 0);
        assert_eq!(t.text, "<EOF>");
    }

    #[test]
    fn test_factory_override_wins() {
        let input = CodePointStream::new("abc");
        let t = CommonTokenFactory.create(
            &input,
            7,
            Some("custom".to_string()),
            DEFAULT_CHANNEL,
            0,
            3,
            1,
            0,
        );
        assert_eq!(t.text, "custom");
    }
}
