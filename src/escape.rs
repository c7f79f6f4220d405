//! Escape-sequence parsing for lexer character literals.
//!
//! Recognizes the escape forms a lexer grammar can contain:
//! `\n`-class single characters, `\uXXXX`, `\u{...}`, and the Unicode
//! property forms `\p{Name}` / `\P{Name}`. Offsets count Unicode scalar
//! values.

/// What an escape sequence denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    /// A concrete code point (`\n`, `\uABCD`, `\u{10ABCD}`).
    CodePoint,
    /// A Unicode property name (`\p{Lu}`).
    PropertyName,
    /// An inverted Unicode property name (`\P{Lu}`).
    PropertyNameInverted,
}

/// A successfully parsed escape sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeResult {
    pub kind: EscapeKind,
    /// The denoted code point, or -1 for property forms.
    pub code_point: i32,
    /// The property name for `\p`/`\P` forms.
    pub property_name: Option<String>,
    /// How many scalar values the escape consumed, starting at the
    /// backslash.
    pub code_unit_length: usize,
}

/// Code point denoted by a single-character escape, or `None`.
fn escaped_char_value(escaped: char) -> Option<i32> {
    match escaped {
        'n' => Some(0x0A),
        'r' => Some(0x0D),
        't' => Some(0x09),
        'b' => Some(0x08),
        'f' => Some(0x0C),
        '\\' => Some(0x5C),
        '\'' => Some(0x27),
        '"' => Some(0x22),
        _ => None,
    }
}

/// Parse the hex digits `s[start..end]` as a code point value.
/// Returns `None` when the range is empty, contains a non-hex digit, or
/// overflows.
fn parse_hex_value(s: &[char], start: usize, end: usize) -> Option<i32> {
    if start >= end || end > s.len() {
        return None;
    }
    let mut value: i64 = 0;
    for &c in &s[start..end] {
        let digit = c.to_digit(16)? as i64;
        value = value * 16 + digit;
        if value > i32::MAX as i64 {
            return None;
        }
    }
    Some(value as i32)
}

/// Parse a single escape sequence of `s` starting at scalar offset
/// `start`. Returns `None` when no valid escape sequence is present.
pub fn parse_escape(s: &str, start: usize) -> Option<EscapeResult> {
    let chars: Vec<char> = s.chars().collect();
    let mut offset = start;
    if offset + 2 > chars.len() || chars[offset] != '\\' {
        return None;
    }
    offset += 1;
    let escaped = chars[offset];
    offset += 1;

    if escaped == 'u' {
        // \u{1} is the shortest braced form we support
        if offset + 3 > chars.len() {
            return None;
        }
        let (hex_start, hex_end) = if chars[offset] == '{' {
            let hex_start = offset + 1;
            let hex_end = chars[hex_start..].iter().position(|&c| c == '}')? + hex_start;
            offset = hex_end + 1;
            (hex_start, hex_end)
        } else {
            if offset + 4 > chars.len() {
                return None;
            }
            let hex_start = offset;
            offset += 4;
            (hex_start, offset)
        };
        let code_point = parse_hex_value(&chars, hex_start, hex_end)?;
        Some(EscapeResult {
            kind: EscapeKind::CodePoint,
            code_point,
            property_name: None,
            code_unit_length: offset - start,
        })
    } else if escaped == 'p' || escaped == 'P' {
        // \p{L} is the shortest we support
        if offset + 3 > chars.len() || chars[offset] != '{' {
            return None;
        }
        let open_brace = offset;
        let close_brace = chars[open_brace..].iter().position(|&c| c == '}')? + open_brace;
        let property_name: String = chars[open_brace + 1..close_brace].iter().collect();
        offset = close_brace + 1;
        let kind = if escaped == 'p' {
            EscapeKind::PropertyName
        } else {
            EscapeKind::PropertyNameInverted
        };
        Some(EscapeResult {
            kind,
            code_point: -1,
            property_name: Some(property_name),
            code_unit_length: offset - start,
        })
    } else {
        let code_point = escaped_char_value(escaped)?;
        Some(EscapeResult {
            kind: EscapeKind::CodePoint,
            code_point,
            property_name: None,
            code_unit_length: offset - start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_point(cp: i32, len: usize) -> EscapeResult {
        EscapeResult {
            kind: EscapeKind::CodePoint,
            code_point: cp,
            property_name: None,
            code_unit_length: len,
        }
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_escape("", 0), None);
    }

    #[test]
    fn test_parse_just_backslash() {
        assert_eq!(parse_escape("\\", 0), None);
    }

    #[test]
    fn test_parse_invalid_escape() {
        assert_eq!(parse_escape("\\z", 0), None);
    }

    #[test]
    fn test_parse_newline() {
        assert_eq!(parse_escape("\\n", 0), Some(code_point(0x0A, 2)));
    }

    #[test]
    fn test_parse_unicode_too_short() {
        assert_eq!(parse_escape("\\uABC", 0), None);
    }

    #[test]
    fn test_parse_unicode_bmp() {
        assert_eq!(parse_escape("\\uABCD", 0), Some(code_point(0xABCD, 6)));
    }

    #[test]
    fn test_parse_unicode_smp_too_short() {
        assert_eq!(parse_escape("\\u{}", 0), None);
    }

    #[test]
    fn test_parse_unicode_smp() {
        assert_eq!(parse_escape("\\u{10ABCD}", 0), Some(code_point(0x10ABCD, 10)));
    }

    #[test]
    fn test_parse_unicode_property_too_short() {
        assert_eq!(parse_escape("\\p{}", 0), None);
    }

    #[test]
    fn test_parse_unicode_property() {
        assert_eq!(
            parse_escape("\\p{Lu}", 0),
            Some(EscapeResult {
                kind: EscapeKind::PropertyName,
                code_point: -1,
                property_name: Some("Lu".to_string()),
                code_unit_length: 6,
            })
        );
    }

    #[test]
    fn test_parse_unicode_property_inverted() {
        assert_eq!(
            parse_escape("\\P{Lu}", 0),
            Some(EscapeResult {
                kind: EscapeKind::PropertyNameInverted,
                code_point: -1,
                property_name: Some("Lu".to_string()),
                code_unit_length: 6,
            })
        );
    }

    #[test]
    fn test_parse_mid_string_offset() {
        assert_eq!(parse_escape("ab\\tcd", 2), Some(code_point(0x09, 2)));
    }

    #[test]
    fn test_parse_unbraced_hex_rejects_garbage() {
        assert_eq!(parse_escape("\\uZZZZ", 0), None);
    }
}
