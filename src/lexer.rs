//! Line-by-line lexer for ZCONF source text.
//!
//! The input must already have `\r\n`/`\r` normalized to `\n` and tabs
//! replaced by spaces. Each line is scanned by attempting a fixed, ordered
//! list of terminals at the current offset; every terminal consumes as much
//! as its own pattern allows and the first one that matches wins. A
//! `NEWLINE` token separates lines and a final `EOS` token closes the
//! sequence.

use crate::error::SyntaxError;
use crate::token::{Token, TokenKind};

pub(crate) struct Lexer {
    emit_newlines: bool,
}

impl Lexer {
    pub(crate) fn new() -> Self {
        Lexer {
            emit_newlines: true,
        }
    }

    /// A lexer that drops the `NEWLINE` tokens between lines. `EOS` is still
    /// emitted.
    #[cfg(test)]
    pub(crate) fn without_newlines() -> Self {
        Lexer {
            emit_newlines: false,
        }
    }

    pub(crate) fn tokenize(&self, input: &str) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        let lines: Vec<&str> = input.split('\n').collect();
        let last = lines.len() - 1;
        for (index, line) in lines.iter().enumerate() {
            let number = index + 1;
            let mut rest = *line;
            while !rest.is_empty() {
                let (kind, length) = match_terminal(rest).ok_or_else(|| {
                    let offender = rest.chars().next().unwrap_or('\0');
                    SyntaxError::new(format!("unexpected character {offender:?}"), number)
                })?;
                tokens.push(Token::new(kind, &rest[..length], number));
                rest = &rest[length..];
            }
            if self.emit_newlines && index != last {
                tokens.push(Token::new(TokenKind::Newline, "\n", number));
            }
        }
        tokens.push(Token::new(TokenKind::Eos, "", lines.len()));
        Ok(tokens)
    }
}

/// Attempts every terminal in order at the start of `rest` and returns the
/// winning kind with its matched byte length. `rest` is never empty.
fn match_terminal(rest: &str) -> Option<(TokenKind, usize)> {
    let bytes = rest.as_bytes();
    if bytes[0] == b'=' {
        return Some((TokenKind::Equal, 1));
    }
    if rest.starts_with("null") {
        return Some((TokenKind::Null, 4));
    }
    if rest.starts_with("true") {
        return Some((TokenKind::Boolean, 4));
    }
    if rest.starts_with("false") {
        return Some((TokenKind::Boolean, 5));
    }
    if let Some(length) = match_datetime(bytes) {
        return Some((TokenKind::DateTime, length));
    }
    if let Some(length) = match_float(bytes) {
        return Some((TokenKind::Float, length));
    }
    if let Some(length) = match_integer(bytes) {
        return Some((TokenKind::Integer, length));
    }
    if rest.starts_with("\"\"\"") {
        return Some((TokenKind::TripleQuotationMark, 3));
    }
    if bytes[0] == b'"' {
        return Some((TokenKind::QuotationMark, 1));
    }
    if rest.starts_with("'''") {
        return Some((TokenKind::TripleApostrophe, 3));
    }
    if bytes[0] == b'\'' {
        return Some((TokenKind::Apostrophe, 1));
    }
    if bytes[0] == b'#' {
        return Some((TokenKind::Hash, 1));
    }
    if bytes[0] == b' ' || bytes[0] == b'\t' {
        let length = bytes
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        return Some((TokenKind::Space, length));
    }
    match bytes[0] {
        b'[' => return Some((TokenKind::LeftSquareBracket, 1)),
        b']' => return Some((TokenKind::RightSquareBracket, 1)),
        b'{' => return Some((TokenKind::LeftCurlyBrace, 1)),
        b'}' => return Some((TokenKind::RightCurlyBrace, 1)),
        b',' => return Some((TokenKind::Comma, 1)),
        b'.' => return Some((TokenKind::Dot, 1)),
        _ => {}
    }
    let length = bytes
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        .count();
    if length > 0 {
        return Some((TokenKind::UnquotedKey, length));
    }
    if bytes[0] == b'\\' {
        if let Some(length) = match_escaped(bytes) {
            return Some((TokenKind::EscapedCharacter, length));
        }
        return Some((TokenKind::Escape, 1));
    }
    let length = basic_unescaped_run(rest);
    if length > 0 {
        return Some((TokenKind::BasicUnescaped, length));
    }
    None
}

fn byte_at(bytes: &[u8], index: usize) -> u8 {
    bytes.get(index).copied().unwrap_or(0)
}

/// A run matching `(\d_?)+`: digits, each optionally followed by a single
/// underscore.
fn digit_run(bytes: &[u8]) -> usize {
    let mut i = 0;
    while byte_at(bytes, i).is_ascii_digit() {
        i += 1;
        if byte_at(bytes, i) == b'_' {
            i += 1;
        }
    }
    i
}

fn match_integer(bytes: &[u8]) -> Option<usize> {
    let start = usize::from(bytes[0] == b'+' || bytes[0] == b'-');
    let run = digit_run(&bytes[start..]);
    if run == 0 {
        None
    } else {
        Some(start + run)
    }
}

/// Floats require a fractional part, an exponent, or both; a plain digit run
/// is left for the integer terminal.
fn match_float(bytes: &[u8]) -> Option<usize> {
    let start = usize::from(bytes[0] == b'+' || bytes[0] == b'-');
    let int_run = digit_run(&bytes[start..]);
    if int_run == 0 {
        return None;
    }
    let after_int = start + int_run;
    let (has_dot, frac_run) = if byte_at(bytes, after_int) == b'.' {
        (true, digit_run(&bytes[after_int + 1..]))
    } else {
        (false, 0)
    };
    let after_frac = if has_dot {
        after_int + 1 + frac_run
    } else {
        after_int
    };
    let marker = byte_at(bytes, after_frac);
    if marker == b'e' || marker == b'E' {
        let mut i = after_frac + 1;
        if byte_at(bytes, i) == b'+' || byte_at(bytes, i) == b'-' {
            i += 1;
        }
        let exp_run = digit_run(&bytes[i..]);
        if exp_run > 0 {
            return Some(i + exp_run);
        }
    }
    if has_dot && frac_run > 0 {
        return Some(after_int + 1 + frac_run);
    }
    None
}

/// `YYYY-MM-DD`, optionally `THH:MM:SS`, fractional seconds and a `Z` or
/// `+HH:MM`/`-HH:MM` offset. Trailing garbage simply ends the match.
fn match_datetime(bytes: &[u8]) -> Option<usize> {
    if !(digits(bytes, 0, 4)
        && byte_at(bytes, 4) == b'-'
        && digits(bytes, 5, 2)
        && byte_at(bytes, 7) == b'-'
        && digits(bytes, 8, 2))
    {
        return None;
    }
    let mut i = 10;
    if byte_at(bytes, 10) == b'T'
        && digits(bytes, 11, 2)
        && byte_at(bytes, 13) == b':'
        && digits(bytes, 14, 2)
        && byte_at(bytes, 16) == b':'
        && digits(bytes, 17, 2)
    {
        i = 19;
        if byte_at(bytes, i) == b'.' {
            let mut j = i + 1;
            while byte_at(bytes, j).is_ascii_digit() {
                j += 1;
            }
            if j > i + 1 {
                i = j;
            }
        }
        match byte_at(bytes, i) {
            b'Z' => i += 1,
            b'+' | b'-'
                if digits(bytes, i + 1, 2)
                    && byte_at(bytes, i + 3) == b':'
                    && digits(bytes, i + 4, 2) =>
            {
                i += 6;
            }
            _ => {}
        }
    }
    Some(i)
}

fn digits(bytes: &[u8], start: usize, count: usize) -> bool {
    bytes.len() >= start + count && bytes[start..start + count].iter().all(u8::is_ascii_digit)
}

fn match_escaped(bytes: &[u8]) -> Option<usize> {
    match byte_at(bytes, 1) {
        b'b' | b't' | b'n' | b'f' | b'r' | b'"' | b'\\' => Some(2),
        b'u' if hex_digits(bytes, 2, 4) => Some(6),
        b'U' if hex_digits(bytes, 2, 8) => Some(10),
        _ => None,
    }
}

fn hex_digits(bytes: &[u8], start: usize, count: usize) -> bool {
    bytes.len() >= start + count
        && bytes[start..start + count]
            .iter()
            .all(u8::is_ascii_hexdigit)
}

/// Catch-all run of printable characters, excluding the delimiters that can
/// close a syntactic region mid-run: `"`, `'`, `[`, `\` and `]`.
fn basic_unescaped_run(rest: &str) -> usize {
    let mut length = 0;
    for ch in rest.chars() {
        if is_basic_unescaped(ch) {
            length += ch.len_utf8();
        } else {
            break;
        }
    }
    length
}

fn is_basic_unescaped(ch: char) -> bool {
    matches!(ch,
        '\u{20}'..='\u{21}' | '\u{23}'..='\u{26}' | '\u{28}'..='\u{5A}' | '\u{5E}'..='\u{10FFFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new()
            .tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn assignment_line() {
        assert_eq!(
            kinds("port = 8080"),
            vec![
                TokenKind::UnquotedKey,
                TokenKind::Space,
                TokenKind::Equal,
                TokenKind::Space,
                TokenKind::Integer,
                TokenKind::Eos,
            ]
        );
    }

    #[test]
    fn newline_between_lines_and_final_eos() {
        let tokens = Lexer::new().tokenize("a = 1\nb = 2").unwrap();
        let newline = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Newline)
            .unwrap();
        assert_eq!(newline.line, 1);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eos);
        assert_eq!(tokens.last().unwrap().line, 2);
    }

    #[test]
    fn newline_emission_can_be_disabled() {
        let tokens = Lexer::without_newlines().tokenize("a\nb").unwrap();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Newline));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eos);
    }

    #[test]
    fn earlier_terminals_win() {
        assert_eq!(kinds("true")[0], TokenKind::Boolean);
        assert_eq!(kinds("null")[0], TokenKind::Null);
        // A date beats the integer that would match its year.
        assert_eq!(kinds("1979-05-27")[0], TokenKind::DateTime);
        // A float beats the integer that would match its mantissa.
        assert_eq!(kinds("3.14")[0], TokenKind::Float);
    }

    #[test]
    fn float_requires_fraction_or_exponent() {
        assert_eq!(kinds("42")[0], TokenKind::Integer);
        assert_eq!(kinds("42e2")[0], TokenKind::Float);
        assert_eq!(kinds("4_2.5")[0], TokenKind::Float);
    }

    #[test]
    fn datetime_forms() {
        for lexeme in [
            "1979-05-27",
            "1979-05-27T07:32:00",
            "1979-05-27T07:32:00.999",
            "1979-05-27T07:32:00Z",
            "1979-05-27T07:32:00-07:00",
        ] {
            let tokens = Lexer::new().tokenize(lexeme).unwrap();
            assert_eq!(tokens[0].kind, TokenKind::DateTime, "{lexeme}");
            assert_eq!(tokens[0].lexeme, lexeme);
        }
    }

    #[test]
    fn escape_tokens() {
        assert_eq!(kinds("\\n")[0], TokenKind::EscapedCharacter);
        assert_eq!(kinds("\\u00E9")[0], TokenKind::EscapedCharacter);
        assert_eq!(kinds("\\U000000E9")[0], TokenKind::EscapedCharacter);
        // A backslash that starts no valid escape is a bare escape token.
        assert_eq!(kinds("\\q"), vec![TokenKind::Escape, TokenKind::UnquotedKey, TokenKind::Eos]);
    }

    #[test]
    fn punctuation_and_catch_all() {
        assert_eq!(
            kinds("[x.y]"),
            vec![
                TokenKind::LeftSquareBracket,
                TokenKind::UnquotedKey,
                TokenKind::Dot,
                TokenKind::UnquotedKey,
                TokenKind::RightSquareBracket,
                TokenKind::Eos,
            ]
        );
        assert_eq!(kinds("é!?")[0], TokenKind::BasicUnescaped);
    }

    #[test]
    fn control_characters_are_rejected() {
        let err = Lexer::new().tokenize("a = \u{1}").unwrap_err();
        assert_eq!(err.line, 1);
    }
}
