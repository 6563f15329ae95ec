//! Recursive-descent parser for ZCONF documents.
//!
//! The parser walks the token stream once, with no backtracking beyond the
//! stream's non-consuming lookahead, and mutates two structures as it goes:
//! the [`ValueTree`] it will eventually hand back, and the [`KeyStore`] that
//! enforces the document-wide uniqueness rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::SyntaxError;
use crate::keystore::KeyStore;
use crate::lexer::Lexer;
use crate::map::ZconfMap;
use crate::stream::TokenStream;
use crate::token::TokenKind;
use crate::tree::ValueTree;
use crate::value::{Kind, Value};

/// Newline and tab normalization applied before lexing: `\r\n` and `\r`
/// become `\n`, tabs become single spaces.
pub(crate) fn normalize(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', " ")
}

/// Parses a normalized document into its root table.
pub(crate) fn parse_document(input: &str) -> Result<ZconfMap, SyntaxError> {
    let tokens = Lexer::new().tokenize(input)?;
    Parser::new(TokenStream::new(tokens)).parse()
}

const KEY_STARTERS: &[TokenKind] = &[
    TokenKind::QuotationMark,
    TokenKind::UnquotedKey,
    TokenKind::Integer,
];

struct Parser {
    tokens: TokenStream,
    key_store: KeyStore,
    tree: ValueTree,
}

impl Parser {
    fn new(tokens: TokenStream) -> Self {
        Parser {
            tokens,
            key_store: KeyStore::new(),
            tree: ValueTree::new(),
        }
    }

    fn parse(mut self) -> Result<ZconfMap, SyntaxError> {
        while !self.tokens.exhausted() {
            if self.tokens.matches(TokenKind::Hash) {
                self.parse_comment();
            } else if self.tokens.matches_any(KEY_STARTERS) {
                self.parse_key_value(false)?;
            } else if self.tokens.matches_sequence(&[
                TokenKind::LeftSquareBracket,
                TokenKind::LeftSquareBracket,
            ]) {
                self.parse_array_of_tables_header()?;
            } else if self.tokens.matches(TokenKind::LeftSquareBracket) {
                self.parse_table_header()?;
            } else if self.tokens.matches_any(&[
                TokenKind::Space,
                TokenKind::Newline,
                TokenKind::Eos,
            ]) {
                self.tokens.advance();
            } else {
                return Err(self.unexpected("a key, a table header or a comment"));
            }
        }
        Ok(self.tree.into_root())
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.tokens.peek() {
            Some(token) => SyntaxError::new(
                format!(
                    "expected {expected} but found {} ({:?})",
                    token.kind.name(),
                    token.lexeme
                ),
                token.line,
            ),
            None => SyntaxError::new(
                format!("expected {expected} but the input ended"),
                self.tokens.line(),
            ),
        }
    }

    /// Discards everything up to, but not including, the end of the line.
    fn parse_comment(&mut self) {
        while !self.tokens.exhausted()
            && !self
                .tokens
                .matches_any(&[TokenKind::Newline, TokenKind::Eos])
        {
            self.tokens.advance();
        }
    }

    /// One `key = value` pair. Top-level pairs must end their line; pairs
    /// inside an inline table leave the separator handling to their caller.
    fn parse_key_value(&mut self, inline: bool) -> Result<(), SyntaxError> {
        let line = self.tokens.line();
        let key = self.parse_key_name()?;
        self.tokens.skip_while(&[TokenKind::Space]);
        self.tokens.expect(TokenKind::Equal)?;
        self.tokens.skip_while(&[TokenKind::Space]);

        if self.tokens.matches(TokenKind::LeftCurlyBrace) {
            if !self.key_store.is_valid_inline_table(&key) {
                return Err(SyntaxError::new(
                    format!("the key \"{key}\" has already been defined"),
                    line,
                ));
            }
            self.key_store.add_inline_table_key(&key);
            self.tree
                .begin_inline_table(&key)
                .map_err(|message| SyntaxError::new(message, line))?;
            self.parse_inline_table()?;
            self.tree.end_inline_table();
            self.key_store.end_inline_table();
        } else {
            if !self.key_store.is_valid_key(&key) {
                return Err(SyntaxError::new(
                    format!("the key \"{key}\" has already been defined"),
                    line,
                ));
            }
            let value = if self.tokens.matches(TokenKind::LeftSquareBracket) {
                self.parse_array()?
            } else {
                self.parse_simple_value()?
            };
            self.key_store.add_key(&key);
            self.tree
                .put(&key, value)
                .map_err(|message| SyntaxError::new(message, line))?;
        }

        if !inline {
            self.finish_line()?;
        }
        Ok(())
    }

    /// A key is a quoted basic string, an unquoted key, or (leniently) an
    /// integer lexeme taken verbatim.
    fn parse_key_name(&mut self) -> Result<String, SyntaxError> {
        let line = self.tokens.line();
        let key = match self.tokens.peek().map(|token| token.kind) {
            Some(TokenKind::QuotationMark) => self.parse_basic_string()?,
            Some(TokenKind::UnquotedKey) => self.tokens.expect(TokenKind::UnquotedKey)?,
            Some(TokenKind::Integer) => self.tokens.expect(TokenKind::Integer)?,
            _ => return Err(self.unexpected("a key")),
        };
        if key.is_empty() {
            return Err(SyntaxError::new("keys must not be empty", line));
        }
        Ok(key)
    }

    /// Trailing whitespace, an optional comment, then the line break (or the
    /// end of the input).
    fn finish_line(&mut self) -> Result<(), SyntaxError> {
        self.tokens.skip_while(&[TokenKind::Space]);
        if self.tokens.matches(TokenKind::Hash) {
            self.parse_comment();
        }
        if self
            .tokens
            .matches_any(&[TokenKind::Newline, TokenKind::Eos])
        {
            self.tokens.advance();
            Ok(())
        } else {
            Err(self.unexpected("the end of the line"))
        }
    }

    fn parse_simple_value(&mut self) -> Result<Value, SyntaxError> {
        let (kind, line) = match self.tokens.peek() {
            Some(token) => (token.kind, token.line),
            None => return Err(self.unexpected("a value")),
        };
        match kind {
            TokenKind::Null => {
                self.tokens.advance();
                Ok(Value::Null)
            }
            TokenKind::Boolean => {
                let lexeme = self.tokens.expect(TokenKind::Boolean)?;
                Ok(Value::Bool(lexeme == "true"))
            }
            TokenKind::Integer => {
                let lexeme = self.tokens.expect(TokenKind::Integer)?;
                parse_integer(&lexeme, line)
            }
            TokenKind::Float => {
                let lexeme = self.tokens.expect(TokenKind::Float)?;
                parse_float(&lexeme, line)
            }
            TokenKind::DateTime => {
                let lexeme = self.tokens.expect(TokenKind::DateTime)?;
                parse_datetime(&lexeme, line)
            }
            TokenKind::QuotationMark => Ok(Value::String(self.parse_basic_string()?)),
            TokenKind::TripleQuotationMark => {
                Ok(Value::String(self.parse_multiline_basic_string()?))
            }
            TokenKind::Apostrophe => Ok(Value::String(self.parse_literal_string()?)),
            TokenKind::TripleApostrophe => {
                Ok(Value::String(self.parse_multiline_literal_string()?))
            }
            _ => Err(self.unexpected("a value")),
        }
    }

    /// `"…"` with escapes. A raw backslash, a line break or the end of the
    /// input inside the string is an error.
    fn parse_basic_string(&mut self) -> Result<String, SyntaxError> {
        self.tokens.expect(TokenKind::QuotationMark)?;
        let mut text = String::new();
        loop {
            let (kind, line) = match self.tokens.peek() {
                Some(token) => (token.kind, token.line),
                None => {
                    return Err(SyntaxError::new(
                        "unterminated basic string",
                        self.tokens.line(),
                    ))
                }
            };
            match kind {
                TokenKind::QuotationMark => {
                    self.tokens.advance();
                    return Ok(text);
                }
                TokenKind::Newline | TokenKind::Eos => {
                    return Err(SyntaxError::new("unterminated basic string", line));
                }
                TokenKind::Escape => {
                    return Err(SyntaxError::new(
                        "invalid escape sequence in basic string",
                        line,
                    ));
                }
                TokenKind::EscapedCharacter => {
                    let lexeme = self.tokens.expect(TokenKind::EscapedCharacter)?;
                    text.push(decode_escape(&lexeme, line)?);
                }
                _ => {
                    if let Some(token) = self.tokens.advance() {
                        text.push_str(&token.lexeme);
                    }
                }
            }
        }
    }

    /// `"""…"""`. A newline right after the opener is dropped; a backslash at
    /// the end of a line swallows the break and any following indentation.
    fn parse_multiline_basic_string(&mut self) -> Result<String, SyntaxError> {
        self.tokens.expect(TokenKind::TripleQuotationMark)?;
        if self.tokens.matches(TokenKind::Newline) {
            self.tokens.advance();
        }
        let mut text = String::new();
        loop {
            let (kind, line) = match self.tokens.peek() {
                Some(token) => (token.kind, token.line),
                None => {
                    return Err(SyntaxError::new(
                        "unterminated multi-line basic string",
                        self.tokens.line(),
                    ))
                }
            };
            match kind {
                TokenKind::TripleQuotationMark => {
                    self.tokens.advance();
                    return Ok(text);
                }
                TokenKind::Eos => {
                    return Err(SyntaxError::new(
                        "unterminated multi-line basic string",
                        line,
                    ));
                }
                TokenKind::EscapedCharacter => {
                    let lexeme = self.tokens.expect(TokenKind::EscapedCharacter)?;
                    text.push(decode_escape(&lexeme, line)?);
                }
                TokenKind::Escape => {
                    self.tokens.advance();
                    self.tokens.skip_while(&[
                        TokenKind::Escape,
                        TokenKind::Space,
                        TokenKind::Newline,
                    ]);
                }
                _ => {
                    if let Some(token) = self.tokens.advance() {
                        text.push_str(&token.lexeme);
                    }
                }
            }
        }
    }

    /// `'…'`: everything is taken verbatim, but the string must close on its
    /// own line.
    fn parse_literal_string(&mut self) -> Result<String, SyntaxError> {
        self.tokens.expect(TokenKind::Apostrophe)?;
        let mut text = String::new();
        loop {
            let (kind, line) = match self.tokens.peek() {
                Some(token) => (token.kind, token.line),
                None => {
                    return Err(SyntaxError::new(
                        "unterminated literal string",
                        self.tokens.line(),
                    ))
                }
            };
            match kind {
                TokenKind::Apostrophe => {
                    self.tokens.advance();
                    return Ok(text);
                }
                TokenKind::Newline | TokenKind::Eos => {
                    return Err(SyntaxError::new("unterminated literal string", line));
                }
                _ => {
                    if let Some(token) = self.tokens.advance() {
                        text.push_str(&token.lexeme);
                    }
                }
            }
        }
    }

    fn parse_multiline_literal_string(&mut self) -> Result<String, SyntaxError> {
        self.tokens.expect(TokenKind::TripleApostrophe)?;
        if self.tokens.matches(TokenKind::Newline) {
            self.tokens.advance();
        }
        let mut text = String::new();
        loop {
            let kind = match self.tokens.peek() {
                Some(token) => token.kind,
                None => {
                    return Err(SyntaxError::new(
                        "unterminated multi-line literal string",
                        self.tokens.line(),
                    ))
                }
            };
            match kind {
                TokenKind::TripleApostrophe => {
                    self.tokens.advance();
                    return Ok(text);
                }
                TokenKind::Eos => {
                    return Err(SyntaxError::new(
                        "unterminated multi-line literal string",
                        self.tokens.line(),
                    ));
                }
                _ => {
                    if let Some(token) = self.tokens.advance() {
                        text.push_str(&token.lexeme);
                    }
                }
            }
        }
    }

    /// `[…]`: whitespace, line breaks and comments may appear anywhere
    /// between elements; elements are nested arrays or simple values; the
    /// first element fixes the type and a comma separates elements, with an
    /// optional trailing comma.
    fn parse_array(&mut self) -> Result<Value, SyntaxError> {
        self.tokens.expect(TokenKind::LeftSquareBracket)?;
        let mut elements: Vec<Value> = Vec::new();
        let mut element_kind: Option<Kind> = None;
        loop {
            self.skip_array_filler();
            if self.tokens.matches(TokenKind::RightSquareBracket) {
                self.tokens.advance();
                break;
            }
            let line = self.tokens.line();
            let value = if self.tokens.matches(TokenKind::LeftSquareBracket) {
                self.parse_array()?
            } else {
                self.parse_simple_value()?
            };
            let kind = value.kind();
            match element_kind {
                None => element_kind = Some(kind),
                Some(expected) if expected != kind => {
                    return Err(SyntaxError::new(
                        format!(
                            "arrays cannot mix value types: {value} is a {kind}, expected a {expected}"
                        ),
                        line,
                    ));
                }
                Some(_) => {}
            }
            elements.push(value);
            self.skip_array_filler();
            if self.tokens.matches(TokenKind::Comma) {
                self.tokens.advance();
            } else if self.tokens.matches(TokenKind::RightSquareBracket) {
                self.tokens.advance();
                break;
            } else {
                return Err(self.unexpected("\",\" or \"]\""));
            }
        }
        Ok(Value::Array(elements))
    }

    fn skip_array_filler(&mut self) {
        loop {
            self.tokens
                .skip_while(&[TokenKind::Space, TokenKind::Newline]);
            if self.tokens.matches(TokenKind::Hash) {
                self.parse_comment();
            } else {
                break;
            }
        }
    }

    /// `{ k = v, … }`; the caller has already repositioned the tree cursor
    /// and the key scope.
    fn parse_inline_table(&mut self) -> Result<(), SyntaxError> {
        self.tokens.expect(TokenKind::LeftCurlyBrace)?;
        self.tokens.skip_while(&[TokenKind::Space]);
        if !self.tokens.matches(TokenKind::RightCurlyBrace) {
            loop {
                self.parse_key_value(true)?;
                self.tokens.skip_while(&[TokenKind::Space]);
                if self.tokens.matches(TokenKind::Comma) {
                    self.tokens.advance();
                    self.tokens.skip_while(&[TokenKind::Space]);
                } else {
                    break;
                }
            }
        }
        self.tokens.expect(TokenKind::RightCurlyBrace)?;
        Ok(())
    }

    fn parse_table_header(&mut self) -> Result<(), SyntaxError> {
        let line = self.tokens.line();
        self.tokens.expect(TokenKind::LeftSquareBracket)?;
        let segments = self.parse_header_name()?;
        self.tokens.expect(TokenKind::RightSquareBracket)?;
        let name = segments.join(".");
        if self.key_store.is_registered_as_array_table(&name) {
            return Err(SyntaxError::new(
                format!("\"{name}\" has already been defined as an array of tables"),
                line,
            ));
        }
        if !self.key_store.is_valid_table_key(&name) {
            return Err(SyntaxError::new(
                format!("the table \"{name}\" has already been defined"),
                line,
            ));
        }
        self.key_store.add_table_key(&name);
        self.tree
            .enter_table(&segments)
            .map_err(|message| SyntaxError::new(message, line))?;
        self.finish_line()
    }

    fn parse_array_of_tables_header(&mut self) -> Result<(), SyntaxError> {
        let line = self.tokens.line();
        self.tokens.expect(TokenKind::LeftSquareBracket)?;
        self.tokens.expect(TokenKind::LeftSquareBracket)?;
        let segments = self.parse_header_name()?;
        self.tokens.expect(TokenKind::RightSquareBracket)?;
        self.tokens.expect(TokenKind::RightSquareBracket)?;
        let name = segments.join(".");
        if self.key_store.is_table_implicit_from_array_table(&name)
            && !self.key_store.is_registered_as_array_table(&name)
        {
            return Err(SyntaxError::new(
                format!(
                    "\"{name}\" was implicitly created as a parent of an array of tables and cannot be declared itself"
                ),
                line,
            ));
        }
        if !self.key_store.is_valid_array_table_key(&name) {
            return Err(SyntaxError::new(
                format!("\"{name}\" conflicts with a previously defined table or key"),
                line,
            ));
        }
        self.key_store.add_array_table_key(&name);
        self.tree
            .enter_array_table(&segments)
            .map_err(|message| SyntaxError::new(message, line))?;
        self.finish_line()
    }

    /// Dotted header segments with optional surrounding whitespace.
    fn parse_header_name(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut segments = Vec::new();
        loop {
            self.tokens.skip_while(&[TokenKind::Space]);
            segments.push(self.parse_key_name()?);
            self.tokens.skip_while(&[TokenKind::Space]);
            if self.tokens.matches(TokenKind::Dot) {
                self.tokens.advance();
            } else {
                break;
            }
        }
        Ok(segments)
    }
}

fn parse_integer(lexeme: &str, line: usize) -> Result<Value, SyntaxError> {
    validate_underscores(lexeme, line)?;
    let digits = lexeme.trim_start_matches(['+', '-']);
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(SyntaxError::new(
            format!("invalid integer \"{lexeme}\": leading zeros are not allowed"),
            line,
        ));
    }
    lexeme
        .replace('_', "")
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| {
            SyntaxError::new(
                format!("invalid integer \"{lexeme}\": out of 64-bit range"),
                line,
            )
        })
}

fn parse_float(lexeme: &str, line: usize) -> Result<Value, SyntaxError> {
    validate_underscores(lexeme, line)?;
    let digits = lexeme.trim_start_matches(['+', '-']);
    let integral = digits.split(['.', 'e', 'E']).next().unwrap_or(digits);
    if integral.len() > 1 && integral.starts_with('0') {
        return Err(SyntaxError::new(
            format!("invalid float \"{lexeme}\": leading zeros are not allowed"),
            line,
        ));
    }
    lexeme
        .replace('_', "")
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| SyntaxError::new(format!("invalid float \"{lexeme}\""), line))
}

/// Underscores in numbers must sit between two digits; this also rules out
/// underscores touching the dot, the exponent marker or either end.
fn validate_underscores(lexeme: &str, line: usize) -> Result<(), SyntaxError> {
    let bytes = lexeme.as_bytes();
    for (at, &byte) in bytes.iter().enumerate() {
        if byte == b'_' {
            let after_digit = at > 0 && bytes[at - 1].is_ascii_digit();
            let before_digit = at + 1 < bytes.len() && bytes[at + 1].is_ascii_digit();
            if !after_digit || !before_digit {
                return Err(SyntaxError::new(
                    format!("invalid number \"{lexeme}\": underscores must sit between digits"),
                    line,
                ));
            }
        }
    }
    Ok(())
}

fn decode_escape(lexeme: &str, line: usize) -> Result<char, SyntaxError> {
    let mut chars = lexeme.chars();
    chars.next();
    match chars.next() {
        Some('b') => Ok('\u{0008}'),
        Some('t') => Ok('\t'),
        Some('n') => Ok('\n'),
        Some('f') => Ok('\u{000C}'),
        Some('r') => Ok('\r'),
        Some('"') => Ok('"'),
        Some('\\') => Ok('\\'),
        Some('u') | Some('U') => {
            let hex = chars.as_str();
            let code = u32::from_str_radix(hex, 16).map_err(|_| {
                SyntaxError::new(format!("invalid unicode escape {lexeme:?}"), line)
            })?;
            char::from_u32(code).ok_or_else(|| {
                SyntaxError::new(
                    format!("{lexeme:?} is not a valid unicode scalar value"),
                    line,
                )
            })
        }
        _ => Err(SyntaxError::new(
            format!("unknown escape sequence {lexeme:?}"),
            line,
        )),
    }
}

/// Date-only lexemes become midnight UTC, zone-less date-times are read as
/// UTC, and explicit offsets are converted to UTC.
fn parse_datetime(lexeme: &str, line: usize) -> Result<Value, SyntaxError> {
    let invalid =
        |_: chrono::ParseError| SyntaxError::new(format!("invalid date-time \"{lexeme}\""), line);
    if lexeme.len() == 10 {
        let date = NaiveDate::parse_from_str(lexeme, "%Y-%m-%d").map_err(invalid)?;
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            SyntaxError::new(format!("invalid date-time \"{lexeme}\""), line)
        })?;
        return Ok(Value::Datetime(Utc.from_utc_datetime(&midnight)));
    }
    let zoned =
        lexeme.ends_with('Z') || lexeme[11..].contains('+') || lexeme[11..].contains('-');
    if zoned {
        let parsed = DateTime::parse_from_rfc3339(lexeme).map_err(invalid)?;
        Ok(Value::Datetime(parsed.with_timezone(&Utc)))
    } else {
        let naive =
            NaiveDateTime::parse_from_str(lexeme, "%Y-%m-%dT%H:%M:%S%.f").map_err(invalid)?;
        Ok(Value::Datetime(Utc.from_utc_datetime(&naive)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<ZconfMap, SyntaxError> {
        parse_document(&normalize(input))
    }

    #[test]
    fn number_validation_catches_bad_underscores() {
        for input in ["k = 1_", "k = 1_.0", "k = 1._0", "k = 1_e1"] {
            assert!(parse(input).is_err(), "{input}");
        }
        assert!(parse("k = 1_000").is_ok());
        assert!(parse("k = 6.626e-34").is_ok());
    }

    #[test]
    fn number_validation_catches_leading_zeros() {
        assert!(parse("k = 01").is_err());
        assert!(parse("k = 01.5").is_err());
        assert!(parse("k = 0").is_ok());
        assert!(parse("k = 0.5").is_ok());
    }

    #[test]
    fn integer_overflow_is_reported() {
        assert!(parse("k = 9223372036854775807").is_ok());
        assert!(parse("k = 9223372036854775808").is_err());
    }

    #[test]
    fn datetime_values_are_normalized_to_utc() {
        let doc = parse("d = 1979-05-27T00:32:00-07:00").unwrap();
        let datetime = doc.get("d").and_then(Value::as_datetime).unwrap();
        assert_eq!(datetime.to_rfc3339(), "1979-05-27T07:32:00+00:00");
    }

    #[test]
    fn invalid_calendar_dates_fail() {
        assert!(parse("d = 1979-13-01").is_err());
    }

    #[test]
    fn basic_string_escapes_decode() {
        let doc = parse(r#"s = "a\tbé\n""#).unwrap();
        assert_eq!(doc.get("s").and_then(Value::as_str), Some("a\tbé\n"));
    }

    #[test]
    fn multiline_backslash_continuation() {
        let doc = parse("s = \"\"\"one \\\n    two\"\"\"").unwrap();
        assert_eq!(doc.get("s").and_then(Value::as_str), Some("one two"));
    }

    #[test]
    fn tabs_count_as_spaces() {
        let doc = parse("k\t=\t1").unwrap();
        assert_eq!(doc.get("k").and_then(Value::as_integer), Some(1));
    }

    #[test]
    fn junk_after_a_value_is_rejected() {
        assert!(parse("k = 1 2").is_err());
        assert!(parse("k = 1 # trailing comments are fine").is_ok());
    }
}
