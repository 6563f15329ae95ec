//! Programmatic construction of ZCONF source text.

use crate::error::DumpError;
use crate::keystore::KeyStore;
use crate::lexer::Lexer;
use crate::token::TokenKind;
use crate::value::{Kind, Value};

/// Builds a syntactically valid ZCONF document from a sequence of calls.
///
/// The builder shares the parser's bookkeeping: duplicate keys, duplicate
/// table headers and table/array-of-tables conflicts are rejected at call
/// time, so a string returned by [`Builder::get_string`] always parses back.
/// Calls consume the builder and hand it back on success, which chains
/// naturally with `?`.
///
/// String values starting with `@` are emitted as literal strings (the `@` is
/// stripped); all other strings become basic strings with control characters
/// and quotes escaped. Backslashes are passed through and must form valid
/// escapes (`\uXXXX`/`\UXXXXXXXX` pre-escapes are accepted as-is), which also
/// means a literal backslash followed by `u` cannot be emitted.
///
/// # Examples
///
/// ```rust
/// use zconf::Builder;
///
/// let text = Builder::new()
///     .add_comment("generated")?
///     .add_table("server")?
///     .add_value("host", "example.com")?
///     .add_value("port", 8080)?
///     .get_string();
/// assert!(zconf::parse_str(&text).is_ok());
/// # Ok::<(), zconf::DumpError>(())
/// ```
#[derive(Debug)]
pub struct Builder {
    output: String,
    key_store: KeyStore,
    prefix: String,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Creates a builder with the default 4-space indentation for key-value
    /// lines.
    #[must_use]
    pub fn new() -> Self {
        Self::with_indent(4)
    }

    /// Creates a builder whose key-value lines are indented by `width`
    /// spaces.
    #[must_use]
    pub fn with_indent(width: usize) -> Self {
        Builder {
            output: String::new(),
            key_store: KeyStore::new(),
            prefix: " ".repeat(width),
        }
    }

    /// Appends a `# …` comment line.
    ///
    /// # Errors
    ///
    /// Fails with [`DumpError::InvalidComment`] if `text` contains a line
    /// break.
    pub fn add_comment(mut self, text: &str) -> Result<Self, DumpError> {
        if text.contains('\n') {
            return Err(DumpError::InvalidComment);
        }
        self.output.push_str("# ");
        self.output.push_str(text);
        self.output.push('\n');
        Ok(self)
    }

    /// Opens a `[name]` table header. Dotted names address nested tables;
    /// every segment must match the unquoted-key pattern.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty, a segment is not an unquoted key, the
    /// table was already defined, or the name is an array of tables.
    pub fn add_table(mut self, name: &str) -> Result<Self, DumpError> {
        let name = validated_header_name(name)?;
        if self.key_store.is_registered_as_array_table(name) {
            return Err(DumpError::TableArrayConflict(name.to_string()));
        }
        if !self.key_store.is_valid_table_key(name) {
            return Err(DumpError::DuplicateTable(name.to_string()));
        }
        self.key_store.add_table_key(name);
        self.open_header();
        self.output.push('[');
        self.output.push_str(name);
        self.output.push_str("]\n");
        Ok(self)
    }

    /// Opens a `[[name]]` array-of-tables header, appending a new element.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty, a segment is not an unquoted key, the
    /// name is already a plain table, or it was implicitly claimed as the
    /// parent of a nested array of tables.
    pub fn add_array_of_table(mut self, name: &str) -> Result<Self, DumpError> {
        let name = validated_header_name(name)?;
        if self.key_store.is_registered_as_table(name)
            || (self.key_store.is_table_implicit_from_array_table(name)
                && !self.key_store.is_registered_as_array_table(name))
        {
            return Err(DumpError::TableArrayConflict(name.to_string()));
        }
        if !self.key_store.is_valid_array_table_key(name) {
            return Err(DumpError::DuplicateTable(name.to_string()));
        }
        self.key_store.add_array_table_key(name);
        self.open_header();
        self.output.push_str("[[");
        self.output.push_str(name);
        self.output.push_str("]]\n");
        Ok(self)
    }

    /// Appends `key = value` under the most recent header.
    ///
    /// Keys that do not match the unquoted-key pattern are emitted quoted.
    ///
    /// # Errors
    ///
    /// Fails for empty or duplicate keys, table values, non-finite floats,
    /// mixed-type arrays, and strings that cannot be safely encoded.
    pub fn add_value(self, key: &str, value: impl Into<Value>) -> Result<Self, DumpError> {
        self.push_value(key, value.into(), None)
    }

    /// Like [`Builder::add_value`], with a trailing `# comment`.
    pub fn add_value_with_comment(
        self,
        key: &str,
        value: impl Into<Value>,
        comment: &str,
    ) -> Result<Self, DumpError> {
        self.push_value(key, value.into(), Some(comment))
    }

    /// Extracts the accumulated document.
    #[must_use]
    pub fn get_string(self) -> String {
        self.output
    }

    fn push_value(
        mut self,
        key: &str,
        value: Value,
        comment: Option<&str>,
    ) -> Result<Self, DumpError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DumpError::EmptyName);
        }
        if comment.is_some_and(|text| text.contains('\n')) {
            return Err(DumpError::InvalidComment);
        }
        if !self.key_store.is_valid_key(key) {
            return Err(DumpError::DuplicateKey(key.to_string()));
        }
        let encoded = encode_value(&value)?;
        let dumped_key = encode_key(key)?;
        self.key_store.add_key(key);
        self.output.push_str(&self.prefix);
        self.output.push_str(&dumped_key);
        self.output.push_str(" = ");
        self.output.push_str(&encoded);
        if let Some(text) = comment {
            self.output.push_str(" # ");
            self.output.push_str(text);
        }
        self.output.push('\n');
        Ok(self)
    }

    /// A blank line separates headers, except at the very first output line.
    fn open_header(&mut self) {
        if !self.output.is_empty() {
            self.output.push('\n');
        }
    }
}

fn validated_header_name(name: &str) -> Result<&str, DumpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DumpError::EmptyName);
    }
    for segment in name.split('.') {
        // The charset is not enough: "true" or "2024-01-01" fit it but lex
        // as other token kinds and would not read back as header segments.
        if !is_unquoted_key(segment) || !key_is_bare_safe(segment) {
            return Err(DumpError::InvalidName {
                name: name.to_string(),
                segment: segment.to_string(),
            });
        }
    }
    Ok(name)
}

fn is_unquoted_key(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// A key may be emitted bare only when it reads back as a single key token.
fn key_is_bare_safe(key: &str) -> bool {
    match Lexer::new().tokenize(key) {
        Ok(tokens) => {
            tokens.len() == 2
                && matches!(
                    tokens[0].kind,
                    TokenKind::UnquotedKey | TokenKind::Integer
                )
                && tokens[0].lexeme == key
        }
        Err(_) => false,
    }
}

fn encode_key(key: &str) -> Result<String, DumpError> {
    if is_unquoted_key(key) && key_is_bare_safe(key) {
        return Ok(key.to_string());
    }
    let normalized = normalize_basic(key);
    if !escapes_are_valid(&normalized) || has_raw_controls(&normalized) {
        return Err(DumpError::InvalidString(key.to_string()));
    }
    Ok(format!("\"{normalized}\""))
}

fn encode_value(value: &Value) -> Result<String, DumpError> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(true) => Ok("true".to_string()),
        Value::Bool(false) => Ok("false".to_string()),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Float(x) => encode_float(*x),
        Value::String(s) => encode_string(s),
        Value::Datetime(dt) => Ok(dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        Value::Array(elements) => encode_array(elements),
        Value::Table(_) => Err(DumpError::UnsupportedValue("table")),
    }
}

/// Whole floats carry a `.0` so they read back as floats.
fn encode_float(value: f64) -> Result<String, DumpError> {
    if !value.is_finite() {
        return Err(DumpError::UnsupportedValue("non-finite float"));
    }
    if value.fract() == 0.0 {
        Ok(format!("{value:.1}"))
    } else {
        Ok(value.to_string())
    }
}

fn encode_array(elements: &[Value]) -> Result<String, DumpError> {
    let mut element_kind: Option<Kind> = None;
    let mut parts = Vec::with_capacity(elements.len());
    for element in elements {
        let kind = element.kind();
        match element_kind {
            None => element_kind = Some(kind),
            Some(expected) if expected != kind => {
                return Err(DumpError::MixedArray {
                    expected: expected.name(),
                    found: kind.name(),
                });
            }
            Some(_) => {}
        }
        parts.push(encode_value(element)?);
    }
    Ok(format!("[{}]", parts.join(", ")))
}

fn encode_string(text: &str) -> Result<String, DumpError> {
    if let Some(literal) = text.strip_prefix('@') {
        // No escapes exist in literal strings, so nothing that would end the
        // string or vanish in newline/tab normalization can be represented.
        if literal.contains('\'') || has_raw_controls(literal) {
            return Err(DumpError::InvalidString(text.to_string()));
        }
        return Ok(format!("'{literal}'"));
    }
    let normalized = normalize_basic(text);
    if !escapes_are_valid(&normalized) || has_raw_controls(&normalized) {
        return Err(DumpError::InvalidString(text.to_string()));
    }
    Ok(format!("\"{normalized}\""))
}

/// Control characters surviving normalization have no escaped form and would
/// be rejected by the lexer (or altered by newline/tab normalization).
fn has_raw_controls(text: &str) -> bool {
    text.chars().any(|ch| ch < '\u{20}')
}

/// Escapes control characters and quotes. Backslashes are left alone; they
/// are checked separately by [`escapes_are_valid`].
fn normalize_basic(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{0008}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{000C}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}

/// Every backslash must start a recognized escape or a `\uXXXX`/`\UXXXXXXXX`
/// pre-escape.
fn escapes_are_valid(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            i += 1;
            continue;
        }
        match chars.get(i + 1).copied() {
            Some('b' | 't' | 'n' | 'f' | 'r' | '"' | '\\') => i += 2,
            Some('u') if hex_run(&chars, i + 2, 4) => i += 6,
            Some('U') if hex_run(&chars, i + 2, 8) => i += 10,
            _ => return false,
        }
    }
    true
}

fn hex_run(chars: &[char], start: usize, count: usize) -> bool {
    chars.len() >= start + count
        && chars[start..start + count]
            .iter()
            .all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn values_are_indented_and_typed() {
        let text = Builder::new()
            .add_table("data")
            .unwrap()
            .add_value("t", true)
            .unwrap()
            .add_value("n", 42)
            .unwrap()
            .add_value("pi", 3.5)
            .unwrap()
            .get_string();
        assert_eq!(text, "[data]\n    t = true\n    n = 42\n    pi = 3.5\n");
    }

    #[test]
    fn whole_floats_keep_a_fractional_digit() {
        assert_eq!(encode_float(1.0).unwrap(), "1.0");
        assert_eq!(encode_float(-3.0).unwrap(), "-3.0");
        assert!(encode_float(f64::INFINITY).is_err());
        assert!(encode_float(f64::NAN).is_err());
    }

    #[test]
    fn datetimes_are_zulu() {
        let dt = chrono::Utc.with_ymd_and_hms(1979, 5, 27, 7, 32, 0).unwrap();
        assert_eq!(
            encode_value(&Value::Datetime(dt)).unwrap(),
            "1979-05-27T07:32:00Z"
        );
    }

    #[test]
    fn at_prefix_selects_literal_strings() {
        assert_eq!(encode_string("@C:\\some\\path").unwrap(), "'C:\\some\\path'");
        assert_eq!(encode_string("plain").unwrap(), "\"plain\"");
        assert!(encode_string("@don't").is_err());
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(
            encode_string("a\tb\nc\"d").unwrap(),
            "\"a\\tb\\nc\\\"d\""
        );
    }

    #[test]
    fn stray_backslashes_are_rejected_but_pre_escapes_pass() {
        assert!(encode_string("a\\qb").is_err());
        assert_eq!(encode_string("a\\u00E9b").unwrap(), "\"a\\u00E9b\"");
        assert_eq!(encode_string("a\\U000000E9b").unwrap(), "\"a\\U000000E9b\"");
    }

    #[test]
    fn unencodable_control_characters_are_rejected() {
        assert!(encode_string("a\u{1}b").is_err());
        assert!(encode_string("@a\rb").is_err());
        assert!(encode_string("@a\tb").is_err());
        // The escapable controls still pass through the basic form.
        assert_eq!(encode_string("a\rb").unwrap(), "\"a\\rb\"");
    }

    #[test]
    fn odd_keys_are_quoted() {
        let text = Builder::with_indent(0)
            .add_value("two words", 1)
            .unwrap()
            .get_string();
        assert_eq!(text, "\"two words\" = 1\n");
    }

    #[test]
    fn keyword_and_numberlike_keys_are_quoted() {
        for key in ["true", "false", "null", "2024-01-01", "1e5", "truex"] {
            let text = Builder::with_indent(0).add_value(key, 1).unwrap().get_string();
            assert_eq!(text, format!("\"{key}\" = 1\n"), "{key}");
        }
        // Plain integer lexemes read back as keys and may stay bare.
        let text = Builder::with_indent(0).add_value("1234", 1).unwrap().get_string();
        assert_eq!(text, "1234 = 1\n");
    }

    #[test]
    fn unexpressible_header_segments_are_rejected() {
        for name in ["true", "a.null", "x.2024-01-01"] {
            assert!(
                matches!(
                    Builder::new().add_table(name),
                    Err(DumpError::InvalidName { .. })
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn duplicate_keys_and_headers_fail() {
        let builder = Builder::new().add_value("k", 1).unwrap();
        assert_eq!(
            builder.add_value("k", 2).unwrap_err(),
            DumpError::DuplicateKey("k".to_string())
        );

        let builder = Builder::new().add_table("t").unwrap();
        assert_eq!(
            builder.add_table("t").unwrap_err(),
            DumpError::DuplicateTable("t".to_string())
        );
    }

    #[test]
    fn table_and_array_headers_exclude_each_other() {
        let builder = Builder::new().add_array_of_table("a").unwrap();
        assert_eq!(
            builder.add_table("a").unwrap_err(),
            DumpError::TableArrayConflict("a".to_string())
        );

        let builder = Builder::new().add_table("a").unwrap();
        assert_eq!(
            builder.add_array_of_table("a").unwrap_err(),
            DumpError::TableArrayConflict("a".to_string())
        );
    }

    #[test]
    fn header_segments_must_be_unquoted_keys() {
        assert!(Builder::new().add_table("a.b-c_9").is_ok());
        assert!(matches!(
            Builder::new().add_table("a.!bad"),
            Err(DumpError::InvalidName { .. })
        ));
        assert_eq!(
            Builder::new().add_table("  ").unwrap_err(),
            DumpError::EmptyName
        );
    }

    #[test]
    fn mixed_arrays_fail() {
        let err = Builder::new()
            .add_value(
                "a",
                Value::Array(vec![Value::from(1), Value::from("x")]),
            )
            .unwrap_err();
        assert!(matches!(err, DumpError::MixedArray { .. }));
    }

    #[test]
    fn blank_line_before_every_header_but_the_first() {
        let text = Builder::new()
            .add_table("a")
            .unwrap()
            .add_table("b")
            .unwrap()
            .get_string();
        assert_eq!(text, "[a]\n\n[b]\n");
    }

    #[test]
    fn value_comments_ride_the_line() {
        let text = Builder::with_indent(0)
            .add_value_with_comment("k", 1, "why")
            .unwrap()
            .get_string();
        assert_eq!(text, "k = 1 # why\n");
        assert_eq!(
            Builder::new().add_comment("a\nb").unwrap_err(),
            DumpError::InvalidComment
        );
    }
}
