//! # zconf
//!
//! A parser and builder for the ZCONF configuration language, a dialect of
//! TOML v0.4.0 extended with a `null` literal.
//!
//! ## Parsing
//!
//! [`parse_str`] turns source text into a tree of [`Value`]s. Tables keep
//! their keys in insertion order, arrays are homogeneous, and every
//! document-wide rule of the format (unique keys, one header per table,
//! table vs. array-of-tables exclusivity) is enforced while parsing:
//!
//! ```rust
//! use zconf::{parse_str, Value};
//!
//! let value = parse_str(r#"
//! title = "example"
//!
//! [owner]
//! name = "Tom"
//! pets = ["cat", "dog"]
//! "#)?;
//!
//! let root = value.as_table().unwrap();
//! assert_eq!(root.get("title").and_then(Value::as_str), Some("example"));
//! let owner = root.get("owner").and_then(Value::as_table).unwrap();
//! assert_eq!(owner.get("pets").and_then(Value::as_array).unwrap().len(), 2);
//! # Ok::<(), zconf::ParseError>(())
//! ```
//!
//! An empty (or comment-only) document parses to the no-value sentinel
//! [`Value::Null`]; use [`parse_str_as_map`] to always get the root as a
//! [`ZconfMap`] instead. [`parse_file`] adds the filename and the offending
//! source line to any error it reports, and fails distinctly for a missing
//! file versus an unreadable one.
//!
//! ## Building
//!
//! [`Builder`] produces documents that are valid by construction: it runs
//! the same bookkeeping as the parser and rejects a call that would emit a
//! conflict.
//!
//! ```rust
//! use zconf::Builder;
//!
//! let text = Builder::new()
//!     .add_table("server")?
//!     .add_value("host", "example.com")?
//!     .add_value("port", 8080)?
//!     .get_string();
//!
//! let parsed = zconf::parse_str(&text)?;
//! let server = parsed.as_table().unwrap().get("server").unwrap();
//! assert!(server.is_table());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! Parsing reports [`ParseError`], building reports [`DumpError`]. Both are
//! plain values: no panics, no partial results.
//!
//! ## Scope
//!
//! The library is synchronous and self-contained: no I/O happens during a
//! parse (file contents are read up front), there is no global state, and
//! independent parses can run on independent threads. Comments and
//! whitespace are not preserved; TOML features newer than v0.4.0 are not
//! accepted. See the [`format`] module for the full surface-syntax
//! reference.

pub mod builder;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod value;

mod keystore;
mod lexer;
mod parser;
mod stream;
mod token;
mod tree;

pub use builder::Builder;
pub use error::{DumpError, ParseError};
pub use map::ZconfMap;
pub use value::{Kind, Value, WrongKindError};

use std::path::Path;

/// Parses ZCONF text into a [`Value`].
///
/// The result is [`Value::Table`] for any document with content and
/// [`Value::Null`] for an empty one.
///
/// # Examples
///
/// ```rust
/// let value = zconf::parse_str("key = [1, 2, 3]")?;
/// let key = value.as_table().unwrap().get("key").unwrap();
/// assert_eq!(key.as_array().unwrap().len(), 3);
///
/// assert!(zconf::parse_str("# nothing here")?.is_null());
/// # Ok::<(), zconf::ParseError>(())
/// ```
///
/// # Errors
///
/// Returns [`ParseError::Syntax`] with the 1-based line and the offending
/// source line for any lexical, syntactic or semantic violation.
pub fn parse_str(input: &str) -> Result<Value, ParseError> {
    parse_internal(input, None).map(root_value)
}

/// Parses ZCONF text, returning the root table itself.
///
/// This is the record-shaped variant of [`parse_str`]: the same keys and
/// values, with the root unwrapped to a [`ZconfMap`] (empty for an empty
/// document).
///
/// # Errors
///
/// Same failure modes as [`parse_str`].
pub fn parse_str_as_map(input: &str) -> Result<ZconfMap, ParseError> {
    parse_internal(input, None)
}

/// Parses ZCONF from raw bytes, rejecting non-UTF-8 input.
///
/// # Errors
///
/// Returns [`ParseError::InvalidUtf8`] for bad encodings, otherwise the same
/// failure modes as [`parse_str`].
pub fn parse_slice(input: &[u8]) -> Result<Value, ParseError> {
    let text =
        std::str::from_utf8(input).map_err(|error| ParseError::InvalidUtf8(error.to_string()))?;
    parse_str(text)
}

/// Reads and parses a ZCONF file.
///
/// Syntax errors are enriched with the filename and the offending source
/// line. A missing file reports [`ParseError::FileNotFound`]; a file that
/// exists but cannot be read reports [`ParseError::FileUnreadable`].
///
/// # Errors
///
/// See above; file contents must also be valid UTF-8.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Value, ParseError> {
    let (text, name) = read_file(path.as_ref())?;
    parse_internal(&text, Some(&name)).map(root_value)
}

/// Reads and parses a ZCONF file, returning the root table itself.
///
/// # Errors
///
/// Same failure modes as [`parse_file`].
pub fn parse_file_as_map<P: AsRef<Path>>(path: P) -> Result<ZconfMap, ParseError> {
    let (text, name) = read_file(path.as_ref())?;
    parse_internal(&text, Some(&name))
}

fn root_value(map: ZconfMap) -> Value {
    if map.is_empty() {
        Value::Null
    } else {
        Value::Table(map)
    }
}

fn read_file(path: &Path) -> Result<(String, String), ParseError> {
    let name = path.display().to_string();
    if !path.exists() {
        return Err(ParseError::FileNotFound(name));
    }
    let bytes = std::fs::read(path).map_err(|error| ParseError::FileUnreadable {
        path: name.clone(),
        reason: error.to_string(),
    })?;
    let text = String::from_utf8(bytes)
        .map_err(|error| ParseError::InvalidUtf8(error.utf8_error().to_string()))?;
    Ok((text, name))
}

fn parse_internal(input: &str, filename: Option<&str>) -> Result<ZconfMap, ParseError> {
    let normalized = parser::normalize(input);
    parser::parse_document(&normalized)
        .map_err(|error| ParseError::from_syntax(error, &normalized, filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_assignment() {
        let value = parse_str("answer = 42").unwrap();
        let root = value.as_table().unwrap();
        assert_eq!(root.get("answer").and_then(Value::as_integer), Some(42));
    }

    #[test]
    fn empty_input_is_the_null_sentinel() {
        assert!(parse_str("").unwrap().is_null());
        assert!(parse_str("  \n# only a comment\n").unwrap().is_null());
        assert!(parse_str_as_map("").unwrap().is_empty());
    }

    #[test]
    fn nested_tables() {
        let map = parse_str_as_map("[a]\nx = 1\n[a.b]\ny = 2").unwrap();
        let a = map.get("a").and_then(Value::as_table).unwrap();
        assert_eq!(a.get("x").and_then(Value::as_integer), Some(1));
        let b = a.get("b").and_then(Value::as_table).unwrap();
        assert_eq!(b.get("y").and_then(Value::as_integer), Some(2));
    }

    #[test]
    fn duplicate_key_reports_its_line() {
        let error = parse_str("dup = 1\ndup = 2").unwrap_err();
        assert_eq!(error.line(), Some(2));
        assert_eq!(error.snippet(), Some("dup = 2"));
    }

    #[test]
    fn invalid_utf8_is_a_distinct_error() {
        let error = parse_slice(&[0x6b, 0x20, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(error, ParseError::InvalidUtf8(_)));
        assert!(parse_slice(b"k = 1").is_ok());
    }

    #[test]
    fn missing_files_and_syntax_errors_in_files_are_distinguished() {
        let missing = parse_file("/definitely/not/here.zconf").unwrap_err();
        assert!(matches!(missing, ParseError::FileNotFound(_)));

        let path = std::env::temp_dir().join("zconf-lib-test.zconf");
        std::fs::write(&path, "broken = ").unwrap();
        let error = parse_file(&path).unwrap_err();
        assert_eq!(error.filename(), Some(path.display().to_string().as_str()));
        assert_eq!(error.line(), Some(1));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn null_literal_round_trips_through_the_tree() {
        let map = parse_str_as_map("nothing = null").unwrap();
        assert!(map.get("nothing").unwrap().is_null());
    }
}
