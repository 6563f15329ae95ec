//! Error types for ZCONF parsing and building.
//!
//! The public surface reports two kinds of failure: [`ParseError`] for
//! everything that can go wrong while reading a document (lexical, syntactic
//! and semantic errors, bad encodings, file access) and [`DumpError`] for
//! everything the [`Builder`](crate::Builder) refuses to emit.
//!
//! Internally the lexer and parser raise a bare [`SyntaxError`] the moment a
//! rule is violated, with no recovery; the entry layer converts it into a
//! [`ParseError::Syntax`] enriched with the filename (when parsing a file)
//! and the offending source line.

use thiserror::Error;

/// Immediate-failure type used inside the lexer and parser.
///
/// Never escapes the crate; the entry points turn it into
/// [`ParseError::Syntax`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub message: String,
    pub line: usize,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, line: usize) -> Self {
        SyntaxError {
            message: message.into(),
            line,
        }
    }
}

/// Errors reported by the parsing entry points.
///
/// # Examples
///
/// ```rust
/// let err = zconf::parse_str("dup = 1\ndup = 2").unwrap_err();
/// assert_eq!(err.line(), Some(2));
/// assert!(err.to_string().contains("dup"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The source text violates ZCONF syntax or its key-uniqueness rules.
    #[error("{}", syntax_display(.message, .line, .filename, .snippet))]
    Syntax {
        /// What went wrong.
        message: String,
        /// 1-based source line the failure was detected on.
        line: usize,
        /// Name of the file being parsed, when parsing from a file.
        filename: Option<String>,
        /// The offending source line.
        snippet: Option<String>,
    },

    /// The input bytes are not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// The file handed to [`parse_file`](crate::parse_file) does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The file exists but its contents could not be read.
    #[error("file {path} could not be read: {reason}")]
    FileUnreadable { path: String, reason: String },
}

impl ParseError {
    /// Source line the error points at, for syntax errors.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Name of the file being parsed, when known.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match self {
            ParseError::Syntax { filename, .. } => filename.as_deref(),
            ParseError::FileNotFound(path) | ParseError::FileUnreadable { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The offending source line, when available.
    #[must_use]
    pub fn snippet(&self) -> Option<&str> {
        match self {
            ParseError::Syntax { snippet, .. } => snippet.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn from_syntax(error: SyntaxError, source: &str, filename: Option<&str>) -> Self {
        let snippet = source
            .lines()
            .nth(error.line.saturating_sub(1))
            .map(str::to_string);
        ParseError::Syntax {
            message: error.message,
            line: error.line,
            filename: filename.map(str::to_string),
            snippet,
        }
    }
}

fn syntax_display(
    message: &str,
    line: &usize,
    filename: &Option<String>,
    snippet: &Option<String>,
) -> String {
    let mut out = String::new();
    if let Some(name) = filename {
        out.push_str(name);
        out.push_str(": ");
    }
    out.push_str(message);
    out.push_str(&format!(" at line {line}"));
    if let Some(text) = snippet {
        out.push_str("\n    ");
        out.push_str(text.trim_end());
    }
    out
}

/// Errors reported by [`Builder`](crate::Builder) calls.
///
/// The builder never repairs its output: the first rejected call leaves the
/// accumulated document unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumpError {
    /// A key, table or array-of-tables name was empty after trimming.
    #[error("keys and table names must not be empty")]
    EmptyName,

    /// The key was already assigned under the current header.
    #[error("the key \"{0}\" has already been defined")]
    DuplicateKey(String),

    /// The table or array-of-tables name collides with an earlier definition.
    #[error("the table \"{0}\" has already been defined or conflicts with an existing key")]
    DuplicateTable(String),

    /// A name was used both as a table and as an array of tables.
    #[error("\"{0}\" cannot be used both as a table and as an array of tables")]
    TableArrayConflict(String),

    /// A dotted header segment does not match the unquoted-key pattern.
    #[error("invalid name \"{name}\": segment \"{segment}\" is not an unquoted key")]
    InvalidName { name: String, segment: String },

    /// Array elements of differing types were supplied.
    #[error("array elements must share one type: expected {expected}, found {found}")]
    MixedArray {
        expected: &'static str,
        found: &'static str,
    },

    /// The value has no ZCONF text representation.
    #[error("{0} values cannot be encoded")]
    UnsupportedValue(&'static str),

    /// The string contains a backslash that does not form a valid escape, or
    /// a literal-string request (`@` prefix) with unrepresentable characters.
    #[error("string {0:?} cannot be safely encoded")]
    InvalidString(String),

    /// Comment text would span multiple lines.
    #[error("comments must not contain line breaks")]
    InvalidComment,
}
