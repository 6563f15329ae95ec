//! ZCONF format reference.
//!
//! This module documents the surface syntax accepted by the parser and
//! produced by the builder. ZCONF is compatible with TOML v0.4.0 and adds a
//! single extension: the `null` literal.
//!
//! # Documents
//!
//! A document is a sequence of expressions separated by line breaks:
//! comments, assignments, table headers and array-of-tables headers.
//! `\r\n` and `\r` are read as `\n`, and tabs are read as spaces.
//!
//! ```text
//! # a comment
//! title = "example"
//!
//! [owner]
//! name = "Tom"
//! ```
//!
//! # Keys
//!
//! A key is either unquoted (`[A-Za-z0-9_-]+`), a quoted basic string, or,
//! as a lenient extension, a bare integer literal used verbatim:
//!
//! ```text
//! bare_key = 1
//! "key with spaces" = 2
//! 1234 = "integer lexeme as key"
//! ```
//!
//! Table headers join key segments with dots: `[a.b.c]`. A quoted segment
//! may contain dots of its own; it still counts as a single segment.
//!
//! # Values
//!
//! | Type      | Examples                                         |
//! |-----------|--------------------------------------------------|
//! | null      | `null`                                           |
//! | boolean   | `true`, `false`                                  |
//! | integer   | 64-bit signed: `42`, `-17`, `1_000`              |
//! | float     | 64-bit IEEE-754: `3.14`, `-0.01`, `6.626e-34`    |
//! | string    | basic `"a\nb"`, literal `'C:\path'`, both also in `"""…"""`/`'''…'''` multi-line forms |
//! | date-time | `1979-05-27`, `1979-05-27T07:32:00`, `1979-05-27T07:32:00.999Z`, `1979-05-27T00:32:00-07:00` |
//! | array     | `[1, 2, 3]`, `[[1, 2], ["a"]]`                   |
//! | table     | `[header]` sections and inline `{ x = 1, y = 2 }` |
//!
//! Underscores in numbers must sit between digits, and leading zeros are
//! rejected (`0` itself and `0.5` are fine). Arrays are homogeneous: all
//! elements share one type, where nested arrays count as "array" whatever
//! their own element types are.
//!
//! # Strings
//!
//! Basic strings support the escapes `\b`, `\t`, `\n`, `\f`, `\r`, `\"`,
//! `\\`, `\uXXXX` and `\UXXXXXXXX`. Multi-line basic strings drop a newline
//! immediately after the opening `"""` and support backslash
//! line-continuations. Literal strings have no escapes at all.
//!
//! # Tables and arrays of tables
//!
//! `[a.b]` opens a table, creating missing parents. `[[fruit]]` appends an
//! element to an array of tables; nested headers such as `[[fruit.variety]]`
//! attach to the newest element of the enclosing array:
//!
//! ```text
//! [[fruit]]
//! name = "apple"
//!
//! [[fruit.variety]]
//! name = "red delicious"
//!
//! [[fruit]]
//! name = "banana"
//! ```
//!
//! Once a path is bound it stays bound: re-assigning a key, repeating a
//! table header, or using the same name both as a table and as an array of
//! tables is an error, as is declaring a name that was implicitly created as
//! the parent of a nested array of tables.
//!
//! # The `null` extension
//!
//! TOML v0.4.0 has no null; ZCONF adds the bare literal `null` as a value of
//! its own type. Inside arrays it behaves like any other type tag: `[null,
//! null]` is homogeneous, `[null, 1]` is not. Documents that avoid `null`
//! are plain TOML v0.4.0.
