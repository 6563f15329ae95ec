//! Document-wide key bookkeeping.
//!
//! The parser and the builder both consult a [`KeyStore`] to enforce the
//! cross-cutting rules of the format: a dotted path bound to a value can
//! never be re-bound, an explicit table header may appear at most once, and a
//! path used as an array of tables can never double as a plain table (or
//! vice versa). Assignments inside an array-of-tables element are namespaced
//! by the element index, so `name` under two successive `[[fruit]]` headers
//! are distinct fully-qualified keys.
//!
//! Callers check the `is_valid_*` predicate first and only then call the
//! matching `add_*` mutator; the store itself never reports errors.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub(crate) struct KeyStore {
    /// Fully qualified paths that already hold a value, including table
    /// headers (the table itself "exists" as a key).
    keys: HashSet<String>,
    /// Explicit `[table]` headers seen.
    tables: HashSet<String>,
    /// For each array-of-tables path, the 0-based index of its newest
    /// element.
    array_of_tables: HashMap<String, usize>,
    /// Parent paths implicitly created by a nested `[[a.b]]` header.
    implicit_array_of_tables: HashSet<String>,
    current_table: String,
    current_array_of_table: String,
}

impl KeyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_valid_key(&self, name: &str) -> bool {
        !self.keys.contains(&self.compose_key(name))
    }

    pub(crate) fn add_key(&mut self, name: &str) {
        let composed = self.compose_key(name);
        self.keys.insert(composed);
    }

    pub(crate) fn is_valid_table_key(&self, name: &str) -> bool {
        if self.array_of_tables.contains_key(name) {
            return false;
        }
        !self.keys.contains(&self.compose_header(name))
    }

    /// Registers `name` as an explicit table header and rescopes subsequent
    /// bare keys under it. When a prefix of `name` is a registered array of
    /// tables, the nearest such prefix becomes the enclosing element scope.
    pub(crate) fn add_table_key(&mut self, name: &str) {
        self.current_table.clear();
        self.current_array_of_table.clear();
        match self.longest_array_prefix(name) {
            Some(prefix) => {
                let rest = name[prefix.len() + 1..].to_string();
                self.current_array_of_table = prefix;
                self.add_key(&rest);
                self.current_table = rest;
            }
            None => {
                self.add_key(name);
                self.current_table = name.to_string();
            }
        }
        self.tables.insert(name.to_string());
    }

    pub(crate) fn is_valid_array_table_key(&self, name: &str) -> bool {
        if self.array_of_tables.contains_key(name) {
            // Appending another element to a known array.
            return true;
        }
        if self.implicit_array_of_tables.contains(name) || self.tables.contains(name) {
            return false;
        }
        !self.keys.contains(&self.compose_header(name))
    }

    /// Registers one `[[name]]` header: the first occurrence claims the path
    /// and starts at index 0, later ones bump the index. Every proper dotted
    /// prefix of a new array is remembered as an implicit parent.
    pub(crate) fn add_array_table_key(&mut self, name: &str) {
        if let Some(index) = self.array_of_tables.get_mut(name) {
            *index += 1;
        } else {
            let composed = self.compose_header(name);
            self.keys.insert(composed);
            self.array_of_tables.insert(name.to_string(), 0);
            let prefixes: Vec<String> =
                proper_prefixes(name).map(str::to_string).collect();
            self.implicit_array_of_tables.extend(prefixes);
        }
        self.current_array_of_table.clear();
        self.current_array_of_table.push_str(name);
        self.current_table.clear();
    }

    pub(crate) fn is_valid_inline_table(&self, name: &str) -> bool {
        self.is_valid_key(name)
    }

    /// Claims the inline-table key and descends the bare-key scope into it.
    pub(crate) fn add_inline_table_key(&mut self, name: &str) {
        self.add_key(name);
        if self.current_table.is_empty() {
            self.current_table = name.to_string();
        } else {
            self.current_table.push('.');
            self.current_table.push_str(name);
        }
    }

    /// Inverse of [`KeyStore::add_inline_table_key`]; drops the innermost
    /// scope segment.
    pub(crate) fn end_inline_table(&mut self) {
        match self.current_table.rfind('.') {
            Some(split) => self.current_table.truncate(split),
            None => self.current_table.clear(),
        }
    }

    pub(crate) fn is_registered_as_table(&self, name: &str) -> bool {
        self.tables.contains(name)
    }

    pub(crate) fn is_registered_as_array_table(&self, name: &str) -> bool {
        self.array_of_tables.contains_key(name)
    }

    pub(crate) fn is_table_implicit_from_array_table(&self, name: &str) -> bool {
        self.implicit_array_of_tables.contains(name)
    }

    /// Fully qualified form of a bare key under the current scope:
    /// `{array}{index}.{table}.{key}` with missing parts collapsed.
    fn compose_key(&self, key: &str) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if !self.current_array_of_table.is_empty() {
            let index = self
                .array_of_tables
                .get(&self.current_array_of_table)
                .copied()
                .unwrap_or(0);
            parts.push(format!("{}{}", self.current_array_of_table, index));
        }
        if !self.current_table.is_empty() {
            parts.push(self.current_table.clone());
        }
        parts.push(key.to_string());
        parts.join(".")
    }

    /// Fully qualified form of a header name, independent of the current
    /// scope: the longest enclosing array-of-tables prefix (if any) is
    /// replaced by its indexed form.
    fn compose_header(&self, name: &str) -> String {
        match self.longest_array_prefix(name) {
            Some(prefix) => {
                let index = self.array_of_tables.get(&prefix).copied().unwrap_or(0);
                format!("{}{}.{}", prefix, index, &name[prefix.len() + 1..])
            }
            None => name.to_string(),
        }
    }

    /// Longest proper dotted prefix of `name` registered as an array of
    /// tables.
    fn longest_array_prefix(&self, name: &str) -> Option<String> {
        let mut end = name.len();
        while let Some(split) = name[..end].rfind('.') {
            let prefix = &name[..split];
            if self.array_of_tables.contains_key(prefix) {
                return Some(prefix.to_string());
            }
            end = split;
        }
        None
    }
}

fn proper_prefixes(name: &str) -> impl Iterator<Item = &str> + '_ {
    name.match_indices('.').map(move |(at, _)| &name[..at])
}
