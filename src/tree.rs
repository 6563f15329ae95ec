//! The value tree under construction.
//!
//! The tree keeps a cursor into the nested structure as a path of segments
//! that is re-resolved from the root on every mutation, so no references into
//! the tree are ever held across edits. Inline tables push the current cursor
//! onto a stack and restore it on exit.
//!
//! Errors are plain messages; the parser attaches the line number.

use crate::map::ZconfMap;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug)]
pub(crate) struct ValueTree {
    root: Value,
    cursor: Vec<PathSegment>,
    saved: Vec<Vec<PathSegment>>,
}

impl ValueTree {
    pub(crate) fn new() -> Self {
        ValueTree {
            root: Value::Table(ZconfMap::new()),
            cursor: Vec::new(),
            saved: Vec::new(),
        }
    }

    pub(crate) fn into_root(self) -> ZconfMap {
        match self.root {
            Value::Table(map) => map,
            _ => ZconfMap::new(),
        }
    }

    /// Inserts `key = value` into the table the cursor points at.
    pub(crate) fn put(&mut self, key: &str, value: Value) -> Result<(), String> {
        let table = self.cursor_table()?;
        table.insert(key.to_string(), value);
        Ok(())
    }

    /// Creates an empty sub-table under `key`, saves the cursor and descends
    /// into the new table.
    pub(crate) fn begin_inline_table(&mut self, key: &str) -> Result<(), String> {
        let table = self.cursor_table()?;
        table.insert(key.to_string(), Value::Table(ZconfMap::new()));
        self.saved.push(self.cursor.clone());
        self.cursor.push(PathSegment::Key(key.to_string()));
        Ok(())
    }

    /// Restores the cursor saved by the matching
    /// [`ValueTree::begin_inline_table`].
    pub(crate) fn end_inline_table(&mut self) {
        if let Some(previous) = self.saved.pop() {
            self.cursor = previous;
        }
    }

    /// Repositions the cursor at the table named by `segments`, starting from
    /// the root, creating missing intermediate tables and stepping into the
    /// newest element of any array of tables on the way.
    pub(crate) fn enter_table(&mut self, segments: &[String]) -> Result<(), String> {
        self.cursor.clear();
        for segment in segments {
            self.descend(segment)?;
        }
        Ok(())
    }

    /// Like [`ValueTree::enter_table`], but appends a fresh table to the
    /// array of tables at the final segment and points the cursor at it.
    pub(crate) fn enter_array_table(&mut self, segments: &[String]) -> Result<(), String> {
        self.cursor.clear();
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| "table names must not be empty".to_string())?;
        for segment in parents {
            self.descend(segment)?;
        }
        let table = self.cursor_table()?;
        let index = match table.get_mut(last) {
            None => {
                table.insert(
                    last.clone(),
                    Value::Array(vec![Value::Table(ZconfMap::new())]),
                );
                0
            }
            Some(Value::Array(elements)) => {
                elements.push(Value::Table(ZconfMap::new()));
                elements.len() - 1
            }
            Some(_) => return Err(format!("the key \"{last}\" is already bound to a value")),
        };
        self.cursor.push(PathSegment::Key(last.clone()));
        self.cursor.push(PathSegment::Index(index));
        Ok(())
    }

    /// Steps the cursor one segment deeper, creating a table when the segment
    /// is absent and following an array of tables to its newest element.
    fn descend(&mut self, segment: &str) -> Result<(), String> {
        enum Step {
            Create,
            Table,
            Array(usize),
        }

        let table = self.cursor_table()?;
        let step = match table.get(segment) {
            None => Step::Create,
            Some(Value::Table(_)) => Step::Table,
            Some(Value::Array(elements))
                if matches!(elements.last(), Some(Value::Table(_))) =>
            {
                Step::Array(elements.len() - 1)
            }
            Some(_) => {
                return Err(format!(
                    "the key \"{segment}\" is already bound to a value"
                ))
            }
        };
        if let Step::Create = step {
            table.insert(segment.to_string(), Value::Table(ZconfMap::new()));
        }
        self.cursor.push(PathSegment::Key(segment.to_string()));
        if let Step::Array(index) = step {
            self.cursor.push(PathSegment::Index(index));
        }
        Ok(())
    }

    /// Resolves the cursor to the table it points at.
    fn cursor_table(&mut self) -> Result<&mut ZconfMap, String> {
        let mut node = &mut self.root;
        for segment in &self.cursor {
            node = match (segment, node) {
                (PathSegment::Key(key), Value::Table(table)) => table
                    .get_mut(key)
                    .ok_or_else(|| format!("unresolvable cursor segment \"{key}\""))?,
                (PathSegment::Index(index), Value::Array(elements)) => elements
                    .get_mut(*index)
                    .ok_or_else(|| "unresolvable cursor index".to_string())?,
                _ => return Err("cursor does not match the tree shape".to_string()),
            };
        }
        match node {
            Value::Table(table) => Ok(table),
            _ => Err("cursor does not point at a table".to_string()),
        }
    }
}
