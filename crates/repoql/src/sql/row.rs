//! Rows and row iterators.

use crate::error::{Error, Result};
use crate::sql::{Schema, Value};
use serde_json::{Map, Value as JsonValue};
use std::ops::Deref;

/// An ordered tuple of values, positionally aligned to one [`Schema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Vec<Value>);

/// Builds a [`Row`] from a list of expressions convertible into [`Value`].
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::sql::Row::new(vec![$($crate::sql::Value::from($value)),*])
    };
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Verifies arity and per-column type against `schema`.
    pub fn check(&self, schema: &Schema) -> Result<()> {
        if self.0.len() != schema.len() {
            return Err(Error::SchemaMismatch(format!(
                "expected {} values, got {}",
                schema.len(),
                self.0.len()
            )));
        }

        for (value, col) in self.0.iter().zip(schema.iter()) {
            match value.data_type() {
                None if col.nullable => {}
                None => {
                    return Err(Error::SchemaMismatch(format!(
                        "column {} is not nullable",
                        col.name
                    )))
                }
                Some(t) if t == col.data_type => {}
                Some(t) => {
                    return Err(Error::SchemaMismatch(format!(
                        "column {} expects {}, got {}",
                        col.name, col.data_type, t
                    )))
                }
            }
        }

        Ok(())
    }

    /// Converts the row to a JSON object keyed by column name.
    pub fn to_json(&self, schema: &Schema) -> JsonValue {
        let mut obj = Map::new();
        for (i, col) in schema.iter().enumerate() {
            let value = self.0.get(i).map(Value::to_json).unwrap_or(JsonValue::Null);
            obj.insert(col.name.clone(), value);
        }
        JsonValue::Object(obj)
    }
}

impl Deref for Row {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// A sequence of rows.
///
/// `next_row` returns `Ok(None)` once the input is exhausted. `close`
/// releases whatever the iterator holds; calling it more than once is a
/// no-op.
pub trait RowIter: Send {
    fn next_row(&mut self) -> Result<Option<Row>>;

    fn close(&mut self) -> Result<()>;
}

impl<I: RowIter + ?Sized> RowIter for Box<I> {
    fn next_row(&mut self) -> Result<Option<Row>> {
        (**self).next_row()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// A row iterator over rows already held in memory.
#[derive(Debug, Default)]
pub struct MemoryRowIter {
    rows: Option<std::vec::IntoIter<Row>>,
}

impl MemoryRowIter {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Some(rows.into_iter()),
        }
    }
}

impl RowIter for MemoryRowIter {
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.as_mut().and_then(Iterator::next))
    }

    fn close(&mut self) -> Result<()> {
        self.rows = None;
        Ok(())
    }
}

/// Drains `iter` into a vector and closes it.
pub fn collect_rows(iter: &mut dyn RowIter) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let drained = loop {
        match iter.next_row() {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    iter.close()?;
    drained.map(|_| rows)
}
