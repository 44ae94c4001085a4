//! Table schemas.

use crate::error::{Error, Result};
use crate::sql::DataType;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Deref;

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    /// Name of the table the column belongs to.
    pub source: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            source: source.into(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// An ordered sequence of columns with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema(Vec<Column>);

impl Schema {
    /// Builds a schema, rejecting duplicate column names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self(columns))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Position of the column with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }
}

impl Deref for Schema {
    type Target = [Column];

    fn deref(&self) -> &[Column] {
        &self.0
    }
}
