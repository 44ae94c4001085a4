//! A database whose tables are backed by the repository pool.

use crate::error::Result;
use crate::git::{
    CommitsSource, PoolRowIter, ReferencesSource, RowSource, COMMITS_TABLE, REFERENCES_TABLE,
};
use crate::session::Context;
use crate::sql::{Database, RowIter, Schema, Table};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A table that scans every repository in the context's pool through one
/// row source.
pub struct PoolTable {
    name: String,
    source: Arc<dyn RowSource>,
}

impl PoolTable {
    pub fn new(name: impl Into<String>, source: Arc<dyn RowSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    /// Starts a scan returning the concrete iterator type.
    pub fn iter(&self, ctx: &Context) -> PoolRowIter {
        PoolRowIter::new(ctx.clone(), Arc::clone(&self.source))
    }
}

impl Table for PoolTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        self.source.schema()
    }

    fn scan(&self, ctx: &Context) -> Result<Box<dyn RowIter>> {
        ctx.check()?;
        Ok(Box::new(self.iter(ctx)))
    }
}

/// The git database: `commits` and `references` over the session's pool.
pub struct GitDatabase {
    name: String,
    tables: BTreeMap<String, Arc<dyn Table>>,
}

impl GitDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        let mut db = Self {
            name: name.into(),
            tables: BTreeMap::new(),
        };
        db.add_table(PoolTable::new(COMMITS_TABLE, Arc::new(CommitsSource::new())));
        db.add_table(PoolTable::new(REFERENCES_TABLE, Arc::new(ReferencesSource::new())));
        db
    }

    /// Adds or replaces a pool-backed table.
    pub fn add_table(&mut self, table: PoolTable) {
        self.tables.insert(table.name.clone(), Arc::new(table));
    }
}

impl Database for GitDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn tables(&self) -> &BTreeMap<String, Arc<dyn Table>> {
        &self.tables
    }
}
