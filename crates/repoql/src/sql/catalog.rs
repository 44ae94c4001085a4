//! Top-level registry of databases.

use crate::error::{Error, Result};
use crate::sql::database::is_reserved_name;
use crate::sql::{Database, MetadataDatabase, Table};
use std::sync::Arc;

/// Ordered collection of databases, unique by name.
#[derive(Default)]
pub struct Catalog {
    databases: Vec<Arc<dyn Database>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a database.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, already registered, or is the reserved
    /// `INFORMATION_SCHEMA` name in any letter case.
    pub fn add_database(&mut self, db: Arc<dyn Database>) -> Result<()> {
        let name = db.name();
        if name.is_empty() {
            return Err(Error::EmptyDatabaseName);
        }
        if is_reserved_name(name) {
            return Err(Error::ReservedDatabaseName(name.to_string()));
        }
        if self.databases.iter().any(|d| d.name() == name) {
            return Err(Error::DuplicateDatabase(name.to_string()));
        }

        tracing::debug!(database = name, "registered database");
        self.databases.push(db);
        Ok(())
    }

    /// Looks up a registered database by name. The reserved
    /// `INFORMATION_SCHEMA` name, in any letter case, resolves to a
    /// [`MetadataDatabase`] over the current registrations.
    pub fn database(&self, name: &str) -> Result<Arc<dyn Database>> {
        if is_reserved_name(name) {
            return Ok(Arc::new(self.metadata()));
        }
        self.databases
            .iter()
            .find(|d| d.name() == name)
            .cloned()
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))
    }

    pub fn table(&self, db_name: &str, table_name: &str) -> Result<Arc<dyn Table>> {
        self.database(db_name)?
            .table(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))
    }

    /// The metadata database over the databases registered so far.
    pub fn metadata(&self) -> MetadataDatabase {
        MetadataDatabase::new(self)
    }

    /// Databases in registration order.
    pub fn databases(&self) -> &[Arc<dyn Database>] {
        &self.databases
    }
}
