//! Minimal relational abstraction: catalog, database, table, schema and row.
//!
//! Any data source plugs into the engine by implementing [`Database`] and
//! [`Table`]; the query planner resolves identifiers through the
//! [`Catalog`] and consumes rows through [`RowIter`].

mod catalog;
mod database;
mod metadata;
mod row;
mod schema;
mod table;
mod value;

pub use catalog::Catalog;
pub use database::{is_reserved_name, Database, INFORMATION_SCHEMA};
pub use metadata::{MetadataDatabase, COLUMNS_TABLE, SCHEMATA_TABLE, TABLES_TABLE};
pub use row::{collect_rows, MemoryRowIter, Row, RowIter};
pub use schema::{Column, Schema};
pub use table::Table;
pub use value::{DataType, Value};
