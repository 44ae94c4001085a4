//! The `INFORMATION_SCHEMA` metadata database: a read-only projection of
//! the databases, tables and columns registered in a [`Catalog`].

use crate::error::Result;
use crate::session::Context;
use crate::sql::{
    Catalog, Column, DataType, Database, MemoryRowIter, Row, RowIter, Schema, Table,
    INFORMATION_SCHEMA,
};
use crate::row;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SCHEMATA_TABLE: &str = "SCHEMATA";
pub const TABLES_TABLE: &str = "TABLES";
pub const COLUMNS_TABLE: &str = "COLUMNS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataKind {
    Schemata,
    Tables,
    Columns,
}

impl MetadataKind {
    const ALL: [MetadataKind; 3] = [Self::Schemata, Self::Tables, Self::Columns];

    fn table_name(self) -> &'static str {
        match self {
            Self::Schemata => SCHEMATA_TABLE,
            Self::Tables => TABLES_TABLE,
            Self::Columns => COLUMNS_TABLE,
        }
    }

    fn schema(self) -> Schema {
        let col = |name: &str, data_type| Column::new(name, data_type, self.table_name());
        let columns = match self {
            Self::Schemata => vec![col("schema_name", DataType::Text)],
            Self::Tables => vec![
                col("table_schema", DataType::Text),
                col("table_name", DataType::Text),
            ],
            Self::Columns => vec![
                col("table_schema", DataType::Text),
                col("table_name", DataType::Text),
                col("column_name", DataType::Text),
                col("ordinal_position", DataType::UInt32),
                col("data_type", DataType::Text),
                col("is_nullable", DataType::Boolean),
            ],
        };
        Schema::new(columns).expect("metadata schemas have unique column names")
    }
}

/// Database name plus its tables and their schemas, in name order.
struct SchemaEntry {
    database: String,
    tables: Vec<(String, Schema)>,
}

/// Catalog contents captured when the metadata database was built. The
/// metadata database lists itself first.
struct Snapshot(Vec<SchemaEntry>);

impl Snapshot {
    fn capture(catalog: &Catalog) -> Self {
        let mut own: Vec<(String, Schema)> = MetadataKind::ALL
            .iter()
            .map(|kind| (kind.table_name().to_string(), kind.schema()))
            .collect();
        own.sort_by(|a, b| a.0.cmp(&b.0));

        let mut entries = vec![SchemaEntry {
            database: INFORMATION_SCHEMA.to_string(),
            tables: own,
        }];
        entries.extend(catalog.databases().iter().map(|db| SchemaEntry {
            database: db.name().to_string(),
            tables: db
                .tables()
                .iter()
                .map(|(name, table)| (name.clone(), table.schema().clone()))
                .collect(),
        }));
        Self(entries)
    }

    fn rows(&self, kind: MetadataKind) -> Vec<Row> {
        let mut rows = Vec::new();
        for entry in &self.0 {
            match kind {
                MetadataKind::Schemata => rows.push(row![entry.database.as_str()]),
                MetadataKind::Tables => {
                    for (table, _) in &entry.tables {
                        rows.push(row![entry.database.as_str(), table.as_str()]);
                    }
                }
                MetadataKind::Columns => {
                    for (table, schema) in &entry.tables {
                        for (i, col) in schema.iter().enumerate() {
                            rows.push(row![
                                entry.database.as_str(),
                                table.as_str(),
                                col.name.as_str(),
                                (i + 1) as u32,
                                col.data_type.to_string(),
                                col.nullable,
                            ]);
                        }
                    }
                }
            }
        }
        rows
    }
}

struct MetadataTable {
    kind: MetadataKind,
    schema: Schema,
    snapshot: Arc<Snapshot>,
}

impl Table for MetadataTable {
    fn name(&self) -> &str {
        self.kind.table_name()
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn scan(&self, ctx: &Context) -> Result<Box<dyn RowIter>> {
        ctx.check()?;
        Ok(Box::new(MemoryRowIter::new(self.snapshot.rows(self.kind))))
    }
}

/// The metadata database over one catalog.
///
/// Built on demand by [`Catalog::database`] for the reserved name; it
/// reflects the databases registered at that moment.
pub struct MetadataDatabase {
    tables: BTreeMap<String, Arc<dyn Table>>,
}

impl MetadataDatabase {
    pub fn new(catalog: &Catalog) -> Self {
        let snapshot = Arc::new(Snapshot::capture(catalog));
        let tables = MetadataKind::ALL
            .iter()
            .map(|&kind| {
                let table: Arc<dyn Table> = Arc::new(MetadataTable {
                    kind,
                    schema: kind.schema(),
                    snapshot: Arc::clone(&snapshot),
                });
                (kind.table_name().to_string(), table)
            })
            .collect();

        Self { tables }
    }
}

impl Database for MetadataDatabase {
    fn name(&self) -> &str {
        INFORMATION_SCHEMA
    }

    fn tables(&self) -> &BTreeMap<String, Arc<dyn Table>> {
        &self.tables
    }
}
