//! The `references` row source.

use crate::error::Result;
use crate::git::{OpenedRepository, RowSource};
use crate::row;
use crate::sql::{Column, DataType, MemoryRowIter, RowIter, Schema};

pub const REFERENCES_TABLE: &str = "references";

/// One row per reference pointing directly at an object, plus `HEAD`.
pub struct ReferencesSource {
    schema: Schema,
}

impl ReferencesSource {
    pub fn new() -> Self {
        let col = |name: &str, data_type| Column::new(name, data_type, REFERENCES_TABLE);
        let schema = Schema::new(vec![
            col("repository_id", DataType::Text),
            col("name", DataType::Text),
            col("hash", DataType::Text),
            col("is_remote", DataType::Boolean),
        ])
        .expect("references schema has unique column names");

        Self { schema }
    }
}

impl Default for ReferencesSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RowSource for ReferencesSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn new_iterator(&self, repo: OpenedRepository) -> Result<Box<dyn RowIter>> {
        let mut refs = Vec::new();

        if let Ok(head) = repo.head() {
            if let Some(target) = head.target() {
                refs.push(("HEAD".to_string(), target.to_string(), false));
            }
        }

        for reference in repo.inner().references()? {
            let reference = reference?;
            let (Some(name), Some(target)) = (reference.name(), reference.target()) else {
                continue;
            };
            refs.push((name.to_string(), target.to_string(), reference.is_remote()));
        }

        let rows = refs
            .into_iter()
            .map(|(name, hash, is_remote)| row![repo.id(), name, hash, is_remote])
            .collect();
        Ok(Box::new(MemoryRowIter::new(rows)))
    }
}
