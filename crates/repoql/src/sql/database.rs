//! The database trait and the reserved metadata database name.

use crate::sql::Table;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name reserved for the metadata database; no registered database may use it.
pub const INFORMATION_SCHEMA: &str = "INFORMATION_SCHEMA";

/// A named collection of tables keyed by table name.
pub trait Database: Send + Sync {
    fn name(&self) -> &str;

    fn tables(&self) -> &BTreeMap<String, Arc<dyn Table>>;

    fn table(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables().get(name).cloned()
    }
}

/// Returns true if `name` is the reserved metadata database name, in any
/// letter case.
pub fn is_reserved_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(INFORMATION_SCHEMA)
}
