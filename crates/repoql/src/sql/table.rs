//! The table trait.

use crate::error::Result;
use crate::session::Context;
use crate::sql::{RowIter, Schema};

/// A named relation with a fixed schema.
///
/// Every row produced by [`Table::scan`] matches [`Table::schema`]
/// positionally and by type.
pub trait Table: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Starts a full scan under the given execution context.
    fn scan(&self, ctx: &Context) -> Result<Box<dyn RowIter>>;
}
