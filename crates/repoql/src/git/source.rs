//! The per-table row source seam.

use crate::error::Result;
use crate::git::OpenedRepository;
use crate::sql::{RowIter, Schema};

/// Translates the objects of one repository into rows.
///
/// Each table kind implements this once. The merged pool iterator calls
/// [`RowSource::new_iterator`] for every repository in the pool and drains
/// the returned iterator before moving on to the next repository.
pub trait RowSource: Send + Sync {
    /// Schema of the rows produced by this source.
    fn schema(&self) -> &Schema;

    /// Creates an iterator over the rows of `repo`. The iterator owns the
    /// opened repository and releases it on close.
    fn new_iterator(&self, repo: OpenedRepository) -> Result<Box<dyn RowIter>>;
}
