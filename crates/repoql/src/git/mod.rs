//! Git data source: the repository pool, row sources and the iterator that
//! merges them into a single row sequence.

mod commits;
mod database;
mod iter;
mod pool;
mod references;
mod repository;
mod source;

pub use commits::{CommitsSource, COMMITS_TABLE};
pub use database::{GitDatabase, PoolTable};
pub use iter::PoolRowIter;
pub use pool::{split_path, RepositoryIter, RepositoryPool};
pub use references::{ReferencesSource, REFERENCES_TABLE};
pub use repository::{OpenedRepository, Repository};
pub use source::RowSource;
