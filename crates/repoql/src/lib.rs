//! # repoql
//!
//! Query pools of Git repositories as relational tables.
//!
//! The crate has two layers. [`sql`] is a minimal relational abstraction
//! (catalog, database, table, schema, row) that any data source can
//! implement. [`git`] is the data source: a [`RepositoryPool`] of many
//! repositories and a merged iterator that scans all of them through a
//! per-table [`RowSource`](git::RowSource).
//!
//! ## Quick Start
//!
//! ```no_run
//! use repoql::git::{PoolTable, CommitsSource, RepositoryPool};
//! use repoql::{Context, Result, Session};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let mut pool = RepositoryPool::new();
//!     pool.add_git("/srv/git/main")?;
//!     pool.add_dir(2, "/srv/git/mirrors")?;
//!
//!     let session = Arc::new(Session::new(pool).with_skip_git_errors(true));
//!     let commits = PoolTable::new("commits", Arc::new(CommitsSource::new()));
//!
//!     let mut count = 0;
//!     for row in commits.iter(&Context::new(session)) {
//!         row?;
//!         count += 1;
//!     }
//!     println!("Found {count} commits");
//!     Ok(())
//! }
//! ```
//!
//! ## Scans
//!
//! Rows come out in repository registration order, one repository at a
//! time. Each scan carries a [`Context`] whose cancellation token and
//! deadline are checked between steps; a cancelled scan fails with
//! [`Error::Cancelled`]. With `skip_git_errors` enabled on the [`Session`],
//! broken repositories are logged and skipped instead of failing the scan.

pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod session;
pub mod sql;

pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
pub use git::{Repository, RepositoryPool};
pub use session::{Context, Session};
