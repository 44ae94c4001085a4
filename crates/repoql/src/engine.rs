//! The engine: catalog plus session, the surface a query planner talks to.

use crate::error::Result;
use crate::session::{Context, Session};
use crate::sql::{Catalog, Database, RowIter};
use std::sync::Arc;

/// Owns the catalog of databases and the session every scan runs under.
///
/// # Example
///
/// ```no_run
/// use repoql::git::{GitDatabase, RepositoryPool};
/// use repoql::sql::collect_rows;
/// use repoql::{Engine, Session};
/// use std::sync::Arc;
///
/// let mut pool = RepositoryPool::new();
/// pool.add_dir(2, "/srv/git")?;
///
/// let mut engine = Engine::new(Session::new(pool).with_skip_git_errors(true));
/// engine.add_database(Arc::new(GitDatabase::new("git")))?;
///
/// let ctx = engine.context();
/// let mut commits = engine.scan("git", "commits", &ctx)?;
/// println!("{} commits", collect_rows(&mut *commits)?.len());
/// # Ok::<(), repoql::Error>(())
/// ```
pub struct Engine {
    catalog: Catalog,
    session: Arc<Session>,
}

impl Engine {
    pub fn new(session: Session) -> Self {
        Self {
            catalog: Catalog::new(),
            session: Arc::new(session),
        }
    }

    pub fn add_database(&mut self, db: Arc<dyn Database>) -> Result<()> {
        self.catalog.add_database(db)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// A new execution context with its own cancellation token.
    pub fn context(&self) -> Context {
        Context::new(Arc::clone(&self.session))
    }

    /// Resolves `db.table` through the catalog and starts a scan.
    pub fn scan(&self, db: &str, table: &str, ctx: &Context) -> Result<Box<dyn RowIter>> {
        let table = self.catalog.table(db, table)?;
        tracing::debug!(database = db, table = table.name(), "starting scan");
        table.scan(ctx)
    }
}
