//! Loading and validating startup configuration.

use crate::error::{Error, Result};
use crate::git::{split_path, RepositoryPool};
use crate::session::{Context, Session};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Startup configuration: which repositories to register and how scans
/// behave.
///
/// ```json
/// {
///   "repositories": ["/srv/git/main"],
///   "directories": ["/srv/git/mirrors"],
///   "archive_directories": ["/srv/archives"],
///   "skip_git_errors": true,
///   "scan_timeout_ms": 30000
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repositories registered by path; the path is the identifier.
    pub repositories: Vec<PathBuf>,
    /// Directories searched recursively for repositories. Identifiers are
    /// relative to the directory.
    pub directories: Vec<PathBuf>,
    /// Directories of bare repository archives.
    pub archive_directories: Vec<PathBuf>,
    pub skip_git_errors: bool,
    pub scan_timeout_ms: Option<u64>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Checks that every configured path exists.
    pub fn validate(&self) -> Result<()> {
        let paths = self
            .repositories
            .iter()
            .chain(&self.directories)
            .chain(&self.archive_directories);

        for path in paths {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "path does not exist: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_ms.map(Duration::from_millis)
    }

    /// Registers all configured repositories, in the order: explicit
    /// repositories, directories, archive directories. Stops at the first
    /// error.
    pub fn build_pool(&self) -> Result<RepositoryPool> {
        let mut pool = RepositoryPool::new();

        for path in &self.repositories {
            pool.add_git(path)?;
        }
        for dir in &self.directories {
            pool.add_dir(split_path(dir).len(), dir)?;
        }
        for dir in &self.archive_directories {
            pool.add_archive_dir(dir)?;
        }

        tracing::debug!(repositories = pool.len(), "built repository pool");
        Ok(pool)
    }

    pub fn session(&self) -> Result<Session> {
        let pool = self.build_pool()?;
        Ok(Session::new(pool).with_skip_git_errors(self.skip_git_errors))
    }

    /// A fresh scan context carrying the configured timeout.
    pub fn context(&self, session: Arc<Session>) -> Context {
        let ctx = Context::new(session);
        match self.scan_timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}
