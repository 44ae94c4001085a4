//! Session state and per-scan execution context.

use crate::error::{Error, Result};
use crate::git::RepositoryPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// State shared by every scan issued against one engine.
#[derive(Debug)]
pub struct Session {
    pool: Arc<RepositoryPool>,
    skip_git_errors: bool,
}

impl Session {
    pub fn new(pool: impl Into<Arc<RepositoryPool>>) -> Self {
        Self {
            pool: pool.into(),
            skip_git_errors: false,
        }
    }

    /// When enabled, repositories that fail to open or read contribute zero
    /// rows instead of failing the scan.
    pub fn with_skip_git_errors(mut self, skip: bool) -> Self {
        self.skip_git_errors = skip;
        self
    }

    pub fn pool(&self) -> &Arc<RepositoryPool> {
        &self.pool
    }

    pub fn skip_git_errors(&self) -> bool {
        self.skip_git_errors
    }
}

/// The execution context of a single scan: the session plus a cancellation
/// signal and an optional deadline.
///
/// Clones share the same cancellation token, so a clone handed to another
/// task can cancel the scan.
#[derive(Debug, Clone)]
pub struct Context {
    session: Arc<Session>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Uses an externally owned token, e.g. a child of the executor's.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn pool(&self) -> &Arc<RepositoryPool> {
        self.session.pool()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`Error::Cancelled`] once the token fires or the deadline
    /// passes.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}
