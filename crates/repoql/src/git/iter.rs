//! Row iteration across every repository of a pool.

use crate::error::{Error, Result};
use crate::git::RowSource;
use crate::session::Context;
use crate::sql::{Row, RowIter};
use std::sync::Arc;

/// Presents a whole pool as one row sequence.
///
/// Repositories are visited in registration order and each one's row
/// source is drained before moving to the next, so rows never interleave
/// across repositories. At most one per-repository iterator is open at a
/// time and it is closed before advancing, on error, on cancellation and on
/// drop.
///
/// The execution context is checked before every step. With
/// `skip_git_errors` set on the session, a repository that fails to open,
/// to build its iterator or to produce a row contributes the rows it had
/// already yielded and the scan moves on; otherwise the error is returned
/// and the iterator terminates. Cancellation is never skipped.
pub struct PoolRowIter {
    ctx: Context,
    source: Arc<dyn RowSource>,
    pos: usize,
    current: Option<Box<dyn RowIter>>,
    done: bool,
}

impl PoolRowIter {
    pub fn new(ctx: Context, source: Arc<dyn RowSource>) -> Self {
        Self {
            ctx,
            source,
            pos: 0,
            current: None,
            done: false,
        }
    }

    /// Position of the repository currently being read.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn skip_errors(&self) -> bool {
        self.ctx.session().skip_git_errors()
    }

    /// Opens the per-repository iterator for the current position.
    /// `Ok(false)` means the pool is exhausted.
    fn open_current(&mut self) -> Result<bool> {
        let pool = Arc::clone(self.ctx.pool());
        let Some(repo) = pool.get_pos(self.pos)? else {
            return Ok(false);
        };

        self.ctx.check()?;
        tracing::debug!(id = repo.id(), pos = self.pos, "opening repository iterator");
        self.current = Some(self.source.new_iterator(repo)?);
        Ok(true)
    }

    fn close_current(&mut self) -> Result<()> {
        match self.current.take() {
            Some(mut iter) => iter.close(),
            None => Ok(()),
        }
    }

    /// Closes the current repository and moves to the next position.
    fn advance(&mut self) {
        if let Err(e) = self.close_current() {
            tracing::warn!(pos = self.pos, error = %e, "failed to close repository iterator");
        }
        self.pos += 1;
    }

    /// Decides whether a repository-level failure is skipped. Consumes the
    /// error when it is, returns it otherwise.
    fn skip_or_surface(&mut self, err: Error) -> Result<()> {
        if err.is_cancelled() || !self.skip_errors() {
            return Err(err);
        }

        let id = self.ctx.pool().ids().get(self.pos).cloned().unwrap_or_default();
        tracing::warn!(id = %id, pos = self.pos, error = %err, "skipping repository");
        self.advance();
        Ok(())
    }

    fn terminate(&mut self, err: Error) -> Error {
        self.done = true;
        if let Err(close_err) = self.close_current() {
            tracing::warn!(error = %close_err, "failed to close repository iterator");
        }
        err
    }

    fn step(&mut self) -> Result<Option<Row>> {
        loop {
            self.ctx.check()?;

            if self.current.is_none() {
                match self.open_current() {
                    Ok(true) => {}
                    Ok(false) => return Ok(None),
                    Err(e) => {
                        self.skip_or_surface(e)?;
                        continue;
                    }
                }
                self.ctx.check()?;
            }

            let next = match self.current.as_mut() {
                Some(iter) => iter.next_row(),
                None => continue,
            };

            match next {
                Ok(Some(row)) => return Ok(Some(row)),
                Ok(None) => self.advance(),
                Err(e) => self.skip_or_surface(e)?,
            }
        }
    }
}

impl RowIter for PoolRowIter {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.done {
            return Ok(None);
        }

        match self.step() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.done = true;
                self.close_current()?;
                Ok(None)
            }
            Err(e) => Err(self.terminate(e)),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.done = true;
        self.close_current()
    }
}

impl Iterator for PoolRowIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl Drop for PoolRowIter {
    fn drop(&mut self) {
        if let Err(e) = self.close_current() {
            tracing::warn!(error = %e, "failed to close repository iterator on drop");
        }
    }
}
