//! Repository handles.

use crate::error::{Error, Result};
use git2::{Commit, Reference, RepositoryOpenFlags};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// A working tree root or `.git` directory.
    Root,
    /// A bare repository archive.
    Bare,
}

/// A repository registered in a [`RepositoryPool`](crate::git::RepositoryPool):
/// an identifier plus the location of the object store.
///
/// `git2::Repository` cannot be shared between threads, so the handle keeps
/// only the resolved location and every access goes through
/// [`Repository::open`], which yields an [`OpenedRepository`] owned by the
/// caller. Handles are cheap to share behind an `Arc`.
///
/// # Example
///
/// ```no_run
/// use repoql::git::Repository;
///
/// // Validated now; a bad path fails here.
/// let repo = Repository::open_at("main", "/srv/git/main")?;
///
/// // Validated on first access.
/// let lazy = Repository::new("mirror", "/srv/git/mirror");
/// # Ok::<(), repoql::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Repository {
    id: String,
    path: PathBuf,
    layout: Layout,
}

impl Repository {
    /// Creates a handle whose repository is opened lazily. A bad path is
    /// reported by every access, never at construction.
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            layout: Layout::Root,
        }
    }

    /// Opens the repository rooted exactly at `path` now, failing with
    /// [`Error::CannotOpen`] if it is not a valid repository. Parent
    /// directories are never searched, so a plain directory inside a
    /// working tree is rejected.
    pub fn open_at(id: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_layout(id.into(), path.as_ref(), Layout::Root)
    }

    /// Mounts a bare repository archive at `path`, failing with
    /// [`Error::CannotOpen`] if it is not a bare repository.
    pub fn open_archive(id: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_layout(id.into(), path.as_ref(), Layout::Bare)
    }

    fn open_with_layout(id: String, path: &Path, layout: Layout) -> Result<Self> {
        let handle = Self {
            id,
            path: path.to_path_buf(),
            layout,
        };
        handle.open_git()?;
        Ok(handle)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_archive(&self) -> bool {
        self.layout == Layout::Bare
    }

    /// Opens the underlying repository for use by the calling thread.
    ///
    /// The result is never cached, so a repository that failed once is
    /// re-attempted by the next call.
    pub fn open(self: &Arc<Self>) -> Result<OpenedRepository> {
        let repo = self.open_git()?;
        Ok(OpenedRepository {
            handle: Arc::clone(self),
            repo,
        })
    }

    fn open_git(&self) -> Result<git2::Repository> {
        let flags = match self.layout {
            Layout::Root => RepositoryOpenFlags::NO_SEARCH,
            Layout::Bare => RepositoryOpenFlags::NO_SEARCH | RepositoryOpenFlags::BARE,
        };
        git2::Repository::open_ext(&self.path, flags, std::iter::empty::<&OsStr>()).map_err(|e| {
            Error::CannotOpen {
                path: self.path.clone(),
                source: e,
            }
        })
    }
}

/// A repository opened for one reader, tied to the handle it came from.
pub struct OpenedRepository {
    handle: Arc<Repository>,
    repo: git2::Repository,
}

impl OpenedRepository {
    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn handle(&self) -> &Arc<Repository> {
        &self.handle
    }

    /// Returns a reference to the underlying `git2::Repository`.
    pub fn inner(&self) -> &git2::Repository {
        &self.repo
    }

    pub fn head(&self) -> Result<Reference<'_>> {
        Ok(self.repo.head()?)
    }

    pub fn head_commit(&self) -> Result<Commit<'_>> {
        let head = self.head()?;
        let commit = head.peel_to_commit()?;
        Ok(commit)
    }

    /// Commits pointed at by HEAD and by every reference that peels to a
    /// commit. An unborn HEAD contributes nothing; duplicates are kept.
    pub fn tip_commits(&self) -> Result<Vec<Commit<'_>>> {
        let mut tips = Vec::new();
        if let Ok(head) = self.repo.head() {
            if let Ok(commit) = head.peel_to_commit() {
                tips.push(commit);
            }
        }
        for reference in self.repo.references()? {
            if let Ok(commit) = reference?.peel_to_commit() {
                tips.push(commit);
            }
        }
        Ok(tips)
    }

    /// Ids of every commit reachable from HEAD or any reference, newest
    /// first in topological order.
    pub fn commit_ids(&self) -> Result<Vec<git2::Oid>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TIME | git2::Sort::TOPOLOGICAL)?;
        for tip in self.tip_commits()? {
            revwalk.push(tip.id())?;
        }

        Ok(revwalk.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl std::fmt::Debug for OpenedRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedRepository")
            .field("id", &self.handle.id)
            .field("path", &self.repo.path())
            .finish()
    }
}
