//! Registry of repositories queried by the engine.

use crate::error::{Error, Result};
use crate::git::{OpenedRepository, Repository};
use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::Arc;
use walkdir::WalkDir;

/// Extension marking a bare repository archive inside an archive directory.
const ARCHIVE_EXTENSION: &str = "git";

/// Identifier-indexed set of repositories plus the order they were
/// registered in.
///
/// Registration takes `&mut self` and happens before any scan; scans only
/// read the pool and may run concurrently from any number of threads.
/// The scan order is kept explicitly, never derived from the map.
#[derive(Debug, Default)]
pub struct RepositoryPool {
    repositories: HashMap<String, Arc<Repository>>,
    order: Vec<String>,
}

impl RepositoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `repo` under its own identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyIdentifier`] for an empty identifier and
    /// [`Error::DuplicateIdentifier`] if the identifier is taken; the pool is
    /// left unchanged.
    pub fn add(&mut self, repo: Repository) -> Result<()> {
        if repo.id().is_empty() {
            return Err(Error::EmptyIdentifier);
        }
        if self.repositories.contains_key(repo.id()) {
            return Err(Error::DuplicateIdentifier(repo.id().to_string()));
        }

        tracing::debug!(id = repo.id(), path = %repo.path().display(), "registered repository");
        let id = repo.id().to_string();
        self.order.push(id.clone());
        self.repositories.insert(id, Arc::new(repo));
        Ok(())
    }

    /// Opens the repository at `path` and registers it using the path as
    /// identifier. Returns the identifier.
    pub fn add_git(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let id = path.display().to_string();
        self.add(Repository::open_at(id.clone(), path)?)?;
        Ok(id)
    }

    /// Registers every repository root found under `dir`.
    ///
    /// A directory containing a `.git` entry is a root and is opened as is,
    /// without searching parent directories; the walk does not descend into
    /// it. Symbolic links are followed and identified by the link path; a
    /// link cycle is a walk error. The identifier of each root is its path
    /// with the first `prefix_len` components removed (see [`split_path`]),
    /// so `dir` itself being a root yields [`Error::EmptyIdentifier`]. The
    /// first walk, IO, open or registration error aborts the walk.
    pub fn add_dir(&mut self, prefix_len: usize, dir: impl AsRef<Path>) -> Result<()> {
        let mut walker = WalkDir::new(dir.as_ref())
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if path.join(".git").try_exists()? {
                let id = strip_prefix_id(prefix_len, path);
                self.add(Repository::open_at(id, path)?)?;
                walker.skip_current_dir();
            }
        }

        Ok(())
    }

    /// Registers every bare repository archive (`*.git` directory) found
    /// under `dir`, mounting each read-only.
    ///
    /// Identifiers are the archive paths relative to `dir`, with the same
    /// uniqueness and abort semantics as [`RepositoryPool::add_dir`].
    pub fn add_archive_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let prefix_len = split_path(dir).len();
        let mut walker = WalkDir::new(dir).sort_by_file_name().into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry?;
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION) {
                let id = strip_prefix_id(prefix_len, path);
                self.add(Repository::open_archive(id, path)?)?;
                walker.skip_current_dir();
            }
        }

        Ok(())
    }

    /// Opens the repository registered at position `pos`.
    ///
    /// Returns `Ok(None)` past the last position, or the open error of a
    /// repository that cannot be opened.
    pub fn get_pos(&self, pos: usize) -> Result<Option<OpenedRepository>> {
        let Some(id) = self.order.get(pos) else {
            return Ok(None);
        };
        self.get_repo(id).map(Some)
    }

    /// Opens the repository registered under `id`.
    pub fn get_repo(&self, id: &str) -> Result<OpenedRepository> {
        self.handle(id)
            .ok_or_else(|| Error::RepositoryNotFound(id.to_string()))?
            .open()
    }

    /// The registered handle for `id`, without opening it.
    pub fn handle(&self, id: &str) -> Option<&Arc<Repository>> {
        self.repositories.get(id)
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates the pool in registration order, opening each repository.
    pub fn repo_iter(&self) -> RepositoryIter<'_> {
        RepositoryIter { pool: self, pos: 0 }
    }
}

/// Iterator over the repositories of a pool, in registration order.
///
/// Every instance has its own cursor, so any number of them may run over
/// the same pool at once.
#[derive(Debug)]
pub struct RepositoryIter<'a> {
    pool: &'a RepositoryPool,
    pos: usize,
}

impl Iterator for RepositoryIter<'_> {
    type Item = Result<OpenedRepository>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.pool.get_pos(self.pos).transpose()?;
        self.pos += 1;
        Some(item)
    }
}

/// Splits a path into its normal components, dropping roots, prefixes and
/// `.` entries.
pub fn split_path(path: impl AsRef<Path>) -> Vec<String> {
    path.as_ref()
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

fn strip_prefix_id(prefix_len: usize, path: &Path) -> String {
    split_path(path)
        .into_iter()
        .skip(prefix_len)
        .collect::<Vec<_>>()
        .join("/")
}
