//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

/// Number of commits in every fixture repository.
pub const FIXTURE_COMMITS: usize = 9;

/// Installs a test subscriber once; `RUST_LOG=repoql=debug` shows the
/// iterator's transitions.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Writes `count` linear commits on HEAD, one file per commit, with strictly
/// increasing timestamps.
fn write_commits(repo: &Repository, count: usize) {
    let mut parent: Option<Oid> = None;

    for i in 0..count {
        let blob = repo
            .blob(format!("content {i}\n").as_bytes())
            .expect("Failed to write blob");

        let mut builder = match parent {
            Some(oid) => {
                let tree = repo.find_commit(oid).unwrap().tree().unwrap();
                repo.treebuilder(Some(&tree)).expect("Failed to create tree builder")
            }
            None => repo.treebuilder(None).expect("Failed to create tree builder"),
        };
        builder
            .insert(format!("file{i}.txt"), blob, 0o100644)
            .expect("Failed to insert blob");
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();

        let time = Time::new(1_600_000_000 + i as i64 * 60, 0);
        let sig = Signature::new("Test User", "test@example.com", &time).unwrap();
        let parents = parent
            .map(|oid| repo.find_commit(oid).unwrap())
            .into_iter()
            .collect::<Vec<_>>();
        let parent_refs = parents.iter().collect::<Vec<_>>();

        let oid = repo
            .commit(
                Some("HEAD"),
                &sig,
                &sig,
                &format!("commit {i}"),
                &tree,
                &parent_refs,
            )
            .expect("Failed to commit");
        parent = Some(oid);
    }
}

/// Creates a working-tree repository at `path` with `count` commits.
pub fn create_repo_at(path: &Path, count: usize) {
    std::fs::create_dir_all(path).expect("Failed to create repo dir");
    let repo = Repository::init(path).expect("Failed to init git repo");
    write_commits(&repo, count);
}

/// Creates a bare repository at `path` with `count` commits.
pub fn create_bare_repo_at(path: &Path, count: usize) {
    std::fs::create_dir_all(path).expect("Failed to create repo dir");
    let repo = Repository::init_bare(path).expect("Failed to init bare repo");
    write_commits(&repo, count);
}

/// Creates a temporary repository with [`FIXTURE_COMMITS`] commits.
pub fn create_test_repo() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    create_repo_at(temp.path(), FIXTURE_COMMITS);
    temp
}
