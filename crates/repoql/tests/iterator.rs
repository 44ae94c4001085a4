//! Integration tests for the merged pool iterator.

mod common;

use common::{create_repo_at, create_test_repo, FIXTURE_COMMITS};
use repoql::git::{CommitsSource, OpenedRepository, PoolRowIter, RowSource};
use repoql::sql::{collect_rows, Column, DataType, Row, RowIter, Schema, Value};
use repoql::{row, Context, Error, Repository, RepositoryPool, Result, Session};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Open/close bookkeeping shared by a source and its iterators.
#[derive(Default)]
struct Stats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    open_now: AtomicUsize,
    max_open: AtomicUsize,
}

/// A row source yielding `rows` rows `[repository_id, "test N"]` per
/// repository, optionally failing on construction or at a given row.
struct TestSource {
    schema: Schema,
    rows: usize,
    fail_construct: bool,
    fail_at: Option<usize>,
    fail_ids: Vec<&'static str>,
    delay: Option<Duration>,
    stats: Arc<Stats>,
}

impl TestSource {
    fn new(rows: usize) -> Self {
        let schema = Schema::new(vec![
            Column::new("repository_id", DataType::Text, "test"),
            Column::new("value", DataType::Text, "test"),
        ])
        .unwrap();

        Self {
            schema,
            rows,
            fail_construct: false,
            fail_at: None,
            fail_ids: Vec::new(),
            delay: None,
            stats: Arc::new(Stats::default()),
        }
    }

    fn failing_construct(mut self) -> Self {
        self.fail_construct = true;
        self
    }

    fn failing_at(mut self, row: usize) -> Self {
        self.fail_at = Some(row);
        self
    }

    /// Restricts the failure to the given repositories.
    fn only_for(mut self, ids: &[&'static str]) -> Self {
        self.fail_ids = ids.to_vec();
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn fails_for(&self, id: &str) -> bool {
        self.fail_ids.is_empty() || self.fail_ids.iter().any(|f| *f == id)
    }
}

impl RowSource for TestSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn new_iterator(&self, repo: OpenedRepository) -> Result<Box<dyn RowIter>> {
        if self.fail_construct && self.fails_for(repo.id()) {
            return Err(Error::Git(git2::Error::from_str("Error iter")));
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.stats.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open.fetch_max(now, Ordering::SeqCst);

        Ok(Box::new(TestIter {
            id: repo.id().to_string(),
            count: 0,
            limit: self.rows,
            fail_at: self.fail_at.filter(|_| self.fails_for(repo.id())),
            delay: self.delay,
            stats: Arc::clone(&self.stats),
            closed: false,
        }))
    }
}

struct TestIter {
    id: String,
    count: usize,
    limit: usize,
    fail_at: Option<usize>,
    delay: Option<Duration>,
    stats: Arc<Stats>,
    closed: bool,
}

impl RowIter for TestIter {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_at == Some(self.count) {
            return Err(Error::Git(git2::Error::from_str("bad row")));
        }
        if self.count >= self.limit {
            return Ok(None);
        }

        self.count += 1;
        Ok(Some(row![self.id.as_str(), format!("test {}", self.count)]))
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
            self.stats.open_now.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

fn pool_of(ids: &[&str], path: &std::path::Path) -> RepositoryPool {
    let mut pool = RepositoryPool::new();
    for id in ids {
        pool.add(Repository::new(*id, path)).unwrap();
    }
    pool
}

fn context(pool: RepositoryPool, skip_git_errors: bool) -> Context {
    let session = Session::new(pool).with_skip_git_errors(skip_git_errors);
    Context::new(Arc::new(session))
}

fn repository_ids(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|r| r[0].as_str().unwrap().to_string())
        .collect()
}

/// Collapses runs of equal ids; equal to the visit order when rows of one
/// repository are contiguous.
fn runs(ids: &[String]) -> Vec<String> {
    let mut runs = ids.to_vec();
    runs.dedup();
    runs
}

fn count_rows(ctx: Context) -> usize {
    let iter = PoolRowIter::new(ctx, Arc::new(CommitsSource::new()));
    let mut count = 0;
    for row in iter {
        row.expect("Strict scan over healthy repositories");
        count += 1;
    }
    count
}

#[test]
fn test_commits_over_64_repositories() {
    common::init_logging();
    let temp = create_test_repo();
    let ids: Vec<String> = (0..64).map(|i| i.to_string()).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let ctx = context(pool_of(&id_refs, temp.path()), false);

    let source = Arc::new(CommitsSource::new());
    let mut iter = PoolRowIter::new(ctx, source.clone());
    let rows = collect_rows(&mut iter).unwrap();

    assert_eq!(rows.len(), 64 * FIXTURE_COMMITS);
    assert_eq!(runs(&repository_ids(&rows)), ids);
    for row in &rows {
        row.check(source.schema()).expect("Row should match commits schema");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_do_not_interfere() {
    let temp = create_test_repo();
    let ids: Vec<String> = (0..64).map(|i| i.to_string()).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let session = Arc::new(Session::new(pool_of(&id_refs, temp.path())));

    assert_eq!(count_rows(Context::new(session.clone())), 576);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Context::new(session.clone());
            tokio::task::spawn_blocking(move || count_rows(ctx))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 576);
    }
}

#[test]
fn test_rows_in_source_order() {
    let temp = create_test_repo();
    let ctx = context(pool_of(&["one"], temp.path()), true);

    let rows: Vec<Row> = PoolRowIter::new(ctx, Arc::new(TestSource::new(10)))
        .collect::<Result<_>>()
        .unwrap();

    let values: Vec<&Value> = rows.iter().map(|r| &r[1]).collect();
    let expected: Vec<Value> = (1..=10).map(|i| Value::from(format!("test {i}"))).collect();
    assert_eq!(values, expected.iter().collect::<Vec<_>>());
}

#[test]
fn test_new_iterator_error_strict() {
    let temp = create_test_repo();
    let ctx = context(pool_of(&["one"], temp.path()), false);
    let mut iter = PoolRowIter::new(ctx, Arc::new(TestSource::new(10).failing_construct()));

    let err = iter.next_row().unwrap_err();
    assert!(matches!(err, Error::Git(e) if e.message() == "Error iter"));
    assert!(iter.next_row().unwrap().is_none());
}

#[test]
fn test_new_iterator_error_skipped() {
    let temp = create_test_repo();
    let ctx = context(pool_of(&["one", "two"], temp.path()), true);
    let source = TestSource::new(3).failing_construct().only_for(&["one"]);

    let rows = collect_rows(&mut PoolRowIter::new(ctx, Arc::new(source))).unwrap();
    assert_eq!(repository_ids(&rows), ["two", "two", "two"]);
}

#[test]
fn test_bad_repository() {
    let pool = || pool_of(&["one"], std::path::Path::new("badpath/should/not/exist"));
    let source = || Arc::new(TestSource::new(10));

    let mut strict = PoolRowIter::new(context(pool(), false), source());
    assert!(matches!(strict.next_row(), Err(Error::CannotOpen { .. })));
    assert!(strict.next_row().unwrap().is_none());

    let mut skip = PoolRowIter::new(context(pool(), true), source());
    assert!(skip.next_row().unwrap().is_none());
}

#[test]
fn test_bad_row() {
    let temp = create_test_repo();

    let source = Arc::new(TestSource::new(10).failing_at(5));
    let ctx = context(pool_of(&["one"], temp.path()), false);
    let mut strict = PoolRowIter::new(ctx, source.clone());
    for _ in 0..5 {
        assert!(strict.next_row().unwrap().is_some());
    }
    let err = strict.next_row().unwrap_err();
    assert!(matches!(err, Error::Git(e) if e.message() == "bad row"));
    assert!(strict.next_row().unwrap().is_none());
    assert_eq!(source.stats.opened.load(Ordering::SeqCst), 1);
    assert_eq!(source.stats.closed.load(Ordering::SeqCst), 1);

    let source = Arc::new(TestSource::new(10).failing_at(5));
    let ctx = context(pool_of(&["one"], temp.path()), true);
    let mut skip = PoolRowIter::new(ctx, source.clone());
    let rows = collect_rows(&mut skip).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(source.stats.closed.load(Ordering::SeqCst), 1);
}

fn mixed_pool(temp: &TempDir) -> RepositoryPool {
    let mut pool = RepositoryPool::new();
    pool.add(Repository::new("a", temp.path())).unwrap();
    pool.add(Repository::new("b", "/directory/should/not/exist")).unwrap();
    pool.add(Repository::new("c", temp.path())).unwrap();
    pool.add(Repository::new("d", temp.path())).unwrap();
    pool
}

#[test]
fn test_mixed_pool_skip_mode() {
    let temp = create_test_repo();
    let source = Arc::new(TestSource::new(3).failing_at(2).only_for(&["d"]));
    let mut iter = PoolRowIter::new(context(mixed_pool(&temp), true), source.clone());

    let rows = collect_rows(&mut iter).unwrap();
    assert_eq!(
        repository_ids(&rows),
        ["a", "a", "a", "c", "c", "c", "d", "d"]
    );
    assert_eq!(source.stats.max_open.load(Ordering::SeqCst), 1);
    assert_eq!(
        source.stats.opened.load(Ordering::SeqCst),
        source.stats.closed.load(Ordering::SeqCst)
    );
}

#[test]
fn test_mixed_pool_strict_mode() {
    let temp = create_test_repo();
    let source = Arc::new(TestSource::new(3));
    let mut iter = PoolRowIter::new(context(mixed_pool(&temp), false), source.clone());

    let mut ids = Vec::new();
    let err = loop {
        match iter.next_row() {
            Ok(Some(row)) => ids.push(row[0].as_str().unwrap().to_string()),
            Ok(None) => panic!("Strict scan should fail on the broken repository"),
            Err(e) => break e,
        }
    };

    assert!(matches!(err, Error::CannotOpen { .. }));
    assert_eq!(ids, ["a", "a", "a"]);
    assert!(iter.next_row().unwrap().is_none());
    assert_eq!(source.stats.opened.load(Ordering::SeqCst), 1);
    assert_eq!(source.stats.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_one_repository_iterator_open_at_a_time() {
    let temp = create_test_repo();
    let source = Arc::new(TestSource::new(3));
    let ctx = context(pool_of(&["1", "2", "3", "4", "5"], temp.path()), false);

    let rows = collect_rows(&mut PoolRowIter::new(ctx, source.clone())).unwrap();

    assert_eq!(rows.len(), 15);
    assert_eq!(source.stats.max_open.load(Ordering::SeqCst), 1);
    assert_eq!(source.stats.opened.load(Ordering::SeqCst), 5);
    assert_eq!(source.stats.closed.load(Ordering::SeqCst), 5);
}

#[test]
fn test_drop_closes_current_iterator() {
    let temp = create_test_repo();
    let source = Arc::new(TestSource::new(3));
    let ctx = context(pool_of(&["one"], temp.path()), false);

    let mut iter = PoolRowIter::new(ctx, source.clone());
    assert!(iter.next_row().unwrap().is_some());
    assert_eq!(source.stats.open_now.load(Ordering::SeqCst), 1);

    drop(iter);
    assert_eq!(source.stats.open_now.load(Ordering::SeqCst), 0);
}

#[test]
fn test_close_is_idempotent() {
    let temp = create_test_repo();
    let source = Arc::new(TestSource::new(3));
    let ctx = context(pool_of(&["one"], temp.path()), false);

    let mut iter = PoolRowIter::new(ctx, source.clone());
    assert!(iter.next_row().unwrap().is_some());
    iter.close().unwrap();
    iter.close().unwrap();

    assert!(iter.next_row().unwrap().is_none());
    assert_eq!(source.stats.closed.load(Ordering::SeqCst), 1);

    let repo = Arc::new(Repository::new("one", temp.path())).open().unwrap();
    let mut commits = CommitsSource::new().new_iterator(repo).unwrap();
    assert!(commits.next_row().unwrap().is_some());
    commits.close().unwrap();
    commits.close().unwrap();
    assert!(commits.next_row().unwrap().is_none());
}

#[test]
fn test_cancel_mid_scan() {
    let temp = create_test_repo();
    let source = Arc::new(TestSource::new(10));
    let ctx = context(pool_of(&["one", "two"], temp.path()), true);
    let handle = ctx.clone();

    let mut iter = PoolRowIter::new(ctx, source.clone());
    assert!(iter.next_row().unwrap().is_some());
    assert!(iter.next_row().unwrap().is_some());

    handle.cancel();
    let err = iter.next_row().unwrap_err();
    assert!(err.is_cancelled(), "expected cancellation, got {err}");
    assert!(iter.next_row().unwrap().is_none());
    assert_eq!(source.stats.open_now.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancel_overrides_skip_errors() {
    let ctx = context(
        pool_of(&["bad"], std::path::Path::new("/directory/should/not/exist")),
        true,
    );
    ctx.cancel();

    let mut iter = PoolRowIter::new(ctx, Arc::new(TestSource::new(1)));
    assert!(matches!(iter.next_row(), Err(Error::Cancelled)));
}

#[test]
fn test_deadline_cancels_scan() {
    let temp = create_test_repo();
    let ctx = context(pool_of(&["one"], temp.path()), false).with_timeout(Duration::ZERO);

    let mut iter = PoolRowIter::new(ctx, Arc::new(TestSource::new(1)));
    assert!(matches!(iter.next_row(), Err(Error::Cancelled)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_in_flight_scan() {
    let temp = create_test_repo();
    let source = Arc::new(TestSource::new(usize::MAX).slow(Duration::from_millis(2)));
    let ctx = context(pool_of(&["one"], temp.path()), true);
    let token = ctx.cancellation_token().clone();

    let scan = tokio::task::spawn_blocking(move || {
        let mut iter = PoolRowIter::new(ctx, source);
        let mut rows = 0;
        loop {
            match iter.next_row() {
                Ok(Some(_)) => rows += 1,
                Ok(None) => return (rows, None),
                Err(e) => return (rows, Some(e)),
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let (rows, err) = tokio::time::timeout(Duration::from_secs(5), scan)
        .await
        .expect("Cancellation should stop the scan promptly")
        .unwrap();
    assert!(rows > 0);
    assert!(matches!(err, Some(Error::Cancelled)));
}

#[test]
fn test_failures_are_not_cached() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("late");
    let session = Arc::new(Session::new(pool_of(&["late"], &path)));

    let source = Arc::new(CommitsSource::new());
    let mut first = PoolRowIter::new(Context::new(session.clone()), source.clone());
    assert!(matches!(first.next_row(), Err(Error::CannotOpen { .. })));

    create_repo_at(&path, FIXTURE_COMMITS);

    let second = PoolRowIter::new(Context::new(session), source);
    assert_eq!(second.count(), FIXTURE_COMMITS);
}
