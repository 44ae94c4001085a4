//! The `commits` row source.

use crate::error::Result;
use crate::git::{OpenedRepository, RowSource};
use crate::sql::{Column, DataType, Row, RowIter, Schema, Value};
use chrono::{DateTime, Utc};
use git2::{Commit, Oid, Time};
use std::collections::{BinaryHeap, HashSet};

pub const COMMITS_TABLE: &str = "commits";

/// One row per commit reachable from HEAD or any reference, newest commit
/// time first.
pub struct CommitsSource {
    schema: Schema,
}

impl CommitsSource {
    pub fn new() -> Self {
        let col = |name: &str, data_type| Column::new(name, data_type, COMMITS_TABLE);
        let schema = Schema::new(vec![
            col("repository_id", DataType::Text),
            col("hash", DataType::Text),
            col("author_name", DataType::Text),
            col("author_email", DataType::Text),
            col("author_when", DataType::Timestamp).nullable(),
            col("committer_name", DataType::Text),
            col("committer_email", DataType::Text),
            col("committer_when", DataType::Timestamp).nullable(),
            col("message", DataType::Text),
            col("parent_count", DataType::UInt32),
        ])
        .expect("commits schema has unique column names");

        Self { schema }
    }
}

impl Default for CommitsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RowSource for CommitsSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn new_iterator(&self, repo: OpenedRepository) -> Result<Box<dyn RowIter>> {
        let mut walk = CommitWalk::default();
        for tip in repo.tip_commits()? {
            walk.push(&tip);
        }

        Ok(Box::new(CommitIter {
            repo: Some(repo),
            walk,
        }))
    }
}

/// Lazy history walk in commit time order. Only the frontier and the set
/// of ids already queued are held; each commit is loaded when its row is
/// produced.
#[derive(Default)]
struct CommitWalk {
    queue: BinaryHeap<(i64, Oid)>,
    seen: HashSet<Oid>,
}

impl CommitWalk {
    fn push(&mut self, commit: &Commit<'_>) {
        if self.seen.insert(commit.id()) {
            self.queue.push((commit.time().seconds(), commit.id()));
        }
    }

    fn pop(&mut self) -> Option<Oid> {
        self.queue.pop().map(|(_, oid)| oid)
    }
}

struct CommitIter {
    repo: Option<OpenedRepository>,
    walk: CommitWalk,
}

impl RowIter for CommitIter {
    fn next_row(&mut self) -> Result<Option<Row>> {
        let Some(repo) = self.repo.as_ref() else {
            return Ok(None);
        };
        let Some(oid) = self.walk.pop() else {
            return Ok(None);
        };

        let commit = repo.inner().find_commit(oid)?;
        for parent in commit.parents() {
            self.walk.push(&parent);
        }

        let author = commit.author();
        let committer = commit.committer();

        Ok(Some(Row::new(vec![
            Value::from(repo.id()),
            Value::from(oid.to_string()),
            Value::from(String::from_utf8_lossy(author.name_bytes()).into_owned()),
            Value::from(String::from_utf8_lossy(author.email_bytes()).into_owned()),
            Value::from(git_time(author.when())),
            Value::from(String::from_utf8_lossy(committer.name_bytes()).into_owned()),
            Value::from(String::from_utf8_lossy(committer.email_bytes()).into_owned()),
            Value::from(git_time(committer.when())),
            Value::from(String::from_utf8_lossy(commit.message_bytes()).into_owned()),
            Value::from(commit.parent_count() as u32),
        ])))
    }

    fn close(&mut self) -> Result<()> {
        self.repo = None;
        self.walk = CommitWalk::default();
        Ok(())
    }
}

/// Converts a git signature time to UTC. Out-of-range times map to `None`.
pub(crate) fn git_time(time: Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.seconds(), 0)
}
