//! Ingestion-run status ledger, keyed by comic root id.
//!
//! Bulk ingestion reports its terminal outcome through the notification
//! sink only; this ledger is the queryable record of what actually
//! happened to each run, including partial failures that the aggregate
//! notification does not spell out.

use chrono::Utc;
use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::notify::RunOutcome;

/// Lifecycle of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Scheduled,
    Processing,
    Done,
    PartiallyFailed,
    TimedOut,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Scheduled => "scheduled",
            RunState::Processing => "processing",
            RunState::Done => "done",
            RunState::PartiallyFailed => "partially_failed",
            RunState::TimedOut => "timed_out",
            RunState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(RunState::Scheduled),
            "processing" => Some(RunState::Processing),
            "done" => Some(RunState::Done),
            "partially_failed" => Some(RunState::PartiallyFailed),
            "timed_out" => Some(RunState::TimedOut),
            "failed" => Some(RunState::Failed),
            _ => None,
        }
    }
}

impl From<RunOutcome> for RunState {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Done => RunState::Done,
            RunOutcome::PartiallyFailed => RunState::PartiallyFailed,
            RunOutcome::TimedOut => RunState::TimedOut,
            RunOutcome::Failed => RunState::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunRow {
    pub comic_id: String,
    pub state: String,
    pub episodes_total: i64,
    pub episodes_completed: i64,
    pub episodes_failed: i64,
    pub error: Option<String>,
    pub started_at: String,
    pub updated_at: String,
}

impl RunRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            comic_id: row.get("comic_id")?,
            state: row.get("state")?,
            episodes_total: row.get("episodes_total")?,
            episodes_completed: row.get("episodes_completed")?,
            episodes_failed: row.get("episodes_failed")?,
            error: row.get("error")?,
            started_at: row.get("started_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Records a freshly scheduled run.
pub fn insert_scheduled(
    db: &Database,
    comic_id: &str,
    episodes_total: usize,
) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO ingest_runs (comic_id, state, episodes_total, started_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                comic_id,
                RunState::Scheduled.as_str(),
                episodes_total as i64,
                now,
            ],
        )?;
        Ok(())
    })
}

pub fn set_state(db: &Database, comic_id: &str, state: RunState) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE ingest_runs SET state = ?2, updated_at = ?3 WHERE comic_id = ?1",
            params![comic_id, state.as_str(), now],
        )?;
        Ok(())
    })
}

pub fn record_progress(
    db: &Database,
    comic_id: &str,
    completed: usize,
    failed: usize,
) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE ingest_runs SET episodes_completed = ?2, episodes_failed = ?3, updated_at = ?4
             WHERE comic_id = ?1",
            params![comic_id, completed as i64, failed as i64, now],
        )?;
        Ok(())
    })
}

/// Records the terminal state of a run.
pub fn finish(
    db: &Database,
    comic_id: &str,
    state: RunState,
    completed: usize,
    failed: usize,
    error: Option<&str>,
) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE ingest_runs SET state = ?2, episodes_completed = ?3, episodes_failed = ?4,
             error = ?5, updated_at = ?6 WHERE comic_id = ?1",
            params![
                comic_id,
                state.as_str(),
                completed as i64,
                failed as i64,
                error,
                now,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_comic(db: &Database, comic_id: &str) -> Result<Option<RunRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM ingest_runs WHERE comic_id = ?1")?;
        let mut rows = stmt.query_map(params![comic_id], RunRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

pub fn delete(db: &Database, comic_id: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM ingest_runs WHERE comic_id = ?1",
            params![comic_id],
        )?;
        Ok(n)
    })
}
