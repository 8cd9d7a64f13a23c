//! Background episode worker.
//!
//! Consumes scheduled ingestion runs: builds each episode document,
//! publishes it, registers the episode row, and reports exactly one
//! terminal notification per run. Group failures are isolated: one bad
//! episode never aborts its siblings.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info_span, warn};
use uuid::Uuid;

use crate::db::episode_repo::{self, EpisodeRow};
use crate::db::run_repo::{self, RunState};
use crate::db::Database;
use crate::document::{build_document, AccessRestrictions};
use crate::error::BinderyError;
use crate::ingest::manifest::EpisodeImageGroup;
use crate::notify::{Notification, NotificationSink, RunOutcome};
use crate::store::{BlobStore, COMICS_BUCKET, UPLOADS_BUCKET};

/// One scheduled ingestion run. Ownership of the groups (and their staged
/// blobs) transfers to the worker with the task.
#[derive(Debug)]
pub struct IngestTask {
    pub comic_id: String,
    pub publisher_id: String,
    pub staging_prefix: String,
    pub groups: Vec<EpisodeImageGroup>,
}

/// Terminal report of one run, surfaced on the pool's result channel.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub comic_id: String,
    pub outcome: RunOutcome,
    pub episodes_total: usize,
    pub episodes_completed: usize,
    pub episodes_failed: usize,
}

#[derive(Clone)]
pub struct EpisodeWorker {
    db: Database,
    store: BlobStore,
    sink: NotificationSink,
    restrictions: AccessRestrictions,
    run_timeout: Duration,
}

impl EpisodeWorker {
    pub fn new(
        db: Database,
        store: BlobStore,
        sink: NotificationSink,
        restrictions: AccessRestrictions,
        run_timeout: Duration,
    ) -> Self {
        Self {
            db,
            store,
            sink,
            restrictions,
            run_timeout,
        }
    }

    /// Processes a whole run. Never returns an error: every failure mode
    /// ends in a terminal report plus notification, and the staging
    /// prefix is removed no matter what happened before.
    pub fn process(&self, task: IngestTask) -> RunReport {
        let IngestTask {
            comic_id,
            publisher_id,
            staging_prefix,
            groups,
        } = task;

        let _span = info_span!("ingest_run", comic_id = %comic_id).entered();

        let episodes_total = groups.len();
        let started = Instant::now();
        let mut completed = 0usize;
        let mut failed = 0usize;
        let mut timed_out = false;

        if let Err(e) = run_repo::set_state(&self.db, &comic_id, RunState::Processing) {
            warn!(comic_id = %comic_id, "Failed to mark run processing: {}", e);
        }

        for group in groups {
            if started.elapsed() >= self.run_timeout {
                timed_out = true;
                break;
            }

            let number = group.episode_number;
            match self.process_group(&comic_id, &publisher_id, group) {
                Ok(()) => completed += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        comic_id = %comic_id,
                        episode = number,
                        "Episode group failed: {}",
                        e
                    );
                }
            }

            if let Err(e) = run_repo::record_progress(&self.db, &comic_id, completed, failed) {
                warn!(comic_id = %comic_id, "Failed to record run progress: {}", e);
            }
        }

        // Staging is removed unconditionally; its failure is logged only.
        if let Err(e) = self.store.delete_prefix(UPLOADS_BUCKET, &staging_prefix) {
            warn!(
                comic_id = %comic_id,
                prefix = %staging_prefix,
                "Failed to remove staging prefix: {}",
                e
            );
        }

        let outcome = if timed_out {
            RunOutcome::TimedOut
        } else if failed > 0 {
            RunOutcome::PartiallyFailed
        } else {
            RunOutcome::Done
        };

        let error = timed_out.then(|| {
            format!(
                "Run exceeded {}s timeout with {} of {} episodes processed",
                self.run_timeout.as_secs(),
                completed + failed,
                episodes_total
            )
        });

        if let Err(e) = run_repo::finish(
            &self.db,
            &comic_id,
            RunState::from(outcome),
            completed,
            failed,
            error.as_deref(),
        ) {
            warn!(comic_id = %comic_id, "Failed to finish run ledger: {}", e);
        }

        self.sink.enqueue(Notification::terminal(
            &publisher_id,
            &comic_id,
            outcome,
            episodes_total,
            completed,
            failed,
            error,
        ));

        RunReport {
            comic_id,
            outcome,
            episodes_total,
            episodes_completed: completed,
            episodes_failed: failed,
        }
    }

    /// Builds, publishes, and registers one episode. The document must
    /// exist in the store before its metadata row is created.
    fn process_group(
        &self,
        comic_id: &str,
        publisher_id: &str,
        group: EpisodeImageGroup,
    ) -> Result<(), BinderyError> {
        let number = group.episode_number;
        let _span = info_span!("episode_group", episode = number).entered();

        let built = build_document(group.images, &self.restrictions)?;

        let document_path = format!("{}/episodes/{}/document.pdf", comic_id, number);
        self.store.put(COMICS_BUCKET, &document_path, &built.bytes)?;

        episode_repo::insert(
            &self.db,
            &EpisodeRow {
                id: Uuid::new_v4().to_string(),
                comic_id: comic_id.to_string(),
                season_id: None,
                episode_number: number as i64,
                banner_path: None,
                document_path,
                page_count: built.page_count as i64,
                price: 0.0,
                publisher_id: Some(publisher_id.to_string()),
                created_at: Utc::now().to_rfc3339(),
            },
        )?;

        Ok(())
    }
}
