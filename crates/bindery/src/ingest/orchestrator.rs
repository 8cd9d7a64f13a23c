//! Ingestion orchestrator — the synchronous phase.
//!
//! Turns an uploaded archive into a committed comic root and a scheduled
//! background run. The caller sees nothing past scheduling: episodes
//! become visible eventually, and post-root failures travel through the
//! notification channel only.

use std::io::Cursor;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info_span, warn};
use uuid::Uuid;

use crate::archive::{ArchiveUnpacker, UnpackedEntry};
use crate::db::comic_repo::{self, ComicRow};
use crate::db::run_repo::{self, RunState};
use crate::db::Database;
use crate::error::{BinderyError, ValidationError};
use crate::ingest::manifest::{self, ArchiveLayout};
use crate::ingest::pool::WorkerPool;
use crate::ingest::worker::IngestTask;
use crate::notify::{Notification, NotificationSink, RunOutcome};
use crate::store::{BlobStore, COMICS_BUCKET, UPLOADS_BUCKET};

/// What the caller gets back: the committed root, nothing more.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub comic_id: String,
}

pub struct Ingestor {
    db: Database,
    store: BlobStore,
    sink: NotificationSink,
    pool: Arc<WorkerPool>,
}

impl Ingestor {
    pub fn new(
        db: Database,
        store: BlobStore,
        sink: NotificationSink,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            db,
            store,
            sink,
            pool,
        }
    }

    /// Runs the synchronous ingestion phase for an uploaded archive.
    ///
    /// Validation failures abort before any repository write. Once the
    /// comic root is committed it is never rolled back; every later
    /// failure is background-only.
    pub fn ingest(&self, archive_key: &str, publisher_id: &str) -> Result<IngestReceipt, BinderyError> {
        let _span = info_span!("ingest", archive = archive_key, publisher = publisher_id).entered();

        let archive = self.store.get(UPLOADS_BUCKET, archive_key)?;

        let unpacker = ArchiveUnpacker::new(self.store.clone());
        let (entries, staging_prefix) = unpacker.unpack(&archive)?;

        // The upload is fully consumed; the staged copy supersedes it.
        if let Err(e) = self.store.delete(UPLOADS_BUCKET, archive_key) {
            warn!(key = archive_key, "Failed to delete consumed upload: {}", e);
        }

        let layout = match manifest::scan_entries(entries) {
            Ok(layout) => layout,
            Err(e) => {
                self.cleanup_staging(&staging_prefix);
                return Err(e);
            }
        };

        let banner = match canonical_banner(&layout.banner) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.cleanup_staging(&staging_prefix);
                return Err(e);
            }
        };

        let comic_id = Uuid::new_v4().to_string();
        let banner_path = format!("{}/banner.jpg", comic_id);

        // Banner object first, then the row referencing it.
        self.store.put(COMICS_BUCKET, &banner_path, &banner)?;
        comic_repo::insert(&self.db, &comic_row(&comic_id, &banner_path, publisher_id, &layout))?;

        let group_count = layout.groups.len();
        run_repo::insert_scheduled(&self.db, &comic_id, group_count)?;

        let task = IngestTask {
            comic_id: comic_id.clone(),
            publisher_id: publisher_id.to_string(),
            staging_prefix,
            groups: layout.groups,
        };

        if let Err(e) = self.pool.submit(task) {
            // The root is committed; this failure must not be silent, but
            // it is no longer the caller's to see.
            warn!(comic_id = %comic_id, "Failed to schedule ingestion run: {}", e);
            if let Err(db_err) = run_repo::finish(
                &self.db,
                &comic_id,
                RunState::Failed,
                0,
                0,
                Some(&e.to_string()),
            ) {
                warn!(comic_id = %comic_id, "Failed to record scheduling failure: {}", db_err);
            }
            self.sink.enqueue(Notification::terminal(
                publisher_id,
                &comic_id,
                RunOutcome::Failed,
                group_count,
                0,
                0,
                Some(e.to_string()),
            ));
        }

        Ok(IngestReceipt { comic_id })
    }

    fn cleanup_staging(&self, staging_prefix: &str) {
        if let Err(e) = self.store.delete_prefix(UPLOADS_BUCKET, staging_prefix) {
            warn!(prefix = staging_prefix, "Failed to clean staging prefix: {}", e);
        }
    }
}

fn comic_row(
    comic_id: &str,
    banner_path: &str,
    publisher_id: &str,
    layout: &ArchiveLayout,
) -> ComicRow {
    ComicRow {
        id: comic_id.to_string(),
        name: layout.manifest.name.clone(),
        summary: layout.manifest.summary.clone(),
        description: layout.manifest.description.clone(),
        source_country: layout.manifest.source_country.clone(),
        publish_date: layout.manifest.publish_date.map(|d| d.to_string()),
        banner_path: Some(banner_path.to_string()),
        publisher_id: Some(publisher_id.to_string()),
        created_at: Utc::now().to_rfc3339(),
    }
}

/// Re-encodes the banner to canonical JPEG unless it already is one.
fn canonical_banner(banner: &UnpackedEntry) -> Result<Vec<u8>, BinderyError> {
    if matches!(
        image::guess_format(&banner.bytes),
        Ok(image::ImageFormat::Jpeg)
    ) {
        return Ok(banner.bytes.clone());
    }

    let img = image::load_from_memory(&banner.bytes)
        .map_err(|e| ValidationError::BannerUndecodable(e.to_string()))?;
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .map_err(|e| ValidationError::BannerUndecodable(e.to_string()))?;
    Ok(bytes)
}
