//! Test harness for isolated end-to-end runs.
//!
//! Wires the same collaborators the composition root does, but backed by
//! a tempdir blob store and an in-memory database. The pool's result
//! channel means tests block on completion instead of sleeping.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use bindery::db::{category_repo, comic_repo, episode_repo, package_repo, season_repo, Database};
use bindery::store::UPLOADS_BUCKET;
use bindery::{
    AccessRestrictions, BlobStore, ConfirmationCoordinator, EpisodeWorker, Ingestor, Notification,
    NotificationSink, OperationCache, WorkerPool,
};

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub store: BlobStore,
    pub cache: OperationCache,
    pub sink: NotificationSink,
    pub pool: Arc<WorkerPool>,
    pub ingestor: Ingestor,
    pub coordinator: ConfirmationCoordinator,
    notifications: tokio::sync::broadcast::Receiver<Notification>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_confirm_ttl(Duration::from_secs(180))
    }

    pub fn with_confirm_ttl(ttl: Duration) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = BlobStore::new(temp_dir.path());
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let cache = OperationCache::new(1_000);
        let sink = NotificationSink::new(32);
        let notifications = sink.subscribe();

        let worker = EpisodeWorker::new(
            db.clone(),
            store.clone(),
            sink.clone(),
            AccessRestrictions::new("open-secret", "owner-secret"),
            Duration::from_secs(60),
        );
        let pool = Arc::new(WorkerPool::new(worker, 2));

        let ingestor = Ingestor::new(db.clone(), store.clone(), sink.clone(), Arc::clone(&pool));
        let coordinator =
            ConfirmationCoordinator::new(db.clone(), store.clone(), cache.clone(), ttl);

        Self {
            temp_dir,
            db,
            store,
            cache,
            sink,
            pool,
            ingestor,
            coordinator,
            notifications,
        }
    }

    /// Stages an upload for ingestion and returns its key.
    pub fn put_upload(&self, key: &str, bytes: &[u8]) -> String {
        self.store.put(UPLOADS_BUCKET, key, bytes).unwrap();
        key.to_string()
    }

    /// The next notification, if one has been enqueued.
    pub fn try_notification(&mut self) -> Option<Notification> {
        self.notifications.try_recv().ok()
    }

    // ---- row seeding -------------------------------------------------

    pub fn seed_comic(&self, id: &str) {
        comic_repo::insert(
            &self.db,
            &comic_repo::ComicRow {
                id: id.to_string(),
                name: format!("Comic {}", id),
                summary: None,
                description: None,
                source_country: None,
                publish_date: None,
                banner_path: Some(format!("{}/banner.jpg", id)),
                publisher_id: Some("pub-1".to_string()),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }

    pub fn seed_episode(&self, id: &str, comic_id: &str, number: i64) {
        episode_repo::insert(
            &self.db,
            &episode_repo::EpisodeRow {
                id: id.to_string(),
                comic_id: comic_id.to_string(),
                season_id: None,
                episode_number: number,
                banner_path: None,
                document_path: format!("{}/episodes/{}/document.pdf", comic_id, number),
                page_count: 5,
                price: 0.0,
                publisher_id: Some("pub-1".to_string()),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }

    pub fn seed_season_episode(&self, id: &str, comic_id: &str, season_id: &str, number: i64) {
        episode_repo::insert(
            &self.db,
            &episode_repo::EpisodeRow {
                id: id.to_string(),
                comic_id: comic_id.to_string(),
                season_id: Some(season_id.to_string()),
                episode_number: number,
                banner_path: None,
                document_path: format!("{}/episodes/{}/document.pdf", comic_id, number),
                page_count: 5,
                price: 0.0,
                publisher_id: Some("pub-1".to_string()),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }

    pub fn seed_season(&self, id: &str, comic_id: &str, ordinal: i64) {
        season_repo::insert(
            &self.db,
            &season_repo::SeasonRow {
                id: id.to_string(),
                comic_id: comic_id.to_string(),
                name: format!("Season {}", ordinal),
                ordinal,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }

    pub fn seed_category(&self, id: &str, name: &str) {
        category_repo::insert(
            &self.db,
            &category_repo::CategoryRow {
                id: id.to_string(),
                name: name.to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }

    pub fn seed_category_mapping(&self, id: &str, category_id: &str, comic_id: &str) {
        category_repo::insert_mapping(
            &self.db,
            &category_repo::CategoryMappingRow {
                id: id.to_string(),
                category_id: category_id.to_string(),
                comic_id: comic_id.to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }

    pub fn seed_package(&self, id: &str) {
        package_repo::insert(
            &self.db,
            &package_repo::PackageRow {
                id: id.to_string(),
                name: format!("Package {}", id),
                price: 4.99,
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }

    pub fn seed_package_comic(&self, id: &str, package_id: &str, comic_id: &str) {
        package_repo::insert_comic(
            &self.db,
            &package_repo::PackageComicRow {
                id: id.to_string(),
                package_id: package_id.to_string(),
                comic_id: comic_id.to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
    }
}
