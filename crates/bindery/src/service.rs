//! Composition root.
//!
//! Builds every collaborator from a validated `Config` and injects them
//! explicitly; no process-wide singletons. Embedders hold a `Service`
//! and reach the ingestor and coordinator through it.

use std::sync::Arc;

use crate::cache::OperationCache;
use crate::config::Config;
use crate::confirm::ConfirmationCoordinator;
use crate::db::Database;
use crate::error::BinderyError;
use crate::ingest::{EpisodeWorker, Ingestor, RunReport, WorkerPool};
use crate::notify::{Notification, NotificationSink};
use crate::store::BlobStore;

/// Capacity of the pending-operation cache. Generous: entries are tiny
/// and expire on their own.
const OPERATION_CACHE_CAPACITY: u64 = 10_000;

pub struct Service {
    store: BlobStore,
    db: Database,
    sink: NotificationSink,
    pool: Arc<WorkerPool>,
    ingestor: Ingestor,
    coordinator: ConfirmationCoordinator,
}

impl Service {
    pub fn start(config: &Config) -> Result<Self, BinderyError> {
        let db = Database::open(&config.database_path)?;
        let store = BlobStore::new(&config.storage_root);
        let cache = OperationCache::new(OPERATION_CACHE_CAPACITY);
        let sink = NotificationSink::new(config.notification_capacity);

        let worker = EpisodeWorker::new(
            db.clone(),
            store.clone(),
            sink.clone(),
            config.restrictions(),
            config.run_timeout(),
        );
        let pool = Arc::new(WorkerPool::new(worker, config.worker_count));

        let ingestor = Ingestor::new(db.clone(), store.clone(), sink.clone(), Arc::clone(&pool));
        let coordinator =
            ConfirmationCoordinator::new(db.clone(), store.clone(), cache, config.confirm_ttl());

        Ok(Self {
            store,
            db,
            sink,
            pool,
            ingestor,
            coordinator,
        })
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    pub fn coordinator(&self) -> &ConfirmationCoordinator {
        &self.coordinator
    }

    pub fn notifications(&self) -> tokio::sync::broadcast::Receiver<Notification> {
        self.sink.subscribe()
    }

    /// Blocks until the next background run finishes. Primarily for
    /// embedders that drive their own scheduling or for tests.
    pub fn recv_run_report(&self) -> Option<RunReport> {
        self.pool.recv_result()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.store
    }

    /// Stops the worker pool and joins its threads. Queued runs that have
    /// not started are dropped.
    pub fn shutdown(self) {
        let Service {
            pool, ingestor, ..
        } = self;

        pool.shutdown();
        drop(ingestor);

        match Arc::try_unwrap(pool) {
            Ok(pool) => pool.wait(),
            Err(_) => log::warn!("Worker pool still shared at shutdown; skipping join"),
        }
    }
}
