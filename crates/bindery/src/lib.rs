pub mod archive;
pub mod cache;
pub mod config;
pub mod confirm;
pub mod db;
pub mod document;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod notify;
pub mod service;
pub mod store;

pub use archive::{ArchiveUnpacker, UnpackedEntry};
pub use cache::{OperationCache, PendingOperation};
pub use config::{load_config, load_config_from_str, Config};
pub use confirm::{
    ConfirmationCoordinator, Dependent, DeletionReport, InitiateOutcome, OperationKey, Subject,
    SubjectKind,
};
pub use document::{build_document, AccessRestrictions, BuiltDocument, PageImage};
pub use error::{
    ArchiveError, AssetError, BinderyError, ConfigError, ConfirmError, Result, StoreError,
    ValidationError, WorkerError,
};
pub use ingest::{EpisodeWorker, IngestReceipt, IngestTask, Ingestor, RunReport, WorkerPool};
pub use notify::{Notification, NotificationKind, NotificationSink, RunOutcome};
pub use service::Service;
pub use store::BlobStore;
