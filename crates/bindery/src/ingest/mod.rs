//! Bulk content ingestion pipeline.
//!
//! The orchestrator runs synchronously up to scheduling; the worker pool
//! builds and registers episodes in the background and reports through
//! the notification sink.

pub mod manifest;
mod orchestrator;
mod pool;
mod worker;

pub use manifest::{scan_entries, ArchiveLayout, EpisodeImageGroup, ManifestDescriptor};
pub use orchestrator::{IngestReceipt, Ingestor};
pub use pool::WorkerPool;
pub use worker::{EpisodeWorker, IngestTask, RunReport};
