use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinderyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Confirmation error: {0}")]
    Confirm(#[from] ConfirmError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Pre-write rejections. Anything in here aborts an operation before a
/// single repository row or final blob object is written.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Archive contains no manifest.json")]
    MissingManifest,

    #[error("Archive contains {0} manifest files, expected exactly one")]
    MultipleManifests(usize),

    #[error("Archive contains no banner image")]
    MissingBanner,

    #[error("Archive contains {0} banner images, expected exactly one")]
    MultipleBanners(usize),

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error("Episode number must be positive (directory '{directory}')")]
    InvalidEpisodeNumber { directory: String },

    #[error("Banner image could not be decoded: {0}")]
    BannerUndecodable(String),

    #[error("Document requires at least one page image")]
    EmptyImageSet,

    #[error("Document open password must not be empty")]
    EmptyOpenPassword,
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Corrupt archive: {0}")]
    Corrupt(#[from] zip::result::ZipError),

    #[error("Failed to read archive entry '{name}': {source}")]
    EntryRead {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Undecodable image '{name}': {source}")]
    UndecodableImage {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Document assembly failed: {0}")]
    Assembly(String),

    #[error("Document encryption failed: {0}")]
    Encryption(String),

    #[error("Staging file error at '{path}': {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid object key '{0}'")]
    InvalidKey(String),

    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write object '{path}': {source}")]
    WriteObject {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read object '{path}': {source}")]
    ReadObject {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete '{path}': {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list objects under '{path}': {source}")]
    List {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

/// Failures of the deferred-confirmation protocol. `ExpiredOrUnknownOperation`
/// covers never-existed, expired, and already-consumed keys; callers
/// cannot distinguish them.
#[derive(Error, Debug)]
pub enum ConfirmError {
    #[error("Operation key is expired or unknown")]
    ExpiredOrUnknownOperation,

    #[error("Presented token does not match the operation issuer")]
    TokenMismatch,

    #[error("A deletion is already pending for {subject}")]
    AlreadyPending { subject: String },

    #[error("Malformed operation key '{0}'")]
    MalformedKey(String),
}

pub type Result<T> = std::result::Result<T, BinderyError>;
