//! Service configuration.
//!
//! A single JSON document with explicit post-parse validation. Every
//! field has a default except the document passwords, which must be set.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::confirm::DEFAULT_CONFIRM_TTL;
use crate::document::AccessRestrictions;
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Root directory of the blob store.
    pub storage_root: PathBuf,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Background ingestion worker threads.
    pub worker_count: usize,
    /// Window in which a pending deletion may be confirmed.
    pub confirm_ttl_secs: u64,
    /// Upper bound on one background ingestion run.
    pub run_timeout_secs: u64,
    /// Open (user) password applied to every built document.
    pub document_open_password: String,
    /// Owner credential applied to every built document.
    pub document_owner_password: String,
    /// Buffered capacity of the notification channel.
    pub notification_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("data/blobs"),
            database_path: PathBuf::from("data/bindery.db"),
            worker_count: num_cpus::get(),
            confirm_ttl_secs: DEFAULT_CONFIRM_TTL.as_secs(),
            run_timeout_secs: 900,
            document_open_password: String::new(),
            document_owner_password: String::new(),
            notification_capacity: 64,
        }
    }
}

impl Config {
    pub fn confirm_ttl(&self) -> Duration {
        Duration::from_secs(self.confirm_ttl_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn restrictions(&self) -> AccessRestrictions {
        AccessRestrictions::new(
            self.document_open_password.clone(),
            self.document_owner_password.clone(),
        )
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "workerCount must be at least 1".to_string(),
        });
    }
    if config.confirm_ttl_secs == 0 {
        return Err(ConfigError::Validation {
            message: "confirmTtlSecs must be at least 1".to_string(),
        });
    }
    if config.run_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "runTimeoutSecs must be at least 1".to_string(),
        });
    }
    if config.notification_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "notificationCapacity must be at least 1".to_string(),
        });
    }
    if config.document_open_password.is_empty() {
        return Err(ConfigError::Validation {
            message: "documentOpenPassword must be set".to_string(),
        });
    }
    if config.document_owner_password.is_empty() {
        return Err(ConfigError::Validation {
            message: "documentOwnerPassword must be set".to_string(),
        });
    }
    if config.document_open_password == config.document_owner_password {
        return Err(ConfigError::Validation {
            message: "documentOwnerPassword must differ from documentOpenPassword".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "documentOpenPassword": "open-secret",
            "documentOwnerPassword": "owner-secret"
        }"#
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = load_config_from_str(minimal_json()).unwrap();
        assert_eq!(config.confirm_ttl_secs, 180);
        assert_eq!(config.run_timeout_secs, 900);
        assert!(config.worker_count >= 1);
        assert_eq!(config.storage_root, PathBuf::from("data/blobs"));
    }

    #[test]
    fn test_full_config_parses() {
        let config = load_config_from_str(
            r#"{
                "storageRoot": "/var/lib/bindery/blobs",
                "databasePath": "/var/lib/bindery/bindery.db",
                "workerCount": 4,
                "confirmTtlSecs": 60,
                "runTimeoutSecs": 300,
                "documentOpenPassword": "open-secret",
                "documentOwnerPassword": "owner-secret",
                "notificationCapacity": 128
            }"#,
        )
        .unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.confirm_ttl(), Duration::from_secs(60));
        assert_eq!(config.run_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_missing_passwords_rejected() {
        let result = load_config_from_str("{}");
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let json = r#"{
            "workerCount": 0,
            "documentOpenPassword": "a",
            "documentOwnerPassword": "b"
        }"#;
        assert!(matches!(
            load_config_from_str(json),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_identical_passwords_rejected() {
        let json = r#"{
            "documentOpenPassword": "same",
            "documentOwnerPassword": "same"
        }"#;
        assert!(matches!(
            load_config_from_str(json),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            load_config_from_str("{ nope"),
            Err(ConfigError::ParseJson(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, minimal_json()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.document_open_password, "open-secret");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/config.json"),
            Err(ConfigError::ReadFile { .. })
        ));
    }
}
