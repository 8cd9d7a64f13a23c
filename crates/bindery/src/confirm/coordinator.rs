//! Two-phase deletion coordinator.
//!
//! `initiate` computes the live dependent set and either deletes the
//! subject immediately (no dependents) or parks a snapshot behind a
//! single-use key. `confirm` consumes the key first, then fans the
//! deletion out: dependent rows, then subject row, then blob objects.
//! A crash mid-fan-out leaves orphaned rows, never a double delete.

use std::time::Duration;

use tracing::info_span;

use crate::cache::{OperationCache, PendingOperation};
use crate::db::{
    category_repo, comic_repo, episode_repo, package_repo, run_repo, season_repo, Database,
};
use crate::error::{BinderyError, ConfirmError};
use crate::store::{BlobStore, COMICS_BUCKET};

use super::{Dependent, OperationKey, Subject, SubjectKind};

/// Default window in which a pending deletion may be confirmed.
pub const DEFAULT_CONFIRM_TTL: Duration = Duration::from_secs(180);

/// Result of `initiate`: either the subject is already gone, or a key the
/// caller must present again to proceed.
#[derive(Debug)]
pub enum InitiateOutcome {
    Deleted(DeletionReport),
    Pending {
        key: OperationKey,
        dependents: Vec<Dependent>,
    },
}

#[derive(Debug, Clone)]
pub struct DeletionReport {
    pub subject: Subject,
    pub dependents_deleted: usize,
}

pub struct ConfirmationCoordinator {
    db: Database,
    store: BlobStore,
    cache: OperationCache,
    ttl: Duration,
}

impl ConfirmationCoordinator {
    pub fn new(db: Database, store: BlobStore, cache: OperationCache, ttl: Duration) -> Self {
        Self {
            db,
            store,
            cache,
            ttl,
        }
    }

    /// Starts (or short-circuits) a deletion.
    ///
    /// A live pending operation for the same subject is rejected. With no
    /// dependents the subject is deleted on the spot; otherwise nothing is
    /// deleted and the caller receives the key plus the frozen snapshot.
    pub fn initiate(
        &self,
        subject: Subject,
        issuer_token: &str,
    ) -> Result<InitiateOutcome, BinderyError> {
        let _span = info_span!("initiate_delete", subject = %subject).entered();

        if self.cache.pending_key_for(&subject).is_some() {
            return Err(ConfirmError::AlreadyPending {
                subject: subject.to_string(),
            }
            .into());
        }

        let dependents = self.dependents_of(&subject)?;

        if dependents.is_empty() {
            let report = self.execute_delete(&subject)?;
            return Ok(InitiateOutcome::Deleted(report));
        }

        let key = OperationKey::mint(&subject);
        self.cache.set(
            &key,
            PendingOperation {
                subject,
                dependents: dependents.clone(),
                issuer_token: issuer_token.to_string(),
            },
            self.ttl,
        );

        Ok(InitiateOutcome::Pending { key, dependents })
    }

    /// Completes a pending deletion.
    ///
    /// Expired, unknown, and already-consumed keys are indistinguishable.
    /// A token mismatch leaves the entry intact so the rightful issuer
    /// can still confirm before the TTL runs out.
    pub fn confirm(
        &self,
        key: &OperationKey,
        presented_token: &str,
    ) -> Result<DeletionReport, BinderyError> {
        let _span = info_span!("confirm_delete", subject = %key.subject()).entered();

        let operation = self
            .cache
            .get(key)
            .ok_or(ConfirmError::ExpiredOrUnknownOperation)?;

        if operation.issuer_token != presented_token {
            return Err(ConfirmError::TokenMismatch.into());
        }

        // Consume the key before anything is deleted: a crash past this
        // point can orphan rows but can never replay the deletion.
        let operation = self
            .cache
            .take(key)
            .ok_or(ConfirmError::ExpiredOrUnknownOperation)?;

        self.execute_delete(&operation.subject)
    }

    /// Computes the current dependent set for a subject. Snapshot-only:
    /// the result is what the caller reviews, not a lock.
    fn dependents_of(&self, subject: &Subject) -> Result<Vec<Dependent>, BinderyError> {
        let id = subject.id.as_str();
        let mut dependents = Vec::new();

        match subject.kind {
            SubjectKind::Category => {
                for mapping in category_repo::list_mappings_by_category(&self.db, id)? {
                    dependents.push(Dependent {
                        entity: "category_mapping".to_string(),
                        id: mapping.id,
                        label: format!("comic {}", mapping.comic_id),
                    });
                }
            }
            SubjectKind::Comic => {
                for episode in episode_repo::list_by_comic(&self.db, id)? {
                    dependents.push(Dependent {
                        entity: "episode".to_string(),
                        id: episode.id,
                        label: format!("episode {}", episode.episode_number),
                    });
                }
                for season in season_repo::list_by_comic(&self.db, id)? {
                    dependents.push(Dependent {
                        entity: "season".to_string(),
                        id: season.id,
                        label: season.name,
                    });
                }
                for mapping in category_repo::list_mappings_by_comic(&self.db, id)? {
                    dependents.push(Dependent {
                        entity: "category_mapping".to_string(),
                        id: mapping.id,
                        label: format!("category {}", mapping.category_id),
                    });
                }
                for mapping in package_repo::list_packages_by_comic(&self.db, id)? {
                    dependents.push(Dependent {
                        entity: "package_comic".to_string(),
                        id: mapping.id,
                        label: format!("package {}", mapping.package_id),
                    });
                }
            }
            SubjectKind::Episode => {
                // No in-scope rows reference an episode; deletion is
                // always immediate.
            }
            SubjectKind::Season => {
                for episode in episode_repo::list_by_season(&self.db, id)? {
                    dependents.push(Dependent {
                        entity: "episode".to_string(),
                        id: episode.id,
                        label: format!("episode {}", episode.episode_number),
                    });
                }
            }
            SubjectKind::PremiumPackage => {
                for mapping in package_repo::list_comics_by_package(&self.db, id)? {
                    dependents.push(Dependent {
                        entity: "package_comic".to_string(),
                        id: mapping.id,
                        label: format!("comic {}", mapping.comic_id),
                    });
                }
            }
        }

        Ok(dependents)
    }

    /// Deletes dependent rows, then the subject row, then blob objects.
    fn execute_delete(&self, subject: &Subject) -> Result<DeletionReport, BinderyError> {
        let id = subject.id.as_str();

        let dependents_deleted = match subject.kind {
            SubjectKind::Category => {
                let n = category_repo::delete_mappings_by_category(&self.db, id)?;
                category_repo::delete(&self.db, id)?;
                n
            }
            SubjectKind::Comic => {
                let mut n = episode_repo::delete_by_comic(&self.db, id)?;
                n += season_repo::delete_by_comic(&self.db, id)?;
                n += category_repo::delete_mappings_by_comic(&self.db, id)?;
                n += package_repo::delete_comics_by_comic(&self.db, id)?;
                run_repo::delete(&self.db, id)?;
                comic_repo::delete(&self.db, id)?;
                // The whole artifact prefix goes: banner and every
                // episode document.
                self.store.delete_prefix(COMICS_BUCKET, id)?;
                n
            }
            SubjectKind::Episode => {
                let episode = episode_repo::find_by_id(&self.db, id)?;
                episode_repo::delete(&self.db, id)?;
                if let Some(episode) = episode {
                    self.store.delete_prefix(
                        COMICS_BUCKET,
                        &format!("{}/episodes/{}", episode.comic_id, episode.episode_number),
                    )?;
                }
                0
            }
            SubjectKind::Season => {
                let episodes = episode_repo::list_by_season(&self.db, id)?;
                let n = episode_repo::delete_by_season(&self.db, id)?;
                season_repo::delete(&self.db, id)?;
                for episode in &episodes {
                    self.store.delete_prefix(
                        COMICS_BUCKET,
                        &format!("{}/episodes/{}", episode.comic_id, episode.episode_number),
                    )?;
                }
                n
            }
            SubjectKind::PremiumPackage => {
                let n = package_repo::delete_comics_by_package(&self.db, id)?;
                package_repo::delete(&self.db, id)?;
                n
            }
        };

        tracing::info!(
            subject = %subject,
            dependents = dependents_deleted,
            "Deletion executed"
        );

        Ok(DeletionReport {
            subject: subject.clone(),
            dependents_deleted,
        })
    }
}
